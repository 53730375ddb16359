use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::{self, AsyncWriteExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStatus {
    None,
    Found,
}

impl fmt::Display for LookupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupStatus::None => write!(f, "none"),
            LookupStatus::Found => write!(f, "found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub status: LookupStatus,
    pub image_version: String,
}

impl Report {
    pub fn new(status: LookupStatus, image_version: impl Into<String>) -> Self {
        Self {
            status,
            image_version: image_version.into(),
        }
    }

    /// The `key=value` lines for the step output, newline-terminated.
    pub fn render(&self) -> String {
        format!(
            "result={}\nimage_version={}\n",
            self.status, self.image_version
        )
    }

    /// Append the report to `path`, or print it to stdout when no output
    /// file is configured.
    pub async fn write(&self, path: Option<&Path>) -> Result<()> {
        let rendered = self.render();

        match path {
            Some(path) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await
                    .with_context(|| format!("Failed to open output file {}", path.display()))?;
                file.write_all(rendered.as_bytes())
                    .await
                    .with_context(|| format!("Failed to write output file {}", path.display()))?;
                file.flush().await?;
            }
            None => {
                let mut stdout = io::stdout();
                stdout.write_all(rendered.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let report = Report::new(LookupStatus::Found, "1.2.3-sha.c47f5b18");
        assert_eq!(report.render(), "result=found\nimage_version=1.2.3-sha.c47f5b18\n");

        let report = Report::new(LookupStatus::None, "1.2.3-sha.c47f5b18");
        assert_eq!(report.render(), "result=none\nimage_version=1.2.3-sha.c47f5b18\n");
    }

    #[tokio::test]
    async fn test_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_output");

        Report::new(LookupStatus::None, "2.0.0-sha.12345678")
            .write(Some(&path))
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "result=none\nimage_version=2.0.0-sha.12345678\n");
    }

    #[tokio::test]
    async fn test_write_appends_to_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_output");
        std::fs::write(&path, "previous=step\n").unwrap();

        Report::new(LookupStatus::Found, "2.0.0-sha.12345678")
            .write(Some(&path))
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "previous=step\nresult=found\nimage_version=2.0.0-sha.12345678\n"
        );
    }

    #[tokio::test]
    async fn test_write_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("github_output");

        let err = Report::new(LookupStatus::None, "1")
            .write(Some(&path))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to open output file"));
    }
}
