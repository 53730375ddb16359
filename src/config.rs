use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing Github repository (GITHUB_REPOSITORY is not set)")]
    MissingRepository,
    #[error("Missing version (INPUT_VERSION is not set)")]
    MissingVersion,
}

/// Three-state reading of an environment variable used as a switch.
///
/// `INVALIDATE_CACHE` follows the Actions convention where any non-empty value
/// turns the switch on, including `false` and `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFlag {
    Absent,
    Empty,
    Set(String),
}

impl EnvFlag {
    pub fn from_value(value: Option<String>) -> Self {
        match value {
            None => EnvFlag::Absent,
            Some(v) if v.is_empty() => EnvFlag::Empty,
            Some(v) => EnvFlag::Set(v),
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, EnvFlag::Set(_))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub owner: String,
    pub repository: String,
    pub image_name: String,
    pub base_version: String,
    pub build_args: Option<String>,
    pub invalidate_cache: EnvFlag,
    pub token: Option<String>,
    pub output: Option<PathBuf>,
    pub api_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let github_repository =
            non_empty("GITHUB_REPOSITORY").ok_or(ConfigError::MissingRepository)?;
        let base_version = non_empty("INPUT_VERSION").ok_or(ConfigError::MissingVersion)?;
        let (owner, repository) = split_repository(&github_repository);

        let api_url = non_empty("GITHUB_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            owner,
            repository,
            image_name: lookup("INPUT_NAME").unwrap_or_default(),
            base_version,
            build_args: lookup("BUILD_ARGS"),
            invalidate_cache: EnvFlag::from_value(lookup("INVALIDATE_CACHE")),
            token: non_empty("INPUT_TOKEN"),
            output: non_empty("GITHUB_OUTPUT").map(PathBuf::from),
            api_url,
        })
    }

    /// Package name as GitHub stores it for this repository's image.
    pub fn package_name(&self) -> String {
        format!("{}/{}", self.repository, self.image_name)
    }
}

/// `ACTION_DEBUG` only enables debug output for the literal value `true`.
pub fn is_debug(value: Option<String>) -> bool {
    value.as_deref() == Some("true")
}

/// Split `owner/repo` on the first `/`. Without a separator the whole value
/// becomes the owner and the repository is empty.
fn split_repository(value: &str) -> (String, String) {
    match value.split_once('/') {
        Some((owner, repo)) => (owner.to_string(), repo.to_string()),
        None => (value.to_string(), String::new()),
    }
}
