use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("check-image/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{url} returned {status}: {body}")]
    UnexpectedStatus {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountType {
    Organization,
    User,
    Other(String),
}

impl AccountType {
    fn from_api(kind: Option<String>) -> Self {
        match kind.as_deref() {
            Some("Organization") => AccountType::Organization,
            Some("User") => AccountType::User,
            Some(other) => AccountType::Other(other.to_string()),
            None => AccountType::Other(String::new()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Account {
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PackageVersion {
    pub metadata: VersionMetadata,
}

#[derive(Debug, Deserialize)]
pub struct VersionMetadata {
    pub container: ContainerMetadata,
}

#[derive(Debug, Deserialize)]
pub struct ContainerMetadata {
    /// `null` means untagged; a missing key is a malformed record.
    #[serde(deserialize_with = "Option::deserialize")]
    pub tags: Option<Vec<String>>,
}

/// Every tag of every version, in listing order.
pub fn flatten_tags(versions: Vec<PackageVersion>) -> Vec<String> {
    versions
        .into_iter()
        .filter_map(|v| v.metadata.container.tags)
        .flatten()
        .collect()
}

pub struct GitHubClient {
    client: Client,
    token: Option<String>,
    api_url: String,
}

impl GitHubClient {
    pub fn with_api_url(token: Option<&str>, api_url: &str) -> Self {
        Self {
            client: Client::new(),
            token: token.map(str::to_string),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT);

        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, GitHubError> {
        serde_json::from_str(body).map_err(|source| GitHubError::Decode {
            url: url.to_string(),
            source,
        })
    }

    pub async fn account_type(&self, owner: &str) -> Result<AccountType, GitHubError> {
        let url = format!("{}/users/{}", self.api_url, owner);

        let response = self.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GitHubError::UnexpectedStatus { url, status, body });
        }

        let account: Account = Self::decode(&url, &body)?;
        Ok(AccountType::from_api(account.kind))
    }

    pub fn versions_url(&self, owner: &str, account: &AccountType, package_name: &str) -> String {
        let encoded = urlencoding::encode(package_name);

        match account {
            AccountType::Organization => format!(
                "{}/orgs/{}/packages/container/{}/versions",
                self.api_url, owner, encoded
            ),
            _ => format!(
                "{}/user/packages/container/{}/versions",
                self.api_url, encoded
            ),
        }
    }

    /// Tags published for the package behind `url`, or `None` when the
    /// package does not exist yet.
    pub async fn package_tags(&self, url: &str) -> Result<Option<Vec<String>>, GitHubError> {
        let response = self.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!("Package not found at {}", url);
            return Ok(None);
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(GitHubError::UnexpectedStatus {
                url: url.to_string(),
                status,
                body,
            });
        }

        let versions: Vec<PackageVersion> = Self::decode(url, &body)?;
        Ok(Some(flatten_tags(versions)))
    }

    pub async fn image_exists(
        &self,
        owner: &str,
        package_name: &str,
        version: &str,
    ) -> Result<bool, GitHubError> {
        let account = self.account_type(owner).await?;
        debug!("Account type of {}: {:?}", owner, account);

        let url = self.versions_url(owner, &account, package_name);
        debug!("URL: {}", url);

        match self.package_tags(&url).await? {
            Some(tags) => {
                debug!(?tags, "Published tags");
                Ok(tags.iter().any(|tag| tag == version))
            }
            None => Ok(false),
        }
    }
}
