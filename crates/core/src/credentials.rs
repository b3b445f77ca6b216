// AWS credential resolution
//
// Sources, in lookup order:
// - AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY
// - Container credentials endpoint (ECS task role, EKS pod identity)
// - EC2 instance metadata (IMDSv2)
//
// Temporary credentials are cached and refreshed shortly before they expire.
// Metadata endpoints are always reached directly, never through the proxy.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, StoreError};
use crate::sigv4::Credentials;

/// Base URL for `AWS_CONTAINER_CREDENTIALS_RELATIVE_URI`
pub const CONTAINER_CREDENTIALS_HOST: &str = "http://169.254.170.2";

/// Default EC2 instance metadata endpoint
pub const INSTANCE_METADATA_ENDPOINT: &str = "http://169.254.169.254";

const METADATA_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
const METADATA_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const IMDS_TOKEN_TTL_SECS: &str = "21600";

/// Refresh cached credentials this long before they expire
const REFRESH_WINDOW_MINUTES: i64 = 5;

/// Where signing credentials come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Requests are sent unsigned
    Anonymous,
    /// Keys given directly in the environment
    Static(Credentials),
    /// Container credentials endpoint
    Container {
        uri: Url,
        auth_token: Option<String>,
        auth_token_file: Option<PathBuf>,
    },
    /// EC2 instance metadata service
    InstanceMetadata { endpoint: Url },
}

impl CredentialSource {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, CredentialSource::Anonymous)
    }

    /// Build the provider for this source; `None` for anonymous access
    pub fn provider(&self) -> Result<Option<Arc<dyn ProvideCredentials>>> {
        let provider: Arc<dyn ProvideCredentials> = match self {
            CredentialSource::Anonymous => return Ok(None),
            CredentialSource::Static(credentials) => Arc::new(credentials.clone()),
            CredentialSource::Container {
                uri,
                auth_token,
                auth_token_file,
            } => Arc::new(CachedCredentials::new(ContainerCredentials {
                http: metadata_client()?,
                uri: uri.clone(),
                auth_token: auth_token.clone(),
                auth_token_file: auth_token_file.clone(),
            })),
            CredentialSource::InstanceMetadata { endpoint } => {
                Arc::new(CachedCredentials::new(InstanceMetadataCredentials {
                    http: metadata_client()?,
                    endpoint: endpoint.clone(),
                }))
            }
        };
        Ok(Some(provider))
    }
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Anonymous => write!(f, "anonymous"),
            CredentialSource::Static(_) => write!(f, "environment"),
            CredentialSource::Container { .. } => write!(f, "container"),
            CredentialSource::InstanceMetadata { .. } => write!(f, "instance-metadata"),
        }
    }
}

/// Supplies credentials for request signing
#[async_trait]
pub trait ProvideCredentials: Send + Sync {
    async fn credentials(&self) -> Result<Credentials>;
}

#[async_trait]
impl ProvideCredentials for Credentials {
    async fn credentials(&self) -> Result<Credentials> {
        Ok(self.clone())
    }
}

fn metadata_client() -> Result<Client> {
    Ok(Client::builder()
        .connect_timeout(METADATA_CONNECT_TIMEOUT)
        .timeout(METADATA_REQUEST_TIMEOUT)
        .no_proxy()
        .build()?)
}

/// Credential document served by both metadata endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CredentialsDocument {
    access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    expiration: Option<DateTime<Utc>>,
}

impl From<CredentialsDocument> for Credentials {
    fn from(doc: CredentialsDocument) -> Self {
        let mut credentials = Credentials::new(doc.access_key_id, doc.secret_access_key);
        credentials.session_token = doc.token;
        credentials.expires_at = doc.expiration;
        credentials
    }
}

async fn fetch_text(request: reqwest::RequestBuilder, what: &str) -> Result<String> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(StoreError::credentials(format!(
            "{} returned {}",
            what,
            status.as_u16()
        )));
    }
    Ok(body)
}

fn parse_document(body: &str, what: &str) -> Result<Credentials> {
    let doc: CredentialsDocument = serde_json::from_str(body)
        .map_err(|e| StoreError::credentials(format!("{} sent an invalid document: {}", what, e)))?;
    Ok(doc.into())
}

/// Container credentials endpoint
pub struct ContainerCredentials {
    http: Client,
    uri: Url,
    auth_token: Option<String>,
    auth_token_file: Option<PathBuf>,
}

impl ContainerCredentials {
    fn authorization(&self) -> Result<Option<String>> {
        match &self.auth_token_file {
            Some(path) => std::fs::read_to_string(path)
                .map(|token| Some(token.trim().to_string()))
                .map_err(|e| {
                    StoreError::credentials(format!("cannot read {}: {}", path.display(), e))
                }),
            None => Ok(self.auth_token.clone()),
        }
    }
}

#[async_trait]
impl ProvideCredentials for ContainerCredentials {
    async fn credentials(&self) -> Result<Credentials> {
        let mut request = self.http.get(self.uri.clone());
        if let Some(token) = self.authorization()? {
            request = request.header(AUTHORIZATION, token);
        }
        let body = fetch_text(request, "container credentials endpoint").await?;
        parse_document(&body, "container credentials endpoint")
    }
}

/// EC2 instance metadata, session-token (v2) flow
pub struct InstanceMetadataCredentials {
    http: Client,
    endpoint: Url,
}

impl InstanceMetadataCredentials {
    fn url(&self, path: &str) -> Result<Url> {
        self.endpoint
            .join(path)
            .map_err(|e| StoreError::config(format!("bad metadata path {}: {}", path, e)))
    }
}

#[async_trait]
impl ProvideCredentials for InstanceMetadataCredentials {
    async fn credentials(&self) -> Result<Credentials> {
        let token = fetch_text(
            self.http
                .put(self.url("/latest/api/token")?)
                .header("x-aws-ec2-metadata-token-ttl-seconds", IMDS_TOKEN_TTL_SECS),
            "instance metadata token",
        )
        .await?;

        let roles_url = self.url("/latest/meta-data/iam/security-credentials/")?;
        let roles = fetch_text(
            self.http
                .get(roles_url.clone())
                .header("x-aws-ec2-metadata-token", token.as_str()),
            "instance metadata role lookup",
        )
        .await?;
        let role = roles
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| StoreError::credentials("no IAM role attached to this instance"))?;

        let body = fetch_text(
            self.http
                .get(self.url(&format!("{}{}", roles_url.path(), role))?)
                .header("x-aws-ec2-metadata-token", token.as_str()),
            "instance metadata credentials",
        )
        .await?;
        parse_document(&body, "instance metadata credentials")
    }
}

/// Caches credentials from an inner provider until they are about to expire
pub struct CachedCredentials<P> {
    inner: P,
    cached: RwLock<Option<Credentials>>,
}

impl<P> CachedCredentials<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cached: RwLock::new(None),
        }
    }
}

fn is_fresh(credentials: &Credentials, now: DateTime<Utc>) -> bool {
    match credentials.expires_at {
        Some(expires_at) => expires_at - ChronoDuration::minutes(REFRESH_WINDOW_MINUTES) > now,
        None => true,
    }
}

#[async_trait]
impl<P: ProvideCredentials> ProvideCredentials for CachedCredentials<P> {
    async fn credentials(&self) -> Result<Credentials> {
        let cached = self.cached.read().clone();
        if let Some(credentials) = cached.filter(|c| is_fresh(c, Utc::now())) {
            return Ok(credentials);
        }

        let credentials = self.inner.credentials().await?;
        tracing::debug!(
            access_key_id = %credentials.access_key_id,
            expires_at = ?credentials.expires_at,
            "Refreshed AWS credentials"
        );
        *self.cached.write() = Some(credentials.clone());
        Ok(credentials)
    }
}
