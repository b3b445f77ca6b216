// Store configuration loaded from environment variables.
// Decision: Follow the AWS SDK variable names (AWS_REGION, AWS_ACCESS_KEY_ID, ...)
// Decision: Default to eu-west-2 and the session table the probe was built against

use reqwest::Url;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::credentials::{
    CredentialSource, CONTAINER_CREDENTIALS_HOST, INSTANCE_METADATA_ENDPOINT,
};
use crate::sigv4::Credentials;
use crate::transport::{ProxyBypassList, DEFAULT_REQUEST_TIMEOUT};

pub const DEFAULT_REGION: &str = "eu-west-2";
pub const DEFAULT_TABLE: &str = "sc-test-1-session";

/// Invalid configuration value
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is not a valid URL: {value}")]
    InvalidUrl { name: &'static str, value: String },

    #[error("{name} must be a whole number of seconds: {value}")]
    InvalidDuration { name: &'static str, value: String },

    #[error("{0} is set without its matching secret")]
    IncompleteCredentials(&'static str),
}

/// Where and how to reach the item store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub region: String,
    pub endpoint: Url,
    pub table_name: String,
    /// Where signing credentials come from
    pub credentials: CredentialSource,
    /// Outbound proxy for store traffic
    pub proxy_url: Option<String>,
    /// Hosts that skip the proxy during the direct phase
    pub proxy_bypass: ProxyBypassList,
    pub request_timeout: Duration,
}

impl StoreConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `AWS_REGION`: store region (default: eu-west-2)
    /// - `DYNAMODB_ENDPOINT`: store endpoint (default: https://dynamodb.{region}.amazonaws.com)
    /// - `DYNAMODB_TABLE`: table to read from (default: sc-test-1-session)
    /// - `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` / `AWS_SESSION_TOKEN`: static credentials
    /// - `AWS_CONTAINER_CREDENTIALS_RELATIVE_URI` / `AWS_CONTAINER_CREDENTIALS_FULL_URI`:
    ///   container role credentials, with `AWS_CONTAINER_AUTHORIZATION_TOKEN(_FILE)`
    /// - `AWS_EC2_METADATA_DISABLED`: `true` skips instance metadata, leaving requests unsigned
    /// - `AWS_EC2_METADATA_SERVICE_ENDPOINT`: instance metadata endpoint override
    /// - `CDP_HTTPS_PROXY`, then `HTTPS_PROXY`: outbound proxy
    /// - `PROXY_BYPASS`: comma-separated bypass suffixes (default: internal domains)
    /// - `STORE_REQUEST_TIMEOUT_SECS`: per-request timeout (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let region = var("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string());

        let endpoint = match var("DYNAMODB_ENDPOINT") {
            Some(value) => Url::parse(&value).map_err(|_| ConfigError::InvalidUrl {
                name: "DYNAMODB_ENDPOINT",
                value,
            })?,
            None => default_endpoint(&region)?,
        };

        let table_name = var("DYNAMODB_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string());

        let credentials = credential_source(&var)?;

        let proxy_url = var("CDP_HTTPS_PROXY").or_else(|| var("HTTPS_PROXY"));
        if let Some(url) = &proxy_url {
            Url::parse(url).map_err(|_| ConfigError::InvalidUrl {
                name: "HTTPS_PROXY",
                value: url.clone(),
            })?;
        }

        let proxy_bypass = var("PROXY_BYPASS")
            .map(|list| ProxyBypassList::parse(&list))
            .unwrap_or_else(ProxyBypassList::defaults);

        let request_timeout = match var("STORE_REQUEST_TIMEOUT_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidDuration {
                    name: "STORE_REQUEST_TIMEOUT_SECS",
                    value,
                })?,
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            region,
            endpoint,
            table_name,
            credentials,
            proxy_url,
            proxy_bypass,
            request_timeout,
        })
    }

    /// Host part of the endpoint, used for bypass matching
    pub fn endpoint_host(&self) -> &str {
        self.endpoint.host_str().unwrap_or_default()
    }
}

/// Pick the first credential source the environment provides
fn credential_source<F>(var: &F) -> Result<CredentialSource, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match (var("AWS_ACCESS_KEY_ID"), var("AWS_SECRET_ACCESS_KEY")) {
        (Some(key), Some(secret)) => {
            let credentials = Credentials::new(key, secret);
            return Ok(CredentialSource::Static(match var("AWS_SESSION_TOKEN") {
                Some(token) => credentials.with_session_token(token),
                None => credentials,
            }));
        }
        (Some(_), None) => return Err(ConfigError::IncompleteCredentials("AWS_ACCESS_KEY_ID")),
        (None, Some(_)) => {
            return Err(ConfigError::IncompleteCredentials("AWS_SECRET_ACCESS_KEY"))
        }
        (None, None) => {}
    }

    let container_uri = match (
        var("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI"),
        var("AWS_CONTAINER_CREDENTIALS_FULL_URI"),
    ) {
        (Some(relative), _) => Some(parse_url(
            "AWS_CONTAINER_CREDENTIALS_RELATIVE_URI",
            format!("{}{}", CONTAINER_CREDENTIALS_HOST, relative.trim()),
        )?),
        (None, Some(full)) => Some(parse_url("AWS_CONTAINER_CREDENTIALS_FULL_URI", full)?),
        (None, None) => None,
    };
    if let Some(uri) = container_uri {
        return Ok(CredentialSource::Container {
            uri,
            auth_token: var("AWS_CONTAINER_AUTHORIZATION_TOKEN"),
            auth_token_file: var("AWS_CONTAINER_AUTHORIZATION_TOKEN_FILE").map(PathBuf::from),
        });
    }

    let imds_disabled = var("AWS_EC2_METADATA_DISABLED")
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if imds_disabled {
        return Ok(CredentialSource::Anonymous);
    }

    let endpoint = var("AWS_EC2_METADATA_SERVICE_ENDPOINT")
        .unwrap_or_else(|| INSTANCE_METADATA_ENDPOINT.to_string());
    Ok(CredentialSource::InstanceMetadata {
        endpoint: parse_url("AWS_EC2_METADATA_SERVICE_ENDPOINT", endpoint)?,
    })
}

fn parse_url(name: &'static str, value: String) -> Result<Url, ConfigError> {
    Url::parse(value.trim()).map_err(|_| ConfigError::InvalidUrl { name, value })
}

fn default_endpoint(region: &str) -> Result<Url, ConfigError> {
    let value = format!("https://dynamodb.{}.amazonaws.com", region);
    Url::parse(&value).map_err(|_| ConfigError::InvalidUrl {
        name: "AWS_REGION",
        value,
    })
}
