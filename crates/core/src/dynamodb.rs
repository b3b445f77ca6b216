// DynamoDB client over the JSON 1.0 protocol
//
// Speaks just enough of the protocol to issue GetItem: one POST per call,
// operation selected by the X-Amz-Target header, SigV4 signed unless the
// credential source is anonymous.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::credentials::ProvideCredentials;
use crate::error::{Result, StoreError};
use crate::item::{GetItemOutput, GetItemRequest};
use crate::sigv4::{self, SignableRequest, SigningParams};
use crate::traits::{ItemReader, StoreConnector};
use crate::transport::{ClientProfile, ProxyBypassList, TransportConfig};

const SERVICE: &str = "dynamodb";
const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.0";
const TARGET_PREFIX: &str = "DynamoDB_20120810";

/// Error body returned by the service
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(alias = "Message", default)]
    message: Option<String>,
}

/// DynamoDB client bound to one endpoint and one HTTP transport
pub struct DynamoDbClient {
    http: Client,
    endpoint: Url,
    region: String,
    credentials: Option<Arc<dyn ProvideCredentials>>,
}

impl DynamoDbClient {
    pub fn new(
        http: Client,
        endpoint: Url,
        region: impl Into<String>,
        credentials: Option<Arc<dyn ProvideCredentials>>,
    ) -> Self {
        Self {
            http,
            endpoint,
            region: region.into(),
            credentials,
        }
    }

    fn host_header(&self) -> Result<String> {
        let host = self
            .endpoint
            .host_str()
            .ok_or_else(|| StoreError::config(format!("endpoint has no host: {}", self.endpoint)))?;
        Ok(match self.endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }

    async fn call<B, R>(&self, operation: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body)?;
        let target = format!("{}.{}", TARGET_PREFIX, operation);

        let mut request = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header("x-amz-target", &target);

        if let Some(provider) = &self.credentials {
            let credentials = provider.credentials().await?;
            let params = SigningParams {
                credentials: &credentials,
                region: &self.region,
                service: SERVICE,
                time: Utc::now(),
            };
            let signable = SignableRequest {
                method: "POST",
                path: self.endpoint.path(),
                headers: vec![
                    ("content-type".to_string(), JSON_CONTENT_TYPE.to_string()),
                    ("host".to_string(), self.host_header()?),
                    ("x-amz-target".to_string(), target.clone()),
                ],
                payload: &payload,
            };
            for (name, value) in sigv4::sign(&params, &signable) {
                request = request.header(name, value);
            }
        }

        let response = request.body(payload).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body: ServiceErrorBody =
                serde_json::from_slice(&bytes).unwrap_or(ServiceErrorBody {
                    error_type: None,
                    message: Some(String::from_utf8_lossy(&bytes).into_owned()),
                });
            let code = body
                .error_type
                .as_deref()
                .map(|t| t.rsplit('#').next().unwrap_or(t).to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            tracing::debug!(
                operation = %operation,
                status = status.as_u16(),
                code = %code,
                "DynamoDB request failed"
            );
            return Err(StoreError::service(
                status.as_u16(),
                code,
                body.message.unwrap_or_default(),
            ));
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::decode(format!("{} response: {}", operation, e)))
    }
}

#[async_trait]
impl ItemReader for DynamoDbClient {
    async fn get_item(&self, request: GetItemRequest) -> Result<GetItemOutput> {
        self.call("GetItem", &request).await
    }
}

/// Connects DynamoDB clients for the configured store
///
/// All clients share one credential provider, so role credentials are
/// fetched once and not on every connect.
pub struct DynamoDbConnector {
    config: StoreConfig,
    credentials: Option<Arc<dyn ProvideCredentials>>,
}

impl DynamoDbConnector {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let credentials = config.credentials.provider()?;
        Ok(Self {
            config,
            credentials,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn transport(&self, profile: ClientProfile, bypass: &ProxyBypassList) -> TransportConfig {
        TransportConfig::new(profile)
            .with_proxy(self.config.proxy_url.clone())
            .with_bypass(bypass.clone())
            .with_request_timeout(self.config.request_timeout)
    }
}

impl StoreConnector for DynamoDbConnector {
    fn connect(
        &self,
        profile: ClientProfile,
        bypass: &ProxyBypassList,
    ) -> Result<Arc<dyn ItemReader>> {
        let transport = self.transport(profile, bypass);
        tracing::debug!(
            profile = %profile,
            endpoint = %self.config.endpoint,
            proxied = transport.proxy_url.is_some() && !bypass.bypasses(self.config.endpoint_host()),
            "Connecting store client"
        );
        Ok(Arc::new(DynamoDbClient::new(
            transport.build_client()?,
            self.config.endpoint.clone(),
            self.config.region.clone(),
            self.credentials.clone(),
        )))
    }
}
