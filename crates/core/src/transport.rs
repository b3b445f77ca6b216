// HTTP transport settings for store clients
//
// Every client is built from an explicit TransportConfig. Proxy bypassing is
// part of that value, so two clients built at the same time can route
// differently without touching process environment.

use reqwest::{Client, NoProxy, Proxy};
use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// Idle sockets kept per host by the keep-alive profile
pub const KEEP_ALIVE_MAX_IDLE_PER_HOST: usize = 10;

/// How long an idle pooled socket stays open (60 seconds)
pub const KEEP_ALIVE_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default timeout for a single store request (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Internal domains that skip the outbound proxy during the direct phase
pub const DEFAULT_PROXY_BYPASS: &[&str] = &[
    ".cdp-int.defra.cloud",
    ".s3.eu-west-2.amazonaws.com",
    "sqs.eu-west-2.amazonaws.com",
    "sns.eu-west-2.amazonaws.com",
    "dynamodb.eu-west-2.amazonaws.com",
];

/// Connection handling of a store client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientProfile {
    /// The HTTP client's default transport, including its default pooling
    Plain,
    /// Tuned persistent connections: capped idle pool, TCP keep-alive probes
    KeepAlive,
}

impl ClientProfile {
    pub const ALL: [ClientProfile; 2] = [ClientProfile::Plain, ClientProfile::KeepAlive];
}

impl fmt::Display for ClientProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientProfile::Plain => write!(f, "plain"),
            ClientProfile::KeepAlive => write!(f, "keep-alive"),
        }
    }
}

/// Hostname suffixes that are reached without the outbound proxy.
///
/// Entries follow `NO_PROXY` conventions: a leading dot matches subdomains
/// only, a bare name matches the host itself and its subdomains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyBypassList {
    suffixes: Vec<String>,
}

impl ProxyBypassList {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes
                .into_iter()
                .map(Into::into)
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// The built-in internal domain list
    pub fn defaults() -> Self {
        Self::new(DEFAULT_PROXY_BYPASS.iter().copied())
    }

    /// Parse a comma-separated list (as found in `NO_PROXY`-style variables)
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// Whether requests to `host` skip the proxy
    pub fn bypasses(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_lowercase();
        self.suffixes.iter().any(|suffix| {
            if suffix.starts_with('.') {
                host.ends_with(suffix.as_str())
            } else {
                host == *suffix || host.ends_with(&format!(".{}", suffix))
            }
        })
    }

    fn to_no_proxy(&self) -> Option<NoProxy> {
        if self.is_empty() {
            None
        } else {
            NoProxy::from_string(&self.to_string())
        }
    }
}

impl fmt::Display for ProxyBypassList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffixes.join(","))
    }
}

/// Everything needed to build the HTTP client behind one store client
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub profile: ClientProfile,
    /// Outbound proxy; `None` means direct connections for every host
    pub proxy_url: Option<String>,
    /// Hosts that skip `proxy_url`
    pub bypass: ProxyBypassList,
    pub request_timeout: Duration,
}

impl TransportConfig {
    pub fn new(profile: ClientProfile) -> Self {
        Self {
            profile,
            proxy_url: None,
            bypass: ProxyBypassList::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_proxy(mut self, proxy_url: Option<String>) -> Self {
        self.proxy_url = proxy_url;
        self
    }

    pub fn with_bypass(mut self, bypass: ProxyBypassList) -> Self {
        self.bypass = bypass;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build a reqwest client for this transport.
    ///
    /// Ambient proxy variables are ignored; only `proxy_url` is used.
    pub fn build_client(&self) -> Result<Client> {
        let mut builder = Client::builder().timeout(self.request_timeout);

        builder = match self.profile {
            ClientProfile::Plain => builder,
            ClientProfile::KeepAlive => builder
                .pool_max_idle_per_host(KEEP_ALIVE_MAX_IDLE_PER_HOST)
                .pool_idle_timeout(KEEP_ALIVE_IDLE_TIMEOUT)
                .tcp_keepalive(KEEP_ALIVE_IDLE_TIMEOUT),
        };

        builder = match &self.proxy_url {
            Some(url) => {
                let proxy = Proxy::all(url.as_str())?.no_proxy(self.bypass.to_no_proxy());
                builder.proxy(proxy)
            }
            None => builder.no_proxy(),
        };

        Ok(builder.build()?)
    }
}
