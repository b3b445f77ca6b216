// Store Probe Core
//
// Measures read latency of a DynamoDB table under different client setups.
//
// Key design decisions:
// - Uses traits (StoreConnector, ItemReader) for pluggable backends
// - DynamoDB is reached over its JSON protocol with reqwest; no vendor SDK
// - Credentials come from env keys, the container role endpoint or instance metadata
// - Proxy bypassing is carried by TransportConfig, one value per client
// - Timing is a single sequential harness shared by every scenario

pub mod benchmark;
pub mod config;
pub mod credentials;
pub mod dynamodb;
pub mod error;
pub mod item;
pub mod sigv4;
pub mod timing;
pub mod traits;
pub mod transport;

// In-memory implementations for examples and testing
pub mod memory;

// Re-exports for convenience
pub use benchmark::{BenchmarkReport, BenchmarkRunner, ProxyPhase, Scenario, ScenarioResult};
pub use config::{ConfigError, StoreConfig};
pub use credentials::{CredentialSource, ProvideCredentials};
pub use dynamodb::{DynamoDbClient, DynamoDbConnector};
pub use error::{Result, StoreError};
pub use item::{AttributeValue, GetItemOutput, GetItemRequest, ReadConsistency};
pub use timing::{measure, Measurement};
pub use traits::{ItemReader, StoreConnector};
pub use transport::{ClientProfile, ProxyBypassList, TransportConfig};
