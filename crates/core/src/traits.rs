// Core traits for pluggable store backends
//
// The benchmark only sees these traits:
// - DynamoDB over HTTP for production
// - In-memory recorders for testing

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::item::{GetItemOutput, GetItemRequest};
use crate::transport::{ClientProfile, ProxyBypassList};

/// A connected client able to read single items
#[async_trait]
pub trait ItemReader: Send + Sync {
    /// Read one item by key. A missing item is `Ok` with no item.
    async fn get_item(&self, request: GetItemRequest) -> Result<GetItemOutput>;
}

/// Builds item readers for a given transport setup
///
/// Each call yields a new client that owns its own connection pool; dropping
/// the last handle closes the pool.
pub trait StoreConnector: Send + Sync {
    fn connect(
        &self,
        profile: ClientProfile,
        bypass: &ProxyBypassList,
    ) -> Result<Arc<dyn ItemReader>>;
}
