// In-memory implementations for examples and testing
//
// InMemoryConnector hands out readers that record every call instead of
// touching the network, making it suitable for:
// - Unit tests of the benchmark runner
// - Router tests in the API crate
// - Running the server without a store

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Result, StoreError};
use crate::item::{GetItemOutput, GetItemRequest};
use crate::traits::{ItemReader, StoreConnector};
use crate::transport::{ClientProfile, ProxyBypassList};

/// One read as seen by the in-memory store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRead {
    pub profile: ClientProfile,
    pub bypass: ProxyBypassList,
    pub table_name: String,
    pub key: String,
    pub consistent_read: bool,
}

#[derive(Default)]
struct State {
    items: RwLock<HashMap<String, Map<String, Value>>>,
    reads: RwLock<Vec<RecordedRead>>,
    connections: RwLock<Vec<(ClientProfile, ProxyBypassList)>>,
    open_clients: AtomicUsize,
    fail_on_read: Option<usize>,
}

/// Store connector backed by memory
///
/// Clones share state, so a test can keep one handle and give another to
/// the code under test.
#[derive(Clone, Default)]
pub struct InMemoryConnector {
    state: Arc<State>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector whose `n`th read (1-based) fails with a service error
    pub fn failing_on_read(n: usize) -> Self {
        Self {
            state: Arc::new(State {
                fail_on_read: Some(n),
                ..State::default()
            }),
        }
    }

    /// Pre-populate an item (useful for testing)
    pub fn seed(&self, key: impl Into<String>, item: Map<String, Value>) {
        self.state.items.write().insert(key.into(), item);
    }

    /// Every read issued so far, in order
    pub fn reads(&self) -> Vec<RecordedRead> {
        self.state.reads.read().clone()
    }

    pub fn read_count(&self) -> usize {
        self.state.reads.read().len()
    }

    /// Every client connected so far, in order
    pub fn connections(&self) -> Vec<(ClientProfile, ProxyBypassList)> {
        self.state.connections.read().clone()
    }

    /// Readers handed out and not yet dropped
    pub fn open_clients(&self) -> usize {
        self.state.open_clients.load(Ordering::SeqCst)
    }
}

impl StoreConnector for InMemoryConnector {
    fn connect(
        &self,
        profile: ClientProfile,
        bypass: &ProxyBypassList,
    ) -> Result<Arc<dyn ItemReader>> {
        self.state
            .connections
            .write()
            .push((profile, bypass.clone()));
        self.state.open_clients.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(InMemoryReader {
            profile,
            bypass: bypass.clone(),
            state: self.state.clone(),
        }))
    }
}

struct InMemoryReader {
    profile: ClientProfile,
    bypass: ProxyBypassList,
    state: Arc<State>,
}

impl Drop for InMemoryReader {
    fn drop(&mut self) {
        self.state.open_clients.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ItemReader for InMemoryReader {
    async fn get_item(&self, request: GetItemRequest) -> Result<GetItemOutput> {
        let key = request.partition_key().unwrap_or_default().to_string();
        let count = {
            let mut reads = self.state.reads.write();
            reads.push(RecordedRead {
                profile: self.profile,
                bypass: self.bypass.clone(),
                table_name: request.table_name.clone(),
                key: key.clone(),
                consistent_read: request.consistent_read,
            });
            reads.len()
        };

        if self.state.fail_on_read == Some(count) {
            return Err(StoreError::service(
                500,
                "InternalServerError",
                format!("simulated failure on read {}", count),
            ));
        }

        Ok(GetItemOutput {
            item: self.state.items.read().get(&key).cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_records_reads_and_serves_seeded_items() {
        let connector = InMemoryConnector::new();
        let mut item = Map::new();
        item.insert("id".to_string(), json!({ "S": "known" }));
        connector.seed("known", item.clone());

        let reader = connector
            .connect(ClientProfile::KeepAlive, &ProxyBypassList::defaults())
            .unwrap();
        let found = reader
            .get_item(GetItemRequest::new("sessions", "known"))
            .await
            .unwrap();
        let missing = reader
            .get_item(GetItemRequest::new("sessions", "other"))
            .await
            .unwrap();

        assert_eq!(found.item, Some(item));
        assert!(!missing.found());
        assert_eq!(connector.read_count(), 2);
        let reads = connector.reads();
        assert_eq!(reads[0].key, "known");
        assert_eq!(reads[1].profile, ClientProfile::KeepAlive);
        assert_eq!(reads[1].bypass, ProxyBypassList::defaults());
    }

    #[tokio::test]
    async fn test_fails_on_requested_read() {
        let connector = InMemoryConnector::failing_on_read(2);
        let reader = connector
            .connect(ClientProfile::Plain, &ProxyBypassList::default())
            .unwrap();

        assert!(reader.get_item(GetItemRequest::new("t", "a")).await.is_ok());
        assert!(reader.get_item(GetItemRequest::new("t", "b")).await.is_err());
        assert!(reader.get_item(GetItemRequest::new("t", "c")).await.is_ok());
    }

    #[test]
    fn test_tracks_open_clients() {
        let connector = InMemoryConnector::new();
        let a = connector
            .connect(ClientProfile::Plain, &ProxyBypassList::default())
            .unwrap();
        let b = connector
            .connect(ClientProfile::KeepAlive, &ProxyBypassList::default())
            .unwrap();
        assert_eq!(connector.open_clients(), 2);
        drop(a);
        assert_eq!(connector.open_clients(), 1);
        drop(b);
        assert_eq!(connector.open_clients(), 0);
        assert_eq!(connector.connections().len(), 2);
    }
}
