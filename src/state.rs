use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use bytes::Bytes;
use tokio::sync::{Mutex, broadcast};

use crate::{
    blocking::ClientId, key_value_store::KeyValueStore, pubsub::PubSubHub, server::ServerConfig,
};

/// Everything connections share. Cloning is cheap.
///
/// Lock order is store first, then pub/sub hub.
#[derive(Debug, Clone)]
pub struct ServerContext {
    pub store: Arc<Mutex<KeyValueStore>>,
    pub pub_sub: Arc<Mutex<PubSubHub>>,
    pub config: Arc<ServerConfig>,
    next_client_id: Arc<AtomicU64>,
}

impl ServerContext {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(KeyValueStore::new())),
            pub_sub: Arc::new(Mutex::new(PubSubHub::new())),
            config: Arc::new(config),
            next_client_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn next_client_id(&self) -> ClientId {
        self.next_client_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Feed of every successful write command, name first, for a replication
    /// or persistence consumer.
    pub async fn subscribe_mutations(&self) -> broadcast::Receiver<Vec<Bytes>> {
        self.store.lock().await.subscribe_mutations()
    }
}
