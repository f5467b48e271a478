use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};

use crate::dao::{device_store::DeviceStore, storage::StorageResult};

/// Process-lifetime store, used for tests and for kiosks running without a data directory.
#[derive(Clone, Default)]
pub struct MemoryDeviceStore {
    entries: Arc<DashMap<String, String>>,
}

impl DeviceStore for MemoryDeviceStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let value = self.entries.get(key).map(|entry| entry.value().clone());
        async move { Ok(value) }.boxed()
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        self.entries.insert(key.to_string(), value);
        async { Ok(()) }.boxed()
    }

    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        self.entries.remove(key);
        async { Ok(()) }.boxed()
    }
}
