/// JSON file backend.
pub mod file;
/// In-process backend.
pub mod memory;

use futures::future::BoxFuture;
use tracing::warn;

use crate::dao::storage::{StorageError, StorageResult};

/// Key holding the string-encoded play counter.
pub const PLAY_COUNT_KEY: &str = "flashka.plays";
/// Key holding the one-time lock flag.
pub const LOCK_FLAG_KEY: &str = "flashka.locked";
const LOCK_FLAG_SET: &str = "1";

/// Device-local key-value persistence, the kiosk's equivalent of browser local storage.
pub trait DeviceStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete `key`; missing keys are not an error.
    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>>;
}

/// Read the play counter; a missing key counts as zero.
pub async fn play_count(store: &dyn DeviceStore) -> StorageResult<u64> {
    match store.get(PLAY_COUNT_KEY).await? {
        None => Ok(0),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| StorageError::Corrupt {
                key: PLAY_COUNT_KEY.into(),
                value,
            }),
    }
}

/// Bump the play counter and return the new value. A corrupt counter restarts at zero.
pub async fn increment_play_count(store: &dyn DeviceStore) -> StorageResult<u64> {
    let current = match play_count(store).await {
        Ok(count) => count,
        Err(err @ StorageError::Corrupt { .. }) => {
            warn!(error = %err, "resetting corrupt play counter");
            0
        }
        Err(err) => return Err(err),
    };
    let next = current.saturating_add(1);
    store.set(PLAY_COUNT_KEY, next.to_string()).await?;
    Ok(next)
}

/// Whether this device already used its one play.
pub async fn is_locked(store: &dyn DeviceStore) -> StorageResult<bool> {
    Ok(store.get(LOCK_FLAG_KEY).await?.as_deref() == Some(LOCK_FLAG_SET))
}

/// Persist the lock flag.
pub async fn set_locked(store: &dyn DeviceStore) -> StorageResult<()> {
    store.set(LOCK_FLAG_KEY, LOCK_FLAG_SET.into()).await
}

/// Clear the lock flag so the device can play again.
pub async fn clear_lock(store: &dyn DeviceStore) -> StorageResult<()> {
    store.remove(LOCK_FLAG_KEY).await
}

#[cfg(test)]
mod tests {
    use super::{memory::MemoryDeviceStore, *};

    #[tokio::test]
    async fn play_counter_starts_at_zero_and_increments() {
        let store = MemoryDeviceStore::default();
        assert_eq!(play_count(&store).await.unwrap(), 0);
        assert_eq!(increment_play_count(&store).await.unwrap(), 1);
        assert_eq!(increment_play_count(&store).await.unwrap(), 2);
        assert_eq!(
            store.get(PLAY_COUNT_KEY).await.unwrap().as_deref(),
            Some("2")
        );
    }

    #[tokio::test]
    async fn corrupt_counter_is_reported_then_reset() {
        let store = MemoryDeviceStore::default();
        store.set(PLAY_COUNT_KEY, "many".into()).await.unwrap();
        assert!(matches!(
            play_count(&store).await,
            Err(StorageError::Corrupt { .. })
        ));
        assert_eq!(increment_play_count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn lock_flag_round_trip() {
        let store = MemoryDeviceStore::default();
        assert!(!is_locked(&store).await.unwrap());
        set_locked(&store).await.unwrap();
        assert!(is_locked(&store).await.unwrap());
        assert_eq!(store.get(LOCK_FLAG_KEY).await.unwrap().as_deref(), Some("1"));
        clear_lock(&store).await.unwrap();
        assert!(!is_locked(&store).await.unwrap());
    }

    #[tokio::test]
    async fn only_the_exact_flag_value_locks() {
        let store = MemoryDeviceStore::default();
        store.set(LOCK_FLAG_KEY, "0".into()).await.unwrap();
        assert!(!is_locked(&store).await.unwrap());
    }
}
