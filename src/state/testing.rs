//! Fakes shared by the unit tests of the service and route layers.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::future::{BoxFuture, FutureExt};
use reqwest::StatusCode;

use crate::{
    config::{AppConfig, GameVariant, VariantPreset},
    dao::{
        device_store::{DeviceStore, memory::MemoryDeviceStore},
        storage::{StorageError, StorageResult},
    },
    services::notifier::{Notification, NotificationSink, NotifyError},
    state::{AppState, SharedState},
};

/// Captures every notification instead of sending it.
#[derive(Clone, Default)]
pub(crate) struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub(crate) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, notification: Notification) -> BoxFuture<'static, Result<(), NotifyError>> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification);
        }
        async { Ok(()) }.boxed()
    }
}

/// Tracking endpoint that always answers 500.
pub(crate) struct FailingNotifier;

impl NotificationSink for FailingNotifier {
    fn notify(&self, _notification: Notification) -> BoxFuture<'static, Result<(), NotifyError>> {
        async {
            Err(NotifyError::Status {
                url: "http://tracking.invalid/".into(),
                status: StatusCode::INTERNAL_SERVER_ERROR,
            })
        }
        .boxed()
    }
}

/// Device store whose backing medium is gone.
pub(crate) struct FailingStore;

impl FailingStore {
    fn failure<T: Send + 'static>() -> BoxFuture<'static, StorageResult<T>> {
        async {
            Err(StorageError::unavailable(
                "device storage offline".into(),
                std::io::Error::other("disk removed"),
            ))
        }
        .boxed()
    }
}

impl DeviceStore for FailingStore {
    fn get(&self, _key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        Self::failure()
    }

    fn set(&self, _key: &str, _value: String) -> BoxFuture<'static, StorageResult<()>> {
        Self::failure()
    }

    fn remove(&self, _key: &str) -> BoxFuture<'static, StorageResult<()>> {
        Self::failure()
    }
}

/// In-memory store whose writes take `delay` to land.
pub(crate) struct SlowStore {
    inner: MemoryDeviceStore,
    delay: Duration,
}

impl SlowStore {
    pub(crate) fn new(inner: MemoryDeviceStore, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl DeviceStore for SlowStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        let key = key.to_string();
        let delay = self.delay;
        async move {
            tokio::time::sleep(delay).await;
            inner.set(&key, value).await
        }
        .boxed()
    }

    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.remove(key)
    }
}

/// Default configuration running the given preset.
pub(crate) fn config_for(preset: VariantPreset) -> AppConfig {
    AppConfig {
        variant: GameVariant::preset(preset),
        ..AppConfig::default()
    }
}

/// State backed by an in-memory store and a recording notifier.
pub(crate) fn memory_state(
    config: AppConfig,
) -> (SharedState, MemoryDeviceStore, RecordingNotifier) {
    let store = MemoryDeviceStore::default();
    let notifier = RecordingNotifier::default();
    let state = AppState::new(config, Arc::new(store.clone()), Arc::new(notifier.clone()));
    (state, store, notifier)
}

/// Let spawned background tasks (tracking calls) run to completion.
pub(crate) async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
