/// Cards and deck construction.
pub mod deck;
mod sse;
/// Turn and attempt accounting for one session.
pub mod state_machine;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    config::AppConfig, dao::device_store::DeviceStore, services::notifier::NotificationSink,
};

pub use self::sse::SseHub;
use self::state_machine::Session;

/// Handle to the application state shared by handlers and background tasks.
pub type SharedState = Arc<AppState>;

/// Capacity of the renderer event channel. A full board deal plus a burst of flips fits.
const BOARD_EVENTS_CAPACITY: usize = 64;

/// Central application state: the kiosk's single game session and its collaborators.
pub struct AppState {
    config: AppConfig,
    device_store: Arc<dyn DeviceStore>,
    notifier: Arc<dyn NotificationSink>,
    board_events: SseHub,
    session: RwLock<Option<Session>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// No session exists until the kiosk page asks for one.
    pub fn new(
        config: AppConfig,
        device_store: Arc<dyn DeviceStore>,
        notifier: Arc<dyn NotificationSink>,
    ) -> SharedState {
        Arc::new(Self {
            config,
            device_store,
            notifier,
            board_events: SseHub::new(BOARD_EVENTS_CAPACITY),
            session: RwLock::new(None),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Device-local key-value store.
    pub fn device_store(&self) -> &dyn DeviceStore {
        self.device_store.as_ref()
    }

    /// Tracking sink, cloned so it can be moved into background tasks.
    pub fn notifier(&self) -> Arc<dyn NotificationSink> {
        self.notifier.clone()
    }

    /// Broadcast hub the renderer subscribes to.
    pub fn board_events(&self) -> &SseHub {
        &self.board_events
    }

    /// Slot holding the current session, if one was started.
    pub fn session(&self) -> &RwLock<Option<Session>> {
        &self.session
    }

    /// Run `f` against the current session.
    pub async fn read_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(Option<&Session>) -> R,
    {
        let guard = self.session.read().await;
        f(guard.as_ref())
    }
}
