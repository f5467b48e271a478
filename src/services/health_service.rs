use tracing::warn;

use crate::{
    dao::device_store::PLAY_COUNT_KEY, dto::health::HealthResponse, state::SharedState,
};

/// Report `ok` while the device store answers reads, `degraded` otherwise.
///
/// The game keeps running without storage, so a failing store never turns into an
/// error status.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.device_store().get(PLAY_COUNT_KEY).await {
        Ok(_) => HealthResponse::ok(),
        Err(err) => {
            warn!(error = %err, "device storage health check failed (degraded mode)");
            HealthResponse::degraded()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        state::{
            AppState,
            testing::{FailingStore, RecordingNotifier, memory_state},
        },
    };

    #[tokio::test]
    async fn healthy_store_reports_ok() {
        let (state, _store, _notifier) = memory_state(AppConfig::default());
        assert_eq!(health_status(&state).await.status, "ok");
    }

    #[tokio::test]
    async fn failing_store_reports_degraded() {
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(FailingStore),
            Arc::new(RecordingNotifier::default()),
        );
        assert_eq!(health_status(&state).await.status, "degraded");
    }
}
