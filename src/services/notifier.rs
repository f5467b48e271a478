//! Outbound tracking calls fired when a board is dealt or won.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::NotificationTargets;

/// Which moment of the game is being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A board was dealt.
    Play,
    /// The player cleared the board.
    Win,
}

/// JSON body posted to the tracking endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Which moment is reported.
    pub kind: NotificationKind,
    /// Session the call refers to.
    pub session_id: Uuid,
    /// Attempts used so far.
    pub attempts: u32,
    /// Pairs found so far.
    pub matched_pairs: u8,
    /// RFC 3339 timestamp.
    pub sent_at: String,
}

impl Notification {
    /// Stamp a notification with the current time.
    pub fn new(kind: NotificationKind, session_id: Uuid, attempts: u32, matched_pairs: u8) -> Self {
        Self {
            kind,
            session_id,
            attempts,
            matched_pairs,
            sent_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_else(|_| "invalid-timestamp".into()),
        }
    }
}

/// Failures of a single tracking call. They are logged and never retried.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The HTTP client could not be configured.
    #[error("failed to build tracking client")]
    ClientBuilder {
        /// Builder failure.
        #[source]
        source: reqwest::Error,
    },
    /// The request never got an answer.
    #[error("failed to send tracking call to `{url}`")]
    Send {
        /// Target endpoint.
        url: String,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The endpoint answered with a non-success status.
    #[error("tracking endpoint `{url}` answered {status}")]
    Status {
        /// Target endpoint.
        url: String,
        /// Status received.
        status: StatusCode,
    },
}

/// Destination of the fire-and-forget tracking calls.
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification.
    fn notify(&self, notification: Notification) -> BoxFuture<'static, Result<(), NotifyError>>;
}

/// Posts notifications as JSON to the configured endpoints. Kinds without an endpoint
/// are skipped.
#[derive(Clone)]
pub struct HttpNotifier {
    client: Client,
    targets: Arc<NotificationTargets>,
}

impl HttpNotifier {
    /// Build the HTTP client for the given endpoints.
    pub fn new(targets: NotificationTargets) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|source| NotifyError::ClientBuilder { source })?;
        Ok(Self {
            client,
            targets: Arc::new(targets),
        })
    }

    fn url_for(&self, kind: NotificationKind) -> Option<&str> {
        match kind {
            NotificationKind::Play => self.targets.start_url.as_deref(),
            NotificationKind::Win => self.targets.win_url.as_deref(),
        }
    }
}

impl NotificationSink for HttpNotifier {
    fn notify(&self, notification: Notification) -> BoxFuture<'static, Result<(), NotifyError>> {
        let Some(url) = self.url_for(notification.kind).map(str::to_string) else {
            debug!(kind = ?notification.kind, "no tracking endpoint configured");
            return async { Ok(()) }.boxed();
        };
        let client = self.client.clone();

        async move {
            let response = client
                .post(&url)
                .json(&notification)
                .send()
                .await
                .map_err(|source| NotifyError::Send {
                    url: url.clone(),
                    source,
                })?;

            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(NotifyError::Status { url, status })
            }
        }
        .boxed()
    }
}

/// Fire a notification in the background. The outcome is only logged.
pub fn dispatch(sink: Arc<dyn NotificationSink>, notification: Notification) {
    tokio::spawn(async move {
        let kind = notification.kind;
        let session_id = notification.session_id;
        match sink.notify(notification).await {
            Ok(()) => info!(?kind, %session_id, "tracking call delivered"),
            Err(err) => warn!(?kind, %session_id, error = %err, "tracking call failed"),
        }
    });
}
