use axum::Router;
use tower_http::services::ServeDir;

use crate::state::SharedState;

/// Kiosk staff endpoints.
pub mod admin;
/// Sponsor art selection.
pub mod adpack;
/// Swagger UI.
pub mod docs;
/// Game session endpoints.
pub mod game;
/// Health check.
pub mod health;
/// Renderer event stream.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
///
/// Anything no route claims is served from the public directory.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(game::router())
        .merge(adpack::router())
        .merge(admin::router());

    let docs_router = docs::router(state.clone());
    let public = ServeDir::new(&state.config().public_dir);

    api_router
        .merge(docs_router)
        .fallback_service(public)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::{config::AppConfig, state::testing::memory_state};

    #[tokio::test]
    async fn unclaimed_paths_fall_back_to_public_files() {
        let dir = std::env::temp_dir().join(format!("flashka-static-{}", Uuid::new_v4().simple()));
        std::fs::create_dir_all(dir.join("ad3")).unwrap();
        std::fs::write(dir.join("ad3").join("logo.png"), b"logo").unwrap();
        let (state, _store, _notifier) = memory_state(AppConfig {
            public_dir: dir.clone(),
            ..AppConfig::default()
        });
        let app = router(state);

        let response = app
            .clone()
            .oneshot(Request::get("/ad3/logo.png").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"logo");

        let response = app
            .oneshot(Request::get("/ad3/missing.png").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let (state, _store, _notifier) = memory_state(AppConfig::default());
        let response = router(state)
            .oneshot(Request::get("/healthcheck").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
    }
}
