use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    response::Html,
    routing::{get, post},
};
use tokio::fs;
use tracing::{info, warn};

use crate::{
    dto::admin::ActionResponse,
    error::{AppError, ServiceError},
    services::{
        game_service,
        media_service::{self, Upload},
    },
    state::SharedState,
};

/// Largest upload request accepted: ten slot images plus the logo.
const UPLOAD_BODY_LIMIT: usize = 32 * 1024 * 1024;
const ADMIN_PAGE: &str = "admin.html";

/// Kiosk staff endpoints: card images and the device lock.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin", get(admin_page))
        .route(
            "/upload-images",
            post(upload_images).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/shuffle-images", post(shuffle_images))
        .route("/admin/device/reset", post(reset_device))
}

/// Serve the staff page from the public directory.
#[utoipa::path(
    get,
    path = "/admin",
    tag = "admin",
    responses(
        (status = 200, description = "Admin page", content_type = "text/html", body = String),
        (status = 404, description = "Admin page not found")
    )
)]
pub async fn admin_page(State(state): State<SharedState>) -> Result<Html<String>, AppError> {
    let path = state.config().public_dir.join(ADMIN_PAGE);
    info!(path = %path.display(), "serving admin page");
    match fs::read_to_string(&path).await {
        Ok(page) => Ok(Html(page)),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot access admin page");
            Err(AppError::NotFound("Admin page not found".into()))
        }
    }
}

/// Store replacement card images in the public directory.
#[utoipa::path(
    post,
    path = "/upload-images",
    tag = "admin",
    request_body(content_type = "multipart/form-data", description = "PNG files named image_N.png or flashka.png"),
    responses(
        (status = 200, description = "Images stored", body = ActionResponse),
        (status = 400, description = "No file or a file outside the allowed names")
    )
)]
pub async fn upload_images(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<ActionResponse>, AppError> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(err.body_text()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(err.body_text()))?;
        uploads.push(Upload {
            file_name,
            content_type,
            bytes,
        });
    }

    let stored = media_service::store_uploads(&state.config().public_dir, uploads)
        .await
        .map_err(ServiceError::from)?;
    info!(stored, "images uploaded");
    Ok(Json(ActionResponse::new("Images uploaded successfully!")))
}

/// Randomly reassign the slot images `image_1.png..image_N.png`.
#[utoipa::path(
    post,
    path = "/shuffle-images",
    tag = "admin",
    responses(
        (status = 200, description = "Slots shuffled", body = ActionResponse),
        (status = 500, description = "Failed to shuffle image positions")
    )
)]
pub async fn shuffle_images(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    let config = state.config();
    media_service::shuffle_slots(&config.public_dir, config.shuffle_image_count)
        .await
        .map_err(|err| {
            warn!(error = %err, "error shuffling images");
            ServiceError::from(err)
        })?;
    Ok(Json(ActionResponse::new("Image positions shuffled successfully!")))
}

/// Clear the one-time lock flag so the device can play again.
#[utoipa::path(
    post,
    path = "/admin/device/reset",
    tag = "admin",
    responses(
        (status = 200, description = "Lock cleared", body = ActionResponse),
        (status = 503, description = "Device storage unavailable")
    )
)]
pub async fn reset_device(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    game_service::reset_device_lock(&state).await?;
    Ok(Json(ActionResponse::new("Device lock cleared.")))
}
