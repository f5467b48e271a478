use axum::{
    Json, Router,
    extract::Query,
    routing::get,
};

use crate::{
    dto::adpack::{AdPackQuery, AdPackResponse},
    services::adpack_service,
    state::SharedState,
};

/// Sponsor art selection for the kiosk page.
pub fn router() -> Router<SharedState> {
    Router::new().route("/adpack", get(get_adpack))
}

/// Resolve the card art pack for today, honouring `?ad=` and `?pack=` overrides.
#[utoipa::path(
    get,
    path = "/adpack",
    tag = "adpack",
    params(AdPackQuery),
    responses(
        (status = 200, description = "Asset URLs of the selected pack", body = AdPackResponse)
    )
)]
pub async fn get_adpack(Query(query): Query<AdPackQuery>) -> Json<AdPackResponse> {
    Json(adpack_service::current_pack(&query))
}
