use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Optional overrides for the day-of-week ad rotation.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdPackQuery {
    /// Pack number `1` to `7`, e.g. `?ad=5` selects `/ad5`.
    pub ad: Option<String>,
    /// `adN` (any case) or a custom folder such as `ads/remy`.
    pub pack: Option<String>,
}

/// Asset URLs the kiosk page binds to its card faces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AdPackResponse {
    /// Folder the assets are served from, e.g. `/ad3`.
    pub base: String,
    /// Card back / logo image.
    pub front: String,
    /// Face images in face order: index 0 is face 1.
    pub images: Vec<String>,
}
