use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Flashka kiosk.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::start_game,
        crate::routes::game::flip_card,
        crate::routes::game::get_board,
        crate::routes::game::get_device,
        crate::routes::sse::board_stream,
        crate::routes::adpack::get_adpack,
        crate::routes::admin::admin_page,
        crate::routes::admin::upload_images,
        crate::routes::admin::shuffle_images,
        crate::routes::admin::reset_device,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::BoardSnapshot,
            crate::dto::game::CardView,
            crate::dto::game::SessionStatus,
            crate::dto::game::GameResult,
            crate::dto::game::StartResponse,
            crate::dto::game::FlipRequest,
            crate::dto::game::FlipResponse,
            crate::dto::game::DeviceStatus,
            crate::dto::adpack::AdPackResponse,
            crate::dto::admin::ActionResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::CardFlippedEvent,
            crate::dto::sse::CardsMatchedEvent,
            crate::dto::sse::BoardLockedEvent,
            crate::dto::sse::CardsHiddenEvent,
            crate::dto::sse::DeviceLockedEvent,
            crate::state::deck::CardState,
            crate::state::state_machine::GameOutcome,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Kiosk game session"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "adpack", description = "Sponsor card art selection"),
        (name = "admin", description = "Kiosk staff operations"),
    )
)]
pub struct ApiDoc;
