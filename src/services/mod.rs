/// Sponsor card art selection.
pub mod adpack_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Kiosk game controller: sessions, flips and termination side effects.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Card image upload and shuffling.
pub mod media_service;
/// Outbound tracking calls.
pub mod notifier;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
