pub mod admin;
pub mod health;
pub mod sessions;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/sessions", post(sessions::create_session))
        .route("/api/sessions/:id", get(sessions::get_session))
        .route("/api/sessions/:id/answer", post(sessions::submit_answer))
        .route("/api/sessions/:id/confirm", post(sessions::confirm_summary))
        .route("/api/sessions/:id/classify", post(sessions::classify))
        .route(
            "/api/sessions/:id/continue",
            post(sessions::continue_to_booking),
        )
        .route(
            "/api/sessions/:id/booking-details",
            post(sessions::submit_booking_details),
        )
        .route("/api/sessions/:id/slots", get(sessions::list_slots))
        .route("/api/sessions/:id/book", post(sessions::book))
        .route(
            "/api/admin/appointments",
            get(admin::list_appointments),
        )
        .route(
            "/api/admin/appointments/:id",
            get(admin::get_appointment),
        )
        .route(
            "/api/admin/appointments/:id/profile",
            post(admin::format_profile),
        )
        .route("/api/admin/catalog/reset", post(admin::reset_catalog))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
