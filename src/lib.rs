pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/availability", post(handlers::availability::check))
        .route(
            "/api/availability/free-intervals",
            get(handlers::availability::free_intervals),
        )
        .route("/api/weekday", get(handlers::availability::resolve_weekday))
        .route("/api/rooms", get(handlers::catalog::list_rooms))
        .route("/api/staff", get(handlers::catalog::list_staff))
        .route(
            "/api/staff/:id/active",
            post(handlers::catalog::set_staff_active),
        )
        .route("/api/services", get(handlers::catalog::list_services))
        .route(
            "/api/appointments",
            get(handlers::appointments::list).post(handlers::appointments::create),
        )
        .route("/api/appointments/:id", get(handlers::appointments::get_one))
        .route(
            "/api/appointments/:id/cancel",
            post(handlers::appointments::cancel),
        )
        .route(
            "/api/appointments/:id/reschedule",
            post(handlers::appointments::reschedule),
        )
        .route("/calendar/:id", get(handlers::calendar::download_ics))
        .with_state(state)
}
