pub mod health;

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::pipeline::handlers;
use crate::state::AppState;

/// Success envelope: `{"status": "success", "content": ...}` with 200.
/// Errors use the matching `{"status": "error", ...}` shape from `AppError`.
#[derive(Debug)]
pub struct Success<T>(pub T);

#[derive(Serialize)]
struct Envelope<T> {
    status: &'static str,
    content: T,
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        Json(Envelope {
            status: "success",
            content: self.0,
        })
        .into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Report cards & links
        .route(
            "/generate/get-report-card",
            get(handlers::handle_get_report_card),
        )
        .route("/generate/get-sc", get(handlers::handle_get_sc))
        .route(
            "/generate/get-employee-url",
            get(handlers::handle_get_employee_url),
        )
        .route(
            "/generate/links-by-branch",
            get(handlers::handle_links_by_branch),
        )
        // Notification mail
        .route("/send/send-email", post(handlers::handle_send_email))
        .route("/send/test-email", post(handlers::handle_test_email))
        .with_state(state)
}
