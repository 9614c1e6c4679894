//! API route definitions.

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;
use tracing::error;

use crate::{middleware::auth::auth_middleware, AppState};
use siren_core::workflow::WorkflowError;

pub mod ambulances;
pub mod bills;
pub mod health;
pub mod regions;
pub mod users;

/// Creates the API router: public health plus authenticated routes.
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(bills::routes())
        .merge(ambulances::routes())
        .merge(regions::routes())
        .merge(users::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

/// Renders a workflow error with its mapped status code.
pub(crate) fn workflow_error_response(err: &WorkflowError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(error = %err, "workflow operation failed");
    }
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string()
        })),
    )
        .into_response()
}

/// Renders a database error as an opaque 500.
pub(crate) fn db_error_response(err: &sea_orm::DbErr) -> Response {
    error!(error = %err, "database operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "DATABASE_ERROR",
            "message": "An internal error occurred"
        })),
    )
        .into_response()
}

/// Renders the standard admin-only rejection.
pub(crate) fn forbidden_response() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "error": "FORBIDDEN",
            "message": "This operation requires the ADMIN role"
        })),
    )
        .into_response()
}
