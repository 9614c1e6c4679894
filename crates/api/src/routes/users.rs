//! User management routes (ADMIN) and per-user activity.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{middleware::AuthUser, AppState};
use siren_core::auth::hash_password;
use siren_core::workflow::{self, Role};
use siren_db::entities::users;
use siren_db::repositories::{AuditRepository, UpdateUserInput, UserRepository};

use super::{db_error_response, forbidden_response};

use crate::routes::bills::HistoryEntry;

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", axum::routing::patch(update_user))
        .route("/users/{id}/activity", get(user_activity))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Login email, unique.
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Display name.
    pub full_name: String,
    /// Workflow role (wire form).
    pub role: String,
    /// Regions the user is scoped to (reviewers and accounts).
    #[serde(default)]
    pub region_ids: Vec<Uuid>,
}

/// Request body for updating a user.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    /// Activate or deactivate the account.
    pub is_active: Option<bool>,
    /// Replace the region scope.
    pub region_ids: Option<Vec<Uuid>>,
}

/// Query parameters for the activity feed.
#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    /// Maximum entries to return (default 50).
    pub limit: Option<u64>,
}

/// Response for a user; never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Email.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Role (wire form).
    pub role: String,
    /// Whether the account is active.
    pub is_active: bool,
    /// Created at timestamp.
    pub created_at: String,
}

impl From<users::Model> for UserResponse {
    fn from(m: users::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            full_name: m.full_name,
            role: workflow::Role::from(&m.role).to_string(),
            is_active: m.is_active,
            created_at: m.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/users` - List all users (ADMIN).
async fn list_users(State(state): State<AppState>, auth: AuthUser) -> Response {
    if auth.role() != Role::Admin {
        return forbidden_response();
    }

    let repo = UserRepository::new((*state.db).clone());
    match repo.list().await {
        Ok(list) => {
            let items: Vec<UserResponse> = list.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "users": items }))).into_response()
        }
        Err(e) => db_error_response(&e),
    }
}

/// POST `/users` - Create a user (ADMIN).
async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> Response {
    if auth.role() != Role::Admin {
        return forbidden_response();
    }

    let Some(role) = Role::parse(&payload.role) else {
        return validation_response("unknown role");
    };
    if payload.password.len() < 8 {
        return validation_response("password must be at least 8 characters");
    }
    if !payload.email.contains('@') {
        return validation_response("email is not valid");
    }

    let repo = UserRepository::new((*state.db).clone());
    match repo.email_exists(&payload.email).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "CONFLICT",
                    "message": "Email is already registered"
                })),
            )
                .into_response();
        }
        Ok(false) => {}
        Err(e) => return db_error_response(&e),
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "password hashing failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "INTERNAL_ERROR",
                    "message": "An internal error occurred"
                })),
            )
                .into_response();
        }
    };

    let user = match repo
        .create(
            &payload.email,
            &password_hash,
            &payload.full_name,
            role,
            &payload.region_ids,
        )
        .await
    {
        Ok(user) => user,
        Err(e) => return db_error_response(&e),
    };

    info!(user_id = %user.id, role = %role, "user created");
    (
        StatusCode::CREATED,
        Json(json!({ "user": UserResponse::from(user) })),
    )
        .into_response()
}

/// PATCH `/users/{id}` - Activate/deactivate or rescope a user (ADMIN).
async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Response {
    if auth.role() != Role::Admin {
        return forbidden_response();
    }

    let repo = UserRepository::new((*state.db).clone());
    match repo
        .update(
            id,
            UpdateUserInput {
                is_active: payload.is_active,
                region_ids: payload.region_ids,
            },
        )
        .await
    {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(json!({ "user": UserResponse::from(user) })),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "NOT_FOUND",
                "message": "User not found"
            })),
        )
            .into_response(),
        Err(e) => db_error_response(&e),
    }
}

/// GET `/users/{id}/activity` - Audit entries by this user, newest first.
///
/// Admins can view anyone; other roles only themselves.
async fn user_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ActivityQuery>,
) -> Response {
    if auth.role() != Role::Admin && auth.user_id() != id {
        return forbidden_response();
    }

    let limit = query.limit.unwrap_or(50).min(200);
    let audit = AuditRepository::new((*state.db).clone());
    match audit.list_for_actor(id, limit).await {
        Ok(logs) => {
            let entries: Vec<HistoryEntry> = logs.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "activity": entries }))).into_response()
        }
        Err(e) => db_error_response(&e),
    }
}

fn validation_response(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "VALIDATION_ERROR",
            "message": message
        })),
    )
        .into_response()
}
