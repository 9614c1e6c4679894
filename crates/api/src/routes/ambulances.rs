//! Ambulance routes for fleet management.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{middleware::AuthUser, AppState};
use siren_core::workflow::Role;
use siren_db::entities::ambulances;
use siren_db::repositories::{
    ambulance::UpdateAmbulanceInput, AmbulanceRepository, AssignmentRepository,
};

use super::{db_error_response, forbidden_response};

/// Creates the ambulance routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ambulances", get(list_ambulances).post(create_ambulance))
        .route("/ambulances/{id}", get(get_ambulance).patch(update_ambulance))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing ambulances.
#[derive(Debug, Deserialize)]
pub struct ListAmbulancesQuery {
    /// Filter by region.
    pub region_id: Option<Uuid>,
}

/// Request body for creating an ambulance.
#[derive(Debug, Deserialize)]
pub struct CreateAmbulanceRequest {
    /// Fleet code, unique.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Region the ambulance operates in.
    pub region_id: Uuid,
    /// Operators to assign.
    #[serde(default)]
    pub operator_ids: Vec<Uuid>,
}

/// Request body for updating an ambulance.
#[derive(Debug, Deserialize)]
pub struct UpdateAmbulanceRequest {
    /// New display name.
    pub name: Option<String>,
    /// Move to a different region; existing bills keep their snapshot.
    pub region_id: Option<Uuid>,
    /// Activate or deactivate.
    pub is_active: Option<bool>,
    /// Replace the assigned operator set.
    pub operator_ids: Option<Vec<Uuid>>,
}

/// Response for an ambulance.
#[derive(Debug, Serialize)]
pub struct AmbulanceResponse {
    /// Ambulance ID.
    pub id: Uuid,
    /// Fleet code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Region.
    pub region_id: Uuid,
    /// Whether the ambulance is active.
    pub is_active: bool,
    /// Created at timestamp.
    pub created_at: String,
}

impl From<ambulances::Model> for AmbulanceResponse {
    fn from(m: ambulances::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            name: m.name,
            region_id: m.region_id,
            is_active: m.is_active,
            created_at: m.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/ambulances` - List ambulances; operators see only their own.
async fn list_ambulances(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListAmbulancesQuery>,
) -> Response {
    if auth.role() == Role::Operator {
        let assignments = AssignmentRepository::new((*state.db).clone());
        return match assignments.list_assigned_ambulances(auth.user_id()).await {
            Ok(list) => {
                let items: Vec<AmbulanceResponse> = list.into_iter().map(Into::into).collect();
                (StatusCode::OK, Json(json!({ "ambulances": items }))).into_response()
            }
            Err(e) => db_error_response(&e),
        };
    }

    let repo = AmbulanceRepository::new((*state.db).clone());
    match repo.list(query.region_id).await {
        Ok(list) => {
            let items: Vec<AmbulanceResponse> = list.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "ambulances": items }))).into_response()
        }
        Err(e) => db_error_response(&e),
    }
}

/// POST `/ambulances` - Create an ambulance (ADMIN).
async fn create_ambulance(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateAmbulanceRequest>,
) -> Response {
    if auth.role() != Role::Admin {
        return forbidden_response();
    }
    if payload.code.trim().len() < 2 || payload.name.trim().len() < 2 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "VALIDATION_ERROR",
                "message": "code and name must be at least 2 characters"
            })),
        )
            .into_response();
    }

    let repo = AmbulanceRepository::new((*state.db).clone());
    let ambulance = match repo
        .create(
            &payload.code,
            &payload.name,
            payload.region_id,
            &payload.operator_ids,
        )
        .await
    {
        Ok(ambulance) => ambulance,
        Err(e) => return db_error_response(&e),
    };

    info!(ambulance_id = %ambulance.id, code = %ambulance.code, "ambulance created");
    (
        StatusCode::CREATED,
        Json(json!({ "ambulance": AmbulanceResponse::from(ambulance) })),
    )
        .into_response()
}

/// GET `/ambulances/{id}` - Ambulance detail with assigned operators.
async fn get_ambulance(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = AmbulanceRepository::new((*state.db).clone());
    let ambulance = match repo.find_by_id(id).await {
        Ok(Some(ambulance)) => ambulance,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "NOT_FOUND",
                    "message": "Ambulance not found"
                })),
            )
                .into_response();
        }
        Err(e) => return db_error_response(&e),
    };

    let assignments = AssignmentRepository::new((*state.db).clone());
    match assignments.list_operators(id).await {
        Ok(operators) => {
            let operator_ids: Vec<Uuid> = operators.iter().map(|u| u.id).collect();
            (
                StatusCode::OK,
                Json(json!({
                    "ambulance": AmbulanceResponse::from(ambulance),
                    "operator_ids": operator_ids
                })),
            )
                .into_response()
        }
        Err(e) => db_error_response(&e),
    }
}

/// PATCH `/ambulances/{id}` - Update an ambulance (ADMIN).
async fn update_ambulance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAmbulanceRequest>,
) -> Response {
    if auth.role() != Role::Admin {
        return forbidden_response();
    }

    let repo = AmbulanceRepository::new((*state.db).clone());
    let updated = match repo
        .update(
            id,
            UpdateAmbulanceInput {
                name: payload.name,
                region_id: payload.region_id,
                is_active: payload.is_active,
                operator_ids: payload.operator_ids,
            },
        )
        .await
    {
        Ok(Some(ambulance)) => ambulance,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "NOT_FOUND",
                    "message": "Ambulance not found"
                })),
            )
                .into_response();
        }
        Err(e) => return db_error_response(&e),
    };

    info!(ambulance_id = %id, "ambulance updated");
    (
        StatusCode::OK,
        Json(json!({ "ambulance": AmbulanceResponse::from(updated) })),
    )
        .into_response()
}
