//! Region routes.

use axum::{
    extract::State,
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
use siren_db::entities::regions;
use siren_db::repositories::RegionRepository;

use super::{db_error_response, forbidden_response};

/// Creates the region routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/regions", get(list_regions).post(create_region))
}

/// Request body for creating a region.
#[derive(Debug, Deserialize)]
pub struct CreateRegionRequest {
    /// Region name, unique.
    pub name: String,
    /// City the region belongs to.
    pub city: String,
    /// State the region belongs to.
    pub state: String,
}

/// Response for a region.
#[derive(Debug, Serialize)]
pub struct RegionResponse {
    /// Region ID.
    pub id: Uuid,
    /// Region name.
    pub name: String,
    /// City.
    pub city: String,
    /// State.
    pub state: String,
}

impl From<regions::Model> for RegionResponse {
    fn from(m: regions::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            city: m.city,
            state: m.state,
        }
    }
}

/// GET `/regions` - List all regions.
async fn list_regions(State(state): State<AppState>, _auth: AuthUser) -> Response {
    let repo = RegionRepository::new((*state.db).clone());
    match repo.list().await {
        Ok(list) => {
            let items: Vec<RegionResponse> = list.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "regions": items }))).into_response()
        }
        Err(e) => db_error_response(&e),
    }
}

/// POST `/regions` - Create a region (ADMIN).
async fn create_region(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateRegionRequest>,
) -> Response {
    if auth.role() != Role::Admin {
        return forbidden_response();
    }
    for (field, value) in [
        ("name", &payload.name),
        ("city", &payload.city),
        ("state", &payload.state),
    ] {
        if value.trim().len() < 2 {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "VALIDATION_ERROR",
                    "message": format!("{field} must be at least 2 characters")
                })),
            )
                .into_response();
        }
    }

    let repo = RegionRepository::new((*state.db).clone());
    match repo
        .create(&payload.name, &payload.city, &payload.state)
        .await
    {
        Ok(region) => {
            info!(region_id = %region.id, name = %region.name, "region created");
            (
                StatusCode::CREATED,
                Json(json!({ "region": RegionResponse::from(region) })),
            )
                .into_response()
        }
        Err(e) => db_error_response(&e),
    }
}
