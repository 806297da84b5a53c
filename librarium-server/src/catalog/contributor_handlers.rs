//! Contributor endpoints.

use axum::http::StatusCode;
use axum::{
    Json,
    extract::{Path, State},
};
use librarium_core::api_types::ApiResponse;
use librarium_core::catalog::Contributor;
use librarium_core::database::ContributorsRepository;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::infra::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateContributorRequest {
    pub full_name: String,
}

pub async fn list_contributors(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Contributor>>>> {
    let contributors = state.db.contributors().list().await?;
    Ok(Json(ApiResponse::success(contributors)))
}

pub async fn get_contributor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Contributor>>> {
    let contributor = state.db.contributors().get(id).await?;
    Ok(Json(ApiResponse::success(contributor)))
}

pub async fn create_contributor(
    State(state): State<AppState>,
    Json(payload): Json<CreateContributorRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Contributor>>)> {
    let contributor = state.db.contributors().create(&payload.full_name).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(contributor))))
}
