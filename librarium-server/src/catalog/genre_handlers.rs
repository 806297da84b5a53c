//! Genre endpoints.

use axum::http::StatusCode;
use axum::{Json, extract::State};
use librarium_core::api_types::ApiResponse;
use librarium_core::catalog::Genre;
use librarium_core::database::GenresRepository;
use serde::Deserialize;

use crate::errors::AppResult;
use crate::infra::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateGenreRequest {
    pub name: String,
}

pub async fn list_genres(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Genre>>>> {
    let genres = state.db.genres().list().await?;
    Ok(Json(ApiResponse::success(genres)))
}

pub async fn create_genre(
    State(state): State<AppState>,
    Json(payload): Json<CreateGenreRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Genre>>)> {
    let genre = state.db.genres().create(&payload.name).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(genre))))
}
