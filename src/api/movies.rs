use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::validation::{parse_genre_filter, validate_movie_id, validate_search_query};
use super::{ApiError, ApiResponse, AppState, SearchParams};
use crate::models::movie::{Genre, MovieDetail, MovieSummary};

/// GET /movies/search?query=&genre=
pub async fn search_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Vec<MovieSummary>>>, ApiError> {
    let query = validate_search_query(params.query.as_deref())?;
    let genre = parse_genre_filter(params.genre.as_deref())?;

    let results = state.search_service().search(query, genre).await?;

    Ok(Json(ApiResponse::success(results)))
}

/// GET /movies/genres
pub async fn list_genres(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Genre>>>, ApiError> {
    let genres = state.search_service().list_genres().await?;
    Ok(Json(ApiResponse::success(genres)))
}

/// GET /movies/details/{id}
pub async fn get_movie_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MovieDetail>>, ApiError> {
    let id = id
        .parse::<i64>()
        .map_err(|_| ApiError::validation(format!("Invalid movie ID: {id}")))?;
    let id = validate_movie_id(id)?;

    let detail = state.search_service().get_movie_detail(id).await?;

    Ok(Json(ApiResponse::success(detail)))
}
