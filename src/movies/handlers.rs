use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreateMovieRequest, MovieEnvelope, UpdateMovieRequest},
    repo_types::{Movie, NewMovie},
};
use crate::{
    auth::{dto::MessageResponse, extractors::ActivatedUser},
    error::{ApiError, ModelError},
    json::AppJson,
    state::AppState,
    validator::Validator,
};

/// Lets a client refuse to patch anything but the version it last saw.
pub const EXPECTED_VERSION_HEADER: &str = "x-expected-version";

pub fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/movies", post(create_movie))
        .route(
            "/v1/movies/:id",
            get(show_movie).patch(update_movie).delete(delete_movie),
        )
}

#[instrument(skip(state, _user, payload))]
pub async fn create_movie(
    State(state): State<AppState>,
    ActivatedUser(_user): ActivatedUser,
    AppJson(payload): AppJson<CreateMovieRequest>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<MovieEnvelope>), ApiError> {
    let new = NewMovie::from(payload);
    let mut v = Validator::new();
    new.validate(&mut v);
    v.into_result()?;

    let movie = Movie::insert(&state.store, new).await?;
    info!(movie_id = movie.id, "movie created");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/v1/movies/{}", movie.id))],
        Json(MovieEnvelope { movie }),
    ))
}

#[instrument(skip(state, _user))]
pub async fn show_movie(
    State(state): State<AppState>,
    ActivatedUser(_user): ActivatedUser,
    Path(id): Path<i64>,
) -> Result<Json<MovieEnvelope>, ApiError> {
    let movie = Movie::get(&state.store, id).await?;
    Ok(Json(MovieEnvelope { movie }))
}

#[instrument(skip(state, _user, headers, payload))]
pub async fn update_movie(
    State(state): State<AppState>,
    ActivatedUser(_user): ActivatedUser,
    Path(id): Path<i64>,
    headers: HeaderMap,
    AppJson(payload): AppJson<UpdateMovieRequest>,
) -> Result<Json<MovieEnvelope>, ApiError> {
    let mut movie = Movie::get(&state.store, id).await?;

    if let Some(expected) = headers.get(EXPECTED_VERSION_HEADER) {
        if expected.to_str().ok() != Some(movie.version.to_string().as_str()) {
            return Err(ModelError::EditConflict.into());
        }
    }

    payload.apply(&mut movie);
    let mut v = Validator::new();
    movie.validate(&mut v);
    v.into_result()?;

    movie.update(&state.store).await?;
    info!(movie_id = movie.id, version = movie.version, "movie updated");
    Ok(Json(MovieEnvelope { movie }))
}

#[instrument(skip(state, _user))]
pub async fn delete_movie(
    State(state): State<AppState>,
    ActivatedUser(_user): ActivatedUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    Movie::delete(&state.store, id).await?;
    info!(movie_id = id, "movie deleted");
    Ok(Json(MessageResponse {
        message: "movie successfully deleted",
    }))
}
