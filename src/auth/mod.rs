use crate::{error::ModelError, state::AppState};
use axum::Router;
use thiserror::Error;

pub(crate) mod dto;
pub mod extractors;
pub mod handlers;
pub mod identity;
pub mod password;
pub mod tokens;

pub use identity::Identity;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid or missing authentication token")]
    InvalidToken,
    #[error("invalid authentication credentials")]
    InvalidCredentials,
    #[error("you must be authenticated to access this resource")]
    AuthenticationRequired,
    #[error("your user account must be activated to access this resource")]
    InactiveAccount,
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub fn router() -> Router<AppState> {
    handlers::token_routes()
}
