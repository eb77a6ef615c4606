use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use crate::{auth::AuthError, store::StoreError, validator::FieldErrors};

/// Failures of the model layer, the vocabulary the HTTP layer maps to statuses.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("record not found")]
    NotFound,
    #[error("edit conflict")]
    EditConflict,
    #[error("duplicate email")]
    DuplicateEmail,
    #[error("validation failed")]
    ValidationFailed(FieldErrors),
    #[error("password hashing failed: {0}")]
    HashingFailure(String),
    #[error("store failure: {0}")]
    StoreFailure(#[from] StoreError),
}

impl ModelError {
    /// A validation failure on a single field.
    pub fn field(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), message.to_string());
        ModelError::ValidationFailed(errors)
    }

    pub(crate) fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            ModelError::StoreFailure(StoreError::Driver(sqlx::Error::Database(e)))
                if e.is_unique_violation()
        )
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    BadRequest(String),
}

const SERVER_ERROR: &str = "the server encountered a problem and could not process your request";

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Model(e) => model_status(e),
            ApiError::Auth(AuthError::Model(e)) => model_status(e),
            ApiError::Auth(AuthError::InactiveAccount) => StatusCode::FORBIDDEN,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn body(&self) -> Value {
        let model = match self {
            ApiError::Model(e) | ApiError::Auth(AuthError::Model(e)) => e,
            ApiError::Auth(e) => return json!({ "error": e.to_string() }),
            ApiError::BadRequest(msg) => return json!({ "error": msg }),
        };
        match model {
            ModelError::NotFound => {
                json!({ "error": "the requested resource could not be found" })
            }
            ModelError::EditConflict => json!({
                "error": "unable to update the record due to an edit conflict, please try again"
            }),
            ModelError::DuplicateEmail => json!({
                "error": { "email": "a user with this email address already exists" }
            }),
            ModelError::ValidationFailed(fields) => json!({ "error": fields }),
            ModelError::HashingFailure(_) | ModelError::StoreFailure(_) => {
                json!({ "error": SERVER_ERROR })
            }
        }
    }
}

fn model_status(e: &ModelError) -> StatusCode {
    match e {
        ModelError::NotFound => StatusCode::NOT_FOUND,
        ModelError::EditConflict => StatusCode::CONFLICT,
        ModelError::DuplicateEmail | ModelError::ValidationFailed(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ModelError::HashingFailure(_) | ModelError::StoreFailure(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let mut res = (status, Json(self.body())).into_response();
        if matches!(self, ApiError::Auth(AuthError::InvalidToken)) {
            res.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        res
    }
}
