use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use super::{
    dto::{AuthTokenResponse, EmailRequest, LoginRequest, MessageResponse},
    extractors::AuthenticatedUser,
    password::{validate_password_plaintext, verify_without_user},
    tokens::{Scope, Token, ACTIVATION_TTL, AUTHENTICATION_TTL, PASSWORD_RESET_TTL},
    AuthError,
};
use crate::{
    error::{ApiError, ModelError},
    json::AppJson,
    mailer,
    state::AppState,
    users::repo::validate_email,
    users::repo_types::User,
    validator::Validator,
};

pub fn token_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/tokens/authentication",
            post(create_authentication_token).delete(delete_authentication_tokens),
        )
        .route("/v1/tokens/password-reset", post(create_password_reset_token))
        .route("/v1/tokens/activation", post(create_activation_token))
}

/// Unknown email is reported as a field error, the way the mailing endpoints expect.
async fn user_for_email(state: &AppState, email: &str) -> Result<User, ApiError> {
    match User::get_by_email(&state.store, email).await {
        Ok(user) => Ok(user),
        Err(ModelError::NotFound) => {
            Err(ModelError::field("email", "no matching email address found").into())
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, payload))]
pub async fn create_authentication_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(StatusCode, Json<AuthTokenResponse>), ApiError> {
    let mut v = Validator::new();
    validate_email(&mut v, &payload.email);
    validate_password_plaintext(&mut v, &payload.password);
    v.into_result()?;

    let user = match User::get_by_email(&state.store, &payload.email).await {
        Ok(u) => u,
        Err(ModelError::NotFound) => {
            verify_without_user(&payload.password);
            warn!("login unknown email");
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(e) => return Err(e.into()),
    };

    if !user.password.matches(&payload.password) {
        warn!(user_id = user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token =
        Token::issue(&state.store, user.id, AUTHENTICATION_TTL, Scope::Authentication).await?;

    info!(user_id = user.id, "user logged in");
    Ok((
        StatusCode::CREATED,
        Json(AuthTokenResponse {
            authentication_token: token,
        }),
    ))
}

#[instrument(skip(state, user))]
pub async fn delete_authentication_tokens(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<MessageResponse>, ApiError> {
    Token::delete_all_for_user(&state.store, Scope::Authentication, user.id).await?;
    info!(user_id = user.id, "user logged out");
    Ok(Json(MessageResponse {
        message: "you have been logged out",
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_password_reset_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<EmailRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let mut v = Validator::new();
    validate_email(&mut v, &payload.email);
    v.into_result()?;

    let user = user_for_email(&state, &payload.email).await?;
    if !user.activated {
        return Err(ModelError::field("email", "user account must be activated").into());
    }

    let token =
        Token::issue(&state.store, user.id, PASSWORD_RESET_TTL, Scope::PasswordReset).await?;
    mailer::spawn_password_reset(state.mailer.clone(), user.email, user.id, token.plaintext);

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "an email will be sent to you containing password reset instructions",
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn create_activation_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<EmailRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let mut v = Validator::new();
    validate_email(&mut v, &payload.email);
    v.into_result()?;

    let user = user_for_email(&state, &payload.email).await?;
    if user.activated {
        return Err(ModelError::field("email", "user has already been activated").into());
    }

    let token = Token::issue(&state.store, user.id, ACTIVATION_TTL, Scope::Activation).await?;
    mailer::spawn_activation(state.mailer.clone(), user.email, user.id, token.plaintext);

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "an email will be sent to you containing activation instructions",
        }),
    ))
}
