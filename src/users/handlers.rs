use axum::{
    extract::State,
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{ActivateRequest, RegisterRequest, ResetPasswordRequest, UserEnvelope},
    repo_types::{NewUser, User},
};
use crate::{
    auth::{
        dto::MessageResponse,
        password::{validate_password_plaintext, Password},
        tokens::{validate_token_plaintext, Scope, Token, ACTIVATION_TTL},
    },
    error::{ApiError, ModelError},
    json::AppJson,
    mailer,
    state::AppState,
    validator::Validator,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/users", post(register_user))
        .route("/v1/users/activated", put(activate_user))
        .route("/v1/users/password", put(reset_password))
}

/// Unknown, expired and wrong-scope tokens all read as the same field error.
async fn user_for_token(
    state: &AppState,
    plaintext: &str,
    scope: Scope,
    message: &str,
) -> Result<User, ApiError> {
    match Token::lookup(&state.store, plaintext, scope).await {
        Ok(user) => Ok(user),
        Err(ModelError::NotFound) => Err(ModelError::field("token", message).into()),
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, payload))]
pub async fn register_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserEnvelope>), ApiError> {
    let password = Password::set(&payload.password)?;
    let new = NewUser::new(payload.name, payload.email, password);

    let mut v = Validator::new();
    new.validate(&mut v);
    v.into_result()?;

    let user = User::insert(&state.store, new).await?;
    let token = Token::issue(&state.store, user.id, ACTIVATION_TTL, Scope::Activation).await?;
    mailer::spawn_activation(state.mailer.clone(), user.email.clone(), user.id, token.plaintext);

    info!(user_id = user.id, "user registered");
    Ok((StatusCode::ACCEPTED, Json(UserEnvelope { user })))
}

#[instrument(skip(state, payload))]
pub async fn activate_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ActivateRequest>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let mut v = Validator::new();
    validate_token_plaintext(&mut v, &payload.token);
    v.into_result()?;

    let mut user = user_for_token(
        &state,
        &payload.token,
        Scope::Activation,
        "invalid or expired activation token",
    )
    .await?;

    user.activated = true;
    user.update(&state.store).await?;
    Token::delete_all_for_user(&state.store, Scope::Activation, user.id).await?;

    info!(user_id = user.id, "user activated");
    Ok(Json(UserEnvelope { user }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut v = Validator::new();
    validate_password_plaintext(&mut v, &payload.password);
    validate_token_plaintext(&mut v, &payload.token);
    v.into_result()?;

    let mut user = user_for_token(
        &state,
        &payload.token,
        Scope::PasswordReset,
        "invalid or expired password reset token",
    )
    .await?;

    user.password = Password::set(&payload.password)?;
    user.update(&state.store).await?;
    // The old password is gone, so are the sessions it opened.
    Token::delete_all_for_user(&state.store, Scope::PasswordReset, user.id).await?;
    Token::delete_all_for_user(&state.store, Scope::Authentication, user.id).await?;

    info!(user_id = user.id, "password reset");
    Ok(Json(MessageResponse {
        message: "your password was successfully reset",
    }))
}
