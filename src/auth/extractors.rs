use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::{
    identity::{bearer_token, resolve},
    AuthError, Identity,
};
use crate::{error::ApiError, state::AppState, users::repo_types::User};

/// The caller's identity, anonymous included.
pub struct CurrentIdentity(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let identity = resolve(&state.store, token).await?;
        Ok(CurrentIdentity(identity))
    }
}

/// Rejects anonymous callers.
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentIdentity::from_request_parts(parts, state).await?.0 {
            Identity::Authenticated(user) => Ok(AuthenticatedUser(user)),
            Identity::Anonymous => Err(AuthError::AuthenticationRequired.into()),
        }
    }
}

/// Rejects anonymous callers and users that have not activated their account.
pub struct ActivatedUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for ActivatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !user.activated {
            return Err(AuthError::InactiveAccount.into());
        }
        Ok(ActivatedUser(user))
    }
}
