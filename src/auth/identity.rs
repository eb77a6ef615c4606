use axum::http::{header, HeaderMap};

use super::{
    tokens::{validate_token_plaintext, Scope, Token},
    AuthError,
};
use crate::{error::ModelError, store::Store, users::repo_types::User, validator::Validator};

/// Who is making a request. Anonymous is a variant of its own, so no stored
/// user (however empty) can be mistaken for it.
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    Authenticated(User),
}

impl Identity {
    pub const ANONYMOUS: Identity = Identity::Anonymous;

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(user) => Some(user),
        }
    }
}

/// No `Authorization` header is `None`; anything other than `Bearer <token>`
/// is an invalid token.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::InvalidToken)?;
    match value.split_once(' ') {
        Some(("Bearer", token)) if !token.is_empty() => Ok(Some(token)),
        _ => Err(AuthError::InvalidToken),
    }
}

pub async fn resolve(store: &Store, token: Option<&str>) -> Result<Identity, AuthError> {
    let Some(token) = token else {
        return Ok(Identity::ANONYMOUS);
    };

    let mut v = Validator::new();
    validate_token_plaintext(&mut v, token);
    if !v.valid() {
        return Err(AuthError::InvalidToken);
    }

    match Token::lookup(store, token, Scope::Authentication).await {
        Ok(user) => Ok(Identity::Authenticated(user)),
        Err(ModelError::NotFound) => Err(AuthError::InvalidToken),
        Err(e) => Err(AuthError::Model(e)),
    }
}
