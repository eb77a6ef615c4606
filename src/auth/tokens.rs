use std::{fmt, time::Duration};

use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use tracing::debug;

use crate::{
    error::ModelError,
    store::Store,
    users::repo_types::{User, UserRow},
    validator::Validator,
};

const ENTROPY_BYTES: usize = 16;
/// Length of the base32 (unpadded) encoding of `ENTROPY_BYTES`.
pub const TOKEN_PLAINTEXT_LEN: usize = 26;

pub const AUTHENTICATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const ACTIVATION_TTL: Duration = Duration::from_secs(3 * 24 * 60 * 60);
pub const PASSWORD_RESET_TTL: Duration = Duration::from_secs(45 * 60);

/// What a token may be used for; tokens never cross scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    Activation,
    Authentication,
    PasswordReset,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Activation => "activation",
            Scope::Authentication => "authentication",
            Scope::PasswordReset => "password-reset",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly issued token. `plaintext` exists only in this value.
#[derive(Clone, Serialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub plaintext: String,
    #[serde(skip)]
    pub hash: Vec<u8>,
    #[serde(skip)]
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub expiry: OffsetDateTime,
    #[serde(skip)]
    pub scope: Scope,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("user_id", &self.user_id)
            .field("expiry", &self.expiry)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

pub fn hash_plaintext(plaintext: &str) -> Vec<u8> {
    Sha256::digest(plaintext.as_bytes()).to_vec()
}

pub fn generate(user_id: i64, ttl: Duration, scope: Scope) -> Token {
    let mut bytes = [0u8; ENTROPY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let plaintext = base32::encode(base32::Alphabet::Rfc4648 { padding: false }, &bytes);
    Token {
        hash: hash_plaintext(&plaintext),
        plaintext,
        user_id,
        expiry: OffsetDateTime::now_utc() + ttl,
        scope,
    }
}

pub fn validate_token_plaintext(v: &mut Validator, plaintext: &str) {
    v.check(!plaintext.is_empty(), "token", "must be provided");
    v.check(
        plaintext.len() == TOKEN_PLAINTEXT_LEN,
        "token",
        "must be 26 bytes long",
    );
}

impl Token {
    pub async fn insert(store: &Store, token: &Token) -> Result<(), ModelError> {
        store
            .execute(
                sqlx::query(
                    r#"
                    INSERT INTO tokens (hash, user_id, expiry, scope)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(token.hash.as_slice())
                .bind(token.user_id)
                .bind(token.expiry)
                .bind(token.scope.as_str()),
            )
            .await?;
        Ok(())
    }

    /// Generates and persists a token; the caller gets the only copy of the plaintext.
    pub async fn issue(
        store: &Store,
        user_id: i64,
        ttl: Duration,
        scope: Scope,
    ) -> Result<Token, ModelError> {
        let token = generate(user_id, ttl, scope);
        Token::insert(store, &token).await?;
        debug!(user_id, scope = %scope, expiry = %token.expiry, "token issued");
        Ok(token)
    }

    /// The owner of a live token in `scope`. Wrong token, wrong scope and
    /// expiry are all `NotFound`.
    pub async fn lookup(store: &Store, plaintext: &str, scope: Scope) -> Result<User, ModelError> {
        let row = store
            .fetch_one(
                sqlx::query_as::<_, UserRow>(
                    r#"
                    SELECT users.id, users.created_at, users.name, users.email,
                           users.password_hash, users.activated, users.version
                    FROM users
                    INNER JOIN tokens ON users.id = tokens.user_id
                    WHERE tokens.hash = $1
                      AND tokens.scope = $2
                      AND tokens.expiry > $3
                    "#,
                )
                .bind(hash_plaintext(plaintext))
                .bind(scope.as_str())
                .bind(OffsetDateTime::now_utc()),
            )
            .await?;
        Ok(row.into())
    }

    pub async fn delete_all_for_user(
        store: &Store,
        scope: Scope,
        user_id: i64,
    ) -> Result<u64, ModelError> {
        let deleted = store
            .execute(
                sqlx::query(
                    r#"
                    DELETE FROM tokens
                    WHERE scope = $1 AND user_id = $2
                    "#,
                )
                .bind(scope.as_str())
                .bind(user_id),
            )
            .await?;
        debug!(user_id, scope = %scope, deleted, "tokens deleted");
        Ok(deleted)
    }
}
