use time::OffsetDateTime;

use crate::{
    auth::password::{validate_password_plaintext, Password},
    error::ModelError,
    store::Store,
    users::repo_types::{NewUser, User, UserRow},
    validator::{matches, Validator, EMAIL_RX},
};

const MAX_NAME_BYTES: usize = 500;

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(matches(email, &EMAIL_RX), "email", "must be a valid email address");
}

/// Shared by new and stored users; the plaintext is only checked while it is set.
pub fn validate_user(v: &mut Validator, name: &str, email: &str, password: &Password) {
    v.check(!name.is_empty(), "name", "must be provided");
    v.check(
        name.len() <= MAX_NAME_BYTES,
        "name",
        "must not be more than 500 bytes long",
    );
    validate_email(v, email);
    if let Some(plaintext) = password.plaintext() {
        validate_password_plaintext(v, plaintext);
    }
}

fn duplicate_email(e: ModelError) -> ModelError {
    if e.is_unique_violation() {
        ModelError::DuplicateEmail
    } else {
        e
    }
}

impl NewUser {
    pub fn validate(&self, v: &mut Validator) {
        validate_user(v, &self.name, &self.email, &self.password);
    }
}

impl User {
    pub fn validate(&self, v: &mut Validator) {
        validate_user(v, &self.name, &self.email, &self.password);
    }

    /// Stores `new` and returns it with the id, timestamp and version the store assigned.
    pub async fn insert(store: &Store, new: NewUser) -> Result<User, ModelError> {
        let (id, created_at, version) = store
            .fetch_one(
                sqlx::query_as::<_, (i64, OffsetDateTime, i32)>(
                    r#"
                    INSERT INTO users (name, email, password_hash, activated)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id, created_at, version
                    "#,
                )
                .bind(&new.name)
                .bind(&new.email)
                .bind(new.password.hash())
                .bind(new.activated),
            )
            .await
            .map_err(duplicate_email)?;

        Ok(User {
            id,
            created_at,
            name: new.name,
            email: new.email,
            password: new.password,
            activated: new.activated,
            version,
        })
    }

    pub async fn get_by_email(store: &Store, email: &str) -> Result<User, ModelError> {
        let row = store
            .fetch_one(
                sqlx::query_as::<_, UserRow>(
                    r#"
                    SELECT id, created_at, name, email, password_hash, activated, version
                    FROM users
                    WHERE email = $1
                    "#,
                )
                .bind(email),
            )
            .await?;
        Ok(row.into())
    }

    /// Conditional write against the version this copy was read at. On success
    /// `self.version` holds the store's new version.
    pub async fn update(&mut self, store: &Store) -> Result<(), ModelError> {
        let row = store
            .fetch_optional(
                sqlx::query_as::<_, (i32,)>(
                    r#"
                    UPDATE users
                    SET name = $1, email = $2, password_hash = $3, activated = $4,
                        version = version + 1
                    WHERE id = $5 AND version = $6
                    RETURNING version
                    "#,
                )
                .bind(&self.name)
                .bind(&self.email)
                .bind(self.password.hash())
                .bind(self.activated)
                .bind(self.id)
                .bind(self.version),
            )
            .await
            .map_err(duplicate_email)?;

        match row {
            Some((version,)) => {
                self.version = version;
                Ok(())
            }
            None => Err(ModelError::EditConflict),
        }
    }
}
