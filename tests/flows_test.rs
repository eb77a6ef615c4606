use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use greenlight::{
    app::build_app,
    auth::{
        password::Password,
        tokens::{Scope, Token, ACTIVATION_TTL, AUTHENTICATION_TTL, PASSWORD_RESET_TTL},
    },
    config::{AppConfig, DbConfig, Environment},
    error::ModelError,
    mailer::{LogMailer, Mailer},
    state::AppState,
    store::Store,
    users::repo_types::{NewUser, User},
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

fn store(pool: PgPool) -> Store {
    Store::new(pool, Duration::from_secs(3))
}

fn state(store: Store) -> AppState {
    let config = AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        env: Environment::Development,
        db: DbConfig {
            url: String::new(),
            max_connections: 1,
            max_idle: Duration::from_secs(60),
            query_timeout: Duration::from_secs(3),
        },
        cors_trusted_origins: Vec::new(),
    };
    AppState::from_parts(store, Arc::new(config), Arc::new(LogMailer) as Arc<dyn Mailer>)
}

async fn call(store: &Store, req: Request<Body>) -> (StatusCode, Value) {
    let res = build_app(state(store.clone())).oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn user(store: &Store, activated: bool) -> User {
    let mut new = NewUser::new(
        "Faith Smith",
        "faith@example.com",
        Password::set("pa55word").unwrap(),
    );
    new.activated = activated;
    User::insert(store, new).await.unwrap()
}

async fn live(store: &Store, token: &Token) -> bool {
    match Token::lookup(store, &token.plaintext, token.scope).await {
        Ok(_) => true,
        Err(ModelError::NotFound) => false,
        Err(e) => panic!("lookup failed: {e}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn activation_marks_user_and_consumes_only_activation_tokens(pool: PgPool) {
    let store = store(pool);
    let user = user(&store, false).await;
    let activation = Token::issue(&store, user.id, ACTIVATION_TTL, Scope::Activation)
        .await
        .unwrap();
    let other_activation = Token::issue(&store, user.id, ACTIVATION_TTL, Scope::Activation)
        .await
        .unwrap();
    let session = Token::issue(&store, user.id, AUTHENTICATION_TTL, Scope::Authentication)
        .await
        .unwrap();

    let (status, body) = call(
        &store,
        json_request(
            "PUT",
            "/v1/users/activated",
            json!({ "token": activation.plaintext }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["activated"], true);

    let stored = User::get_by_email(&store, "faith@example.com").await.unwrap();
    assert!(stored.activated);
    assert_eq!(stored.version, 2);
    assert!(!live(&store, &activation).await);
    assert!(!live(&store, &other_activation).await);
    assert!(live(&store, &session).await);

    let (status, body) = call(
        &store,
        json_request(
            "PUT",
            "/v1/users/activated",
            json!({ "token": activation.plaintext }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["token"], "invalid or expired activation token");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn password_reset_revokes_reset_and_authentication_tokens(pool: PgPool) {
    let store = store(pool);
    let user = user(&store, true).await;
    let reset = Token::issue(&store, user.id, PASSWORD_RESET_TTL, Scope::PasswordReset)
        .await
        .unwrap();
    let session_a = Token::issue(&store, user.id, AUTHENTICATION_TTL, Scope::Authentication)
        .await
        .unwrap();
    let session_b = Token::issue(&store, user.id, AUTHENTICATION_TTL, Scope::Authentication)
        .await
        .unwrap();

    let (status, body) = call(
        &store,
        json_request(
            "PUT",
            "/v1/users/password",
            json!({ "password": "n3w-pa55word", "token": reset.plaintext }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "your password was successfully reset");

    assert!(!live(&store, &reset).await);
    assert!(!live(&store, &session_a).await);
    assert!(!live(&store, &session_b).await);

    let stored = User::get_by_email(&store, "faith@example.com").await.unwrap();
    assert!(stored.password.matches("n3w-pa55word"));
    assert!(!stored.password.matches("pa55word"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn login_then_logout_invalidates_the_bearer_token(pool: PgPool) {
    let store = store(pool);
    user(&store, true).await;

    let (status, body) = call(
        &store,
        json_request(
            "POST",
            "/v1/tokens/authentication",
            json!({ "email": "faith@example.com", "password": "pa55word" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let bearer = format!(
        "Bearer {}",
        body["authentication_token"]["token"].as_str().unwrap()
    );

    let missing_movie = || {
        Request::get("/v1/movies/999")
            .header(header::AUTHORIZATION, bearer.as_str())
            .body(Body::empty())
            .unwrap()
    };
    let (status, _) = call(&store, missing_movie()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let logout = Request::delete("/v1/tokens/authentication")
        .header(header::AUTHORIZATION, bearer.as_str())
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&store, logout).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "you have been logged out");

    let (status, body) = call(&store, missing_movie()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid or missing authentication token");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn login_failures_are_indistinguishable(pool: PgPool) {
    let store = store(pool);
    user(&store, true).await;

    let (wrong_password, wrong_body) = call(
        &store,
        json_request(
            "POST",
            "/v1/tokens/authentication",
            json!({ "email": "faith@example.com", "password": "not-the-password" }),
        ),
    )
    .await;
    let (unknown_email, unknown_body) = call(
        &store,
        json_request(
            "POST",
            "/v1/tokens/authentication",
            json!({ "email": "nobody@example.com", "password": "not-the-password" }),
        ),
    )
    .await;
    assert_eq!(wrong_password, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn password_reset_request_requires_an_activated_account(pool: PgPool) {
    let store = store(pool);
    let inactive = user(&store, false).await;

    let (status, body) = call(
        &store,
        json_request(
            "POST",
            "/v1/tokens/password-reset",
            json!({ "email": "faith@example.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["email"], "user account must be activated");

    let issued: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tokens WHERE user_id = $1")
        .bind(inactive.id)
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(issued, 0);

    let mut activated = User::get_by_email(&store, "faith@example.com").await.unwrap();
    activated.activated = true;
    activated.update(&store).await.unwrap();

    let (status, _) = call(
        &store,
        json_request(
            "POST",
            "/v1/tokens/password-reset",
            json!({ "email": "faith@example.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
}
