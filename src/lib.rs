pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod json;
pub mod mailer;
pub mod movies;
pub mod state;
pub mod store;
pub mod users;
pub mod validator;
