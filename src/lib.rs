use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;

use crate::state::AppState;

pub mod auth;
pub mod command;
pub mod contact;
pub mod error;
pub mod integration;
pub mod state;
pub mod subscription;

pub type Result<T> = std::result::Result<T, error::Error>;

/// Access to the underlying secret of a wrapper type.
pub trait Raw {
    fn raw(&self) -> &str;
}

/// Debug-friendly view of a secret: keeps a short prefix, hides the rest.
pub trait Redact: Raw {
    fn redact(&self) -> String {
        let raw = self.raw();
        match raw.char_indices().nth(4) {
            Some((i, _)) => format!("{}***", &raw[..i]),
            None => "***".to_owned(),
        }
    }
}

/// Assembles every route of the service with its CORS policy.
pub fn app(cfg: &integration::Config, s: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .merge(auth::api(s.clone()))
        .merge(contact::api(s.clone()).layer(cfg.form_cors()))
        .merge(subscription::api(s.clone()).layer(cfg.form_cors()))
        .merge(command::api(s).layer(integration::Config::open_cors()))
}
