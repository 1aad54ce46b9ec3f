use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;

use crate::error::respond;
use crate::integration;
use crate::state::AppState;

mod handler;
pub mod model;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Service = Arc<dyn service::ContactService + Send + Sync>;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/api/contacts", post(handler::api::create))
        .with_state(s)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("email address is required")]
    MissingEmail,
    #[error("unable to refresh access token, please re-authorize the application")]
    AuthorizationFailed,

    #[error("failed to relay request to CRM: {0}")]
    _Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    _Integration(#[from] integration::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::MissingEmail => {
                respond(StatusCode::BAD_REQUEST, "invalid_request", self.to_string())
            }
            Self::AuthorizationFailed => respond(
                StatusCode::UNAUTHORIZED,
                "authorization_failed",
                self.to_string(),
            ),
            Self::_Reqwest(_) => respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                "upstream_unreachable",
                self.to_string(),
            ),
            Self::_Integration(e) => e.into_response(),
        }
    }
}
