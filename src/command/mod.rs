use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;

use crate::error::respond;
use crate::state::AppState;

mod handler;
pub mod model;
pub mod parser;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Service = Arc<dyn service::CommandService + Send + Sync>;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/api/curl", post(handler::api::execute))
        .with_state(s)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no curl command provided")]
    MissingCommand,
    #[error("failed to parse curl command: {0}")]
    Parse(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to execute request: {0}")]
    _Reqwest(#[from] reqwest::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::MissingCommand | Self::Parse(_) | Self::InvalidRequest(_) => {
                respond(StatusCode::BAD_REQUEST, "invalid_request", self.to_string())
            }
            Self::_Reqwest(_) => respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                "unexpected",
                self.to_string(),
            ),
        }
    }
}
