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
pub type Service = Arc<dyn service::SubscriptionService + Send + Sync>;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/api/subscriptions", post(handler::api::create))
        .with_state(s)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no list memberships provided")]
    NoListMemberships,

    #[error("failed to process subscription: {0}")]
    _Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    _Integration(#[from] integration::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::NoListMemberships => {
                respond(StatusCode::BAD_REQUEST, "invalid_request", self.to_string())
            }
            Self::_Reqwest(_) => respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                "upstream_unreachable",
                self.to_string(),
            ),
            Self::_Integration(e) => e.into_response(),
        }
    }
}
