use std::fmt;
use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum_extra::extract::cookie::Cookie;
use oauth2::TokenResponse;
use serde::{Deserialize, Serialize};

use crate::error::respond;
use crate::state::AppState;
use crate::integration::{self, idp};
use crate::{Raw, Redact};

pub mod handler;
pub mod service;
pub mod state;

type Result<T> = std::result::Result<T, Error>;
pub type Service = Arc<dyn service::AuthService + Send + Sync>;
pub type StateStore = Arc<dyn state::StateStore + Send + Sync>;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/auth/authorize", get(handler::api::authorize))
        .route("/auth/callback", get(handler::api::callback))
        .with_state(s)
}

#[derive(Deserialize)]
pub struct Code(String);

impl Code {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl Redact for Code {}

impl Raw for Code {
    fn raw(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code({})", self.redact())
    }
}

#[derive(Deserialize, PartialEq, Clone)]
pub struct Csrf(String);

impl Csrf {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl Redact for Csrf {}

impl Raw for Csrf {
    fn raw(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Csrf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Csrf({})", self.redact())
    }
}

impl From<&Cookie<'_>> for Csrf {
    fn from(c: &Cookie<'_>) -> Self {
        Self::new(c.value())
    }
}

/// Credentials handed out by the provider. Never stored here: the operator
/// copies them into the service configuration.
#[derive(Serialize, Clone)]
pub struct TokenSet {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    token_type: String,
}

impl TokenSet {
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }
}

impl From<&idp::TokenResponse> for TokenSet {
    fn from(r: &idp::TokenResponse) -> Self {
        Self {
            access_token: r.access_token().secret().to_owned(),
            refresh_token: r.refresh_token().map(|t| t.secret().to_owned()),
            expires_in: r.expires_in().map(|d| d.as_secs()),
            token_type: r.token_type().as_ref().to_owned(),
        }
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("provider denied authorization: {code}")]
    Provider {
        code: String,
        description: Option<String>,
    },
    #[error("invalid state, possible forgery attempt")]
    InvalidState,
    #[error("no authorization code received")]
    MissingCode,
    #[error("token endpoint rejected the request: {0}")]
    TokenEndpoint(String),

    #[error(transparent)]
    _Integration(#[from] integration::Error),

    #[error("unexpected error happened: {0}")]
    Unexpected(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::Provider { code, description } => {
                respond(StatusCode::BAD_REQUEST, &code, description.unwrap_or_default())
            }
            Self::InvalidState => {
                respond(StatusCode::BAD_REQUEST, "invalid_state", self.to_string())
            }
            Self::MissingCode => {
                respond(StatusCode::BAD_REQUEST, "invalid_request", self.to_string())
            }
            // raw provider body, kept verbatim for diagnosis
            Self::TokenEndpoint(body) => respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_exchange_failed",
                body,
            ),
            Self::_Integration(e) => e.into_response(),
            Self::Unexpected(_) => respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                "unexpected",
                self.to_string(),
            ),
        }
    }
}
