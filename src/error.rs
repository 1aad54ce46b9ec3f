use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, warn};
use serde::Serialize;

use crate::{auth, command, contact, integration, subscription};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    _Auth(#[from] auth::Error),
    #[error(transparent)]
    _Contact(#[from] contact::Error),
    #[error(transparent)]
    _Subscription(#[from] subscription::Error),
    #[error(transparent)]
    _Command(#[from] command::Error),
    #[error(transparent)]
    _Integration(#[from] integration::Error),
    #[error(transparent)]
    _Json(#[from] JsonRejection),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::_Auth(e) => e.into_response(),
            Self::_Contact(e) => e.into_response(),
            Self::_Subscription(e) => e.into_response(),
            Self::_Command(e) => e.into_response(),
            Self::_Integration(e) => e.into_response(),
            Self::_Json(e) => respond(StatusCode::BAD_REQUEST, "invalid_request", e.body_text()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    details: String,
}

/// Uniform JSON error body: a short code plus a human-readable detail.
pub(crate) fn respond(status: StatusCode, code: &str, details: impl Into<String>) -> Response {
    let details = details.into();

    if status.is_server_error() {
        error!("{code}: {details}");
    } else {
        warn!("{code}: {details}");
    }

    let body = ErrorBody {
        error: code.to_owned(),
        details,
    };

    (status, Json(body)).into_response()
}
