use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_LIST: &str = "07936f78-662a-11eb-af0a-fa163e56c9b0";
const DEFAULT_PERMISSION: &str = "implicit";
const DEFAULT_SOURCE: &str = "Account";

/// Form submission as posted by the website.
#[derive(Deserialize, Debug, Default)]
pub struct Submission {
    pub email: Option<String>,
    pub email_address: Option<String>,
    pub list_memberships: Option<Vec<String>>,
    pub permission_to_send: Option<String>,
    pub create_source: Option<String>,
    pub name: Option<String>,
}

impl Submission {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    fn email(&self) -> Option<&str> {
        [&self.email, &self.email_address]
            .into_iter()
            .flatten()
            .find(|e| !e.is_empty())
            .map(String::as_str)
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct EmailAddress {
    pub address: String,
    pub permission_to_send: String,
}

/// Contact creation body of the CRM API.
#[derive(Serialize, Debug, PartialEq)]
pub struct Payload {
    pub email_address: EmailAddress,
    pub create_source: String,
    pub list_memberships: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl TryFrom<Submission> for Payload {
    type Error = super::Error;

    fn try_from(s: Submission) -> super::Result<Self> {
        let address = s.email().ok_or(super::Error::MissingEmail)?.to_owned();

        let (first_name, last_name) = match s.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => match name.split_once(char::is_whitespace) {
                Some((first, last)) => (Some(first.to_owned()), Some(last.trim().to_owned())),
                None => (Some(name.to_owned()), None),
            },
            _ => (None, None),
        };

        Ok(Self {
            email_address: EmailAddress {
                address,
                permission_to_send: s
                    .permission_to_send
                    .unwrap_or_else(|| DEFAULT_PERMISSION.into()),
            },
            create_source: s.create_source.unwrap_or_else(|| DEFAULT_SOURCE.into()),
            list_memberships: s
                .list_memberships
                .unwrap_or_else(|| vec![DEFAULT_LIST.into()]),
            first_name,
            last_name,
        })
    }
}

/// Final result of a relay, whichever attempt produced it.
#[derive(Serialize, Debug)]
pub struct Outcome {
    pub success: bool,
    pub status: u16,
    pub data: Value,
}

impl Outcome {
    pub async fn read(response: reqwest::Response) -> reqwest::Result<Self> {
        let status = response.status();
        let text = response.text().await?;

        let data = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(Self {
            success: status.is_success(),
            status: status.as_u16(),
            data,
        })
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let status = if self.success {
            StatusCode::OK
        } else {
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY)
        };

        (status, Json(self)).into_response()
    }
}
