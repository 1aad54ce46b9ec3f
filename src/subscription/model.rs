use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

const SOURCE: &str = "Webflow Form";
const DEFAULT_PERMISSION: &str = "implicit";

/// Known list ids and the newsletter they stand for.
const NEWSLETTERS: [(&str, &str); 2] = [
    ("07936f78-662a-11eb-af0a-fa163e56c9b0", "The Street Smarts"),
    ("wellness-wednesdays-list-id", "Wellness Wednesdays"),
];

pub fn newsletter_name(list_id: &str) -> &str {
    NEWSLETTERS
        .iter()
        .find(|(id, _)| *id == list_id)
        .map_or(list_id, |(_, name)| *name)
}

#[derive(Deserialize, Debug, Default)]
pub struct Submission {
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub list_memberships: Vec<String>,
    pub permission_to_send: Option<String>,
}

impl Submission {
    pub fn new(email: impl Into<String>, list_memberships: &[&str]) -> Self {
        Self {
            email: Some(email.into()),
            list_memberships: list_memberships.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn payload(&self, list_id: &str) -> Payload {
        Payload {
            email: self.email.clone(),
            name: self.name.clone().unwrap_or_default(),
            source: SOURCE,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            list_id: list_id.to_owned(),
            newsletter_name: newsletter_name(list_id).to_owned(),
            permission_to_send: self
                .permission_to_send
                .clone()
                .unwrap_or_else(|| DEFAULT_PERMISSION.into()),
        }
    }
}

/// Body forwarded to the automation webhook, one per list.
#[derive(Serialize, Debug)]
pub struct Payload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub name: String,
    pub source: &'static str,
    pub timestamp: String,
    pub list_id: String,
    pub newsletter_name: String,
    pub permission_to_send: String,
}

/// Any failed list, even all of them, makes the outcome partial.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Delivered { processed: usize },
    Partial { successful: usize, failed: usize, total: usize },
}

impl Outcome {
    pub fn tally(failed: usize, total: usize) -> Self {
        match failed {
            0 => Self::Delivered { processed: total },
            _ => Self::Partial {
                successful: total - failed,
                failed,
                total,
            },
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Self::Delivered { processed } => (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": "All subscriptions successful",
                    "subscriptions_processed": processed
                })),
            ),
            Self::Partial {
                successful,
                failed,
                total,
            } => (
                StatusCode::MULTI_STATUS,
                Json(json!({
                    "error": "Some subscriptions failed",
                    "successful": successful,
                    "failed": failed,
                    "total": total
                })),
            ),
        }
        .into_response()
    }
}
