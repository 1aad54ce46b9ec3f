use std::collections::BTreeMap;

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Deserialize, Debug)]
pub struct Command {
    pub curl: Option<String>,
}

/// Outbound request described by a curl-like command string.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

/// Upstream response mirrored back to the caller.
#[derive(Serialize, Debug)]
pub struct Relayed {
    pub status: u16,
    #[serde(rename = "statusText")]
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub data: Value,
}

impl Relayed {
    pub async fn read(response: reqwest::Response) -> reqwest::Result<Self> {
        let status = response.status();

        let mut headers = BTreeMap::<String, String>::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes());
            headers
                .entry(name.as_str().to_owned())
                .and_modify(|v| {
                    v.push_str(", ");
                    v.push_str(&value);
                })
                .or_insert_with(|| value.into_owned());
        }

        let json = headers
            .get(CONTENT_TYPE.as_str())
            .is_some_and(|ct| ct.contains("application/json"));

        let text = response.text().await?;
        let data = if json {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        } else {
            Value::String(text)
        };

        Ok(Self {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            headers,
            data,
        })
    }
}
