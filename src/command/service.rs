use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::model::{ParsedRequest, Relayed};
use super::parser;

#[async_trait]
pub trait CommandService {
    /// Parses the command and performs the described request once.
    async fn execute(&self, command: &str) -> super::Result<Relayed>;
}

#[derive(Clone)]
pub struct CommandServiceImpl {
    http: reqwest::Client,
}

impl CommandServiceImpl {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CommandService for CommandServiceImpl {
    async fn execute(&self, command: &str) -> super::Result<Relayed> {
        let parsed = parser::parse(command)?;
        warn!("Relaying {} {} on behalf of caller", parsed.method, parsed.url);

        let ParsedRequest {
            url,
            method,
            headers,
            body,
        } = parsed;

        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| super::Error::InvalidRequest(format!("unsupported method {method}")))?;

        let mut header_map = HeaderMap::with_capacity(headers.len());
        for (name, value) in &headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| super::Error::InvalidRequest(format!("invalid header name {name}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| super::Error::InvalidRequest(format!("invalid value for header {name}")))?;
            header_map.insert(name, value);
        }

        let mut request = self.http.request(method, &url).headers(header_map);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        debug!("Relayed request answered with {}", response.status());

        Ok(Relayed::read(response).await?)
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::command::Error;
    use crate::integration;

    fn service() -> CommandServiceImpl {
        CommandServiceImpl::new(integration::init_relay_client().unwrap())
    }

    #[tokio::test]
    async fn should_relay_json_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/items"))
            .and(header("content-type", "application/json"))
            .and(body_string(r#"{"a":1}"#))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7})))
            .expect(1)
            .mount(&server)
            .await;

        let actual = service()
            .execute(&format!(
                r#"curl -X POST {}/v1/items -H "Content-Type: application/json" -d '{{"a":1}}'"#,
                server.uri()
            ))
            .await
            .unwrap();

        assert_eq!(actual.status, 201);
        assert_eq!(actual.status_text, "Created");
        assert_eq!(actual.data, json!({"id": 7}));
        assert_eq!(actual.headers["content-type"], "application/json");
    }

    #[tokio::test]
    async fn should_relay_text_response_as_string() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
            .expect(1)
            .mount(&server)
            .await;

        let actual = service()
            .execute(&format!("curl {}/ping", server.uri()))
            .await
            .unwrap();

        assert_eq!(actual.status, 200);
        assert_eq!(actual.data, json!("pong"));
    }

    #[tokio::test]
    async fn should_pass_through_upstream_failure_status() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .expect(1)
            .mount(&server)
            .await;

        let actual = service()
            .execute(&format!("curl -X DELETE {}/items/1", server.uri()))
            .await
            .unwrap();

        assert_eq!(actual.status, 404);
        assert_eq!(actual.status_text, "Not Found");
    }

    #[tokio::test]
    async fn should_follow_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", format!("{}/new", server.uri())),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved here"))
            .expect(1)
            .mount(&server)
            .await;

        let actual = service()
            .execute(&format!("curl {}/old", server.uri()))
            .await
            .unwrap();

        assert_eq!(actual.status, 200);
        assert_eq!(actual.data, json!("moved here"));
    }

    #[tokio::test]
    async fn should_reject_invalid_header_name() {
        let actual = service()
            .execute(r#"curl https://example.com -H "Bad Header: 1""#)
            .await;

        assert!(matches!(actual, Err(Error::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn should_reject_unparsable_command() {
        let actual = service().execute("curl -X GET nowhere").await;

        assert!(matches!(actual, Err(Error::Parse(_))));
    }

    #[tokio::test]
    async fn should_fail_when_host_is_unreachable() {
        let actual = service().execute("curl http://127.0.0.1:1/ping").await;

        assert!(matches!(actual, Err(Error::_Reqwest(_))));
    }
}
