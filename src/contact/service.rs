use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::StatusCode;
use reqwest::header::ACCEPT;

use super::model::{Outcome, Payload, Submission};
use crate::auth;
use crate::integration::{crm, idp};

#[async_trait]
pub trait ContactService {
    /// Creates the contact, refreshing the access token at most once.
    async fn relay(&self, s: Submission) -> super::Result<Outcome>;
}

#[derive(Clone)]
pub struct ContactServiceImpl {
    cfg: Arc<crm::Config>,
    idp: Arc<idp::Config>,
    http: reqwest::Client,
    auth_service: auth::Service,
}

impl ContactServiceImpl {
    pub fn new(
        cfg: &crm::Config,
        idp: &idp::Config,
        http: reqwest::Client,
        auth_service: auth::Service,
    ) -> Self {
        Self {
            cfg: Arc::new(cfg.to_owned()),
            idp: Arc::new(idp.to_owned()),
            http,
            auth_service,
        }
    }
}

#[async_trait]
impl ContactService for ContactServiceImpl {
    async fn relay(&self, s: Submission) -> super::Result<Outcome> {
        let access_token = self.cfg.access_token()?;
        self.idp.client_id()?;
        self.idp.client_secret()?;

        let payload = Payload::try_from(s)?;
        debug!("Relaying contact to CRM: {payload:?}");

        let first = self.create(&payload, access_token).await?;
        if first.status() != StatusCode::UNAUTHORIZED {
            return Ok(Outcome::read(first).await?);
        }

        warn!("Access token rejected by CRM, attempting to refresh");
        let token = self.auth_service.refresh().await.map_err(|e| {
            error!("Failed to refresh access token: {e}");
            super::Error::AuthorizationFailed
        })?;

        info!("Retrying contact creation with refreshed token");
        let second = self.create(&payload, token.access_token()).await?;
        Ok(Outcome::read(second).await?)
    }
}

impl ContactServiceImpl {
    async fn create(&self, payload: &Payload, token: &str) -> reqwest::Result<reqwest::Response> {
        self.http
            .post(self.cfg.contacts_url())
            .header(ACCEPT, "application/json")
            .bearer_auth(token)
            .json(payload)
            .send()
            .await
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::service::AuthServiceImpl;
    use crate::auth::state::InMemoryStateStore;
    use crate::contact::Error;
    use crate::integration;

    fn idp_config(server: &MockServer) -> idp::Config {
        idp::Config::new(
            Some("client-id".into()),
            Some("client-secret".into()),
            Some("refresh-1".into()),
            format!("{}/authorize", server.uri()),
            format!("{}/token", server.uri()),
            "http://localhost:8000/auth/callback",
        )
    }

    fn service(server: &MockServer, idp: idp::Config, access_token: Option<&str>) -> ContactServiceImpl {
        let http = integration::init_http_client().unwrap();
        let crm = crm::Config::new(
            format!("{}/v3/contacts", server.uri()),
            access_token.map(String::from),
        );
        let auth_service: auth::Service = Arc::new(AuthServiceImpl::new(
            &idp,
            http.clone(),
            Arc::new(InMemoryStateStore::default()),
        ));

        ContactServiceImpl::new(&crm, &idp, http, auth_service)
    }

    async fn mock_refresh(server: &MockServer, status: u16, times: u64) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "access_token": "access-2",
                "refresh_token": "refresh-2",
                "expires_in": 86400,
                "token_type": "Bearer"
            })))
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn should_relay_with_configured_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/contacts"))
            .and(bearer_token("access-1"))
            .and(body_partial_json(json!({
                "email_address": {"address": "jora@example.com"}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"contact_id": "c-1"})))
            .expect(1)
            .mount(&server)
            .await;
        mock_refresh(&server, 200, 0).await;
        let service = service(&server, idp_config(&server), Some("access-1"));

        let actual = service.relay(Submission::new("jora@example.com")).await.unwrap();

        assert!(actual.success);
        assert_eq!(actual.status, 201);
        assert_eq!(actual.data, json!({"contact_id": "c-1"}));
    }

    #[tokio::test]
    async fn should_retry_once_after_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/contacts"))
            .and(bearer_token("access-1"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!([{"error_key": "unauthorized"}])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v3/contacts"))
            .and(bearer_token("access-2"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"contact_id": "c-1"})))
            .expect(1)
            .mount(&server)
            .await;
        mock_refresh(&server, 200, 1).await;
        let service = service(&server, idp_config(&server), Some("access-1"));

        let actual = service.relay(Submission::new("jora@example.com")).await.unwrap();

        assert!(actual.success);
        assert_eq!(actual.status, 201);
    }

    #[tokio::test]
    async fn should_return_retry_outcome_even_when_unauthorized_again() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/contacts"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .expect(2)
            .mount(&server)
            .await;
        mock_refresh(&server, 200, 1).await;
        let service = service(&server, idp_config(&server), Some("access-1"));

        let actual = service.relay(Submission::new("jora@example.com")).await.unwrap();

        assert!(!actual.success);
        assert_eq!(actual.status, 401);
        assert_eq!(actual.data, json!("unauthorized"));
    }

    #[tokio::test]
    async fn should_fail_without_retry_when_refresh_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/contacts"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        mock_refresh(&server, 400, 1).await;
        let service = service(&server, idp_config(&server), Some("access-1"));

        let actual = service.relay(Submission::new("jora@example.com")).await;

        assert!(matches!(actual, Err(Error::AuthorizationFailed)));
    }

    #[tokio::test]
    async fn should_fail_without_retry_when_refresh_token_is_missing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/contacts"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        mock_refresh(&server, 200, 0).await;
        let idp = idp::Config::new(
            Some("client-id".into()),
            Some("client-secret".into()),
            None,
            format!("{}/authorize", server.uri()),
            format!("{}/token", server.uri()),
            "http://localhost:8000/auth/callback",
        );
        let service = service(&server, idp, Some("access-1"));

        let actual = service.relay(Submission::new("jora@example.com")).await;

        assert!(matches!(actual, Err(Error::AuthorizationFailed)));
    }

    #[tokio::test]
    async fn should_pass_through_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/contacts"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!([{"error_key": "http.conflict"}])),
            )
            .expect(1)
            .mount(&server)
            .await;
        let service = service(&server, idp_config(&server), Some("access-1"));

        let actual = service.relay(Submission::new("jora@example.com")).await.unwrap();

        assert!(!actual.success);
        assert_eq!(actual.status, 409);
        assert_eq!(actual.data, json!([{"error_key": "http.conflict"}]));
    }

    #[tokio::test]
    async fn should_reject_missing_email_without_calling_crm() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;
        let service = service(&server, idp_config(&server), Some("access-1"));

        let actual = service.relay(Submission::default()).await;

        assert!(matches!(actual, Err(Error::MissingEmail)));
    }

    #[tokio::test]
    async fn should_require_access_token() {
        let server = MockServer::start().await;
        let service = service(&server, idp_config(&server), None);

        let actual = service.relay(Submission::new("jora@example.com")).await;

        assert!(matches!(
            actual,
            Err(Error::_Integration(integration::Error::NotConfigured(
                "CRM_ACCESS_TOKEN"
            )))
        ));
    }

    #[tokio::test]
    async fn should_require_client_credentials() {
        let server = MockServer::start().await;
        let idp = idp::Config::new(
            Some("client-id".into()),
            None,
            Some("refresh-1".into()),
            format!("{}/authorize", server.uri()),
            format!("{}/token", server.uri()),
            "http://localhost:8000/auth/callback",
        );
        let service = service(&server, idp, Some("access-1"));

        let actual = service.relay(Submission::new("jora@example.com")).await;

        assert!(matches!(
            actual,
            Err(Error::_Integration(integration::Error::NotConfigured(
                "CRM_CLIENT_SECRET"
            )))
        ));
    }
}
