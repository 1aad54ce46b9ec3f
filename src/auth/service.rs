use std::error::Error as StdError;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use oauth2::basic::BasicErrorResponse;
use oauth2::{CsrfToken, RefreshToken, RequestTokenError, Scope, TokenResponse};

use super::{Code, Csrf, StateStore, TokenSet};
use crate::integration::idp::{self, TokenHttpClient};

#[async_trait]
pub trait AuthService {
    /// Returns the provider authorization URL and the state bound to it.
    async fn authorize(&self) -> super::Result<(String, Csrf)>;

    /// Verifies the state round-trip and exchanges the code for tokens.
    /// `issued` is the state kept for the caller, `returned` the one the
    /// provider sent back.
    async fn exchange_code(
        &self,
        code: Option<Code>,
        issued: Option<Csrf>,
        returned: Option<Csrf>,
    ) -> super::Result<TokenSet>;

    async fn refresh(&self) -> super::Result<TokenSet>;

    /// Consumes the issued state of a callback that will not be exchanged.
    async fn discard(&self, issued: Option<Csrf>);
}

#[derive(Clone)]
pub struct AuthServiceImpl {
    cfg: Arc<idp::Config>,
    http: reqwest::Client,
    states: StateStore,
}

impl AuthServiceImpl {
    pub fn new(cfg: &idp::Config, http: reqwest::Client, states: StateStore) -> Self {
        Self {
            cfg: Arc::new(cfg.to_owned()),
            http,
            states,
        }
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn authorize(&self) -> super::Result<(String, Csrf)> {
        let (auth_url, csrf) = self
            .cfg
            .init_client()?
            .authorize_url(CsrfToken::new_random)
            .add_scopes(idp::SCOPES.map(|s| Scope::new(s.to_string())))
            .url();

        let csrf = Csrf::from(csrf);
        self.states.put(&csrf).await;

        Ok((auth_url.to_string(), csrf))
    }

    async fn exchange_code(
        &self,
        code: Option<Code>,
        issued: Option<Csrf>,
        returned: Option<Csrf>,
    ) -> super::Result<TokenSet> {
        self.validate_state(issued, returned).await?;

        let code = code.ok_or(super::Error::MissingCode)?;
        self.cfg.client_secret()?;

        debug!("Exchanging {code:?} for token");

        let http = TokenHttpClient::new(&self.http);
        let token = self
            .cfg
            .init_client()?
            .exchange_code(code.into())
            .request_async(&http)
            .await
            .map_err(|e| token_error(e, http.rejected_body()))?;

        info!("Authorization code exchanged");
        Ok(TokenSet::from(&token))
    }

    async fn refresh(&self) -> super::Result<TokenSet> {
        let refresh_token = RefreshToken::new(self.cfg.refresh_token()?.to_owned());
        self.cfg.client_secret()?;

        let http = TokenHttpClient::new(&self.http);
        let token = self
            .cfg
            .init_client()?
            .exchange_refresh_token(&refresh_token)
            .request_async(&http)
            .await
            .map_err(|e| token_error(e, http.rejected_body()))?;

        if token.refresh_token().is_some() {
            debug!("Provider rotated the refresh token, keeping the configured one");
        }

        info!("Access token refreshed");
        Ok(TokenSet::from(&token))
    }

    async fn discard(&self, issued: Option<Csrf>) {
        if let Some(csrf) = issued {
            self.states.take(&csrf).await;
            debug!("Discarded {csrf:?}");
        }
    }
}

impl AuthServiceImpl {
    async fn validate_state(
        &self,
        issued: Option<Csrf>,
        returned: Option<Csrf>,
    ) -> super::Result<()> {
        // consumed whatever the outcome
        let live = match &issued {
            Some(csrf) => self.states.take(csrf).await,
            None => false,
        };

        match (issued, returned) {
            (Some(issued), Some(returned)) if live && issued == returned => Ok(()),
            (issued, returned) => {
                warn!(
                    "Rejecting callback, possible forgery attempt: issued {issued:?}, returned {returned:?}, live {live}"
                );
                Err(super::Error::InvalidState)
            }
        }
    }
}

/// Maps a failed token call, preferring the body the provider actually sent.
fn token_error<RE>(
    e: RequestTokenError<RE, BasicErrorResponse>,
    rejected: Option<String>,
) -> super::Error
where
    RE: StdError + 'static,
{
    match e {
        RequestTokenError::ServerResponse(r) => super::Error::TokenEndpoint(
            rejected.unwrap_or_else(|| serde_json::to_string(&r).unwrap_or_else(|_| r.to_string())),
        ),
        RequestTokenError::Parse(_, body) => {
            super::Error::TokenEndpoint(String::from_utf8_lossy(&body).into_owned())
        }
        RequestTokenError::Other(reason) => {
            super::Error::TokenEndpoint(rejected.unwrap_or(reason))
        }
        RequestTokenError::Request(e) => super::Error::Unexpected(e.to_string()),
    }
}
