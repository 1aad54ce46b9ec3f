use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use oauth2::{
    AsyncHttpClient, AuthType, AuthUrl, ClientId, ClientSecret, EmptyExtraTokenFields,
    EndpointNotSet, EndpointSet, HttpClientError, HttpRequest, HttpResponse, RedirectUrl,
    StandardRevocableToken, StandardTokenResponse, TokenType, TokenUrl,
    basic::{BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse},
};
use serde::{Deserialize, Serialize};

use super::var;
use crate::auth;
use crate::{Raw, integration};

const AUTH_URL: &str = "https://authz.constantcontact.com/oauth2/default/v1/authorize";
const TOKEN_URL: &str = "https://authz.constantcontact.com/oauth2/default/v1/token";
const REDIRECT_URL: &str = "http://localhost:8000/auth/callback";

pub const SCOPES: [&str; 2] = ["contact_data", "offline_access"];

#[derive(Clone)]
pub struct Config {
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
    auth_url: String,
    token_url: String,
    redirect_url: String,
}

impl Config {
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        refresh_token: Option<String>,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            refresh_token,
            auth_url: auth_url.into(),
            token_url: token_url.into(),
            redirect_url: redirect_url.into(),
        }
    }

    pub fn env() -> Self {
        Self::new(
            var("CRM_CLIENT_ID"),
            var("CRM_CLIENT_SECRET"),
            var("CRM_REFRESH_TOKEN"),
            var("CRM_AUTH_URL").unwrap_or_else(|| AUTH_URL.into()),
            var("CRM_TOKEN_URL").unwrap_or_else(|| TOKEN_URL.into()),
            var("CRM_REDIRECT_URL").unwrap_or_else(|| REDIRECT_URL.into()),
        )
    }

    pub fn client_id(&self) -> super::Result<&str> {
        self.client_id
            .as_deref()
            .ok_or(integration::Error::NotConfigured("CRM_CLIENT_ID"))
    }

    pub fn client_secret(&self) -> super::Result<&str> {
        self.client_secret
            .as_deref()
            .ok_or(integration::Error::NotConfigured("CRM_CLIENT_SECRET"))
    }

    pub fn refresh_token(&self) -> super::Result<&str> {
        self.refresh_token
            .as_deref()
            .ok_or(integration::Error::NotConfigured("CRM_REFRESH_TOKEN"))
    }

    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }
}

/// Token type exactly as the provider spelled it.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RawTokenType(String);

impl TokenType for RawTokenType {}

impl AsRef<str> for RawTokenType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub type TokenResponse = StandardTokenResponse<EmptyExtraTokenFields, RawTokenType>;

pub type OAuth2Client<
    HasAuthUrl = EndpointSet,
    HasDeviceAuthUrl = EndpointNotSet,
    HasIntrospectionUrl = EndpointNotSet,
    HasRevocationUrl = EndpointNotSet,
    HasTokenUrl = EndpointSet,
> = oauth2::Client<
    BasicErrorResponse,
    TokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    HasAuthUrl,
    HasDeviceAuthUrl,
    HasIntrospectionUrl,
    HasRevocationUrl,
    HasTokenUrl,
>;

type UnsetClient =
    OAuth2Client<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet>;

impl Config {
    /// Builds a client from the current settings. The secret is optional so
    /// that the authorize redirect works with a client id alone.
    pub fn init_client(&self) -> super::Result<OAuth2Client> {
        let client = UnsetClient::new(ClientId::new(self.client_id()?.to_owned()))
            .set_auth_uri(AuthUrl::new(self.auth_url.clone())?)
            .set_auth_type(AuthType::BasicAuth)
            .set_token_uri(TokenUrl::new(self.token_url.clone())?)
            .set_redirect_uri(RedirectUrl::new(self.redirect_url.clone())?);

        let client = match &self.client_secret {
            Some(secret) => client.set_client_secret(ClientSecret::new(secret.clone())),
            None => client,
        };

        Ok(client)
    }
}

type TokenFuture<'c> = Pin<
    Box<dyn Future<Output = Result<HttpResponse, HttpClientError<reqwest::Error>>> + Send + Sync + 'c>,
>;

/// Token endpoint client that keeps the body of the last rejected call, so
/// provider errors can be reported byte for byte.
pub struct TokenHttpClient<'a> {
    http: &'a reqwest::Client,
    rejected: Mutex<Option<String>>,
}

impl<'a> TokenHttpClient<'a> {
    pub fn new(http: &'a reqwest::Client) -> Self {
        Self {
            http,
            rejected: Mutex::new(None),
        }
    }

    pub fn rejected_body(&self) -> Option<String> {
        self.rejected.lock().ok().and_then(|mut b| b.take())
    }
}

impl<'c> AsyncHttpClient<'c> for TokenHttpClient<'_> {
    type Error = HttpClientError<reqwest::Error>;
    type Future = TokenFuture<'c>;

    fn call(&'c self, request: HttpRequest) -> Self::Future {
        Box::pin(async move {
            let response = AsyncHttpClient::call(self.http, request).await?;

            if !response.status().is_success() {
                let body = String::from_utf8_lossy(response.body()).into_owned();
                if let Ok(mut rejected) = self.rejected.lock() {
                    *rejected = Some(body);
                }
            }

            Ok(response)
        })
    }
}

impl From<auth::Code> for oauth2::AuthorizationCode {
    fn from(c: auth::Code) -> Self {
        oauth2::AuthorizationCode::new(c.raw().to_string())
    }
}

impl From<oauth2::CsrfToken> for auth::Csrf {
    fn from(csrf: oauth2::CsrfToken) -> Self {
        Self::new(csrf.into_secret())
    }
}
