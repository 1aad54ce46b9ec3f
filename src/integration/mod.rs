use std::env;
use std::fs::File;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use dotenv::dotenv;
use log::{LevelFilter, warn};
use simplelog::{ColorChoice, CombinedLogger, SharedLogger, TermLogger, TerminalMode, WriteLogger};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::error::respond;

pub mod crm;
pub mod idp;
pub mod webhook;

type Result<T> = std::result::Result<T, Error>;

const DEFAULT_ORIGIN: &str = "https://www.thestreetsmarts.org";
const DEFAULT_PORT: u16 = 8000;
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone, Debug, PartialEq)]
pub enum Env {
    Local,
    Dev,
    Stage,
    Production,
}

impl Env {
    pub fn addr(&self, port: u16) -> SocketAddr {
        match self {
            Env::Local => SocketAddr::from(([127, 0, 0, 1], port)),
            Env::Dev | Env::Stage | Env::Production => SocketAddr::from(([0, 0, 0, 0], port)),
        }
    }
}

impl FromStr for Env {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "local" => Ok(Env::Local),
            "dev" => Ok(Env::Dev),
            "stg" => Ok(Env::Stage),
            "prod" => Ok(Env::Production),
            _ => Err(format!("invalid environment: {s}")),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub env: Env,
    pub port: u16,
    pub allow_origins: Vec<HeaderValue>,

    pub idp: idp::Config,
    pub crm: crm::Config,
    pub webhook: webhook::Config,
}

impl Config {
    pub fn env() -> Self {
        dotenv().ok();

        let env = env::var("ENV")
            .ok()
            .and_then(|env| {
                env.parse()
                    .map_err(|e| warn!("{e}, falling back to local"))
                    .ok()
            })
            .unwrap_or(Env::Local);

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let allow_origins = env::var("ALLOW_ORIGIN")
            .unwrap_or_else(|_| DEFAULT_ORIGIN.into())
            .split(',')
            .map(str::trim)
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("Ignoring invalid ALLOW_ORIGIN value '{o}'");
                    None
                }
            })
            .collect::<Vec<_>>();

        Self {
            env,
            port,
            allow_origins,
            idp: idp::Config::env(),
            crm: crm::Config::env(),
            webhook: webhook::Config::env(),
        }
    }

    /// CORS policy of the endpoints called by the website forms.
    pub fn form_cors(&self) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CACHE_CONTROL,
            ])
            .max_age(PREFLIGHT_MAX_AGE);

        match self.env {
            Env::Local | Env::Dev => layer.allow_origin(AllowOrigin::any()),
            Env::Stage | Env::Production => layer
                .allow_origin(AllowOrigin::list(self.allow_origins.clone()))
                .allow_credentials(true),
        }
    }

    /// CORS policy of the command relay, open to any origin.
    pub fn open_cors() -> CorsLayer {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    }
}

pub fn init_logger() {
    dotenv().ok();

    let rust_log = env::var("RUST_LOG").unwrap_or("info".into());
    let level = LevelFilter::from_str(&rust_log).unwrap_or(LevelFilter::Info);
    let log_file = env::var("SERVICE_NAME")
        .map(|pkg| format!("{pkg}.log"))
        .unwrap_or("service.log".into());

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    match File::create(&log_file) {
        Ok(file) => loggers.push(WriteLogger::new(level, simplelog::Config::default(), file)),
        Err(e) => eprintln!("Failed to create log file {log_file}: {e}"),
    }

    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("Failed to initialize logger: {e}");
    }
}

pub fn init_http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(2))
        .timeout(Duration::from_secs(5))
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    Ok(client)
}

/// Client for the command relay, which follows redirects like a browser fetch.
pub fn init_relay_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(2))
        .timeout(Duration::from_secs(5))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?;

    Ok(client)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error(transparent)]
    _Url(#[from] url::ParseError),

    #[error(transparent)]
    _Reqwest(#[from] reqwest::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::NotConfigured(_) | Self::_Url(_) => respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                "configuration",
                self.to_string(),
            ),
            Self::_Reqwest(_) => respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                "unexpected",
                self.to_string(),
            ),
        }
    }
}

/// Reads an optional variable, treating blank values as absent.
fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
