use log::warn;
use url::Url;

use super::var;
use crate::integration;

#[derive(Clone, Default)]
pub struct Config {
    url: Option<Url>,
}

impl Config {
    pub fn new(url: Option<Url>) -> Self {
        Self { url }
    }

    pub fn env() -> Self {
        let url = var("WEBHOOK_URL").and_then(|u| match Url::parse(&u) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Ignoring invalid WEBHOOK_URL: {e}");
                None
            }
        });

        Self::new(url)
    }

    pub fn url(&self) -> super::Result<&Url> {
        self.url
            .as_ref()
            .ok_or(integration::Error::NotConfigured("WEBHOOK_URL"))
    }
}
