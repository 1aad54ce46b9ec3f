use super::var;
use crate::integration;

const CONTACTS_URL: &str = "https://api.cc.email/v3/contacts";

#[derive(Clone)]
pub struct Config {
    contacts_url: String,
    access_token: Option<String>,
}

impl Config {
    pub fn new(contacts_url: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            contacts_url: contacts_url.into(),
            access_token,
        }
    }

    pub fn env() -> Self {
        Self::new(
            var("CRM_CONTACTS_URL").unwrap_or_else(|| CONTACTS_URL.into()),
            var("CRM_ACCESS_TOKEN"),
        )
    }

    pub fn contacts_url(&self) -> &str {
        &self.contacts_url
    }

    pub fn access_token(&self) -> super::Result<&str> {
        self.access_token
            .as_deref()
            .ok_or(integration::Error::NotConfigured("CRM_ACCESS_TOKEN"))
    }
}
