use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::service::AuthServiceImpl;
use crate::auth::state::InMemoryStateStore;
use crate::command::service::CommandServiceImpl;
use crate::contact::service::ContactServiceImpl;
use crate::integration;
use crate::subscription::service::SubscriptionServiceImpl;
use crate::{auth, command, contact, subscription};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth_service: auth::Service,
    pub contact_service: contact::Service,
    pub subscription_service: subscription::Service,
    pub command_service: command::Service,
}

impl AppState {
    pub fn init(cfg: &integration::Config) -> crate::Result<Self> {
        let http = integration::init_http_client()?;
        let states: auth::StateStore = Arc::new(InMemoryStateStore::default());

        let auth_service: auth::Service =
            Arc::new(AuthServiceImpl::new(&cfg.idp, http.clone(), states));
        let contact_service = Arc::new(ContactServiceImpl::new(
            &cfg.crm,
            &cfg.idp,
            http.clone(),
            auth_service.clone(),
        ));
        let subscription_service = Arc::new(SubscriptionServiceImpl::new(&cfg.webhook, http));
        let command_service = Arc::new(CommandServiceImpl::new(integration::init_relay_client()?));

        Ok(Self {
            auth_service,
            contact_service,
            subscription_service,
            command_service,
        })
    }
}
