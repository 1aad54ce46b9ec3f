use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use log::{debug, error, info};
use url::Url;

use super::model::{Outcome, Payload, Submission};
use crate::integration::webhook;

#[async_trait]
pub trait SubscriptionService {
    /// Posts one webhook call per list membership and tallies the results.
    async fn relay(&self, s: Submission) -> super::Result<Outcome>;
}

#[derive(Clone)]
pub struct SubscriptionServiceImpl {
    cfg: Arc<webhook::Config>,
    http: reqwest::Client,
}

impl SubscriptionServiceImpl {
    pub fn new(cfg: &webhook::Config, http: reqwest::Client) -> Self {
        Self {
            cfg: Arc::new(cfg.to_owned()),
            http,
        }
    }
}

#[async_trait]
impl SubscriptionService for SubscriptionServiceImpl {
    async fn relay(&self, s: Submission) -> super::Result<Outcome> {
        let url = self.cfg.url()?;

        if s.list_memberships.is_empty() {
            return Err(super::Error::NoListMemberships);
        }

        let total = s.list_memberships.len();
        debug!("Fanning out subscription to {total} list(s)");

        let requests = s
            .list_memberships
            .iter()
            .map(|list_id| self.deliver(url, list_id, s.payload(list_id)));

        let delivered = try_join_all(requests).await?;
        let failed = delivered.iter().filter(|ok| !**ok).count();

        info!("Subscription fan-out finished: {} of {total} delivered", total - failed);
        Ok(Outcome::tally(failed, total))
    }
}

impl SubscriptionServiceImpl {
    async fn deliver(&self, url: &Url, list_id: &str, payload: Payload) -> reqwest::Result<bool> {
        let response = self.http.post(url.clone()).json(&payload).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }

        let body = response.text().await.unwrap_or_default();
        error!("Failed request for list {list_id}: {status} {body}");
        Ok(false)
    }
}
