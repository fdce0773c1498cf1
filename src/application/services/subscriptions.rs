//! Entitlements and subscription pools

use std::sync::Arc;

use tracing::instrument;

use crate::application::ApplicationResult;
use crate::domain::{Entitlement, Pool, PoolFilter, UnsubscribeTarget};
use crate::infrastructure::traits::ServerApi;

pub struct SubscriptionService {
    api: Arc<dyn ServerApi>,
}

impl SubscriptionService {
    pub fn new(api: Arc<dyn ServerApi>) -> Self {
        Self { api }
    }

    #[instrument(skip(self))]
    pub fn subscribe(&self, uuid: &str, pool: &str, quantity: u32) -> ApplicationResult<()> {
        Ok(self.api.subscribe(uuid, pool, quantity)?)
    }

    pub fn current(&self, uuid: &str) -> ApplicationResult<Vec<Entitlement>> {
        Ok(self.api.subscriptions(uuid)?.entitlements)
    }

    pub fn available(&self, uuid: &str, filter: PoolFilter) -> ApplicationResult<Vec<Pool>> {
        Ok(self.api.available_pools(uuid, filter)?.pools)
    }

    #[instrument(skip(self))]
    pub fn unsubscribe(&self, uuid: &str, target: &UnsubscribeTarget) -> ApplicationResult<()> {
        Ok(self.api.unsubscribe(uuid, target)?)
    }
}
