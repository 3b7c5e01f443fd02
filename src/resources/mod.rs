pub mod cache;
pub mod dashboard;
pub mod portfolios;
pub mod properties;
pub mod stocks;

use std::sync::Arc;

use crate::api::ApiClient;

pub use cache::{QueryCache, QueryKey, Resource, Scope};
pub use dashboard::Dashboard;
pub use portfolios::Portfolios;
pub use properties::Properties;
pub use stocks::Stocks;

/// Entry point to the data-access layer: one query cache shared by every
/// resource handle. The cache is emptied whenever the session ends.
#[derive(Clone)]
pub struct Resources {
    client: ApiClient,
    cache: Arc<QueryCache>,
}

impl Resources {
    pub fn new(client: ApiClient) -> Self {
        let cache = QueryCache::new();
        cache.follow_session(client.session().generation());
        Self {
            client,
            cache: Arc::new(cache),
        }
    }

    fn synced(&self) -> &QueryCache {
        self.cache.follow_session(self.client.session().generation());
        &self.cache
    }

    pub fn cache(&self) -> &QueryCache {
        self.synced()
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn dashboard(&self) -> Dashboard<'_> {
        Dashboard::new(&self.client, self.synced())
    }

    pub fn portfolios(&self) -> Portfolios<'_> {
        Portfolios::new(&self.client, self.synced())
    }

    /// Properties, optionally restricted to one portfolio
    pub fn properties(&self, portfolio_id: Option<i64>) -> Properties<'_> {
        Properties::new(&self.client, self.synced(), portfolio_id)
    }

    /// Stock holdings, optionally restricted to one portfolio
    pub fn stocks(&self, portfolio_id: Option<i64>) -> Stocks<'_> {
        Stocks::new(&self.client, self.synced(), portfolio_id)
    }
}
