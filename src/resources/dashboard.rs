use crate::api::ApiClient;
use crate::error::ClientResult;
use crate::resources::cache::{QueryCache, QueryKey, Resource};
use crate::types::DashboardSummary;

pub const DASHBOARD_PATH: &str = "/dashboard";

/// Net worth and cashflow summary, aggregated server-side
pub struct Dashboard<'a> {
    client: &'a ApiClient,
    cache: &'a QueryCache,
}

impl<'a> Dashboard<'a> {
    pub fn new(client: &'a ApiClient, cache: &'a QueryCache) -> Self {
        Self { client, cache }
    }

    pub fn key() -> QueryKey {
        QueryKey::all(Resource::Dashboard)
    }

    pub async fn summary(&self) -> ClientResult<DashboardSummary> {
        self.cache
            .query(Self::key(), || self.client.get(DASHBOARD_PATH))
            .await
    }
}
