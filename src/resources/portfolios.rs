use crate::api::ApiClient;
use crate::error::ClientResult;
use crate::resources::cache::{QueryCache, QueryKey, Resource};
use crate::types::{Paginated, Portfolio, PortfolioPayload, PortfolioUpdate};

pub const PORTFOLIOS_PATH: &str = "/portfolios";

// Portfolio names feed no dashboard aggregate
const INVALIDATES: &[Resource] = &[Resource::Portfolios];

pub struct Portfolios<'a> {
    client: &'a ApiClient,
    cache: &'a QueryCache,
}

impl<'a> Portfolios<'a> {
    pub fn new(client: &'a ApiClient, cache: &'a QueryCache) -> Self {
        Self { client, cache }
    }

    pub fn key() -> QueryKey {
        QueryKey::all(Resource::Portfolios)
    }

    pub async fn list(&self) -> ClientResult<Paginated<Portfolio>> {
        self.cache
            .query(Self::key(), || self.client.get(PORTFOLIOS_PATH))
            .await
    }

    pub async fn get(&self, id: i64) -> ClientResult<Portfolio> {
        self.client.get(&format!("{}/{}", PORTFOLIOS_PATH, id)).await
    }

    pub async fn create(&self, name: &str) -> ClientResult<Portfolio> {
        let payload = PortfolioPayload {
            name: name.to_string(),
        };
        let portfolio = self.client.post(PORTFOLIOS_PATH, &payload).await?;
        self.cache.invalidate_all(INVALIDATES);
        Ok(portfolio)
    }

    pub async fn update(&self, id: i64, update: &PortfolioUpdate) -> ClientResult<Portfolio> {
        let portfolio = self
            .client
            .put(&format!("{}/{}", PORTFOLIOS_PATH, id), update)
            .await?;
        self.cache.invalidate_all(INVALIDATES);
        Ok(portfolio)
    }

    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        self.client
            .delete(&format!("{}/{}", PORTFOLIOS_PATH, id))
            .await?;
        self.cache.invalidate_all(INVALIDATES);
        Ok(())
    }
}
