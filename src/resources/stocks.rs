use crate::api::{ApiClient, ApiRequest};
use crate::error::ClientResult;
use crate::resources::cache::{QueryCache, QueryKey, Resource};
use crate::types::{Paginated, StockHolding, StockPayload, StockUpdate};

pub const STOCKS_PATH: &str = "/stocks";

const INVALIDATES: &[Resource] = &[Resource::Stocks, Resource::Dashboard];

/// Stock positions
pub struct Stocks<'a> {
    client: &'a ApiClient,
    cache: &'a QueryCache,
    portfolio_id: Option<i64>,
}

impl<'a> Stocks<'a> {
    pub fn new(client: &'a ApiClient, cache: &'a QueryCache, portfolio_id: Option<i64>) -> Self {
        Self {
            client,
            cache,
            portfolio_id,
        }
    }

    pub fn key(&self) -> QueryKey {
        QueryKey::new(Resource::Stocks, self.portfolio_id)
    }

    pub async fn list(&self) -> ClientResult<Paginated<StockHolding>> {
        let mut request = ApiRequest::get(STOCKS_PATH);
        if let Some(portfolio_id) = self.portfolio_id {
            request = request.query("portfolio_id", portfolio_id);
        }

        self.cache
            .query(self.key(), || self.client.send_json(request))
            .await
    }

    pub async fn get(&self, id: i64) -> ClientResult<StockHolding> {
        self.client.get(&format!("{}/{}", STOCKS_PATH, id)).await
    }

    pub async fn create(&self, payload: &StockPayload) -> ClientResult<StockHolding> {
        let holding = self.client.post(STOCKS_PATH, payload).await?;
        self.cache.invalidate_all(INVALIDATES);
        Ok(holding)
    }

    pub async fn update(&self, id: i64, update: &StockUpdate) -> ClientResult<StockHolding> {
        let holding = self
            .client
            .put(&format!("{}/{}", STOCKS_PATH, id), update)
            .await?;
        self.cache.invalidate_all(INVALIDATES);
        Ok(holding)
    }

    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        self.client
            .delete(&format!("{}/{}", STOCKS_PATH, id))
            .await?;
        self.cache.invalidate_all(INVALIDATES);
        Ok(())
    }
}
