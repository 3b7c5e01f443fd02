use crate::api::{ApiClient, ApiRequest};
use crate::error::ClientResult;
use crate::resources::cache::{QueryCache, QueryKey, Resource};
use crate::types::{Paginated, Property, PropertyPayload, PropertyUpdate, RentCastPreview};

pub const PROPERTIES_PATH: &str = "/properties";
pub const RENTCAST_PREVIEW_PATH: &str = "/integrations/rentcast/preview";

// A property's value and cashflow feed both the dashboard and the parent
// portfolio's aggregates
const ON_WRITE: &[Resource] = &[Resource::Properties, Resource::Portfolios, Resource::Dashboard];
const ON_DELETE: &[Resource] = &[Resource::Properties, Resource::Dashboard];
const ON_RENTCAST_REFRESH: &[Resource] = &[Resource::Properties, Resource::Dashboard];

/// Real-estate holdings
pub struct Properties<'a> {
    client: &'a ApiClient,
    cache: &'a QueryCache,
    portfolio_id: Option<i64>,
}

impl<'a> Properties<'a> {
    pub fn new(client: &'a ApiClient, cache: &'a QueryCache, portfolio_id: Option<i64>) -> Self {
        Self {
            client,
            cache,
            portfolio_id,
        }
    }

    pub fn key(&self) -> QueryKey {
        QueryKey::new(Resource::Properties, self.portfolio_id)
    }

    pub async fn list(&self) -> ClientResult<Paginated<Property>> {
        let mut request = ApiRequest::get(PROPERTIES_PATH);
        if let Some(portfolio_id) = self.portfolio_id {
            request = request.query("portfolio_id", portfolio_id);
        }

        self.cache
            .query(self.key(), || self.client.send_json(request))
            .await
    }

    pub async fn get(&self, id: i64) -> ClientResult<Property> {
        self.client.get(&item_path(id)).await
    }

    pub async fn create(&self, payload: &PropertyPayload) -> ClientResult<Property> {
        let property = self.client.post(PROPERTIES_PATH, payload).await?;
        self.cache.invalidate_all(ON_WRITE);
        Ok(property)
    }

    pub async fn update(&self, id: i64, update: &PropertyUpdate) -> ClientResult<Property> {
        let property = self.client.put(&item_path(id), update).await?;
        self.cache.invalidate_all(ON_WRITE);
        Ok(property)
    }

    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        self.client.delete(&item_path(id)).await?;
        self.cache.invalidate_all(ON_DELETE);
        Ok(())
    }

    /// Ask the server to re-run the RentCast valuation for one property
    pub async fn refresh_rentcast(&self, id: i64) -> ClientResult<Property> {
        let request = ApiRequest::new(
            reqwest::Method::POST,
            format!("{}/refresh-rentcast", item_path(id)),
        );
        let property = self.client.send_json(request).await?;
        self.cache.invalidate_all(ON_RENTCAST_REFRESH);
        Ok(property)
    }

    /// RentCast lookup for an address that is not stored yet. Not cached.
    pub async fn preview_rentcast(&self, address: &str) -> ClientResult<RentCastPreview> {
        let request = ApiRequest::get(RENTCAST_PREVIEW_PATH).query("address", address);
        self.client.send_json(request).await
    }
}

fn item_path(id: i64) -> String {
    format!("{}/{}", PROPERTIES_PATH, id)
}
