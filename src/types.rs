/// Wire types shared by the session layer, the API client and the resources.
/// Domain records are passed through as the server sends them; valuation
/// and cashflow fields are computed server-side.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Profile of the signed-in user, cached beside the tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Response of `/auth/login` and `/auth/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

// Portfolios

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioPayload {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// Properties

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    pub portfolio_id: i64,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(default)]
    pub purchase_price: f64,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default = "default_valuation_method")]
    pub valuation_method: String,
    #[serde(default)]
    pub last_valuation: f64,
    #[serde(default, with = "timestamp::option")]
    pub last_valuation_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub monthly_rent: f64,
    #[serde(default)]
    pub monthly_operating_expenses: f64,
    #[serde(default)]
    pub monthly_mortgage: f64,
    #[serde(default)]
    pub mortgage_balance: f64,
    #[serde(default)]
    pub bedrooms: f64,
    #[serde(default)]
    pub bathrooms: f64,
    #[serde(default)]
    pub living_area_sqft: f64,
    #[serde(default)]
    pub year_built: Option<i32>,
    #[serde(default, with = "timestamp::option")]
    pub rc_last_checked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rc_confidence: f64,
    #[serde(default)]
    pub rc_source_id: Option<String>,
}

fn default_valuation_method() -> String {
    "manual".to_string()
}

/// Body of `POST /properties`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyPayload {
    pub portfolio_id: i64,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub purchase_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_valuation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_rent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_operating_expenses: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_mortgage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mortgage_balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub living_area_sqft: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
}

/// Partial update; absent fields are left untouched by the server
pub type PropertyUpdate = Map<String, Value>;

// Stocks

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockHolding {
    pub id: i64,
    pub portfolio_id: i64,
    pub symbol: String,
    #[serde(default)]
    pub shares: f64,
    #[serde(default)]
    pub average_cost: f64,
    #[serde(default)]
    pub last_price: f64,
    #[serde(default, with = "timestamp::option")]
    pub last_price_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl StockHolding {
    pub fn market_value(&self) -> f64 {
        self.shares * self.last_price
    }
}

/// Body of `POST /stocks`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockPayload {
    pub portfolio_id: i64,
    pub symbol: String,
    pub shares: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

pub type StockUpdate = Map<String, Value>;

// Dashboard

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardAllocation {
    pub stocks_value: f64,
    pub properties_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    #[serde(with = "timestamp")]
    pub as_of: DateTime<Utc>,
    pub net_worth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_net_worth: f64,
    pub liquid_cashflow_monthly: f64,
    pub property_count: i64,
    pub stock_count: i64,
    pub allocation: DashboardAllocation,
    #[serde(default)]
    pub timeline: Vec<TimelinePoint>,
}

/// RentCast lookup, forwarded untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentCastPreview {
    #[serde(default)]
    pub details: Map<String, Value>,
    #[serde(default)]
    pub estimate: Map<String, Value>,
    #[serde(default)]
    pub comps: Vec<Value>,
}

/// Timestamps arrive either as RFC 3339 or as naive ISO 8601 (treated as UTC)
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw))),
                None => Ok(None),
            }
        }
    }
}
