#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use atlas_client::config::ApiConfig;
use atlas_client::session::{MemoryStorage, Storage};
use atlas_client::{ApiClient, AuthController, Resources, Session};

pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "correct-horse";

/// Tokens the mock currently accepts
#[derive(Debug, Clone)]
struct Issued {
    access: String,
    refresh: String,
    user: Value,
}

/// Observable state of the mock Atlas API
#[derive(Default)]
pub struct MockState {
    pub refresh_calls: AtomicUsize,
    pub me_calls: AtomicUsize,
    pub portfolio_list_calls: AtomicUsize,
    pub property_list_calls: AtomicUsize,
    pub stock_list_calls: AtomicUsize,
    pub dashboard_calls: AtomicUsize,
    pub refresh_saw_bearer: AtomicBool,
    /// Reject every protected request, even with a valid token
    pub force_unauthorized: AtomicBool,
    /// Reject every refresh token
    pub reject_refresh: AtomicBool,
    pub refresh_delay_ms: AtomicUsize,
    pub last_list_query: Mutex<Option<HashMap<String, String>>>,
    pub last_preview_address: Mutex<Option<String>>,
    accounts: Mutex<HashMap<String, (i64, String)>>,
    issued: Mutex<Option<Issued>>,
    next_id: AtomicI64,
    portfolios: Mutex<Vec<Value>>,
    properties: Mutex<Vec<Value>>,
    stocks: Mutex<Vec<Value>>,
}

impl MockState {
    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Rotate the server-side access token so the one the client holds is rejected
    pub fn expire_access_token(&self) {
        if let Some(issued) = self.issued.lock().unwrap().as_mut() {
            issued.access = format!("access-{}", uuid::Uuid::new_v4());
        }
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn me_count(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }

    fn issue(&self, user: Value) -> Value {
        let issued = Issued {
            access: format!("access-{}", uuid::Uuid::new_v4()),
            refresh: format!("refresh-{}", uuid::Uuid::new_v4()),
            user,
        };
        let tokens = json!({
            "access_token": issued.access,
            "refresh_token": issued.refresh,
            "token_type": "bearer",
        });
        *self.issued.lock().unwrap() = Some(issued);
        tokens
    }
}

pub struct MockApi {
    pub base_url: String,
    pub state: Arc<MockState>,
}

/// Start an in-process Atlas API on a free port with one registered account
pub async fn spawn_mock_api() -> Result<MockApi> {
    let state = Arc::new(MockState::default());
    state.refresh_delay_ms.store(150, Ordering::SeqCst);
    state
        .accounts
        .lock()
        .unwrap()
        .insert(EMAIL.to_string(), (1, PASSWORD.to_string()));
    state.next_id.store(100, Ordering::SeqCst);

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind mock api")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let app = router(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(MockApi { base_url, state })
}

/// Client stack over in-memory storage, as the app wires it
pub struct Harness {
    pub storage: Arc<MemoryStorage>,
    pub session: Arc<Session>,
    pub client: ApiClient,
    pub auth: AuthController,
    pub resources: Resources,
}

impl Harness {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_storage(base_url, Arc::new(MemoryStorage::new()))
    }

    /// Same storage, fresh process: the reload case
    pub fn with_storage(base_url: &str, storage: Arc<MemoryStorage>) -> Result<Self> {
        let dyn_storage: Arc<dyn Storage> = storage.clone();
        let session = Arc::new(Session::new(dyn_storage));
        let client = ApiClient::new(&ApiConfig::with_base_url(base_url), session.clone())?;
        Ok(Self {
            storage,
            session,
            auth: AuthController::new(client.clone()),
            resources: Resources::new(client.clone()),
            client,
        })
    }

    pub async fn signed_in(base_url: &str) -> Result<Self> {
        let harness = Self::new(base_url)?;
        harness.auth.bootstrap().await;
        harness.auth.login(EMAIL, PASSWORD).await?;
        Ok(harness)
    }
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(me))
        .route("/dashboard", get(dashboard))
        .route("/portfolios", get(list_portfolios).post(create_portfolio))
        .route(
            "/portfolios/:id",
            get(get_portfolio).put(update_portfolio).delete(delete_portfolio),
        )
        .route("/properties", get(list_properties).post(create_property))
        .route(
            "/properties/:id",
            get(get_property).put(update_property).delete(delete_property),
        )
        .route("/properties/:id/refresh-rentcast", post(refresh_rentcast))
        .route("/stocks", get(list_stocks).post(create_stock))
        .route("/stocks/:id", get(get_stock).put(update_stock).delete(delete_stock))
        .route("/integrations/rentcast/preview", get(rentcast_preview))
        .with_state(state)
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn validation(field: &str, message: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "detail": [{ "loc": ["body", field], "msg": message, "type": "value_error" }]
        })),
    )
        .into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn authorize(state: &MockState, headers: &HeaderMap) -> Result<Value, Response> {
    let unauthorized = || detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    if state.force_unauthorized.load(Ordering::SeqCst) {
        return Err(unauthorized());
    }

    let issued = state.issued.lock().unwrap().clone();
    match (issued, bearer(headers)) {
        (Some(issued), Some(token)) if issued.access == token => Ok(issued.user),
        _ => Err(unauthorized()),
    }
}

fn page(items: Vec<Value>) -> Value {
    let total = items.len();
    json!({ "items": items, "total": total, "page": 1, "page_size": 50 })
}

fn scoped(items: &[Value], query: &HashMap<String, String>) -> Vec<Value> {
    let portfolio_id = query.get("portfolio_id").and_then(|id| id.parse::<i64>().ok());
    items
        .iter()
        .filter(|item| portfolio_id.map_or(true, |id| item["portfolio_id"] == json!(id)))
        .cloned()
        .collect()
}

fn find(items: &[Value], id: i64) -> Option<Value> {
    items.iter().find(|item| item["id"] == json!(id)).cloned()
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

// Auth

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_lowercase();
    let password = body["password"].as_str().unwrap_or_default();

    let account = state.accounts.lock().unwrap().get(&email).cloned();
    match account {
        Some((id, stored)) if stored == password => {
            let user = json!({ "id": id, "email": email, "created_at": "2024-01-02T03:04:05" });
            let tokens = state.issue(user.clone());
            Json(json!({ "user": user, "tokens": tokens })).into_response()
        }
        _ => detail(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn register(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_lowercase();
    let password = body["password"].as_str().unwrap_or_default().to_string();

    if password.len() < 8 {
        return validation("password", "String should have at least 8 characters");
    }
    if state.accounts.lock().unwrap().contains_key(&email) {
        return detail(StatusCode::BAD_REQUEST, "Account already exists for this email");
    }

    let id = state.next_id();
    state.accounts.lock().unwrap().insert(email.clone(), (id, password));
    let user = json!({ "id": id, "email": email, "created_at": "2024-06-01T12:00:00Z" });
    let tokens = state.issue(user.clone());
    (StatusCode::CREATED, Json(json!({ "user": user, "tokens": tokens }))).into_response()
}

async fn refresh(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if headers.contains_key(header::AUTHORIZATION) {
        state.refresh_saw_bearer.store(true, Ordering::SeqCst);
    }

    let delay = state.refresh_delay_ms.load(Ordering::SeqCst) as u64;
    tokio::time::sleep(Duration::from_millis(delay)).await;

    if state.reject_refresh.load(Ordering::SeqCst) {
        return detail(StatusCode::UNAUTHORIZED, "Invalid refresh token");
    }

    let presented = body["refresh_token"].as_str().unwrap_or_default();
    let issued = state.issued.lock().unwrap().clone();
    match issued {
        Some(issued) if issued.refresh == presented => Json(state.issue(issued.user)).into_response(),
        _ => detail(StatusCode::UNAUTHORIZED, "Invalid refresh token"),
    }
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.me_calls.fetch_add(1, Ordering::SeqCst);
    match authorize(&state, &headers) {
        Ok(user) => Json(user).into_response(),
        Err(rejected) => rejected,
    }
}

// Dashboard

async fn dashboard(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    state.dashboard_calls.fetch_add(1, Ordering::SeqCst);

    let properties = state.properties.lock().unwrap().clone();
    let stocks = state.stocks.lock().unwrap().clone();

    let properties_value: f64 = properties
        .iter()
        .map(|p| p["last_valuation"].as_f64().unwrap_or(0.0) - p["mortgage_balance"].as_f64().unwrap_or(0.0))
        .sum();
    let cashflow: f64 = properties
        .iter()
        .map(|p| {
            p["monthly_rent"].as_f64().unwrap_or(0.0)
                - p["monthly_operating_expenses"].as_f64().unwrap_or(0.0)
                - p["monthly_mortgage"].as_f64().unwrap_or(0.0)
        })
        .sum();
    let stocks_value: f64 = stocks
        .iter()
        .map(|s| s["shares"].as_f64().unwrap_or(0.0) * s["last_price"].as_f64().unwrap_or(0.0))
        .sum();

    Json(json!({
        "total_net_worth": properties_value + stocks_value,
        "liquid_cashflow_monthly": cashflow,
        "property_count": properties.len(),
        "stock_count": stocks.len(),
        "allocation": { "stocks_value": stocks_value, "properties_value": properties_value },
        "timeline": [{ "as_of": "2024-06-01T00:00:00", "net_worth": properties_value + stocks_value }],
    }))
    .into_response()
}

// Portfolios

async fn list_portfolios(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    state.portfolio_list_calls.fetch_add(1, Ordering::SeqCst);
    Json(page(state.portfolios.lock().unwrap().clone())).into_response()
}

async fn create_portfolio(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    let name = body["name"].as_str().unwrap_or_default().trim().to_string();
    if name.is_empty() {
        return validation("name", "String should have at least 1 character");
    }

    let portfolio = json!({ "id": state.next_id(), "name": name });
    state.portfolios.lock().unwrap().push(portfolio.clone());
    (StatusCode::CREATED, Json(portfolio)).into_response()
}

async fn get_portfolio(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    match find(&state.portfolios.lock().unwrap(), id) {
        Some(portfolio) => Json(portfolio).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Portfolio not found"),
    }
}

async fn update_portfolio(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    let mut portfolios = state.portfolios.lock().unwrap();
    match portfolios.iter_mut().find(|p| p["id"] == json!(id)) {
        Some(portfolio) => {
            merge(portfolio, &body);
            Json(portfolio.clone()).into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "Portfolio not found"),
    }
}

async fn delete_portfolio(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    state.portfolios.lock().unwrap().retain(|p| p["id"] != json!(id));
    StatusCode::NO_CONTENT.into_response()
}

// Properties

async fn list_properties(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    state.property_list_calls.fetch_add(1, Ordering::SeqCst);
    let items = scoped(&state.properties.lock().unwrap(), &query);
    *state.last_list_query.lock().unwrap() = Some(query);
    Json(page(items)).into_response()
}

async fn create_property(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    if body["purchase_price"].as_f64().unwrap_or(0.0) < 0.0 {
        return validation("purchase_price", "Input should be greater than or equal to 0");
    }

    let mut property = json!({
        "id": state.next_id(),
        "valuation_method": "manual",
        "last_valuation": body["purchase_price"].clone(),
        "rc_confidence": 0.0,
    });
    merge(&mut property, &body);
    state.properties.lock().unwrap().push(property.clone());
    (StatusCode::CREATED, Json(property)).into_response()
}

async fn get_property(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    match find(&state.properties.lock().unwrap(), id) {
        Some(property) => Json(property).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Property not found"),
    }
}

async fn update_property(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    let mut properties = state.properties.lock().unwrap();
    match properties.iter_mut().find(|p| p["id"] == json!(id)) {
        Some(property) => {
            merge(property, &body);
            Json(property.clone()).into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "Property not found"),
    }
}

async fn delete_property(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    state.properties.lock().unwrap().retain(|p| p["id"] != json!(id));
    StatusCode::NO_CONTENT.into_response()
}

async fn refresh_rentcast(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    let mut properties = state.properties.lock().unwrap();
    match properties.iter_mut().find(|p| p["id"] == json!(id)) {
        Some(property) => {
            merge(
                property,
                &json!({
                    "valuation_method": "rentcast",
                    "last_valuation": 412000.0,
                    "last_valuation_at": "2024-06-02T09:30:00",
                    "rc_last_checked_at": "2024-06-02T09:30:00",
                    "rc_confidence": 0.87,
                    "rc_source_id": "rc-123",
                }),
            );
            Json(property.clone()).into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "Property not found"),
    }
}

async fn rentcast_preview(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    let address = query.get("address").cloned().unwrap_or_default();
    *state.last_preview_address.lock().unwrap() = Some(address.clone());

    Json(json!({
        "details": { "formattedAddress": address, "bedrooms": 3, "bathrooms": 2 },
        "estimate": { "price": 410000, "rent": 2400 },
        "comps": [{ "price": 405000 }, { "price": 398000 }],
    }))
    .into_response()
}

// Stocks

async fn list_stocks(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    state.stock_list_calls.fetch_add(1, Ordering::SeqCst);
    let items = scoped(&state.stocks.lock().unwrap(), &query);
    *state.last_list_query.lock().unwrap() = Some(query);
    Json(page(items)).into_response()
}

async fn create_stock(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    if body["shares"].as_f64().unwrap_or(0.0) <= 0.0 {
        return validation("shares", "Input should be greater than 0");
    }

    let mut holding = json!({ "id": state.next_id(), "average_cost": 0.0, "last_price": 0.0 });
    merge(&mut holding, &body);
    state.stocks.lock().unwrap().push(holding.clone());
    (StatusCode::CREATED, Json(holding)).into_response()
}

async fn get_stock(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    match find(&state.stocks.lock().unwrap(), id) {
        Some(holding) => Json(holding).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Stock holding not found"),
    }
}

async fn update_stock(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    let mut stocks = state.stocks.lock().unwrap();
    match stocks.iter_mut().find(|s| s["id"] == json!(id)) {
        Some(holding) => {
            merge(holding, &body);
            Json(holding.clone()).into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "Stock holding not found"),
    }
}

async fn delete_stock(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    state.stocks.lock().unwrap().retain(|s| s["id"] != json!(id));
    StatusCode::NO_CONTENT.into_response()
}
