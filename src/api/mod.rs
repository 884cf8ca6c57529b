//! HTTP surface: catalog browsing, cart management, stock reconciliation,
//! checkout initiation and order history.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use validator::Validate;

use crate::catalog::{Catalog, CatalogQuery, StockSource};
use crate::checkout::{checkout_gate, CheckoutGateway};
use crate::domain::aggregates::cart::{Cart, CartLine};
use crate::domain::aggregates::order::Order;
use crate::domain::aggregates::product::{Product, Selection};
use crate::domain::stock::{is_low_stock, reconcile, CartStockReport, StockSnapshot, StockSync};
use crate::domain::value_objects::Money;
use crate::error::ServiceError;

type ApiResult<T> = Result<T, ServiceError>;

/// Per-session cart plus its stock-snapshot orchestration state.
struct Session {
    cart: Cart,
    stock: StockSync,
}

impl Session {
    fn new(session_id: &str) -> Self {
        Self { cart: Cart::for_session(session_id), stock: StockSync::new() }
    }
}

#[derive(Clone)]
pub struct AppState {
    catalog: Arc<Catalog>,
    stock_source: Arc<dyn StockSource>,
    gateway: Arc<dyn CheckoutGateway>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    orders: Arc<RwLock<Vec<Order>>>,
    order_seq: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(catalog: Arc<Catalog>, gateway: Arc<dyn CheckoutGateway>) -> Self {
        let stock_source: Arc<dyn StockSource> = catalog.clone();
        Self {
            catalog,
            stock_source,
            gateway,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            orders: Arc::new(RwLock::new(Vec::new())),
            order_seq: Arc::new(AtomicU64::new(1000)),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/:slug", get(get_product))
        .route("/api/v1/products/:slug/resolve", post(resolve_variant))
        .route("/api/v1/stock", get(stock_snapshot))
        .route("/api/v1/cart/:session", get(get_cart).post(add_line).delete(clear_cart))
        .route(
            "/api/v1/cart/:session/lines/:product_id",
            put(set_quantity).delete(remove_line),
        )
        .route("/api/v1/cart/:session/stock", get(cart_stock))
        .route("/api/v1/checkout/:session", post(checkout))
        .route("/api/v1/orders", get(list_orders))
        .route("/api/v1/orders/:id", get(get_order))
        .with_state(state)
}

/// Fetch a fresh snapshot for the session's cart. Runs after every cart
/// mutation: each fetch supersedes the previous one wholesale, and a stale
/// completion is discarded by the token check.
async fn refresh_stock(state: &AppState, session: &mut Session) {
    let ids: Vec<String> =
        session.cart.lines().iter().map(|l| l.product_id.clone()).collect();
    let token = session.stock.begin_fetch();
    match state.stock_source.fetch(&ids).await {
        Ok(snapshot) => {
            if !session.stock.complete(token, snapshot) {
                tracing::debug!(session = session.cart.session_id(), "stale stock fetch discarded");
            }
        }
        Err(err) => {
            session.stock.fail(token);
            tracing::warn!(error = %err, "stock snapshot fetch failed");
        }
    }
}

fn drain_cart_events(session: &mut Session) -> bool {
    let events = session.cart.take_events();
    for event in &events {
        tracing::debug!(?event, session = session.cart.session_id(), "cart event");
    }
    !events.is_empty()
}

// --- health ----------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": "storefront" }))
}

// --- catalog ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: u32,
}

async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<PaginatedResponse<Product>> {
    let query = CatalogQuery {
        page: params.page,
        per_page: params.per_page,
        category: params.category,
        search: params.search,
    };
    let page = state.catalog.list(&query);
    Json(PaginatedResponse {
        data: page.data.into_iter().cloned().collect(),
        total: page.total,
        page: page.page,
    })
}

async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Product>> {
    state
        .catalog
        .get_by_slug(&slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound("product".into()))
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    /// Option name -> chosen value, one entry per declared option.
    #[serde(default)]
    pub selection: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub code: Option<String>,
    pub price: Money,
    pub compare_at_price: Option<Money>,
    pub stock: u32,
    pub low_stock: bool,
    pub image: Option<String>,
}

async fn resolve_variant(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<ResolveRequest>,
) -> ApiResult<Json<ResolveResponse>> {
    let product = state
        .catalog
        .get_by_slug(&slug)
        .ok_or_else(|| ServiceError::NotFound("product".into()))?;
    let selection: Selection = req.selection.into_iter().collect();
    let selection =
        if selection.is_empty() { Selection::initial(product) } else { selection };
    let resolved = product.resolve_sku(&selection);
    Ok(Json(ResolveResponse {
        code: resolved.code.as_ref().map(|c| c.as_str().to_string()),
        compare_at_price: product.compare_at_price(&resolved),
        low_stock: is_low_stock(resolved.stock),
        price: resolved.price,
        stock: resolved.stock,
        image: resolved.image,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StockParams {
    /// Comma-separated product ids.
    pub ids: String,
}

async fn stock_snapshot(
    State(state): State<AppState>,
    Query(params): Query<StockParams>,
) -> ApiResult<Json<StockSnapshot>> {
    let ids: Vec<String> = params
        .ids
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    let snapshot = state.stock_source.fetch(&ids).await?;
    Ok(Json(snapshot))
}

// --- cart ------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub session_id: String,
    pub lines: Vec<CartLine>,
    pub total_items: u32,
    pub subtotal: Money,
}

fn cart_view(cart: &Cart) -> CartView {
    CartView {
        session_id: cart.session_id().to_string(),
        lines: cart.lines().to_vec(),
        total_items: cart.total_items(),
        subtotal: cart.subtotal(),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddLineRequest {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(range(min = 1))]
    pub quantity: u32,
    /// Variant choice; the resolved SKU fixes the captured price and image.
    /// Defaults to the product's initial selection.
    #[serde(default)]
    pub selection: BTreeMap<String, String>,
}

async fn get_cart(State(state): State<AppState>, Path(session): Path<String>) -> Json<CartView> {
    let mut sessions = state.sessions.write().await;
    let entry = sessions.entry(session.clone()).or_insert_with(|| Session::new(&session));
    Json(cart_view(&entry.cart))
}

async fn add_line(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(req): Json<AddLineRequest>,
) -> ApiResult<(StatusCode, Json<CartView>)> {
    req.validate()?;
    let product = state
        .catalog
        .get(&req.product_id)
        .ok_or_else(|| ServiceError::NotFound("product".into()))?;
    let selection: Selection = req.selection.into_iter().collect();
    let selection =
        if selection.is_empty() { Selection::initial(product) } else { selection };
    let resolved = product.resolve_sku(&selection);

    let mut sessions = state.sessions.write().await;
    let entry = sessions.entry(session.clone()).or_insert_with(|| Session::new(&session));
    entry.cart.add_line(CartLine {
        product_id: product.id.clone(),
        name: product.name.clone(),
        unit_price: resolved.price,
        quantity: req.quantity,
        image: resolved.image,
    })?;
    if drain_cart_events(entry) {
        refresh_stock(&state, entry).await;
    }
    Ok((StatusCode::CREATED, Json(cart_view(&entry.cart))))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetQuantityRequest {
    #[validate(range(min = 1))]
    pub quantity: u32,
}

async fn set_quantity(
    State(state): State<AppState>,
    Path((session, product_id)): Path<(String, String)>,
    Json(req): Json<SetQuantityRequest>,
) -> ApiResult<Json<CartView>> {
    req.validate()?;
    let mut sessions = state.sessions.write().await;
    let entry = sessions
        .get_mut(&session)
        .ok_or_else(|| ServiceError::NotFound("cart".into()))?;
    entry.cart.set_quantity(&product_id, req.quantity)?;
    if drain_cart_events(entry) {
        refresh_stock(&state, entry).await;
    }
    Ok(Json(cart_view(&entry.cart)))
}

async fn remove_line(
    State(state): State<AppState>,
    Path((session, product_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let mut sessions = state.sessions.write().await;
    let entry = sessions
        .get_mut(&session)
        .ok_or_else(|| ServiceError::NotFound("cart".into()))?;
    entry.cart.remove_line(&product_id)?;
    if drain_cart_events(entry) {
        refresh_stock(&state, entry).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_cart(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> ApiResult<StatusCode> {
    let mut sessions = state.sessions.write().await;
    if let Some(entry) = sessions.get_mut(&session) {
        entry.cart.clear();
        drain_cart_events(entry);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartStockResponse {
    #[serde(flatten)]
    pub report: CartStockReport,
    /// True while no snapshot has been installed for the session; absence
    /// of data is not confirmed availability.
    pub loading: bool,
}

async fn cart_stock(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Json<CartStockResponse> {
    let mut sessions = state.sessions.write().await;
    let entry = sessions.entry(session.clone()).or_insert_with(|| Session::new(&session));
    refresh_stock(&state, entry).await;
    let (report, loading) = match entry.stock.snapshot() {
        Some(snapshot) => (reconcile(entry.cart.lines(), snapshot), entry.stock.is_loading()),
        None => (reconcile(entry.cart.lines(), &StockSnapshot::new()), true),
    };
    Json(CartStockResponse { report, loading })
}

// --- checkout --------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    pub customer_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub url: String,
    pub order_id: String,
    pub order_number: u64,
}

async fn checkout(
    State(state): State<AppState>,
    Path(session): Path<String>,
    req: Option<Json<CheckoutRequest>>,
) -> ApiResult<Json<CheckoutResponse>> {
    let req = req.map(|Json(r)| r).unwrap_or_default();

    // Gate under the lock, then snapshot the lines and release it for the
    // provider call: a slow payment session must not block other sessions'
    // cart operations.
    let lines = {
        let mut sessions = state.sessions.write().await;
        let entry = sessions
            .get_mut(&session)
            .ok_or_else(|| ServiceError::NotFound("cart".into()))?;
        // Reconcile against a snapshot fetched just now; the gate is the
        // sole validation before the payment provider is invoked.
        refresh_stock(&state, entry).await;
        checkout_gate(&entry.cart, &entry.stock)?;
        entry.cart.lines().to_vec()
    };

    let checkout_session = state.gateway.create_checkout_session(&lines).await?;

    let customer = req.customer_id.unwrap_or_else(|| format!("guest-{session}"));
    let order_number = state.order_seq.fetch_add(1, Ordering::Relaxed);
    let mut order = Order::from_lines(order_number, customer, &lines)
        .map_err(|_| ServiceError::Checkout(crate::checkout::CheckoutError::EmptyCart))?;
    for event in order.take_events() {
        tracing::info!(?event, "order event");
    }

    {
        let mut sessions = state.sessions.write().await;
        if let Some(entry) = sessions.get_mut(&session) {
            entry.cart.clear();
            drain_cart_events(entry);
        }
    }

    let response = CheckoutResponse {
        success: true,
        url: checkout_session.url,
        order_id: order.id().to_string(),
        order_number,
    };
    state.orders.write().await.push(order);
    Ok(Json(response))
}

// --- orders ----------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct OrdersParams {
    pub customer: Option<String>,
}

async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<OrdersParams>,
) -> Json<Vec<Order>> {
    let orders = state.orders.read().await;
    let mut matching: Vec<Order> = orders
        .iter()
        .filter(|o| match &params.customer {
            Some(customer) => o.customer_id() == customer.as_str(),
            None => true,
        })
        .cloned()
        .collect();
    matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    Json(matching)
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Order>> {
    let orders = state.orders.read().await;
    orders
        .iter()
        .find(|o| o.id() == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound("order".into()))
}
