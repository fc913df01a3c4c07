//! Integration tests for the StyleAura storefront engine.
//!
//! [`MockBackend`] is an in-process commerce backend served by axum on
//! `127.0.0.1:0`. Tests drive the real `reqwest`-based client against it and
//! inspect or tweak its state between calls.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p styleaura-integration-tests
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use styleaura_storefront::AppState;
use styleaura_storefront::config::StorefrontConfig;
use styleaura_storefront::session::{MemoryStorage, SessionStorage};

// =============================================================================
// Backend state
// =============================================================================

/// A registered account.
#[derive(Debug, Clone)]
pub struct Account {
    pub email: String,
    pub password: String,
    pub token: String,
    pub user: Value,
}

/// One cart line as the backend stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i64,
}

/// Everything the mock backend knows. Tests mutate it through
/// [`MockBackend::state`].
#[derive(Debug, Default)]
pub struct BackendState {
    pub products: Vec<Value>,
    /// Response body of the rating-average endpoint per product; a missing
    /// entry answers 404.
    pub ratings: HashMap<i64, Value>,
    /// Products whose rating endpoint answers 500.
    pub failing_ratings: HashSet<i64>,
    pub reviews: HashMap<i64, Vec<Value>>,
    /// Make the review endpoint answer 500.
    pub failing_reviews: bool,
    pub accounts: Vec<Account>,
    /// Tokens the backend no longer accepts.
    pub revoked_tokens: HashSet<String>,
    /// Cart per account email.
    pub carts: HashMap<String, Vec<CartLine>>,
    /// Delay applied to successive `GET /Cart/list` responses. The response
    /// body is taken when the request arrives, before the delay.
    pub list_delays: VecDeque<Duration>,
    /// Number of upcoming cart listings that answer 503.
    pub failing_cart_lists: u32,
    /// Number of upcoming cart additions that answer 503.
    pub failing_cart_adds: u32,
    /// Products whose cart addition answers 403.
    pub forbidden_products: HashSet<i64>,
    /// Make cart listings repeat their first line.
    pub duplicate_cart_lines: bool,
    /// Make auth endpoints answer 200 with a token but no user.
    pub incomplete_auth: bool,
    /// `METHOD /path` of every request received.
    pub requests: Vec<String>,
}

impl BackendState {
    /// A catalog, an admin, two shoppers and a few reviews.
    #[must_use]
    pub fn seeded() -> Self {
        let mut state = Self {
            products: vec![
                product(1, "Linen Kurta", Some("Fabindia"), json!(1499)),
                product(2, "Silk Saree", Some("Biba"), json!(4999.5)),
                product(3, "Cotton Dupatta", Some("Fabindia"), json!(399)),
                product(4, "Denim Jacket", None, json!(2499)),
                product(5, "Sample Scarf", Some("Biba"), json!("N/A")),
            ],
            ..Self::default()
        };
        state.ratings.insert(1, json!(4.5));
        state.ratings.insert(2, json!(3.0));
        state.ratings.insert(3, json!(4.0));
        state.reviews.insert(
            1,
            vec![
                review(11, 1, "Asha", 4, "Comfortable"),
                review(12, 1, "Ravi", 5, "Great fit"),
            ],
        );
        state.add_account("admin@styleaura.in", "admin123", "Store Admin", "Admin");
        state.add_account("asha@styleaura.in", "secret", "Asha Rao", "user");
        state.add_account("ravi@styleaura.in", "secret", "Ravi Kumar", "user");
        state
    }

    /// Register an account and return its token.
    pub fn add_account(&mut self, email: &str, password: &str, name: &str, role: &str) -> String {
        let id = self.accounts.len() + 1;
        let token = format!("token-{id}-{email}");
        let given = name.split_whitespace().next().unwrap_or(name);
        self.accounts.push(Account {
            email: email.to_string(),
            password: password.to_string(),
            token: token.clone(),
            user: json!({
                "userID": id,
                "email": email,
                "username": name,
                "name": given,
                "role": role,
            }),
        });
        token
    }

    fn account_by_token(&self, token: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.token == token)
    }

    fn product(&self, id: i64) -> Option<&Value> {
        self.products
            .iter()
            .find(|p| p.get("productID").and_then(Value::as_i64) == Some(id))
    }

    fn cart_json(&self, email: &str) -> Value {
        let lines = self.carts.get(email).map(Vec::as_slice).unwrap_or_default();
        Value::Array(
            lines
                .iter()
                .filter_map(|line| {
                    let product = self.product(line.product_id)?;
                    Some(json!({
                        "productID": line.product_id,
                        "productName": product["name"],
                        "price": product["price"],
                        "quantity": line.quantity,
                        "productImageUrl": product["imageURL"],
                    }))
                })
                .collect(),
        )
    }
}

/// Product JSON as the backend serves it.
#[must_use]
pub fn product(id: i64, name: &str, brand: Option<&str>, price: Value) -> Value {
    json!({
        "productID": id,
        "name": name,
        "description": format!("{name} description"),
        "price": price,
        "imageURL": format!("https://img.styleaura.in/{id}.jpg"),
        "brand": brand,
        "stockQuantity": 10,
        "categoryID": 1,
    })
}

/// Review JSON as the backend serves it.
#[must_use]
pub fn review(id: i64, product_id: i64, user: &str, stars: i64, text: &str) -> Value {
    json!({
        "ratingId": id,
        "productID": product_id,
        "userId": id * 10,
        "userName": user,
        "ratingValue": stars,
        "reviewText": text,
    })
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// MockBackend
// =============================================================================

/// A running mock backend. The server stops when this is dropped.
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Serve `state` on an ephemeral local port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start(state: BackendState) -> Self {
        let state = Arc::new(Mutex::new(state));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");

        let app = router(Arc::clone(&state));
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Start with [`BackendState::seeded`].
    pub async fn seeded() -> Self {
        Self::start(BackendState::seeded()).await
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Client configuration pointing at this backend with fast retries.
    ///
    /// # Panics
    ///
    /// Panics if the base URL is rejected.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        let mut config =
            StorefrontConfig::for_base_url(&self.base_url()).expect("Mock URL is valid");
        config.retry_backoff = Duration::from_millis(10);
        config.request_timeout = Duration::from_secs(5);
        config
    }

    /// Application state with an in-memory session.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn app(&self) -> AppState {
        self.app_with(self.config(), MemoryStorage::new())
    }

    /// Application state with the given configuration and storage.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn app_with(&self, config: StorefrontConfig, storage: impl SessionStorage) -> AppState {
        AppState::with_storage(config, storage).expect("Failed to build app state")
    }

    /// Lock the backend state for inspection or changes.
    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        lock(&self.state)
    }

    /// Number of requests received whose `METHOD /path` starts with `prefix`.
    #[must_use]
    pub fn request_count(&self, prefix: &str) -> usize {
        self.state()
            .requests
            .iter()
            .filter(|r| r.starts_with(prefix))
            .count()
    }

    #[must_use]
    pub fn total_requests(&self) -> usize {
        self.state().requests.len()
    }

    /// `(product_id, quantity)` of an account's cart in backend order.
    #[must_use]
    pub fn cart_of(&self, email: &str) -> Vec<(i64, i64)> {
        self.state()
            .carts
            .get(email)
            .map(|lines| lines.iter().map(|l| (l.product_id, l.quantity)).collect())
            .unwrap_or_default()
    }

    /// Token the backend issues for `email`.
    ///
    /// # Panics
    ///
    /// Panics if there is no such account.
    #[must_use]
    pub fn token_of(&self, email: &str) -> String {
        self.state()
            .accounts
            .iter()
            .find(|a| a.email == email)
            .map(|a| a.token.clone())
            .expect("Unknown account")
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Routes
// =============================================================================

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/Auth/login", post(login))
        .route("/api/Auth/register", post(register))
        .route("/api/GoogleAuth/login", post(google_login))
        .route("/api/Products/", get(products))
        .route("/api/Products/search", get(search_products))
        .route("/api/Products/AddProducts", post(add_product))
        .route("/api/Products/{id}", get(get_product).delete(delete_product))
        .route("/api/ProductRatings/product/{id}", get(reviews))
        .route("/api/ProductRatings/product/{id}/average", get(rating_average))
        .route("/api/Cart/list", get(cart_list))
        .route("/api/Cart/add", post(cart_add))
        .route("/api/Cart/{id}", delete(cart_remove).put(cart_update))
        .route("/api/Admin/{resource}", get(admin_list))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), record))
        .with_state(state)
}

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let line = format!(
        "{} {}",
        request.method(),
        request.uri().path().trim_start_matches("/api")
    );
    lock(&state).requests.push(line);
    next.run(request).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// Resolve the bearer token to an account email.
fn authorize(state: &BackendState, headers: &HeaderMap) -> Result<String, Response> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())?;
    if state.revoked_tokens.contains(token) {
        return Err(StatusCode::UNAUTHORIZED.into_response());
    }
    state
        .account_by_token(token)
        .map(|a| a.email.clone())
        .ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())
}

fn auth_body(state: &BackendState, account: &Account) -> Response {
    if state.incomplete_auth {
        return Json(json!({ "token": account.token })).into_response();
    }
    Json(json!({ "token": account.token, "user": account.user })).into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let state = lock(&state);
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match state
        .accounts
        .iter()
        .find(|a| a.email == email && a.password == password)
    {
        Some(account) => auth_body(&state, account),
        None => error(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    }
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if state.accounts.iter().any(|a| a.email == email) {
        return error(StatusCode::BAD_REQUEST, "Email is already registered.");
    }
    let name = format!(
        "{} {}",
        body["firstName"].as_str().unwrap_or_default(),
        body["lastName"].as_str().unwrap_or_default()
    );
    let password = body["password"].as_str().unwrap_or_default().to_string();
    state.add_account(&email, &password, &name, "user");
    let Some(account) = state.accounts.last().cloned() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    auth_body(&state, &account)
}

async fn google_login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let state = lock(&state);
    // ID tokens look like `google:<email>`
    let email = body["idToken"]
        .as_str()
        .and_then(|t| t.strip_prefix("google:"))
        .unwrap_or_default();
    match state.accounts.iter().find(|a| a.email == email) {
        Some(account) => auth_body(&state, account),
        None => (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid Google token" })))
            .into_response(),
    }
}

async fn products(State(state): State<Shared>) -> Response {
    Json(Value::Array(lock(&state).products.clone())).into_response()
}

async fn search_products(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let query = params.get("query").map(|q| q.to_lowercase()).unwrap_or_default();
    let matches: Vec<Value> = lock(&state)
        .products
        .iter()
        .filter(|p| {
            p["name"]
                .as_str()
                .is_some_and(|name| name.to_lowercase().contains(&query))
        })
        .cloned()
        .collect();
    Json(Value::Array(matches)).into_response()
}

async fn get_product(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    lock(&state).product(id).cloned().map_or_else(
        || error(StatusCode::NOT_FOUND, "Product not found"),
        |p| Json(p).into_response(),
    )
}

async fn add_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    let id = state
        .products
        .iter()
        .filter_map(|p| p["productID"].as_i64())
        .max()
        .unwrap_or(0)
        + 1;
    let mut product = body;
    product["productID"] = json!(id);
    state.products.push(product);
    StatusCode::CREATED.into_response()
}

async fn delete_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    let before = state.products.len();
    state
        .products
        .retain(|p| p["productID"].as_i64() != Some(id));
    if state.products.len() == before {
        return error(StatusCode::NOT_FOUND, "Product not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn rating_average(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let state = lock(&state);
    if state.failing_ratings.contains(&id) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    state.ratings.get(&id).cloned().map_or_else(
        || StatusCode::NOT_FOUND.into_response(),
        |r| Json(r).into_response(),
    )
}

async fn reviews(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let state = lock(&state);
    if state.failing_reviews {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(Value::Array(state.reviews.get(&id).cloned().unwrap_or_default())).into_response()
}

async fn cart_list(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let (body, delay) = {
        let mut state = lock(&state);
        if state.failing_cart_lists > 0 {
            state.failing_cart_lists -= 1;
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
        let email = match authorize(&state, &headers) {
            Ok(email) => email,
            Err(response) => return response,
        };
        let mut body = state.cart_json(&email);
        if state.duplicate_cart_lines
            && let Value::Array(lines) = &mut body
            && let Some(first) = lines.first().cloned()
        {
            lines.push(first);
        }
        (body, state.list_delays.pop_front())
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    Json(body).into_response()
}

async fn cart_add(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    if state.failing_cart_adds > 0 {
        state.failing_cart_adds -= 1;
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    let email = match authorize(&state, &headers) {
        Ok(email) => email,
        Err(response) => return response,
    };
    let product_id = body["productId"].as_i64().unwrap_or_default();
    let quantity = body["quantity"].as_i64().unwrap_or(1);
    if quantity < 1 {
        return error(StatusCode::BAD_REQUEST, "Quantity must be at least 1.");
    }
    if state.product(product_id).is_none() {
        return error(StatusCode::NOT_FOUND, "Product not found");
    }
    if state.forbidden_products.contains(&product_id) {
        return error(StatusCode::FORBIDDEN, "This product cannot be ordered.");
    }
    let lines = state.carts.entry(email).or_default();
    match lines.iter_mut().find(|l| l.product_id == product_id) {
        Some(line) => line.quantity += quantity,
        None => lines.push(CartLine {
            product_id,
            quantity,
        }),
    }
    StatusCode::OK.into_response()
}

async fn cart_update(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    let email = match authorize(&state, &headers) {
        Ok(email) => email,
        Err(response) => return response,
    };
    let quantity = body["quantity"].as_i64().unwrap_or_default();
    if quantity < 1 {
        return error(StatusCode::BAD_REQUEST, "Quantity must be at least 1.");
    }
    let line = state
        .carts
        .get_mut(&email)
        .and_then(|lines| lines.iter_mut().find(|l| l.product_id == id));
    match line {
        Some(line) => {
            line.quantity = quantity;
            StatusCode::OK.into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Item not in cart"),
    }
}

async fn cart_remove(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut state = lock(&state);
    let email = match authorize(&state, &headers) {
        Ok(email) => email,
        Err(response) => return response,
    };
    let lines = state.carts.entry(email).or_default();
    let before = lines.len();
    lines.retain(|l| l.product_id != id);
    if lines.len() == before {
        return error(StatusCode::NOT_FOUND, "Item not in cart");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn admin_list(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(resource): Path<String>,
) -> Response {
    let state = lock(&state);
    let email = match authorize(&state, &headers) {
        Ok(email) => email,
        Err(response) => return response,
    };
    let is_admin = state
        .accounts
        .iter()
        .find(|a| a.email == email)
        .and_then(|a| a.user["role"].as_str())
        .is_some_and(|role| role.eq_ignore_ascii_case("admin"));
    if !is_admin {
        return error(StatusCode::FORBIDDEN, "Admin access required.");
    }

    match resource.as_str() {
        "users" => Json(Value::Array(
            state
                .accounts
                .iter()
                .map(|a| {
                    let name = a.user["username"].as_str().unwrap_or_default();
                    let (first, last) = name.split_once(' ').unwrap_or((name, ""));
                    json!({
                        "userID": a.user["userID"],
                        "firstName": first,
                        "lastName": last,
                        "email": a.email,
                        "role": a.user["role"],
                    })
                })
                .collect(),
        ))
        .into_response(),
        "products" => Json(Value::Array(state.products.clone())).into_response(),
        _ => Json(json!({ "message": "Unknown resource" })).into_response(),
    }
}
