// Inventory Ledger - Web Server
// REST API over the ledger core with Axum

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use inventory_ledger::{
    indexed_view, Config, Flow, Inventory, LedgerError, MovementRecord, ProductFilter,
    ProductName, ProductStock, Registration, SessionContext, Submission, Totals,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
struct AppState {
    inventory: Arc<Inventory>,
    /// Bearer token required on every /api route except health
    api_token: Option<String>,
}

impl AppState {
    /// Session for one request, derived from the Authorization header
    fn session(&self, headers: &HeaderMap) -> SessionContext {
        let Some(expected) = &self.api_token else {
            return SessionContext::authenticated("api");
        };

        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        match presented {
            Some(token) if token == expected => SessionContext::authenticated("api"),
            _ => SessionContext::anonymous(),
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Ledger errors rendered as an HTTP response
struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LedgerError::Unauthenticated => StatusCode::UNAUTHORIZED,
            LedgerError::IndexOutOfRange { .. } => StatusCode::NOT_FOUND,
            LedgerError::EmptyName => StatusCode::BAD_REQUEST,
            LedgerError::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            LedgerError::InvalidConfig { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }

        (status, Json(ApiResponse::<()>::err(self.0.to_string()))).into_response()
    }
}

type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::ok(data))))
}

// ============================================================================
// Request / Response types
// ============================================================================

#[derive(Deserialize)]
struct FilterQuery {
    /// Product name or ALL; missing means ALL
    #[serde(default)]
    product: Option<String>,
}

impl FilterQuery {
    fn filter(&self) -> ProductFilter {
        ProductFilter::parse(self.product.as_deref().unwrap_or_default())
    }
}

/// Ledger row with its insertion index (used by DELETE)
#[derive(Serialize)]
struct LedgerEntry {
    index: usize,
    #[serde(flatten)]
    record: MovementRecord,
}

#[derive(Serialize)]
struct StockResponse {
    filter: String,
    product_count: usize,
    totals: Totals,
    stock: Vec<ProductStock>,
}

#[derive(Deserialize)]
struct MovementBody {
    product: String,
    kind: Flow,
    quantity: f64,
    #[serde(default)]
    note: String,
}

#[derive(Deserialize)]
struct ProductBody {
    name: String,
}

#[derive(Serialize)]
struct ProductResponse {
    product: String,
    created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<MovementRecord>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/ledger?product= - Movements, most recent first
async fn get_ledger(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Vec<LedgerEntry>> {
    let view = state.inventory.refresh(&state.session(&headers))?;

    let entries = indexed_view(&view.ledger, &query.filter())
        .into_iter()
        .map(|(index, record)| LedgerEntry {
            index,
            record: record.clone(),
        })
        .collect();

    ok(entries)
}

/// GET /api/stock?product= - Totals and per-product stock
async fn get_stock(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FilterQuery>,
) -> ApiResult<StockResponse> {
    let view = state.inventory.refresh(&state.session(&headers))?;
    let filter = query.filter();

    let stock = view
        .stock
        .iter()
        .filter(|s| match &filter {
            ProductFilter::All => true,
            ProductFilter::Product(name) => &s.product == name,
        })
        .cloned()
        .collect();

    ok(StockResponse {
        filter: filter.label().to_string(),
        product_count: view.product_count(),
        totals: view.totals_for(&filter),
        stock,
    })
}

/// GET /api/products - Registered products, sorted
async fn get_products(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<ProductName>> {
    let view = state.inventory.refresh(&state.session(&headers))?;
    ok(view.products.into_iter().collect())
}

/// POST /api/movements - Record an entry or exit
async fn post_movement(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<MovementBody>,
) -> Result<Response, ApiError> {
    let inventory = &state.inventory;
    let outcome = inventory.submit_movement(
        &state.session(&headers),
        &body.product,
        body.kind,
        body.quantity,
        &body.note,
        inventory.now(),
    )?;

    let response = match outcome {
        Submission::Recorded(record) => {
            (StatusCode::CREATED, Json(ApiResponse::ok(record))).into_response()
        }
        Submission::Rejected => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::<()>::err(
                "nothing recorded: choose a product and a quantity greater than zero",
            )),
        )
            .into_response(),
    };
    Ok(response)
}

/// POST /api/products - Register a product
async fn post_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ProductBody>,
) -> ApiResult<ProductResponse> {
    let inventory = &state.inventory;
    let outcome =
        inventory.register_product(&state.session(&headers), &body.name, inventory.now())?;

    match outcome {
        Registration::Created(record) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::ok(ProductResponse {
                product: record.product.clone(),
                created: true,
                record: Some(record),
            })),
        )),
        Registration::AlreadyExists(name) => ok(ProductResponse {
            product: name.to_string(),
            created: false,
            record: None,
        }),
    }
}

/// DELETE /api/movements/:index - Remove a ledger row
async fn delete_movement(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(index): Path<usize>,
) -> ApiResult<MovementRecord> {
    let removed = state
        .inventory
        .delete_movement(&state.session(&headers), index)?;
    ok(removed)
}

// ============================================================================
// Main Server
// ============================================================================

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ledger", get(get_ledger))
        .route("/stock", get(get_stock))
        .route("/products", get(get_products).post(post_product))
        .route("/movements", post(post_movement))
        .route("/movements/:index", delete(delete_movement))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::args_os().nth(1).map(std::path::PathBuf::from);
    let config = Config::discover(config_path.as_deref()).context("Failed to load configuration")?;
    let inventory = Inventory::from_config(&config).context("Failed to open inventory")?;

    if config.server.api_token.is_none() {
        warn!("no api_token configured, every request is authenticated");
    }

    let state = AppState {
        inventory: Arc::new(inventory),
        api_token: config.server.api_token.clone(),
    };

    let addr = config.server.bind.as_str();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(addr, "🚀 inventory server running");
    axum::serve(listener, app(state))
        .await
        .context("Server stopped")
}
