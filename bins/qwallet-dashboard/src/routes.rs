//! Axum router and HTTP handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use qwallet_core::error::CatalogError;
use qwallet_core::CurrencyCode;
use qwallet_session::{CheckOutcome, MarketView, SessionError, SessionSnapshot};

use crate::AppState;

// Embed the web UI at compile time.
const INDEX_HTML: &str = include_str!("static/index.html");

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        let status = match &e {
            SessionError::NoWallet => StatusCode::CONFLICT,
            SessionError::Catalog(CatalogError::UnsupportedCurrency(_)) => StatusCode::BAD_REQUEST,
            SessionError::Oracle(_) | SessionError::Balance(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!("request failed: {e}");
        }
        ApiError {
            status,
            message: e.to_string(),
        }
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(web_ui))
        .route("/api/catalog", get(api_catalog))
        .route("/api/state", get(api_state))
        .route("/api/generate", post(api_generate))
        .route("/api/check", post(api_check))
        .route("/api/autoscan/start", post(api_autoscan_start))
        .route("/api/autoscan/stop", post(api_autoscan_stop))
        .route("/api/currency", post(api_currency))
        .route("/api/market", get(api_market))
        .with_state(state)
        .layer(cors)
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CurrencyRequest {
    currency: Option<String>,
}

/// Session snapshot plus the rendered last-scan age.
#[derive(Serialize)]
struct StateView {
    #[serde(flatten)]
    snapshot: SessionSnapshot,
    last_scan_age: String,
}

#[derive(Serialize)]
struct CheckView {
    result: CheckOutcome,
    state: StateView,
}

fn state_view(state: &AppState) -> StateView {
    StateView {
        snapshot: state.session.snapshot(),
        last_scan_age: state.session.last_scan_age(),
    }
}

/// Requested currency, or the session's current selection.
fn requested_currency(state: &AppState, body: Option<Json<CurrencyRequest>>) -> CurrencyCode {
    body.and_then(|Json(req)| req.currency)
        .map(CurrencyCode::from)
        .unwrap_or_else(|| state.session.snapshot().selected_currency)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Serve the embedded web UI.
async fn web_ui() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `GET /api/catalog` — supported currencies and the fallback row.
async fn api_catalog(State(state): State<AppState>) -> Json<Value> {
    let catalog = state.session.catalog();
    Json(json!({
        "currencies": catalog.entries(),
        "fallback": catalog.fallback(),
        "auto_scan_interval_ms": state.session.config().auto_scan_interval_ms,
    }))
}

/// `GET /api/state` — current session snapshot.
async fn api_state(State(state): State<AppState>) -> Json<StateView> {
    Json(state_view(&state))
}

/// `POST /api/generate` — new wallet for `{currency}`, then its first check.
async fn api_generate(
    State(state): State<AppState>,
    body: Option<Json<CurrencyRequest>>,
) -> ApiResult<CheckView> {
    let currency = requested_currency(&state, body);
    let outcome = state.session.generate(currency.clone()).await?;
    state.follow_currency();
    info!(%currency, "wallet generated via API");
    Ok(Json(CheckView {
        result: outcome,
        state: state_view(&state),
    }))
}

/// `POST /api/check` — one balance check of the current wallet.
async fn api_check(State(state): State<AppState>) -> ApiResult<CheckView> {
    let outcome = state.session.check_balance().await?;
    Ok(Json(CheckView {
        result: outcome,
        state: state_view(&state),
    }))
}

/// `POST /api/autoscan/start`
async fn api_autoscan_start(State(state): State<AppState>) -> ApiResult<Value> {
    let started = state.session.start_auto_scan()?;
    Ok(Json(json!({ "started": started })))
}

/// `POST /api/autoscan/stop`
async fn api_autoscan_stop(State(state): State<AppState>) -> Json<Value> {
    let stopped = state.session.stop_auto_scan();
    Json(json!({ "stopped": stopped }))
}

/// `POST /api/currency` — switch the selected currency.
async fn api_currency(
    State(state): State<AppState>,
    body: Option<Json<CurrencyRequest>>,
) -> ApiResult<StateView> {
    let currency = requested_currency(&state, body);
    state.session.select_currency(currency)?;
    state.follow_currency();
    Ok(Json(state_view(&state)))
}

/// `GET /api/market` — price window and network statistics.
async fn api_market(State(state): State<AppState>) -> Json<MarketView> {
    Json(state.market.lock().view())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use qwallet_session::{SessionConfig, WalletSession};
    use tower::ServiceExt;

    fn app_state() -> AppState {
        let session = WalletSession::builder()
            .config(SessionConfig {
                balance_latency_ms: 1,
                ..SessionConfig::default()
            })
            .build()
            .unwrap();
        AppState::new(session)
    }

    async fn call(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = router(state.clone())
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn index_is_served() {
        let state = app_state();
        let response = router(state)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn catalog_lists_builtin_rows() {
        let (status, body) = call(&app_state(), "GET", "/api/catalog", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currencies"].as_array().unwrap().len(), 6);
        assert_eq!(body["fallback"]["code"], "DEFAULT");
    }

    #[tokio::test]
    async fn check_without_wallet_conflicts() {
        let (status, body) = call(&app_state(), "POST", "/api/check", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "no wallet generated");
    }

    #[tokio::test]
    async fn generate_then_check() {
        let state = app_state();
        let (status, body) = call(&state, "POST", "/api/generate", Some(json!({ "currency": "BTC" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["outcome"], "applied");
        assert_eq!(body["state"]["history"].as_array().unwrap().len(), 1);
        let address = body["state"]["identity"]["address"].as_str().unwrap();
        assert!(address.starts_with("bc1"));

        let (status, body) = call(&state, "POST", "/api/check", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["history"].as_array().unwrap().len(), 2);
        assert_eq!(state.market.lock().currency().as_str(), "BTC");
    }

    #[tokio::test]
    async fn autoscan_start_requires_wallet() {
        let state = app_state();
        let (_, body) = call(&state, "POST", "/api/autoscan/start", None).await;
        assert_eq!(body["started"], false);

        call(&state, "POST", "/api/generate", Some(json!({ "currency": "ETH" }))).await;
        let (_, body) = call(&state, "POST", "/api/autoscan/start", None).await;
        assert_eq!(body["started"], true);
        let (_, body) = call(&state, "GET", "/api/state", None).await;
        assert_eq!(body["is_scanning"], true);

        let (_, body) = call(&state, "POST", "/api/autoscan/stop", None).await;
        assert_eq!(body["stopped"], true);
        let (_, body) = call(&state, "POST", "/api/autoscan/stop", None).await;
        assert_eq!(body["stopped"], false);
    }

    #[tokio::test]
    async fn currency_switch_resets_market() {
        let state = app_state();
        state.tick_market();
        assert_eq!(state.market.lock().prices().len(), 1);

        let (status, body) = call(&state, "POST", "/api/currency", Some(json!({ "currency": "DOGE" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selected_currency"], "DOGE");

        let (_, market) = call(&state, "GET", "/api/market", None).await;
        assert_eq!(market["currency"], "DOGE");
        assert!(market["prices"].as_array().unwrap().is_empty());
        assert_eq!(market["stats"]["block_height"], 1);
    }

    #[tokio::test]
    async fn state_includes_last_scan_age() {
        let state = app_state();
        let (_, body) = call(&state, "GET", "/api/state", None).await;
        assert_eq!(body["last_scan_age"], "");
        assert!(body["identity"].is_null());

        call(&state, "POST", "/api/generate", Some(json!({ "currency": "ADA" }))).await;
        let (_, body) = call(&state, "GET", "/api/state", None).await;
        assert_eq!(body["last_scan_age"], "just now");
    }
}
