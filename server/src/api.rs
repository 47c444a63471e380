//! # Construction API Router
//!
//! Builds the axum router exposing the Rosetta Construction API. Every
//! handler delegates to the shared [`ConstructionService`].
//!
//! ## Endpoints
//!
//! | Method | Path                      | Description                          |
//! |--------|---------------------------|--------------------------------------|
//! | GET    | `/health`                 | Liveness probe                       |
//! | POST   | `/construction/derive`    | Address of a public key              |
//! | POST   | `/construction/preprocess`| Options for the metadata call        |
//! | POST   | `/construction/metadata`  | Nonce, gas price and suggested fee   |
//! | POST   | `/construction/payloads`  | Unsigned transaction and payloads    |
//! | POST   | `/construction/parse`     | Operations of a transaction          |
//! | POST   | `/construction/combine`   | Signed transaction                   |
//! | POST   | `/construction/hash`      | Transaction identifier               |
//! | POST   | `/construction/submit`    | Register (and optionally broadcast)  |
//!
//! Failures are answered with HTTP 500 and a Rosetta `Error` body, as
//! Rosetta clients expect. That includes bodies axum cannot decode: they
//! become `MalformedRequest` instead of axum's plain-text 400/422.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use zil_construction::mempool::{Acceptance, Mempool};
use zil_construction::types::*;
use zil_construction::{ConstructionError, ConstructionService, RequestContext, Result};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone; everything sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ConstructionService>,
    /// The submission sink the service writes to, kept for the size gauge.
    pub mempool: Arc<Mempool>,
    pub metrics: SharedMetrics,
    /// Cancelled on shutdown so in-flight node calls stop promptly.
    pub shutdown: CancellationToken,
}

impl AppState {
    fn request_context(&self) -> RequestContext {
        RequestContext::with_cancellation(
            self.service.request_context().timeout(),
            self.shutdown.child_token(),
        )
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/construction/derive", post(derive_handler))
        .route("/construction/preprocess", post(preprocess_handler))
        .route("/construction/metadata", post(metadata_handler))
        .route("/construction/payloads", post(payloads_handler))
        .route("/construction/parse", post(parse_handler))
        .route("/construction/combine", post(combine_handler))
        .route("/construction/hash", post(hash_handler))
        .route("/construction/submit", post(submit_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Turns a stage result into an HTTP response and records its metrics.
fn respond<T: Serialize>(
    state: &AppState,
    stage: &'static str,
    started: Instant,
    result: Result<T>,
) -> Response {
    state
        .metrics
        .observe(stage, started.elapsed(), result.as_ref().err());

    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => {
            tracing::warn!(stage, code = err.code(), error = %err, "construction request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(err.to_api_error())).into_response()
        }
    }
}

/// A request body as handlers receive it: decoded, or why it was not.
type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;

fn decode<T>(body: JsonBody<T>) -> Result<T> {
    body.map(|Json(req)| req)
        .map_err(|rejection| ConstructionError::MalformedRequest(rejection.body_text()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: 200 while the process is serving.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "network": state.service.network().network,
            "online": state.service.is_online(),
            "mempool_size": state.mempool.size(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

async fn derive_handler(
    State(state): State<AppState>,
    body: JsonBody<ConstructionDeriveRequest>,
) -> Response {
    let started = Instant::now();
    let result = decode(body).and_then(|req| state.service.derive(req));
    respond(&state, "derive", started, result)
}

async fn preprocess_handler(
    State(state): State<AppState>,
    body: JsonBody<ConstructionPreprocessRequest>,
) -> Response {
    let started = Instant::now();
    let result = decode(body).and_then(|req| state.service.preprocess(req));
    respond(&state, "preprocess", started, result)
}

async fn metadata_handler(
    State(state): State<AppState>,
    body: JsonBody<ConstructionMetadataRequest>,
) -> Response {
    let started = Instant::now();
    let result = match decode(body) {
        Ok(req) => state.service.metadata(req, &state.request_context()).await,
        Err(err) => Err(err),
    };
    respond(&state, "metadata", started, result)
}

async fn payloads_handler(
    State(state): State<AppState>,
    body: JsonBody<ConstructionPayloadsRequest>,
) -> Response {
    let started = Instant::now();
    let result = decode(body).and_then(|req| state.service.payloads(req));
    respond(&state, "payloads", started, result)
}

async fn parse_handler(
    State(state): State<AppState>,
    body: JsonBody<ConstructionParseRequest>,
) -> Response {
    let started = Instant::now();
    let result = decode(body).and_then(|req| state.service.parse(req));
    respond(&state, "parse", started, result)
}

async fn combine_handler(
    State(state): State<AppState>,
    body: JsonBody<ConstructionCombineRequest>,
) -> Response {
    let started = Instant::now();
    let result = decode(body).and_then(|req| state.service.combine(req));
    respond(&state, "combine", started, result)
}

async fn hash_handler(
    State(state): State<AppState>,
    body: JsonBody<ConstructionHashRequest>,
) -> Response {
    let started = Instant::now();
    let result = decode(body).and_then(|req| state.service.hash(req));
    respond(&state, "hash", started, result)
}

async fn submit_handler(
    State(state): State<AppState>,
    body: JsonBody<ConstructionSubmitRequest>,
) -> Response {
    let started = Instant::now();
    let result = match decode(body) {
        Ok(req) => state.service.submit(req, &state.request_context()).await,
        Err(err) => Err(err),
    };

    let accepted = result
        .as_ref()
        .ok()
        .and_then(|resp| resp.metadata.as_ref())
        .and_then(|meta| meta.get(MetadataKey::Status.as_str()))
        .and_then(|status| status.as_str())
        == Some(Acceptance::Accepted.as_str());
    if accepted {
        state.metrics.transactions_submitted_total.inc();
    }
    state
        .metrics
        .transactions_in_mempool
        .set(state.mempool.size() as i64);

    respond(&state, "submit", started, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use zil_construction::config::NetworkConfig;
    use zil_construction::mempool::MempoolConfig;
    use zil_construction::transaction::TransactionCodec;
    use zil_construction::ApiError;

    use crate::metrics::ServerMetrics;

    const SENDER_KEY: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const RECIPIENT: &str = "zil135un5ghygahlsgfduyl7ryuau23rdu98f354v4";

    /// An offline testnet server with an empty mempool.
    fn test_app_state() -> AppState {
        let network = NetworkConfig::testnet();
        let mempool = Arc::new(Mempool::new(
            TransactionCodec::new(network.chain_id),
            MempoolConfig::default(),
        ));
        let service = ConstructionService::new(network, mempool.clone());

        AppState {
            service: Arc::new(service),
            mempool,
            metrics: Arc::new(ServerMetrics::new()),
            shutdown: CancellationToken::new(),
        }
    }

    fn network() -> Value {
        json!({"blockchain": "zilliqa", "network": "testnet"})
    }

    fn signed_transaction() -> String {
        json!({
            "version": NetworkConfig::testnet().version(),
            "nonce": 1,
            "toAddr": RECIPIENT,
            "amount": "1000000000000",
            "pubKey": SENDER_KEY,
            "gasPrice": "2000000000",
            "gasLimit": "50",
            "code": "",
            "data": "",
            "signature": "5a".repeat(64),
            "priority": false,
        })
        .to_string()
    }

    async fn get(router: &Router, path: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    async fn post_json(router: &Router, path: &str, body: Value) -> (StatusCode, Vec<u8>) {
        post_raw(router, path, serde_json::to_vec(&body).unwrap()).await
    }

    async fn post_raw(router: &Router, path: &str, body: Vec<u8>) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/health").await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["network"], "testnet");
        assert_eq!(json["online"], false);
    }

    #[tokio::test]
    async fn derive_returns_bech32_address() {
        let router = create_router(test_app_state());
        let (status, body) = post_json(
            &router,
            "/construction/derive",
            json!({
                "network_identifier": network(),
                "public_key": {"hex_bytes": SENDER_KEY, "curve_type": "secp256k1"},
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let resp: ConstructionDeriveResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            resp.account_identifier.unwrap().address,
            "zil198jk9ae53ry29wuah3tspvmp649ekp250ajt0a"
        );
    }

    #[tokio::test]
    async fn wrong_network_is_rosetta_error() {
        let router = create_router(test_app_state());
        let (status, body) = post_json(
            &router,
            "/construction/derive",
            json!({
                "network_identifier": {"blockchain": "zilliqa", "network": "mainnet"},
                "public_key": {"hex_bytes": SENDER_KEY, "curve_type": "secp256k1"},
            }),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let err: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.code, 1);
        assert!(!err.retriable);
    }

    #[tokio::test]
    async fn metadata_offline_is_error_16() {
        let router = create_router(test_app_state());
        let (status, body) = post_json(
            &router,
            "/construction/metadata",
            json!({
                "network_identifier": network(),
                "options": {"sender": "zil198jk9ae53ry29wuah3tspvmp649ekp250ajt0a"},
            }),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let err: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.code, 16);
    }

    #[tokio::test]
    async fn hash_and_submit_agree() {
        let state = test_app_state();
        let router = create_router(state.clone());
        let signed = signed_transaction();

        let (status, body) = post_json(
            &router,
            "/construction/hash",
            json!({"network_identifier": network(), "signed_transaction": signed}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let hashed: TransactionIdentifierResponse = serde_json::from_slice(&body).unwrap();

        let (status, body) = post_json(
            &router,
            "/construction/submit",
            json!({"network_identifier": network(), "signed_transaction": signed}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let submitted: TransactionIdentifierResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(hashed.transaction_identifier, submitted.transaction_identifier);
        assert!(state.mempool.contains(&submitted.transaction_identifier.hash));
        assert_eq!(state.metrics.transactions_submitted_total.get(), 1);
        assert_eq!(state.metrics.transactions_in_mempool.get(), 1);
    }

    #[tokio::test]
    async fn empty_submit_is_error_11() {
        let state = test_app_state();
        let router = create_router(state.clone());
        let (status, body) = post_json(
            &router,
            "/construction/submit",
            json!({"network_identifier": network(), "signed_transaction": ""}),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let err: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.code, 11);
        assert!(!err.retriable);
        assert!(state.mempool.is_empty());
        assert_eq!(
            state
                .metrics
                .errors_total
                .with_label_values(&["submit", "11"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn undecodable_bodies_are_rosetta_errors() {
        let state = test_app_state();
        let router = create_router(state.clone());

        let bodies: [&[u8]; 3] = [b"{}", b"not json", br#"{"network_identifier": 7}"#];
        for raw in bodies {
            let (status, body) = post_raw(&router, "/construction/submit", raw.to_vec()).await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            let err: ApiError = serde_json::from_slice(&body).unwrap();
            assert_eq!(err.code, 17);
            assert!(!err.retriable);
        }
        assert!(state.mempool.is_empty());
        assert_eq!(
            state
                .metrics
                .errors_total
                .with_label_values(&["submit", "17"])
                .get(),
            3
        );
    }

    #[tokio::test]
    async fn missing_field_on_derive_is_rosetta_error() {
        let router = create_router(test_app_state());
        let (status, body) = post_json(
            &router,
            "/construction/derive",
            json!({"network_identifier": network()}),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let err: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.code, 17);
        assert!(err.details.unwrap()["error"]
            .as_str()
            .unwrap()
            .contains("public_key"));
    }
}
