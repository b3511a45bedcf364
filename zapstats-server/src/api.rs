//! HTTP API for the dashboard's statistics widgets.
//!
//! One data route. Computation failures never surface as HTTP errors:
//! once the bearer token checks out, the response is always 200 with
//! either complete or zeroed metrics.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use zapstats_core::{FeedClient, StatsEngine};

#[derive(Clone)]
struct AppState {
    engine: Arc<StatsEngine<FeedClient>>,
    service_token: Option<String>,
}

#[derive(Deserialize)]
struct StatsQuery {
    owner_id: Option<String>,
    debug: Option<bool>,
}

/// Bind and serve the API until the process is stopped.
pub async fn run_server(
    engine: StatsEngine<FeedClient>,
    service_token: Option<String>,
    host: String,
    port: u16,
) -> Result<()> {
    if service_token.is_none() {
        tracing::warn!("No service token configured; the stats endpoint is unauthenticated");
    }

    let state = AppState {
        engine: Arc::new(engine),
        service_token,
    };

    let app = Router::new()
        .route("/api/health", get(api_health))
        .route("/api/response-stats", get(api_response_stats))
        .with_state(state);

    let bind = format!("{}:{}", host, port)
        .parse::<SocketAddr>()
        .map_err(|err| anyhow!("invalid bind address: {err}"))?;

    tracing::info!(%bind, "zapstats-server listening");
    println!("zapstats-server running at http://{}", bind);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| anyhow!("failed to bind {bind}: {err}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn json_response<T: serde::Serialize>(payload: T, status: StatusCode) -> Response {
    let mut response = Json(payload).into_response();
    *response.status_mut() = status;
    response
}

async fn api_health() -> Response {
    json_response(json!({"ok": true}), StatusCode::OK)
}

async fn api_response_stats(
    State(state): State<AppState>,
    Query(params): Query<StatsQuery>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers, state.service_token.as_deref()) {
        return json_response(json!({"error": "unauthorized"}), StatusCode::UNAUTHORIZED);
    }

    let debug = params.debug.unwrap_or(false);
    let report = state.engine.compute(params.owner_id.as_deref(), debug).await;

    let mut body = match serde_json::to_value(report.metrics) {
        Ok(Value::Object(map)) => map,
        // Metrics are a plain struct; serialization cannot realistically
        // fail, but the widget still gets a 200 if it ever does.
        _ => return json_response(json!({}), StatusCode::OK),
    };
    if let Some(debug_report) = report.debug {
        if let Ok(value) = serde_json::to_value(debug_report) {
            body.insert("_debug".to_string(), value);
        }
    }

    json_response(Value::Object(body), StatusCode::OK)
}

/// Check the bearer token against the configured service token.
///
/// With no token configured the gate is open (authorization then lives
/// entirely upstream, e.g. on a private network).
fn authorized(headers: &HeaderMap, service_token: Option<&str>) -> bool {
    let Some(expected) = service_token else {
        return true;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token == expected)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_authorized_with_matching_token() {
        let headers = headers_with("Bearer dash-token");
        assert!(authorized(&headers, Some("dash-token")));
    }

    #[test]
    fn test_rejects_wrong_or_missing_token() {
        assert!(!authorized(&headers_with("Bearer other"), Some("dash-token")));
        assert!(!authorized(&headers_with("dash-token"), Some("dash-token")));
        assert!(!authorized(&HeaderMap::new(), Some("dash-token")));
    }

    #[test]
    fn test_open_when_no_token_configured() {
        assert!(authorized(&HeaderMap::new(), None));
    }

    #[test]
    fn test_stats_query_parsing() {
        let query: StatsQuery =
            serde_json::from_value(json!({"owner_id": "u-1", "debug": true})).unwrap();
        assert_eq!(query.owner_id.as_deref(), Some("u-1"));
        assert_eq!(query.debug, Some(true));

        let query: StatsQuery = serde_json::from_value(json!({})).unwrap();
        assert!(query.owner_id.is_none());
        assert!(query.debug.is_none());
    }
}
