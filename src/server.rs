//! HTTP server for the chat frontend.
//!
//! The frontend forwards each chat query as one JSON request carrying the
//! chat-group id and the query parameters; the server resolves which data
//! snapshot that group is pinned to, runs the operation, and returns the
//! reply sections (plus HTML for timeline / potential / help views).
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/query/{op}` | Run a query operation for a group |
//! | `GET`  | `/sources` | List per-group snapshot overrides |
//! | `POST` | `/source/switch` | Pin a group to a snapshot (admin only) |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "character not found: 米卡" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `forbidden` (403),
//! `internal` (500).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::aliases::AliasStore;
use crate::config::Config;
use crate::data::GameData;
use crate::models::Reply;
use crate::render;
use crate::sources::{GroupSources, SourceKind};
use crate::{affinity, events, gear, heroes, levels, potential, stages};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    data: GameData,
    aliases: Arc<AliasStore>,
    sources: Arc<Mutex<GroupSources>>,
}

/// Starts the HTTP server. Loads both snapshots and the alias stores,
/// binds to `[server].bind`, and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let data = GameData::load(config)?;
    let aliases = AliasStore::load(&config.data.alias_dir)?;
    let sources = GroupSources::load(&config.data.state_file)?;

    info!(
        live_strings = data.live.strings.len(),
        review_strings = data.review.strings.len(),
        "snapshots loaded"
    );

    let bind_addr = config.server.bind.clone();
    let state = AppState {
        config: Arc::new(config.clone()),
        data,
        aliases: Arc::new(aliases),
        sources: Arc::new(Mutex::new(sources)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/query/{op}", post(handle_query))
        .route("/sources", get(handle_list_sources))
        .route("/source/switch", post(handle_source_switch))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("esdex server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn forbidden(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::FORBIDDEN,
        code: "forbidden".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Map query errors to HTTP statuses by message shape, so handlers can
/// signal client errors without a custom error type.
fn classify_query_error(op: &str, err: anyhow::Error) -> AppError {
    let msg = err.to_string();

    if msg.contains("not found") || msg.contains("no affinity data") {
        not_found(format!("{}: {}", op, msg))
    } else if msg.contains("invalid")
        || msg.contains("unknown")
        || msg.contains("Unknown")
        || msg.contains("missing parameter")
        || msg.contains("Use ")
    {
        bad_request(format!("{}: {}", op, msg))
    } else {
        internal(format!("{}: {}", op, msg))
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /sources ============

#[derive(Serialize)]
struct SourceEntry {
    group_id: i64,
    source: String,
}

#[derive(Serialize)]
struct SourceListResponse {
    default: String,
    overrides: Vec<SourceEntry>,
}

async fn handle_list_sources(
    State(state): State<AppState>,
) -> Result<Json<SourceListResponse>, AppError> {
    let sources = state
        .sources
        .lock()
        .map_err(|_| internal("source state lock poisoned"))?;

    let overrides = sources
        .entries()
        .map(|(group_id, source)| SourceEntry {
            group_id,
            source: source.to_string(),
        })
        .collect();

    Ok(Json(SourceListResponse {
        default: SourceKind::Live.to_string(),
        overrides,
    }))
}

// ============ POST /source/switch ============

#[derive(Deserialize)]
struct SwitchRequest {
    group_id: i64,
    user_id: i64,
    source: String,
}

async fn handle_source_switch(
    State(state): State<AppState>,
    Json(req): Json<SwitchRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.config.server.admin_users.contains(&req.user_id) {
        return Err(forbidden(format!(
            "user {} is not allowed to switch data sources",
            req.user_id
        )));
    }

    let source: SourceKind = req
        .source
        .parse()
        .map_err(|e: anyhow::Error| bad_request(e.to_string()))?;

    let mut sources = state
        .sources
        .lock()
        .map_err(|_| internal("source state lock poisoned"))?;
    sources
        .switch(req.group_id, source)
        .map_err(|e| internal(e.to_string()))?;

    info!(group = req.group_id, source = %source, user = req.user_id, "data source switched");

    Ok(Json(serde_json::json!({
        "result": { "group_id": req.group_id, "source": source.to_string() }
    })))
}

// ============ POST /query/{op} ============

async fn handle_query(
    State(state): State<AppState>,
    Path(op): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let group_id = params
        .get("group_id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| bad_request("missing parameter: group_id"))?;

    let source = {
        let sources = state
            .sources
            .lock()
            .map_err(|_| internal("source state lock poisoned"))?;
        sources.resolve(group_id)
    };
    let snapshot = state.data.snapshot(source);

    let reply = dispatch(&op, &snapshot, &state.aliases, &params)
        .map_err(|e| classify_query_error(&op, e))?;

    Ok(Json(serde_json::json!({ "result": reply })))
}

/// Route an operation name to its query handler.
fn dispatch(
    op: &str,
    snapshot: &crate::data::Snapshot,
    aliases: &AliasStore,
    params: &serde_json::Value,
) -> anyhow::Result<Reply> {
    match op {
        "hero" => heroes::query_hero(snapshot, aliases, &str_param(params, "name")?),
        "heroes" => heroes::query_hero_list(snapshot, aliases),
        "ranking" => heroes::query_ranking(snapshot, &str_param(params, "field")?),
        "stage" => stages::query_stage(snapshot, &str_param(params, "code")?),
        "gate" => stages::query_gate(snapshot, &str_param(params, "race")?),
        "gear" => gear::query_gear(snapshot, &str_param(params, "query")?),
        "packs" => stages::query_packs(snapshot, &str_param(params, "target")?),
        "events" => {
            let month = int_param(params, "month")?;
            events::query_events(snapshot, u32::try_from(month).unwrap_or(0))
        }
        "affinity" => affinity::query_affinity(snapshot, aliases, &str_param(params, "name")?),
        "levels" => levels::query_levels(
            snapshot,
            int_param(params, "from")?,
            int_param(params, "to")?,
        ),
        "ark" => levels::query_ark(snapshot),
        "potential" => potential::query_potential(snapshot),
        "help" => Ok(Reply::new()
            .section("指令一览", "见附带页面")
            .with_html(render::help_page())),
        other => anyhow::bail!("unknown operation: {}", other),
    }
}

fn str_param(params: &serde_json::Value, key: &str) -> anyhow::Result<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("missing parameter: {}", key))
}

fn int_param(params: &serde_json::Value, key: &str) -> anyhow::Result<i64> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| anyhow::anyhow!("missing parameter: {}", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_not_found() {
        let err = anyhow::anyhow!("character not found: 米卡");
        let app_err = classify_query_error("hero", err);
        assert_eq!(app_err.status, StatusCode::NOT_FOUND);
        assert_eq!(app_err.code, "not_found");
    }

    #[test]
    fn test_classify_bad_request() {
        let err = anyhow::anyhow!("invalid month: 13. Use 1 to 12.");
        let app_err = classify_query_error("events", err);
        assert_eq!(app_err.status, StatusCode::BAD_REQUEST);

        let err = anyhow::anyhow!("missing parameter: name");
        assert_eq!(
            classify_query_error("hero", err).status,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_classify_internal_fallback() {
        let err = anyhow::anyhow!("something exploded");
        let app_err = classify_query_error("ark", err);
        assert_eq!(app_err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(app_err.code, "internal");
    }

    #[test]
    fn test_dispatch_unknown_op() {
        let snapshot = crate::data::Snapshot::default();
        let aliases = AliasStore::default();
        let err = dispatch("nope", &snapshot, &aliases, &serde_json::json!({}))
            .unwrap_err()
            .to_string();
        assert!(err.contains("unknown operation"));
    }

    #[test]
    fn test_param_helpers() {
        let params = serde_json::json!({ "name": "米卡", "month": 6 });
        assert_eq!(str_param(&params, "name").unwrap(), "米卡");
        assert_eq!(int_param(&params, "month").unwrap(), 6);
        assert!(str_param(&params, "missing").is_err());
        assert!(int_param(&params, "name").is_err());
    }
}
