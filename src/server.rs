// http server mode - run asksql as an api

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::core::QueryResult;
use crate::error::first_line;
use crate::{Ai, Db, Error, Gate};

struct AppState {
    db: Db,
    ai: Ai,
    gate: Gate,
    schema: String,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    dry_run: bool,
}

#[derive(Serialize)]
struct AskResponse {
    question: String,
    sql: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<QueryResult>,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
}

type Reply = Result<Json<AskResponse>, (StatusCode, Json<ErrorResponse>)>;

pub struct Server;

impl Server {
    /// Serve until the listener fails. `db`, `ai` and `gate` are built by the
    /// caller once and shared by every request.
    pub async fn run(db: Db, ai: Ai, gate: Gate, host: &str, port: u16) -> Result<(), Error> {
        let schema = db.schema().await?;

        let state = Arc::new(AppState {
            db,
            ai,
            gate,
            schema,
        });

        let app = Router::new()
            .route("/health", get(health))
            .route("/ask", post(ask))
            .route("/schema", get(get_schema))
            .layer(CorsLayer::permissive())
            .with_state(state.clone());

        let addr = format!("{host}:{port}");
        info!(
            %addr,
            backend = state.ai.backend().name(),
            dialect = state.db.dialect_name(),
            "server running"
        );

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        Ok(())
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

async fn get_schema(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "schema": state.schema }))
}

async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> Reply {
    info!(question = %req.question, "ask");

    let candidate = state
        .ai
        .generate(&req.question, &state.schema)
        .await
        .map_err(bad_request)?;

    let statement = state
        .gate
        .process(&req.question, &candidate)
        .map_err(|rejection| bad_request(rejection.into()))?;

    if req.dry_run {
        return Ok(Json(AskResponse {
            question: req.question,
            sql: statement.into_string(),
            result: None,
        }));
    }

    let result = state.db.run(&statement).await.map_err(bad_request)?;

    Ok(Json(AskResponse {
        question: req.question,
        sql: statement.into_string(),
        result: Some(result),
    }))
}

// backend and database errors can run over many lines, users get the first
fn bad_request(error: Error) -> (StatusCode, Json<ErrorResponse>) {
    let message = error.to_string();
    warn!(error = %message, "ask failed");

    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            detail: first_line(&message).to_string(),
        }),
    )
}
