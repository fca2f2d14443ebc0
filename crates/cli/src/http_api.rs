use crate::app::{history_item, App};
use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{Response as HttpResponse, StatusCode},
    response::Response,
    routing::{get, post},
    Router,
};
use claimcheck_protocol::{
    serialize_json, ClearHistoryResponse, ErrorEnvelope, HealthResponse, HistoryResponse,
    VerifyRequest, VerifyResponse,
};
use claimcheck_verdict::VerdictError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_HISTORY_LIMIT: usize = 20;

pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route("/verify", post(http_verify))
        .route("/history", get(http_history).delete(http_clear_history))
        .route("/health", get(http_health))
        .with_state(app)
}

pub async fn serve(bind: &str, app: Arc<App>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    log::info!("Serving claim verification on http://{bind}/verify");
    axum::serve(listener, router(app)).await?;
    Ok(())
}

async fn http_verify(State(app): State<Arc<App>>, body: Bytes) -> Result<Response, StatusCode> {
    let request: VerifyRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return build_response(
                StatusCode::BAD_REQUEST,
                &ErrorEnvelope::invalid_input(format!("Invalid request body: {e}")),
            )
        }
    };

    match app.verify(&request.text, None).await {
        Ok(result) => build_response(StatusCode::OK, &VerifyResponse::from(&result)),
        Err(VerdictError::InvalidInput(message)) => {
            build_response(StatusCode::BAD_REQUEST, &ErrorEnvelope::invalid_input(message))
        }
        Err(e) => build_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorEnvelope::internal(e.to_string()),
        ),
    }
}

#[derive(Debug, Default, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

async fn http_history(
    State(app): State<Arc<App>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, StatusCode> {
    let Some(history) = app.history() else {
        return build_response(StatusCode::OK, &HistoryResponse { items: Vec::new() });
    };
    match history
        .recent(query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
        .await
    {
        Ok(entries) => build_response(
            StatusCode::OK,
            &HistoryResponse {
                items: entries.iter().map(history_item).collect(),
            },
        ),
        Err(e) => build_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorEnvelope::internal(e.to_string()),
        ),
    }
}

async fn http_clear_history(State(app): State<Arc<App>>) -> Result<Response, StatusCode> {
    let Some(history) = app.history() else {
        return build_response(StatusCode::OK, &ClearHistoryResponse { removed: 0 });
    };
    match history.clear().await {
        Ok(removed) => build_response(StatusCode::OK, &ClearHistoryResponse { removed }),
        Err(e) => build_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorEnvelope::internal(e.to_string()),
        ),
    }
}

async fn http_health(State(app): State<Arc<App>>) -> Result<Response, StatusCode> {
    build_response(
        StatusCode::OK,
        &HealthResponse {
            status: "ok".to_string(),
            backend: app.backend().as_str().to_string(),
        },
    )
}

fn build_response<T: Serialize>(status: StatusCode, body: &T) -> Result<Response, StatusCode> {
    let bytes = serialize_json(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .into_bytes();

    HttpResponse::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
