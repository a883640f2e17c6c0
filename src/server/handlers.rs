//! HTTP request handlers

use std::sync::Arc;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::{InferenceError, PredictError};
use crate::inference::PredictionResult;

use super::error::{Result, ServerError};
use super::state::AppState;

/// Score one customer record
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResult>> {
    let Json(raw) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let result = state.service.predict_json(&raw)?;
    Ok(Json(result))
}

/// One entry of a batch response
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BatchItem {
    Prediction(PredictionResult),
    Error { error: String, kind: &'static str },
}

/// Score an array of records; each entry succeeds or fails on its own.
///
/// Scoring runs on the blocking pool so a large batch never holds an async
/// worker away from other requests.
pub async fn predict_batch(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(raw) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let Value::Array(records) = raw else {
        return Err(ServerError::BadRequest("expected a JSON array of records".to_string()));
    };

    if records.len() > state.max_batch_size {
        return Err(ServerError::BadRequest(format!(
            "batch of {} records exceeds the limit of {}",
            records.len(),
            state.max_batch_size
        )));
    }

    let scoring = Arc::clone(&state);
    let outcomes = tokio::task::spawn_blocking(move || scoring.service.predict_batch(&records))
        .await
        .map_err(|e| PredictError::from(InferenceError::Interrupted(e.to_string())))?;

    let results: Vec<BatchItem> = outcomes
        .into_iter()
        .map(|r| match r {
            Ok(prediction) => BatchItem::Prediction(prediction),
            Err(e) => BatchItem::Error {
                error: e.to_string(),
                kind: e.kind(),
            },
        })
        .collect();

    let failed = results
        .iter()
        .filter(|item| matches!(item, BatchItem::Error { .. }))
        .count();
    info!(records = results.len(), failed, "Scored batch");

    Ok(Json(json!({ "results": results })))
}

/// Health check with the identity of the loaded artifacts
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "run_id": state.service.run_id(),
        "n_features": state.service.n_features(),
        "uptime_secs": state.uptime_secs(),
    }))
}
