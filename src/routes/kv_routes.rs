use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::services::kv_service;
use crate::state::kv::KvStore;

/// Body of `POST /in-memory` and the response of both in-memory routes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Build the in-memory routes.
pub fn routes(store: KvStore) -> Router {
    Router::new()
        .route("/in-memory", post(set_key).get(get_key))
        .with_state(store)
}

//
// ─────────────────────────────────────────────────────────────
// POST /in-memory
// Set or overwrite a key, echo it back with 201
// ─────────────────────────────────────────────────────────────
//
async fn set_key(
    State(store): State<KvStore>,
    body: Bytes,
) -> Result<(StatusCode, Json<KeyValue>), ApiError>
{
    let entry: KeyValue = serde_json::from_slice(&body).map_err(|_| ApiError::InvalidPayload)?;

    if entry.key.is_empty() {
        return Err(ApiError::KeyRequired);
    }
    if entry.value.is_empty() {
        return Err(ApiError::ValueRequired);
    }

    kv_service::set(&store, entry.key.clone(), entry.value.clone());
    Ok((StatusCode::CREATED, Json(entry)))
}

//
// ─────────────────────────────────────────────────────────────
// GET /in-memory?key=...
// Return the entry or 404
// ─────────────────────────────────────────────────────────────
//
async fn get_key(
    State(store): State<KvStore>,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<KeyValue>, ApiError>
{
    // Repeated `key` parameters resolve to the first one.
    let key = params
        .ok()
        .and_then(|Query(pairs)| pairs.into_iter().find(|(name, _)| name == "key"))
        .map(|(_, value)| value)
        .filter(|k| !k.is_empty())
        .ok_or(ApiError::KeyRequired)?;

    match kv_service::get(&store, &key) {
        Some(value) => Ok(Json(KeyValue { key, value })),
        None => Err(ApiError::KeyNotFound(key)),
    }
}
