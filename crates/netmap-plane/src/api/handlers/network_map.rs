//! Network Map Handlers
//!
//! Reads are served from the publication cache and the registry; writes are
//! forwarded to the authority actor and answered once it has applied them.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use netmap_core::{DistinguishedName, NotaryInfo, SecureHash};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::state::AppState;

const OCTET_STREAM: &str = "application/octet-stream";

/// Bounds of the advertised Cache-Control max-age, in seconds
const MAX_AGE_SECS: std::ops::Range<u32> = 10..30;

/// Registry summary
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapStats {
    /// Organisation of each node's primary identity
    pub node_names: Vec<String>,
    /// `OU= O= L= C=` rendering of each notary
    pub notary_names: Vec<String>,
    pub node_count: usize,
    pub notary_count: usize,
}

fn cached_bytes(bytes: Vec<u8>) -> Response {
    let max_age = rand::thread_rng().gen_range(MAX_AGE_SECS);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, OCTET_STREAM.to_string()),
            (header::CACHE_CONTROL, format!("max-age={}", max_age)),
        ],
        bytes,
    )
        .into_response()
}

/// Current signed network map
///
/// GET /network-map
pub async fn get_network_map(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let publication = state
        .publications
        .latest()
        .ok_or_else(|| ApiError::NotFound("network map not built yet".into()))?;
    Ok(cached_bytes(publication.network_map_bytes.clone()))
}

/// Signed parameters, only if `hash` is the current one
///
/// GET /network-map/network-parameters/{hash}
pub async fn get_network_parameters(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Response, ApiError> {
    let hash = SecureHash::parse(&hash)?;
    match state.publications.latest() {
        Some(publication) if publication.parameters_hash == hash => {
            Ok(cached_bytes(publication.parameters_bytes.clone()))
        }
        _ => Err(ApiError::NotFound(format!("network parameters {}", hash))),
    }
}

/// Stored node info bytes exactly as published
///
/// GET /network-map/node-info/{hash}
pub async fn get_node_info(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Response, ApiError> {
    let hash = SecureHash::parse(&hash)?;
    let record = state
        .store
        .find_by_hash(&hash)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("node info {}", hash)))?;
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, OCTET_STREAM)], record.bytes).into_response())
}

/// Publish a signed node info
///
/// POST /network-map/publish
///
/// Answers once the record is saved and the map rebuilt.
pub async fn publish(State(state): State<Arc<AppState>>, body: Bytes) -> Result<&'static str, ApiError> {
    state.authority.publish_node_info(body.to_vec()).await?;
    Ok("OK")
}

/// Registry summary
///
/// GET /network-map/map-stats
pub async fn map_stats(State(state): State<Arc<AppState>>) -> Result<Json<MapStats>, ApiError> {
    let mut records = state.store.all().await?;
    records.sort_by_key(|r| r.hash);

    let node_names: Vec<String> = records
        .iter()
        .filter_map(|r| r.signed.payload_unverified().ok())
        .filter_map(|info| info.primary_identity().map(|p| p.name.clone()))
        .map(|name| organisation_of(&name))
        .collect();

    let notary_names: Vec<String> = state
        .publications
        .latest()
        .map(|p| p.parameters.notaries.iter().map(notary_label).collect())
        .unwrap_or_default();

    Ok(Json(MapStats {
        node_count: node_names.len(),
        notary_count: notary_names.len(),
        node_names,
        notary_names,
    }))
}

/// Clear the registry
///
/// GET /network-map/reset-persisted-nodes
pub async fn reset_persisted_nodes(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let removed = state.authority.reset_nodes().await?;
    Ok((StatusCode::ACCEPTED, format!("Deleted: {{{}}} rows.", removed)).into_response())
}

/// GET /network-map/bumpEpoch
pub async fn bump_epoch(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.authority.bump_epoch().await?;
    Ok(StatusCode::OK)
}

/// GET /network-map/bumpMPV
pub async fn bump_minimum_platform_version(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    state.authority.bump_minimum_platform_version().await?;
    Ok(StatusCode::OK)
}

fn organisation_of(name: &str) -> String {
    DistinguishedName::parse(name)
        .ok()
        .and_then(|dn| dn.organisation().map(str::to_string))
        .unwrap_or_else(|| name.to_string())
}

fn notary_label(notary: &NotaryInfo) -> String {
    let dn = DistinguishedName::parse(&notary.identity.name).ok();
    let attr = |key: &str| {
        dn.as_ref()
            .and_then(|dn| dn.get(key))
            .unwrap_or_default()
            .to_string()
    };
    format!("OU={} O={} L={} C={}", attr("OU"), attr("O"), attr("L"), attr("C"))
}
