//! Certificate Handlers
//!
//! CSR submission, signed chain retrieval and the trust store download.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::info;

use crate::api::error::ApiError;
use crate::api::state::AppState;

/// Attachment name of the trust store download
pub const TRUSTSTORE_FILENAME: &str = "network-root-truststore.jks";

const OCTET_STREAM: &str = "application/octet-stream";

/// Submit a PKCS#10 request
///
/// POST /certificate
///
/// Responds with the request id once the request is stored.
pub async fn submit_csr(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<String, ApiError> {
    let id = state.authority.submit_csr(body.to_vec()).await?;
    info!(id = %id, "Accepted certificate request");
    Ok(id)
}

/// Fetch the signed chain for a request
///
/// GET /certificate/{id}
///
/// Every call signs a new node CA certificate.
pub async fn get_certificate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match state.authority.sign_csr(id.clone()).await? {
        Some(archive) => Ok((StatusCode::OK, [(header::CONTENT_TYPE, OCTET_STREAM)], archive).into_response()),
        None => Err(ApiError::NotFound(format!("certificate request {}", id))),
    }
}

/// Download the trust anchor store
///
/// GET /truststore, GET /trustStore
pub async fn truststore(State(state): State<Arc<AppState>>) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", TRUSTSTORE_FILENAME);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, OCTET_STREAM.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        state.truststore.to_vec(),
    )
        .into_response()
}
