use super::AppState;
use super::response::{ApiError, ApiResponse};
use crate::error::{Error, ErrorRepr};
use crate::multipart::{DEFAULT_MEDIA_TYPE, FileAttachment, RawBody, TransportEncoding, transport};
use crate::types::AssetId;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use serde::Deserialize;
use serde_json::{Value, json};

/// Request header that flags a base64 transport-encoded body.
pub const BODY_ENCODING: &str = "x-body-encoding";

/// Field name given to the file of a single-file upload.
const SINGLE_FILE_FIELD: &str = "file";

/// Number of files listed when the request does not say.
pub const DEFAULT_LIST_LIMIT: usize = 100;
const MAX_LIST_LIMIT: usize = 1000;

/// `POST /api/scores`: a multipart submission of a score.
pub async fn add_score(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<ApiResponse, ApiError> {
    let body = body.map_err(|e| ApiError::new(e.status(), e.body_text()))?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::from(ErrorRepr::MalformedMultipart("missing content type")))?;
    let raw = RawBody::from_content_type(body, content_type)?.with_encoding(encoding(&headers));

    match state.orchestrator.run_detached(raw).await {
        Ok(done) => Ok(ApiResponse::ok("Uploaded successfully").with_data(&done.record_id)),
        Err(e) => {
            error!(kind = %e.kind(), phase = ?e.phase(), error = %e, "score submission failed");
            Err(e.into())
        }
    }
}

/// The body of a single-file upload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileRequest {
    #[serde(default)]
    pub file_name: String,
    pub mime_type: Option<String>,
    #[serde(default)]
    pub base64: String,
}

/// `POST /api/files`: one base64 file in a JSON body, stored without a
/// record.
pub async fn upload_file(
    State(state): State<AppState>,
    req: Result<Json<UploadFileRequest>, JsonRejection>,
) -> Result<ApiResponse, ApiError> {
    let Json(req) = req.map_err(|e| ApiError::new(e.status(), e.body_text()))?;
    if req.file_name.is_empty() || req.base64.is_empty() {
        return Err(ApiError::bad_request("Missing file data"));
    }

    let payload = transport::decode_base64(req.base64.as_bytes())?;
    let file = FileAttachment {
        field_name: SINGLE_FILE_FIELD.to_string(),
        filename: req.file_name,
        media_type: req
            .mime_type
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string()),
        payload,
    };

    // Spawned so that a disconnect does not drop a create that may already
    // have landed.
    let orchestrator = state.orchestrator.clone();
    let res = tokio::spawn(async move { orchestrator.upload_file(file).await })
        .await
        .map_err(Error::from_dyn)?;

    match res {
        Ok(asset) => Ok(ApiResponse::ok("File uploaded successfully").with_data(&asset)),
        Err(e) => {
            error!(error = %e, "file upload failed");
            Err(e.into())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    #[serde(rename = "fileId")]
    pub file_id: Option<String>,
}

/// `DELETE /api/files?fileId=...`: remove one stored file.
pub async fn delete_file(
    State(state): State<AppState>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<ApiResponse, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::new(e.status(), e.body_text()))?;
    let Some(file_id) = params.file_id.filter(|id| !id.is_empty()) else {
        return Err(ApiError::bad_request("fileId is required"));
    };

    let id = AssetId::from(file_id);
    match state.orchestrator.delete_asset(&id).await {
        Ok(()) => Ok(ApiResponse::ok("File deleted successfully")),
        Err(e) => {
            error!(%id, error = %e, "file delete failed");
            Err(e.into())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

/// `GET /api/files?limit=...`: the stored files as `{success, files}`.
pub async fn list_files(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::new(e.status(), e.body_text()))?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    match state.orchestrator.list_assets(limit).await {
        Ok(files) => Ok(Json(json!({ "success": true, "files": files }))),
        Err(e) => {
            error!(error = %e, "listing files failed");
            Err(e.into())
        }
    }
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "module": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `OPTIONS` on any route. The CORS headers are added by the router.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

pub async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Not found")
}

fn encoding(headers: &HeaderMap) -> TransportEncoding {
    let base64 = headers
        .get(BODY_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("base64"));
    if base64 {
        TransportEncoding::Base64
    } else {
        TransportEncoding::Identity
    }
}
