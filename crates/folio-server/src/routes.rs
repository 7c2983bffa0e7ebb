//! Route handlers for the content and session APIs

use crate::error::ApiError;
use axum::extract::{Query, State};
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use folio_content::ContentDocument;
use folio_store::{ContentStore, StoreConfig};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Server configuration assembled at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind: SocketAddr,
    /// Bearer token guarding the `/content` routes
    pub admin_token: String,
    /// Content and backup paths
    pub store: StoreConfig,
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// The content store
    pub store: Arc<ContentStore>,
    /// Expected bearer token
    pub admin_token: Arc<str>,
}

impl AppState {
    /// Build state from a server config
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            store: Arc::new(ContentStore::new(config.store.clone())),
            admin_token: Arc::from(config.admin_token.as_str()),
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/content",
            get(get_content)
                .put(put_content)
                .patch(patch_content)
                .options(options_content),
        )
        .route("/session", get(get_session))
        .with_state(state)
}

fn authorize(headers: &HeaderMap, state: &AppState) -> Result<(), ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;
    if token == state.admin_token.as_ref() {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

fn with_cors(response: Response) -> Response {
    let mut response = response;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, PUT, PATCH, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("authorization, content-type"),
    );
    response
}

async fn get_content(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    authorize(&headers, &state)?;
    let doc = state.store.read()?;
    let stats = state.store.stats()?;
    let body = json!({
        "success": true,
        "content": doc.root(),
        "stats": {
            "profilesCount": stats.profiles_count,
            "caseCount": stats.case_count,
            "lastModified": stats.last_modified.to_rfc3339(),
            "fileSize": stats.file_size,
        },
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(with_cors(Json(body).into_response()))
}

async fn put_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(candidate): Json<Value>,
) -> Result<Response, ApiError> {
    authorize(&headers, &state)?;
    let doc = ContentDocument::new(candidate)
        .map_err(|_| ApiError::Validation(vec!["Content must be an object".to_string()]))?;
    let backup = state.store.write(&doc)?;
    info!(backup = ?backup, "content replaced");
    let body = json!({
        "success": true,
        "message": "Content updated successfully",
        "backup": backup.map(|p| p.display().to_string()),
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(with_cors(Json(body).into_response()))
}

/// Body of a `PATCH /content` request
#[derive(Debug, Deserialize)]
pub struct PatchRequest {
    /// Dotted path to assign
    pub path: Option<String>,
    /// Value to place at the path
    pub value: Option<Value>,
}

async fn patch_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PatchRequest>,
) -> Result<Response, ApiError> {
    authorize(&headers, &state)?;
    let (Some(path), Some(value)) = (request.path, request.value) else {
        return Err(ApiError::BadRequest(
            "Path and value are required".to_string(),
        ));
    };
    state.store.patch(&path, value)?;
    let body = json!({
        "success": true,
        "message": "Content patched successfully",
        "updatedPath": path,
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(with_cors(Json(body).into_response()))
}

async fn options_content() -> Response {
    with_cors(StatusCode::OK.into_response())
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    code: Option<String>,
}

async fn get_session(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Response, ApiError> {
    let Some(code) = query.code.filter(|code| !code.is_empty()) else {
        return Err(ApiError::BadRequest("Access code is required".to_string()));
    };
    let doc = state.store.read()?;
    let view = doc
        .session_view(&code)
        .map_err(|_| ApiError::NotFound("Invalid access code".to_string()))?;
    Ok(Json(view).into_response())
}
