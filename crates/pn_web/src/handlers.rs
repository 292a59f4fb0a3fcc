use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use pn_core::{Error, ImportOutcome};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

use crate::AppState;

pub const MSG_CREATED: &str = "게시물이 노션에 저장되었습니다";
pub const MSG_EXISTING: &str = "이미 저장된 게시물입니다";
pub const MSG_MISSING_URL: &str = "URL이 제공되지 않았습니다";
pub const MSG_INVALID_URL: &str = "유효하지 않은 URL입니다";
pub const MSG_FAILED: &str = "게시물 저장 중 오류가 발생했습니다";

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportResponse {
    fn failure(message: &str, error: Option<String>) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            id: None,
            existing: None,
            error,
        }
    }
}

impl From<ImportOutcome> for ImportResponse {
    fn from(outcome: ImportOutcome) -> Self {
        match outcome {
            ImportOutcome::Created { id } => Self {
                success: true,
                message: MSG_CREATED.to_string(),
                id: Some(id),
                existing: None,
                error: None,
            },
            ImportOutcome::Existing { id } => Self {
                success: true,
                message: MSG_EXISTING.to_string(),
                id: Some(id),
                existing: Some(true),
                error: None,
            },
        }
    }
}

fn error_response(err: &Error) -> (StatusCode, Json<ImportResponse>) {
    if err.is_client_error() {
        warn!(error = %err, "Rejected import request");
        (
            StatusCode::BAD_REQUEST,
            Json(ImportResponse::failure(MSG_INVALID_URL, Some(err.to_string()))),
        )
    } else {
        error!(error = %err, "Import failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ImportResponse::failure(MSG_FAILED, Some(err.to_string()))),
        )
    }
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (fetcher, store) = match state.importer() {
        Ok(importer) => (
            Some(importer.fetcher_name().to_string()),
            Some(importer.store_name().to_string()),
        ),
        Err(_) => (None, None),
    };

    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "configured": state.is_configured(),
        "fetcher": fetcher,
        "store": store,
    }))
}

pub async fn add_thread(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> (StatusCode, Json<ImportResponse>) {
    let url = payload
        .ok()
        .and_then(|Json(request)| request.url)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty());

    let Some(url) = url else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ImportResponse::failure(MSG_MISSING_URL, None)),
        );
    };

    let importer = match state.importer() {
        Ok(importer) => importer,
        Err(e) => return error_response(&e),
    };

    match importer.import(&url).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome.into())),
        Err(e) => error_response(&e),
    }
}
