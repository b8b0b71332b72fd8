//! # API REST
//!
//! REST API for the slide filler.
//!
//! Handles:
//! - the push trigger (`POST /fill`)
//! - health checks and OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON envelopes, status mapping, CORS)
//!
//! Uses `api-shared` for wire types and API-key validation.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    validate_api_key, ErrorRes, FillReq, FillRes, HealthRes, HealthService, API_KEY_HEADER,
};
use filler_core::{FillError, FillerConfig, PatientRecord, TemplateFiller};

/// Application state shared across REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<FillerConfig>,
    pub filler: TemplateFiller,
}

impl AppState {
    pub fn new(cfg: Arc<FillerConfig>, filler: TemplateFiller) -> Self {
        Self { cfg, filler }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, fill),
    components(schemas(HealthRes, FillReq, FillRes, ErrorRes))
)]
pub struct ApiDoc;

type FillReply = (StatusCode, Json<Value>);

/// Build the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/fill", post(fill))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/fill",
    request_body = FillReq,
    params(
        ("x-api-key" = Option<String>, Header, description = "Shared secret, when configured")
    ),
    responses(
        (status = 200, description = "Template filled", body = FillRes),
        (status = 400, description = "Malformed envelope or record", body = ErrorRes),
        (status = 401, description = "Missing or invalid API key", body = ErrorRes),
        (status = 502, description = "Document store failure", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Fill the configured template with a pushed record
///
/// The payload is echoed back in both the success and the error envelope.
///
/// # Errors
/// - `400` if the body is not JSON, has no `data` member, or the record lacks a group,
/// - `401` if an API key is configured and the request does not carry it,
/// - `502` if the document store or an upstream service fails,
/// - `500` for anything else.
#[axum::debug_handler]
async fn fill(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> FillReply {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            tracing::error!("Fill rejected: {}", rejection.body_text());
            return error_reply(StatusCode::BAD_REQUEST, rejection.body_text(), Value::Null);
        }
    };

    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if let Err(e) = validate_api_key(state.cfg.api_key(), provided) {
        tracing::error!("Fill unauthorised: {}", e);
        return error_reply(StatusCode::UNAUTHORIZED, e.to_string(), payload);
    }

    let record = match PatientRecord::from_envelope(&payload) {
        Ok(record) => record,
        Err(e) => {
            tracing::error!("Fill record error: {}", e);
            return error_reply(status_for(&e), e.to_string(), payload);
        }
    };

    let template = match state.cfg.template_id() {
        Ok(template) => template.clone(),
        Err(e) => {
            tracing::error!("Fill configuration error: {}", e);
            return error_reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), payload);
        }
    };

    let filler = state.filler.clone();
    let today = filler_core::local_today();
    let outcome =
        tokio::task::spawn_blocking(move || filler.fill(&record, &template, today)).await;

    match outcome {
        Ok(Ok(filled)) => {
            let body = FillRes::new(payload, filled.id.to_string());
            (StatusCode::OK, Json(to_json(body)))
        }
        Ok(Err(e)) => {
            tracing::error!("Fill error: {}", e);
            error_reply(status_for(&e), e.to_string(), payload)
        }
        Err(e) => {
            tracing::error!("Fill task failed: {:?}", e);
            error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_owned(),
                payload,
            )
        }
    }
}

fn status_for(e: &FillError) -> StatusCode {
    if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else if e.is_upstream_error() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn error_reply(status: StatusCode, message: String, received: Value) -> FillReply {
    (status, Json(to_json(ErrorRes::new(message, received))))
}

fn to_json(body: impl serde::Serialize) -> Value {
    serde_json::to_value(body).unwrap_or(Value::Null)
}
