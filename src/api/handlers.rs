//! HTTP request handlers with OpenAPI documentation.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::error;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::app::AppState;
use crate::domain::{
    AppError, BlockchainError, ErrorDetail, ErrorResponse, HealthResponse, HealthStatus,
    PriceQuote, QuoteParams, RateLimitResponse, SelectRailRequest, SessionSnapshot,
    SetNameRequest, ViewParams, WorkflowError,
};
use crate::presentation::{ViewModel, renderer_for};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Basename Mint API",
        version = "0.1.0",
        description = "Check .base name availability and mint it with ETH or USDC",
        license(
            name = "MIT"
        )
    ),
    paths(
        create_session_handler,
        get_session_handler,
        set_name_handler,
        check_availability_handler,
        select_rail_handler,
        mint_handler,
        switch_network_handler,
        view_handler,
        quote_handler,
        health_check_handler,
        liveness_handler,
        readiness_handler,
    ),
    components(
        schemas(
            SessionSnapshot,
            SetNameRequest,
            SelectRailRequest,
            PriceQuote,
            ViewModel,
            HealthResponse,
            HealthStatus,
            ErrorResponse,
            ErrorDetail,
            RateLimitResponse,
        )
    ),
    tags(
        (name = "sessions", description = "Availability and mint workflow per UI session"),
        (name = "pricing", description = "Price quotes"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Open a new UI session
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    responses(
        (status = 201, description = "Session created", body = SessionSnapshot),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse)
    )
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let snapshot = state.service.create_session().await;
    (StatusCode::CREATED, Json(snapshot))
}

/// Current session snapshot
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session snapshot", body = SessionSnapshot),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.service.snapshot(id).await?))
}

/// Edit the candidate name
#[utoipa::path(
    put,
    path = "/sessions/{id}/name",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = SetNameRequest,
    responses(
        (status = 200, description = "Name updated, availability reset", body = SessionSnapshot),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn set_name_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetNameRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.service.set_name(id, &payload).await?))
}

/// Query the registry for the current name
#[utoipa::path(
    post,
    path = "/sessions/{id}/check",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Availability resolved", body = SessionSnapshot),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Empty name or check already running", body = ErrorResponse)
    )
)]
pub async fn check_availability_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.service.check_availability(id).await?))
}

/// Toggle the payment rail
#[utoipa::path(
    put,
    path = "/sessions/{id}/rail",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = SelectRailRequest,
    responses(
        (status = 200, description = "Rail selected", body = SessionSnapshot),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Attempt in flight", body = ErrorResponse)
    )
)]
pub async fn select_rail_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SelectRailRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.service.select_rail(id, payload.rail).await?))
}

/// Start a mint attempt; the lifecycle continues in the background
#[utoipa::path(
    post,
    path = "/sessions/{id}/mint",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 202, description = "Attempt started", body = SessionSnapshot),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Mint blocked", body = ErrorResponse)
    )
)]
pub async fn mint_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    let snapshot = state.service.start_mint(id).await?;
    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

/// Ask the wallet to switch to the expected chain
#[utoipa::path(
    post,
    path = "/sessions/{id}/network/switch",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 202, description = "Switch requested", body = SessionSnapshot),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn switch_network_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    let snapshot = state.service.start_network_switch(id).await?;
    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

/// Rendered session view
#[utoipa::path(
    get,
    path = "/sessions/{id}/view",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID"), ViewParams),
    responses(
        (status = 200, description = "Rendered view", body = String, content_type = "text/plain"),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn view_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<ViewParams>,
) -> Result<Response, AppError> {
    let snapshot = state.service.snapshot(id).await?;
    let renderer = renderer_for(params.format);
    let body = renderer.render(&ViewModel::from_snapshot(&snapshot));
    Ok(([(header::CONTENT_TYPE, renderer.content_type())], body).into_response())
}

/// Price quote for a name without a session
#[utoipa::path(
    get,
    path = "/quote",
    tag = "pricing",
    params(QuoteParams),
    responses(
        (status = 200, description = "Price quote", body = PriceQuote)
    )
)]
pub async fn quote_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuoteParams>,
) -> Json<PriceQuote> {
    Json(state.service.quote(&params.name).await)
}

/// Detailed health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health status", body = HealthResponse)
    )
)]
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(state.service.health_check().await)
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Application is alive")
    )
)]
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Application is ready to serve traffic"),
        (status = 503, description = "Application is not ready")
    )
)]
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    match state.service.health_check().await.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Prometheus scrape output
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            AppError::Workflow(WorkflowError::SessionNotFound(_)) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            AppError::Workflow(WorkflowError::MintBlocked(_)) => {
                (StatusCode::CONFLICT, "mint_blocked")
            }
            AppError::Workflow(_) => (StatusCode::CONFLICT, "workflow_conflict"),
            AppError::Blockchain(bc_err) => match bc_err {
                BlockchainError::Connection(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "blockchain_error")
                }
                BlockchainError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
                BlockchainError::Rejected { .. } => (StatusCode::BAD_GATEWAY, "rejected"),
                _ => (StatusCode::BAD_GATEWAY, "blockchain_error"),
            },
            AppError::Payment(_) => (StatusCode::BAD_GATEWAY, "payment_error"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(error_type = %error_type, message = %message, "Server error");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                r#type: error_type.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MintBlockReason, PaymentError};

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(WorkflowError::SessionNotFound("x".to_string()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(WorkflowError::MintBlocked(MintBlockReason::WrongNetwork).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(WorkflowError::AttemptInFlight.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(BlockchainError::Timeout("t".to_string()).into()),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(BlockchainError::Connection("c".to_string()).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(PaymentError::Declined("card".to_string()).into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_openapi_lists_session_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/sessions/{id}/mint"));
        assert!(doc.paths.paths.contains_key("/quote"));
    }
}
