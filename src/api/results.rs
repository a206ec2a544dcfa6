//! Result submission and lookup handlers.

use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::BearerToken;
use crate::error::{AppError, AppResult, ValidationError};
use crate::models::{StoredRecord, SubmissionPayload};
use crate::services::{IngestionService, QueryService, ResultQuery};

/// Methods served by `/results`.
const RESULTS_ALLOWED_METHODS: &str = "GET, POST";

/// Response for a stored submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResultResponse {
    pub status: &'static str,
    pub message: &'static str,
    /// Key the record was stored under (`username-userId-taskId`).
    #[serde(rename = "storedKey")]
    pub stored_key: String,
    pub data: StoredRecord,
}

/// Response for a result lookup.
#[derive(Debug, Serialize, ToSchema)]
pub struct QueryResultResponse {
    pub status: &'static str,
    pub key: String,
    pub data: StoredRecord,
}

/// Submit a test result from a CI workflow.
///
/// The bearer token must be a GitHub Actions OIDC token whose `repository`
/// claim equals `studentRepository`.
#[utoipa::path(
    post,
    path = "/api/v1/results",
    tag = "Results",
    request_body = SubmissionPayload,
    responses(
        (status = 200, description = "Result verified and stored", body = SubmitResultResponse),
        (status = 400, description = "Invalid submission", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse),
        (status = 500, description = "Result store failure", body = crate::error::ErrorResponse),
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn submit_result(
    auth: BearerToken,
    ingestion: web::Data<IngestionService>,
    body: web::Json<SubmissionPayload>,
) -> AppResult<HttpResponse> {
    let outcome = ingestion.ingest(&auth.token, body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(SubmitResultResponse {
        status: "ok",
        message: "Result received, verified, and stored successfully.",
        stored_key: outcome.key.to_string(),
        data: outcome.record,
    }))
}

/// Look up the stored result for a student and task.
#[utoipa::path(
    get,
    path = "/api/v1/results",
    tag = "Results",
    params(ResultQuery),
    responses(
        (status = 200, description = "Stored result", body = QueryResultResponse),
        (status = 400, description = "Missing or invalid query parameters", body = crate::error::ErrorResponse),
        (status = 404, description = "No result for this userId and taskId", body = crate::error::ErrorResponse),
        (status = 500, description = "Result store failure", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_result(
    query: web::Query<ResultQuery>,
    service: web::Data<QueryService>,
) -> AppResult<HttpResponse> {
    let outcome = service.query(&query).await?;

    info!(key = %outcome.key, "Result served");

    Ok(HttpResponse::Ok().json(QueryResultResponse {
        status: "ok",
        key: outcome.key,
        data: outcome.record,
    }))
}

async fn method_not_allowed() -> AppResult<HttpResponse> {
    Err(AppError::MethodNotAllowed(RESULTS_ALLOWED_METHODS))
}

/// Query string errors only arise from unparseable input, e.g. repeated keys.
fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|_err, _req| AppError::from(ValidationError::InvalidQueryParams).into())
}

/// Configure result routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/results")
            .app_data(query_config())
            .route(web::post().to(submit_result))
            .route(web::get().to(get_result))
            .default_service(web::to(method_not_allowed)),
    );
}
