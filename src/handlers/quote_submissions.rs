use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use utoipa::IntoParams;

use crate::{
    dto::SubmissionResponse,
    errors::ServiceError,
    models::{AttributeSchema, SaveOutcome, SubmissionAttributes},
    AppState,
};

/// Pagination for the index; both values fall back to the configured defaults
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// 1-based page number
    pub page: Option<u64>,
    /// Page size, clamped to the configured maximum
    pub per_page: Option<u64>,
}

fn parse_attributes(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<SubmissionAttributes, ServiceError> {
    let Json(body) = payload.map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))?;
    SubmissionAttributes::from_body(body).map_err(|e| ServiceError::BadRequest(e.to_string()))
}

fn submission_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, ServiceError> {
    let Path(id) = path.map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))?;
    Ok(id)
}

fn saved(outcome: SaveOutcome) -> Result<SubmissionResponse, ServiceError> {
    match outcome {
        SaveOutcome::Saved(aggregate) => Ok(aggregate.into()),
        SaveOutcome::Invalid(errors) => Err(ServiceError::InvalidAttributes(errors)),
    }
}

/// List quote submissions
#[utoipa::path(
    get,
    path = "/api/client/quote_submissions",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of submissions ordered by id", body = [SubmissionResponse],
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Quote Submissions"
)]
pub async fn list_quote_submissions(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<SubmissionResponse>>, ServiceError> {
    let per_page = state.config.page_size(query.per_page);
    let page = query.page.unwrap_or(1);

    let submissions = state
        .services
        .quote_submissions
        .list(page, per_page)
        .await?;
    Ok(Json(submissions.iter().map(SubmissionResponse::from).collect()))
}

/// Field names accepted in create and update payloads
#[utoipa::path(
    get,
    path = "/api/client/quote_submissions/new",
    responses(
        (status = 200, description = "Permitted nested attribute fields", body = AttributeSchema),
        (status = 401, description = "Unauthorized"),
    ),
    security(("Bearer" = [])),
    tag = "Quote Submissions"
)]
pub async fn new_quote_submission(State(state): State<AppState>) -> Json<AttributeSchema> {
    Json(state.services.quote_submissions.attribute_schema())
}

/// Get a quote submission with its children
#[utoipa::path(
    get,
    path = "/api/client/quote_submissions/{id}",
    params(("id" = i32, Path, description = "Quote submission id")),
    responses(
        (status = 200, description = "Quote submission", body = SubmissionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 400, description = "Malformed id", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Quote Submissions"
)]
pub async fn get_quote_submission(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<SubmissionResponse>, ServiceError> {
    let id = submission_id(path)?;
    let aggregate = state.services.quote_submissions.find(id).await?;
    Ok(Json(aggregate.into()))
}

/// Create a quote submission from nested attributes
#[utoipa::path(
    post,
    path = "/api/client/quote_submissions",
    request_body = SubmissionAttributes,
    responses(
        (status = 201, description = "Quote submission created", body = SubmissionResponse,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid nested attributes or malformed body", body = crate::errors::NestedErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "A nested id does not belong to the submission", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Quote Submissions"
)]
pub async fn create_quote_submission(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmissionResponse>), ServiceError> {
    let attributes = parse_attributes(payload)?;
    let outcome = state.services.quote_submissions.create(attributes).await?;
    Ok((StatusCode::CREATED, Json(saved(outcome)?)))
}

/// Update a quote submission and its nested children
#[utoipa::path(
    patch,
    path = "/api/client/quote_submissions/{id}",
    params(("id" = i32, Path, description = "Quote submission id")),
    request_body = SubmissionAttributes,
    responses(
        (status = 200, description = "Quote submission updated", body = SubmissionResponse),
        (status = 400, description = "Invalid nested attributes or malformed body", body = crate::errors::NestedErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Submission or nested child not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Quote Submissions"
)]
pub async fn update_quote_submission(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmissionResponse>, ServiceError> {
    let id = submission_id(path)?;
    let attributes = parse_attributes(payload)?;
    let outcome = state
        .services
        .quote_submissions
        .update(id, attributes)
        .await?;
    Ok(Json(saved(outcome)?))
}

/// Delete a quote submission with all of its children
#[utoipa::path(
    delete,
    path = "/api/client/quote_submissions/{id}",
    params(("id" = i32, Path, description = "Quote submission id")),
    responses(
        (status = 200, description = "The deleted quote submission", body = SubmissionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 400, description = "Malformed id", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Quote Submissions"
)]
pub async fn delete_quote_submission(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<SubmissionResponse>, ServiceError> {
    let id = submission_id(path)?;
    let snapshot = state.services.quote_submissions.destroy(id).await?;
    Ok(Json(snapshot.into()))
}

/// Routes relative to the client API namespace
pub fn quote_submission_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/quote_submissions",
            get(list_quote_submissions).post(create_quote_submission),
        )
        .route("/quote_submissions/new", get(new_quote_submission))
        .route(
            "/quote_submissions/:id",
            get(get_quote_submission)
                .patch(update_quote_submission)
                .put(update_quote_submission)
                .delete(delete_quote_submission),
        )
}
