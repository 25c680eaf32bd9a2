use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{AssessmentId, EvaluationId, EvaluationRecord};
use super::repository::{AssessmentRepository, RepositoryError};
use super::service::{AssessmentService, AssessmentServiceError, NewSession};
use super::sync::EventChannel;
use crate::workflows::matrix::TopicId;

/// Router builder exposing the assessment HTTP API.
pub fn assessment_router<R, C>(service: Arc<AssessmentService<R, C>>) -> Router
where
    R: AssessmentRepository + 'static,
    C: EventChannel + 'static,
{
    Router::new()
        .route(
            "/api/v1/assessments",
            get(list_sessions_handler::<R, C>).post(create_session_handler::<R, C>),
        )
        .route(
            "/api/v1/assessments/:assessment_id/lock",
            post(lock_session_handler::<R, C>),
        )
        .route(
            "/api/v1/assessments/:assessment_id/summary",
            get(assessment_summary_handler::<R, C>),
        )
        .route(
            "/api/v1/assessments/:assessment_id/evaluations",
            post(start_evaluation_handler::<R, C>),
        )
        .route(
            "/api/v1/evaluations/import",
            post(import_evaluation_handler::<R, C>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id/scores",
            post(record_score_handler::<R, C>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id/complete",
            post(complete_evaluation_handler::<R, C>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id/reject",
            post(reject_evaluation_handler::<R, C>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id/summary",
            get(evaluation_summary_handler::<R, C>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id/export.csv",
            get(export_csv_handler::<R, C>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct StartEvaluationRequest {
    assessor_name: String,
}

#[derive(Debug, Deserialize)]
struct RecordScoreRequest {
    topic_id: TopicId,
    score: u8,
    #[serde(default)]
    note: Option<String>,
}

async fn list_sessions_handler<R, C>(
    State(service): State<Arc<AssessmentService<R, C>>>,
) -> Response
where
    R: AssessmentRepository + 'static,
    C: EventChannel + 'static,
{
    match service.sessions() {
        Ok(sessions) => (StatusCode::OK, Json(sessions)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn create_session_handler<R, C>(
    State(service): State<Arc<AssessmentService<R, C>>>,
    Json(request): Json<NewSession>,
) -> Response
where
    R: AssessmentRepository + 'static,
    C: EventChannel + 'static,
{
    match service.create_session(request) {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn lock_session_handler<R, C>(
    State(service): State<Arc<AssessmentService<R, C>>>,
    Path(assessment_id): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
    C: EventChannel + 'static,
{
    match service.lock_session(&AssessmentId(assessment_id)) {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn assessment_summary_handler<R, C>(
    State(service): State<Arc<AssessmentService<R, C>>>,
    Path(assessment_id): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
    C: EventChannel + 'static,
{
    match service.assessment_aggregate(&AssessmentId(assessment_id)) {
        Ok(aggregate) => (StatusCode::OK, Json(aggregate)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn start_evaluation_handler<R, C>(
    State(service): State<Arc<AssessmentService<R, C>>>,
    Path(assessment_id): Path<String>,
    Json(request): Json<StartEvaluationRequest>,
) -> Response
where
    R: AssessmentRepository + 'static,
    C: EventChannel + 'static,
{
    match service.start_evaluation(&AssessmentId(assessment_id), request.assessor_name) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn import_evaluation_handler<R, C>(
    State(service): State<Arc<AssessmentService<R, C>>>,
    Json(record): Json<EvaluationRecord>,
) -> Response
where
    R: AssessmentRepository + 'static,
    C: EventChannel + 'static,
{
    match service.import_evaluation(record) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => error_response(err),
    }
}

/// Records the score (and optional note), answering with the refreshed
/// summary so the caller can update its live view from one round trip.
async fn record_score_handler<R, C>(
    State(service): State<Arc<AssessmentService<R, C>>>,
    Path(evaluation_id): Path<String>,
    Json(request): Json<RecordScoreRequest>,
) -> Response
where
    R: AssessmentRepository + 'static,
    C: EventChannel + 'static,
{
    let evaluation_id = EvaluationId(evaluation_id);

    if let Err(err) = service.record_score(&evaluation_id, &request.topic_id, request.score) {
        return error_response(err);
    }

    if let Some(note) = request.note {
        if let Err(err) = service.record_note(&evaluation_id, &request.topic_id, note) {
            return error_response(err);
        }
    }

    match service.evaluation_summary(&evaluation_id) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn complete_evaluation_handler<R, C>(
    State(service): State<Arc<AssessmentService<R, C>>>,
    Path(evaluation_id): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
    C: EventChannel + 'static,
{
    match service.complete_evaluation(&EvaluationId(evaluation_id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn reject_evaluation_handler<R, C>(
    State(service): State<Arc<AssessmentService<R, C>>>,
    Path(evaluation_id): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
    C: EventChannel + 'static,
{
    match service.reject_evaluation(&EvaluationId(evaluation_id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn evaluation_summary_handler<R, C>(
    State(service): State<Arc<AssessmentService<R, C>>>,
    Path(evaluation_id): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
    C: EventChannel + 'static,
{
    match service.evaluation_summary(&EvaluationId(evaluation_id)) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn export_csv_handler<R, C>(
    State(service): State<Arc<AssessmentService<R, C>>>,
    Path(evaluation_id): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
    C: EventChannel + 'static,
{
    match service.export_evaluation_csv(&EvaluationId(evaluation_id)) {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv")],
            csv,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: AssessmentServiceError) -> Response {
    let status = match &err {
        AssessmentServiceError::UnknownProfile(_)
        | AssessmentServiceError::UnknownTopic(_)
        | AssessmentServiceError::ScoreOutOfRange(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AssessmentServiceError::SessionLocked(_)
        | AssessmentServiceError::EvaluationClosed { .. }
        | AssessmentServiceError::InvalidTransition { .. } => StatusCode::CONFLICT,
        AssessmentServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AssessmentServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        AssessmentServiceError::Repository(RepositoryError::Unavailable(_))
        | AssessmentServiceError::Channel(_)
        | AssessmentServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
