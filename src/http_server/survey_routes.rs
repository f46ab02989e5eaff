//! Survey HTTP Routes
//!
//! Submission, lookup and deletion of single surveys.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::errors::{ApiError, ApiResult};
use super::state::ApiState;
use crate::observability::Event;
use crate::schema::SubmissionValidator;
use crate::store::SurveyDetail;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub survey_id: String,
}

/// Create survey routes
pub fn survey_routes(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/surveys", post(submit_handler))
        .route("/surveys/:survey_id", get(get_survey_handler).delete(delete_survey_handler))
        .with_state(state)
}

async fn submit_handler(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<SubmitResponse>> {
    let Json(payload) = payload.map_err(|rejection| {
        state.metrics.increment_rejected();
        ApiError::from(rejection)
    })?;

    // A registered study config replaces the fixed question-count contract
    let study_config = match payload.get("studyId").and_then(Value::as_str) {
        Some(study_id) if !study_id.is_empty() => state.store.get_study_config(study_id).await?,
        _ => None,
    };
    let validator = match &study_config {
        Some(config) => SubmissionValidator::for_study(config),
        None => SubmissionValidator::new(state.question_count),
    };

    let submission = validator.validate(&payload).map_err(|err| {
        state.metrics.increment_rejected();
        info!(
            event = Event::SubmissionRejected.as_str(),
            issues = err.details().len(),
            "submission failed validation"
        );
        ApiError::from(err)
    })?;

    let patient_id = submission.patient_id.clone();
    let study_id = submission.study_id.clone();
    let responses = submission.responses.len() as u64;

    match state.store.submit(submission).await {
        Ok(survey_id) => {
            state.metrics.record_submission(responses);
            info!(
                event = Event::SurveySubmitted.as_str(),
                survey_id = %survey_id,
                patient_id = %patient_id,
                study_id = %study_id,
                responses
            );
            Ok(Json(SubmitResponse {
                success: true,
                survey_id,
            }))
        }
        Err(err) if err.is_conflict() => {
            state.metrics.increment_rejected();
            info!(event = Event::SubmissionRejected.as_str(), study_id = %study_id, "resubmission not allowed");
            Err(err.into())
        }
        Err(err) => {
            state.metrics.increment_failed();
            warn!(event = Event::SubmissionFailed.as_str(), study_id = %study_id, error = %err);
            Err(err.into())
        }
    }
}

async fn get_survey_handler(
    State(state): State<Arc<ApiState>>,
    Path(survey_id): Path<String>,
) -> ApiResult<Json<SurveyDetail>> {
    let detail = state.store.get_by_id(&survey_id).await?;
    Ok(Json(detail))
}

async fn delete_survey_handler(
    State(state): State<Arc<ApiState>>,
    Path(survey_id): Path<String>,
) -> ApiResult<StatusCode> {
    let responses = state.store.delete(&survey_id).await?;
    state.metrics.increment_deleted();
    info!(event = Event::SurveyDeleted.as_str(), survey_id = %survey_id, responses);
    Ok(StatusCode::NO_CONTENT)
}
