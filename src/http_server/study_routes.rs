//! Study HTTP Routes
//!
//! Study-scoped reads (listing, export, analytics) and study config
//! management.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures_util::stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::config::DEFAULT_PAGE_SIZE;
use super::errors::{ApiError, ApiResult};
use super::state::ApiState;
use crate::aggregate::{ExportEncoder, ExportFormat, StudyStats};
use crate::observability::{Event, MetricsRegistry};
use crate::schema::StudyConfig;
use crate::store::{ExportRow, StoreError, SurveyStore, SurveySummary};

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct SurveyListResponse {
    pub surveys: Vec<SurveySummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigStoredResponse {
    pub success: bool,
    pub study_id: String,
}

// ==================
// Study Routes
// ==================

/// Create study routes
pub fn study_routes(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/studies/:study_id/surveys", get(list_surveys_handler))
        .route("/studies/:study_id/export", get(export_handler))
        .route("/studies/:study_id/analytics", get(analytics_handler))
        .route(
            "/studies/:study_id/config",
            get(get_config_handler).put(put_config_handler),
        )
        .with_state(state)
}

// ==================
// Helper Functions
// ==================

/// Resolves page and limit against defaults and the configured cap.
fn resolve_paging(query: &ListQuery, max_page_size: u32) -> ApiResult<(u32, u32)> {
    let page = query.page.unwrap_or(1);
    if page < 1 {
        return Err(ApiError::InvalidQueryParam(format!("page must be >= 1, got {}", page)));
    }
    let limit = query.limit.unwrap_or(i64::from(DEFAULT_PAGE_SIZE));
    if limit < 1 {
        return Err(ApiError::InvalidQueryParam(format!("limit must be >= 1, got {}", limit)));
    }

    let page = u32::try_from(page)
        .map_err(|_| ApiError::InvalidQueryParam(format!("page out of range: {}", page)))?;
    let limit = limit.min(i64::from(max_page_size)) as u32;
    Ok((page, limit))
}

// ==================
// Handlers
// ==================

async fn list_surveys_handler(
    State(state): State<Arc<ApiState>>,
    Path(study_id): Path<String>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<SurveyListResponse>> {
    let Query(query) = query?;
    let (page, limit) = resolve_paging(&query, state.max_page_size)?;

    let result = state.store.list_by_study(&study_id, page, limit).await?;

    Ok(Json(SurveyListResponse {
        surveys: result.surveys,
        pagination: Pagination {
            page,
            limit,
            has_more: result.has_more,
        },
    }))
}

async fn export_handler(
    State(state): State<Arc<ApiState>>,
    Path(study_id): Path<String>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let format = match query.format.as_deref() {
        Some(raw) => raw.parse::<ExportFormat>().map_err(ApiError::InvalidQueryParam)?,
        None => ExportFormat::default(),
    };

    let survey_ids = state.store.export_survey_ids(&study_id).await?;
    info!(
        event = Event::ExportStarted.as_str(),
        study_id = %study_id,
        format = %format,
        surveys = survey_ids.len()
    );

    let mut batches = survey_ids
        .chunks(state.export_batch_size)
        .map(|chunk| chunk.to_vec())
        .collect::<Vec<_>>()
        .into_iter();

    // First batch is read before the status line goes out, so a failure here
    // is still a 500. Later failures can only cut the body short.
    let first = match batches.next() {
        Some(batch) => match state.store.export_rows(batch).await {
            Ok(rows) => Some(rows),
            Err(err) => {
                warn!(event = Event::ExportFailed.as_str(), study_id = %study_id, error = %err);
                return Err(err.into());
            }
        },
        None => None,
    };

    let cursor = ExportCursor {
        store: state.store.clone(),
        metrics: Arc::clone(&state.metrics),
        study_id: study_id.clone(),
        encoder: ExportEncoder::new(format),
        pending: first,
        batches,
        stage: ExportStage::Header,
    };
    let body = Body::from_stream(stream::try_unfold(cursor, ExportCursor::next_chunk));

    let mut response = body.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(format.content_type()));
    if format == ExportFormat::Csv {
        let disposition = format!("attachment; filename=\"{}\"", format.file_name(&study_id));
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }
    Ok(response)
}

async fn analytics_handler(
    State(state): State<Arc<ApiState>>,
    Path(study_id): Path<String>,
) -> ApiResult<Json<StudyStats>> {
    let counts = state.store.stats_counts(&study_id).await?;
    Ok(Json(StudyStats::from_counts(study_id, counts)))
}

async fn get_config_handler(
    State(state): State<Arc<ApiState>>,
    Path(study_id): Path<String>,
) -> ApiResult<Json<StudyConfig>> {
    match state.store.get_study_config(&study_id).await? {
        Some(config) => Ok(Json(config)),
        None => Err(ApiError::StudyConfigNotFound(study_id)),
    }
}

async fn put_config_handler(
    State(state): State<Arc<ApiState>>,
    Path(study_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<ConfigStoredResponse>> {
    let Json(mut payload) = payload?;

    // The path names the study; the body may omit it
    if let Some(object) = payload.as_object_mut() {
        match object.get("studyId").and_then(Value::as_str) {
            Some(body_id) if body_id != study_id => {
                return Err(ApiError::invalid_body(format!(
                    "field 'studyId': expected {}, got {}",
                    study_id, body_id
                )));
            }
            _ => {
                object.insert("studyId".to_string(), Value::String(study_id.clone()));
            }
        }
    }

    let config: StudyConfig =
        serde_json::from_value(payload).map_err(|e| ApiError::invalid_body(e.to_string()))?;
    config.validate_structure()?;

    let questions = config.question_count();
    state.store.put_study_config(config).await?;
    info!(event = Event::StudyConfigUpdated.as_str(), study_id = %study_id, questions);

    Ok(Json(ConfigStoredResponse {
        success: true,
        study_id,
    }))
}

// ==================
// Export Streaming
// ==================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportStage {
    Header,
    Rows,
    Done,
}

/// Drives a batched export: header, one chunk per survey batch, trailer.
///
/// The response status is already sent when a later batch is read; a storage
/// error there ends the stream and the client sees a truncated body.
struct ExportCursor {
    store: SurveyStore,
    metrics: Arc<MetricsRegistry>,
    study_id: String,
    encoder: ExportEncoder,
    pending: Option<Vec<ExportRow>>,
    batches: std::vec::IntoIter<Vec<String>>,
    stage: ExportStage,
}

impl ExportCursor {
    async fn next_chunk(mut self) -> Result<Option<(String, Self)>, StoreError> {
        match self.stage {
            ExportStage::Header => {
                self.stage = ExportStage::Rows;
                let chunk = self.encoder.begin();
                Ok(Some((chunk, self)))
            }
            ExportStage::Rows => {
                if let Some(rows) = self.pending.take() {
                    let chunk = self.encoder.encode_batch(&rows);
                    return Ok(Some((chunk, self)));
                }
                self.next_batch().await
            }
            ExportStage::Done => Ok(None),
        }
    }

    async fn next_batch(mut self) -> Result<Option<(String, Self)>, StoreError> {
        match self.batches.next() {
            Some(batch) => {
                let rows = match self.store.export_rows(batch).await {
                    Ok(rows) => rows,
                    Err(err) => {
                        warn!(
                            event = Event::ExportFailed.as_str(),
                            study_id = %self.study_id,
                            error = %err
                        );
                        return Err(err);
                    }
                };
                let chunk = self.encoder.encode_batch(&rows);
                Ok(Some((chunk, self)))
            }
            None => {
                self.stage = ExportStage::Done;
                let rows = self.encoder.rows() as u64;
                self.metrics.record_export(rows);
                info!(event = Event::ExportComplete.as_str(), study_id = %self.study_id, rows);
                let chunk = self.encoder.finish();
                Ok(Some((chunk, self)))
            }
        }
    }
}
