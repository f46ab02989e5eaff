//! Shared handler state

use std::sync::Arc;

use super::config::{HttpServerConfig, MAX_EXPORT_BATCH_SIZE};
use crate::observability::MetricsRegistry;
use crate::store::SurveyStore;

/// State shared by every survey and study handler
#[derive(Debug, Clone)]
pub struct ApiState {
    pub store: SurveyStore,
    pub metrics: Arc<MetricsRegistry>,
    pub question_count: usize,
    pub max_page_size: u32,
    pub export_batch_size: usize,
}

impl ApiState {
    pub fn new(store: SurveyStore, config: &HttpServerConfig) -> Self {
        Self {
            store,
            metrics: Arc::new(MetricsRegistry::new()),
            question_count: config.question_count,
            max_page_size: config.max_page_size.max(1),
            export_batch_size: config.export_batch_size.clamp(1, MAX_EXPORT_BATCH_SIZE),
        }
    }
}
