//! # HTTP Server Module
//!
//! Axum server exposing the survey API.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/surveys*` - Submission, lookup, deletion
//! - `/api/studies/:study_id/*` - Listing, export, analytics, study config
//! - `/observability/*` - Health and counters

pub mod config;
pub mod errors;
pub mod observability_routes;
pub mod server;
mod state;
pub mod study_routes;
pub mod survey_routes;

pub use config::{HttpServerConfig, MAX_EXPORT_BATCH_SIZE};
pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use server::HttpServer;
pub use state::ApiState;
