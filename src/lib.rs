//! survey-collector - survey submission and aggregation service
//!
//! Validates 20-question survey submissions, stores each survey with its
//! responses atomically in SQLite, and serves listing, export and analytics
//! over HTTP.

pub mod aggregate;
pub mod cli;
pub mod fault_point;
pub mod http_server;
pub mod observability;
pub mod schema;
pub mod store;
