//! HTTP Server Configuration
//!
//! Bind address, CORS allow-list and request limits.

use serde::{Deserialize, Serialize};

use crate::schema::DEFAULT_QUESTION_COUNT;

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 3000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Responses per submission when the study has no config
    #[serde(default = "default_question_count")]
    pub question_count: usize,

    /// Upper bound on `limit` for listings
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Surveys read per export batch
    #[serde(default = "default_export_batch_size")]
    pub export_batch_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_question_count() -> usize {
    DEFAULT_QUESTION_COUNT
}

fn default_max_page_size() -> u32 {
    500
}

fn default_export_batch_size() -> usize {
    100
}

/// Listing page size when the request names none
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Upper bound on surveys read per export batch
pub const MAX_EXPORT_BATCH_SIZE: usize = 1000;

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            question_count: default_question_count(),
            max_page_size: default_max_page_size(),
            export_batch_size: default_export_batch_size(),
        }
    }
}

impl HttpServerConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
