//! Observability
//!
//! - Structured logging through `tracing`, text or JSON
//! - Typed lifecycle events
//! - In-process counters
//!
//! # Usage
//!
//! ```ignore
//! use survey_collector::observability::{init_tracing, log_event, Event, LogFormat};
//!
//! init_tracing(LogFormat::Json);
//! log_event(Event::BootStart);
//! log_event_with_fields(Event::ConfigLoaded, &[("path", "./survey.json")]);
//! ```

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{MetricsRegistry, MetricsSnapshot};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}', expected text or json", other)),
        }
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides the default `info` filter. A second call is a no-op.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    let _ = match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields rendered as `key=value` pairs
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let fields = fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ");

    if event.is_fatal() {
        error!(event = event.as_str(), fields = %fields, "fatal");
    } else if event.is_failure() {
        warn!(event = event.as_str(), fields = %fields);
    } else {
        info!(event = event.as_str(), fields = %fields);
    }
}
