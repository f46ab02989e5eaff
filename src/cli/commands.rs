//! CLI command implementations
//!
//! Boot order for `serve`:
//! 1. Configuration load
//! 2. Logging setup
//! 3. Database open and migration
//! 4. Study config seeding
//! 5. HTTP activation

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::aggregate::{ExportEncoder, ExportFormat};
use crate::fault_point::FaultPoints;
use crate::http_server::{HttpServer, HttpServerConfig, MAX_EXPORT_BATCH_SIZE};
use crate::observability::{init_tracing, log_event_with_fields, Event, LogFormat};
use crate::schema::StudyConfigLoader;
use crate::store::{default_database_path, Database, SurveyStore};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{open_output, write_response};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite file (default: ./data/surveys.db)
    #[serde(default = "default_database_file")]
    pub database_path: String,

    /// Bind address, CORS and request limits
    #[serde(flatten)]
    pub server: HttpServerConfig,

    /// Directory of study config files seeded at boot (optional)
    #[serde(default)]
    pub study_config_dir: Option<String>,

    /// Log output format (default: text)
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_database_file() -> String {
    default_database_path(Path::new("./data"))
        .to_string_lossy()
        .into_owned()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_file(),
            server: HttpServerConfig::default(),
            study_config_dir: None,
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from file. A missing file yields the defaults.
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.database_path.trim().is_empty() {
            return Err(CliError::config_error("database_path must not be empty"));
        }
        if self.server.question_count == 0 {
            return Err(CliError::config_error("question_count must be > 0"));
        }
        if self.server.max_page_size == 0 {
            return Err(CliError::config_error("max_page_size must be > 0"));
        }
        if self.server.export_batch_size == 0 || self.server.export_batch_size > MAX_EXPORT_BATCH_SIZE {
            return Err(CliError::config_error(format!(
                "export_batch_size must be between 1 and {}",
                MAX_EXPORT_BATCH_SIZE
            )));
        }
        if let Some(origin) = self
            .server
            .cors_origins
            .iter()
            .find(|o| o.parse::<axum::http::HeaderValue>().is_err())
        {
            return Err(CliError::config_error(format!("Invalid CORS origin: '{}'", origin)));
        }
        Ok(())
    }

    pub fn database_path(&self) -> &Path {
        Path::new(&self.database_path)
    }

    pub fn study_config_dir(&self) -> Option<PathBuf> {
        self.study_config_dir.as_ref().map(PathBuf::from)
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config, port } => serve(&config, port),
        Command::Export {
            config,
            study,
            format,
            output,
        } => export(&config, &study, &format, output.as_deref()),
        Command::CheckStudies { config, dir } => check_studies(&config, dir.as_deref()),
    }
}

/// Creates the database and, when absent, a default config file.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config_written = !config_path.exists();
    let config = Config::load(config_path)?;

    let database = config.database_path();
    if database.exists() {
        return Err(CliError::already_initialized(database.display()));
    }

    if config_written {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(config_path, serde_json::to_string_pretty(&config)?)?;
    }

    Database::open(database)?;

    if let Some(dir) = config.study_config_dir() {
        fs::create_dir_all(&dir).map_err(|e| {
            CliError::config_error(format!("Failed to create directory {:?}: {}", dir, e))
        })?;
    }

    write_response(json!({
        "initialized": true,
        "database": config.database_path,
        "config": config_path.display().to_string(),
        "config_written": config_written,
    }))?;

    Ok(())
}

/// Boots the store and serves HTTP until a shutdown signal.
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = Config::load(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }

    init_tracing(config.log_format);
    let config_display = config_path.display().to_string();
    log_event_with_fields(Event::BootStart, &[("config", config_display.as_str())]);
    log_event_with_fields(Event::ConfigLoaded, &[("database", config.database_path.as_str())]);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    let result = rt.block_on(async {
        let store = open_store(&config)?;
        let seeded = seed_study_configs(&store, &config).await?;
        let seeded_text = seeded.to_string();
        log_event_with_fields(Event::StudyConfigsLoaded, &[("count", seeded_text.as_str())]);

        let server = HttpServer::with_config(config.server.clone(), store);
        log_event_with_fields(Event::BootComplete, &[]);

        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    });

    if let Err(err) = &result {
        log_event_with_fields(Event::BootFailed, &[("error", err.message())]);
    }
    result
}

/// Writes one study's export to stdout or a file, batch by batch.
pub fn export(config_path: &Path, study_id: &str, format: &str, output: Option<&Path>) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let format: ExportFormat = format.parse().map_err(CliError::config_error)?;
    if !config.database_path().exists() {
        return Err(CliError::not_initialized(config.database_path().display()));
    }

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let store = open_store(&config)?;
        let survey_ids = store.export_survey_ids(study_id).await?;

        let mut out = open_output(output)?;
        let mut encoder = ExportEncoder::new(format);
        out.write_all(encoder.begin().as_bytes())?;
        for batch in survey_ids.chunks(config.server.export_batch_size) {
            let rows = store.export_rows(batch.to_vec()).await?;
            out.write_all(encoder.encode_batch(&rows).as_bytes())?;
        }
        out.write_all(encoder.finish().as_bytes())?;
        out.flush()?;

        info!(study_id, surveys = survey_ids.len(), rows = encoder.rows(), "export written");
        store.close().await?;
        Ok::<(), CliError>(())
    })
}

/// Loads every study config file and reports what was found.
pub fn check_studies(config_path: &Path, dir: Option<&Path>) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => config
            .study_config_dir()
            .ok_or_else(|| CliError::config_error("study_config_dir is not configured"))?,
    };
    if !dir.is_dir() {
        return Err(CliError::config_error(format!(
            "Study config directory not found: {}",
            dir.display()
        )));
    }

    let mut loader = StudyConfigLoader::new(&dir);
    loader.load_all()?;

    let studies: Vec<_> = loader
        .configs()
        .map(|c| {
            json!({
                "studyId": c.study_id,
                "questions": c.question_count(),
                "allowResubmission": c.settings.allow_resubmission,
            })
        })
        .collect();

    write_response(json!({
        "directory": dir.display().to_string(),
        "count": loader.config_count(),
        "studies": studies,
    }))?;

    Ok(())
}

fn open_store(config: &Config) -> CliResult<SurveyStore> {
    let db = Database::open(config.database_path())?;
    Ok(SurveyStore::with_faults(db, FaultPoints::from_env()))
}

/// Registers every config from the configured directory. Returns the count.
pub async fn seed_study_configs(store: &SurveyStore, config: &Config) -> CliResult<usize> {
    let Some(dir) = config.study_config_dir() else {
        return Ok(0);
    };

    let mut loader = StudyConfigLoader::new(&dir);
    loader.load_all()?;
    for study in loader.configs() {
        store.put_study_config(study.clone()).await?;
    }
    Ok(loader.config_count())
}
