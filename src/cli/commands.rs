//! CLI command implementations
//!
//! Every command loads the configured models, parses the query file and
//! validates it before doing its own work. The first error stops the
//! command.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::compiler::{IndexCompiler, QueryAnalyzer};
use crate::model::ModelManager;
use crate::query::{Query, QueryManager};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model files to load (required, at least one)
    pub models: Vec<PathBuf>,

    /// Parsed query file, as JSON emitted by the query parser (required)
    pub queries: PathBuf,

    /// Log filter used when RUST_LOG is unset (optional, default "qryc=info")
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "qryc=info".to_string()
}

impl Config {
    /// Load configuration from file.
    ///
    /// Relative paths are resolved against the config file's directory.
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let mut config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for model in &mut config.models {
            *model = resolve(base, model);
        }
        config.queries = resolve(base, &config.queries);

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.models.is_empty() {
            return Err(CliError::config_error("models must list at least one model file"));
        }

        if self.queries.as_os_str().is_empty() {
            return Err(CliError::config_error("queries must name a query file"));
        }

        if EnvFilter::try_new(&self.log_filter).is_err() {
            return Err(CliError::config_error(format!(
                "Invalid log_filter: '{}'",
                self.log_filter
            )));
        }

        Ok(())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Installs the stderr log subscriber. RUST_LOG takes precedence over
/// the configured filter.
fn init_tracing(log_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter));
    // a subscriber may already be installed (tests)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Main CLI entry point
///
/// Parses arguments, runs the command and writes its JSON envelope.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();

    let result = Config::load(cli.command.config_path()).and_then(|config| {
        init_tracing(&config.log_filter);
        run_command(&cli.command, &config)
    });

    match result {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Runs a command against a loaded configuration and returns its output
pub fn run_command(cmd: &Command, config: &Config) -> CliResult<Value> {
    match cmd {
        Command::Validate { .. } => validate(config),
        Command::Index { .. } => index(config),
        Command::Params { query, .. } => params(config, query.as_deref()),
    }
}

/// Loads the models and installs the validated query file
fn load(config: &Config) -> CliResult<QueryManager> {
    let mut models = ModelManager::new();
    for path in &config.models {
        models.load_file(path)?;
    }
    info!(types = models.len(), "loaded models");

    let source = fs::read_to_string(&config.queries).map_err(|e| {
        CliError::io_error(format!(
            "Failed to read query file {}: {}",
            config.queries.display(),
            e
        ))
    })?;

    let mut manager = QueryManager::new(Arc::new(models));
    let identifier = config.queries.display().to_string();
    let file = manager.create_query_file(&identifier, &source)?;
    manager.set_query_file(file)?;
    Ok(manager)
}

fn queries(manager: &QueryManager) -> &[Query] {
    manager
        .query_file()
        .map(|file| file.queries())
        .unwrap_or_default()
}

/// Validate every query in the configured query file
pub fn validate(config: &Config) -> CliResult<Value> {
    let manager = load(config)?;
    let names: Vec<&str> = queries(&manager).iter().map(Query::name).collect();

    Ok(json!({
        "valid": true,
        "queries": names
    }))
}

/// Compile one index definition per query, in declaration order
pub fn index(config: &Config) -> CliResult<Value> {
    let manager = load(config)?;
    let indexes = IndexCompiler::new().compile_manager(&manager)?;
    Ok(serde_json::to_value(indexes)?)
}

/// Parameter manifests keyed by query name
pub fn params(config: &Config, only: Option<&str>) -> CliResult<Value> {
    let manager = load(config)?;

    let selected: Vec<&Query> = match only {
        Some(name) => {
            let query = queries(&manager)
                .iter()
                .find(|q| q.name() == name)
                .ok_or_else(|| CliError::unknown_query(name))?;
            vec![query]
        }
        None => queries(&manager).iter().collect(),
    };

    let mut manifests = Map::new();
    for query in selected {
        let parameters = QueryAnalyzer::new(query, manager.registry()).analyze()?;
        manifests.insert(query.name().to_string(), serde_json::to_value(parameters)?);
    }
    Ok(Value::Object(manifests))
}
