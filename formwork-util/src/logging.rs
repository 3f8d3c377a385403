use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;

use tracing_subscriber::filter::{Directive, EnvFilter, LevelFilter};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_ENV_VAR: &str = "FORMWORK_LOG";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unable to initialize tracing: {source}")]
    TracingFilterFromEnv { #[from] source: tracing_subscriber::filter::FromEnvError },
    #[error("Unable to initialize tracing: {source}")]
    TracingFilterParse { #[from] source: tracing_subscriber::filter::ParseError },
    #[error("Unable to initialize tracing: {source}")]
    TracingInit { #[from] source: tracing_subscriber::util::TryInitError },
    #[error("Failed to open log file at '{path}': {source}")]
    LogFile { path: PathBuf, #[source] source: std::io::Error },
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub default_level: Option<LevelFilter>,
    /// Level of the formwork crates themselves, on top of the default level.
    pub crate_level: Option<LevelFilter>,
    pub file_logging: Option<PathBuf>,
}

/// Installs the global subscriber. The filter is read from `FORMWORK_LOG`,
/// falling back to the configured default level (`info` when unset).
pub fn initialize_with_config(config: LoggingConfig) -> Result<(), Error> {

    let mut tracing_filter = EnvFilter::builder()
        .with_default_directive(config.default_level.unwrap_or(LevelFilter::INFO).into())
        .with_env_var(LOG_ENV_VAR)
        .from_env()?;

    if let Some(crate_level) = config.crate_level {
        tracing_filter = tracing_filter.add_directive(Directive::from_str(&format!("formwork={crate_level}"))?);
    }

    let logging_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .compact();

    let file_logging_layer =
        if let Some(log_file) = config.file_logging {
            let file = File::create(&log_file)
                .map_err(|source| Error::LogFile { path: log_file, source })?;

            Some(tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file))
        } else {
            None
        };

    tracing_subscriber::registry()
        .with(tracing_filter)
        .with(logging_layer)
        .with(file_logging_layer)
        .try_init()?;

    Ok(())
}
