use std::path::PathBuf;

pub use config::{Config, ConfigError, FileFormat};
use home::home_dir;

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("Failed to load config: {0}")]
    Config(#[from] ConfigError),
    #[error("Error while retrieving configured value for '{field}'")]
    ReadField { field: &'static str, #[source] source: Box<ConfigError> },
}

#[derive(Clone, Debug)]
pub struct LoadedConfig {
    pub config: Config,
    pub config_files_used: Vec<PathBuf>,
    pub config_files_declared: Vec<PathBuf>,
}

impl LoadedConfig {
    /// Deserializes the section at `field`, e.g. `form` into the engine's options.
    pub fn section<'de, T: serde::Deserialize<'de>>(&self, field: &'static str) -> Result<T, LoadError> {
        self.config.get::<T>(field)
            .map_err(|source| LoadError::ReadField { field, source: Box::new(source) })
    }
}

/// Load configuration from files and environment variables used by formwork.
///
/// This includes in following order:
/// * A default configuration, provided as a string
/// * A system configuration, read from `/etc/formwork/{name}.toml`
/// * A user configuration, read from `[XDG_CONFIG_HOME|~/.config]/formwork/{name}/config.toml`
/// * A custom configuration, read from the path in `FORMWORK_{NAME}_CUSTOM_CONFIG_PATH`
/// * Environment variables prefixed with `FORMWORK_{NAME}_`
/// * The `overrides` passed as parameter.
///
pub fn load_config(name: &str, defaults: &str, defaults_format: FileFormat, overrides: Config) -> Result<LoadedConfig, LoadError> {

    let name_upper_case = name.to_uppercase();
    let system_config = format!("/etc/formwork/{name}.toml");
    let user_config = format!("formwork/{name}/config.toml");

    let builder = Config::builder()
        .add_source(config::File::from_str(defaults, defaults_format));

    let mut config_files = vec![
        Some(PathBuf::from(system_config)),
    ];

    match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg_config_home) => {
            config_files.push(Some(PathBuf::from(xdg_config_home).join(&user_config)));
        }
        Err(_) => {
            config_files.push(home_dir().map(|path| path.join(".config").join(&user_config)));
        }
    }

    let custom_config_path_env_key = format!("FORMWORK_{name_upper_case}_CUSTOM_CONFIG_PATH");
    if let Ok(config_path) = std::env::var(custom_config_path_env_key) {
        config_files.push(Some(PathBuf::from(config_path)));
    }

    let (sources_used, sources_declared): (Vec<PathBuf>, Vec<PathBuf>) = config_files.into_iter()
        .flatten()
        .fold((Vec::new(), Vec::new()), |(mut used, mut declared), path| {
            declared.push(Clone::clone(&path));
            if path.is_file() {
                used.push(path);
            }
            (used, declared)
        });

    let builder = sources_used.iter()
        .cloned()
        .fold(builder, |builder, path| {
            builder.add_source(config::File::from(path).required(false))
        });

    let builder = builder.add_source(
        config::Environment::with_prefix(&format!("FORMWORK_{name_upper_case}"))
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    );

    let settings = builder
        .add_source(overrides)
        .build()?;

    tracing::debug!("Loaded configuration '{name}' from files: {sources_used:?}");

    Ok(LoadedConfig {
        config: settings,
        config_files_used: sources_used,
        config_files_declared: sources_declared,
    })
}
