use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use console::Style;
use tracing::level_filters::LevelFilter;

use formwork_engine::FormOptions;
use formwork_util::logging::{self, LoggingConfig};
use formwork_util::settings::{FileFormat, load_config, LoadedConfig};

mod commands;

type Error = String;
type Result<T> = std::result::Result<T, Error>;

/// formctl inspects the configuration forms of alert channels, alert definitions and storage backends.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Kinds(commands::kinds::ListKindsCli),
    Describe(commands::describe::DescribeKindCli),
    Project(commands::project::ProjectCli),
    ///Show the loaded configuration
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Table,
    Json,
    PrettyJson,
}

#[tokio::main]
async fn main() -> ExitCode {
    let red = Style::new().red();
    match execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", red.apply_to(error));
            ExitCode::FAILURE
        }
    }
}

async fn execute() -> Result<()> {
    let args = Args::parse();

    let settings = load_config("formctl", include_str!("../formctl.toml"), FileFormat::Toml, config::Config::default())
        .map_err(|cause| format!("Failed to load configuration.\n  {cause}"))?;

    logging::initialize_with_config(logging_config(&settings)?)
        .map_err(|cause| format!("Failed to initialize logging.\n  {cause}"))?;

    let options = settings.section::<FormOptions>("form")
        .map_err(|cause| format!("Invalid form configuration.\n  {cause}"))?;

    match args.command {
        Commands::Kinds(implementation) => {
            implementation.execute()?;
        }
        Commands::Describe(implementation) => {
            implementation.execute()?;
        }
        Commands::Project(implementation) => {
            implementation.execute(options).await?;
        }
        Commands::Config => {
            commands::config::execute(&settings, &options)?;
        }
    }
    Ok(())
}

fn logging_config(settings: &LoadedConfig) -> Result<LoggingConfig> {
    let level = settings.config.get_string("log.level")
        .map_err(|cause| format!("Configuration should contain a log level.\n  {cause}"))?;
    let level = LevelFilter::from_str(&level)
        .map_err(|cause| format!("Invalid log level '{level}'.\n  {cause}"))?;

    let file = settings.config.get_string("log.file")
        .map_err(|cause| format!("Configuration should contain a field for 'log.file'.\n  {cause}"))?;
    let file_logging = (!file.is_empty()).then(|| PathBuf::from(file));

    Ok(LoggingConfig {
        default_level: Some(level),
        crate_level: Some(level),
        file_logging,
    })
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use formwork_types::{Family, Kind};

    use super::*;

    #[test]
    fn should_parse_the_kinds_command_with_a_family_filter() -> anyhow::Result<()> {
        let args = Args::try_parse_from(["formctl", "kinds", "--family", "storage", "--output", "json"])?;

        let Commands::Kinds(kinds) = args.command else { panic!("Expected the kinds command.") };
        assert_that!(kinds.family, some(eq(Family::Storage)));
        assert_that!(kinds.output, eq(OutputFormat::Json));
        Ok(())
    }

    #[test]
    fn should_parse_repeated_values_and_toggles() -> anyhow::Result<()> {
        let args = Args::try_parse_from([
            "formctl", "project", "email",
            "--value", "name=ops",
            "--value", "emailIds=a@x.com,b@x.com",
            "--toggle", "customSmtp=off",
        ])?;

        let Commands::Project(project) = args.command else { panic!("Expected the project command.") };
        assert_that!(project.kind, eq(Kind::Email));
        assert_that!(project.values, elements_are![
            eq((String::from("name"), String::from("ops"))),
            eq((String::from("emailIds"), String::from("a@x.com,b@x.com"))),
        ]);
        assert_that!(project.toggles, elements_are![eq((String::from("customSmtp"), false))]);
        Ok(())
    }

    #[test]
    fn should_reject_unknown_kinds() {
        let result = Args::try_parse_from(["formctl", "describe", "pagerDuty"]);

        assert!(result.is_err());
    }

    #[test]
    fn should_load_the_bundled_defaults() -> anyhow::Result<()> {
        let settings = load_config("formctl-test", include_str!("../formctl.toml"), FileFormat::Toml, config::Config::default())?;

        let options = settings.section::<FormOptions>("form")?;
        let logging = logging_config(&settings).map_err(anyhow::Error::msg)?;

        assert_that!(options, eq(FormOptions::default()));
        assert_that!(logging.default_level, some(eq(LevelFilter::WARN)));
        assert_that!(logging.file_logging, none());
        Ok(())
    }

    #[test]
    fn should_reject_an_empty_list_separator() -> anyhow::Result<()> {
        let overrides = config::Config::builder()
            .set_override("form.list_separator", "")?
            .build()?;
        let settings = load_config("formctl-test", include_str!("../formctl.toml"), FileFormat::Toml, overrides)?;

        let result = settings.section::<FormOptions>("form");

        assert!(result.is_err());
        Ok(())
    }
}
