use std::sync::Arc;

use cli_table::{print_stdout, Table, WithTitle};
use serde::Serialize;

use formwork_api::InMemoryRecordManager;
use formwork_engine::registry::ValueFormat;
use formwork_engine::{FieldValue, FormEngine, FormOptions, SubmitError, SubmitOutcome};
use formwork_types::{Kind, SubmissionPayload};

use crate::commands::{load_registry, to_json};
use crate::OutputFormat;

/// Validate form values and print the payload a submission would send
#[derive(clap::Parser)]
pub struct ProjectCli {
    ///Kind of configuration record, e.g. 'email' or 's3'
    #[arg()]
    pub(crate) kind: Kind,
    ///Field value as 'id=value'. May be repeated.
    #[arg(long = "value", value_parser = parse_assignment)]
    pub(crate) values: Vec<(String, String)>,
    ///Toggle state as 'id=on' or 'id=off'. May be repeated.
    #[arg(long = "toggle", value_parser = parse_toggle)]
    pub(crate) toggles: Vec<(String, bool)>,
    ///JSON, prettified JSON or table as output format
    #[arg(value_enum, short, long, default_value_t=OutputFormat::PrettyJson)]
    pub(crate) output: OutputFormat,
}

#[derive(Table, Debug, Serialize)]
struct ParameterTable {
    #[table(title = "Parameter")]
    key: String,
    #[table(title = "Value")]
    value: String,
}

impl ProjectCli {
    pub async fn execute(self, options: FormOptions) -> crate::Result<()> {
        let output = self.output;
        let payload = self.project(options).await?;

        match output {
            OutputFormat::Table => {
                let parameters = std::iter::once(ParameterTable { key: String::from("name"), value: Clone::clone(&payload.name) })
                    .chain(payload.params.iter().map(|(key, value)| ParameterTable {
                        key: Clone::clone(key),
                        value: value.to_string(),
                    }))
                    .collect::<Vec<_>>();
                print_stdout(parameters.with_title())
                    .map_err(|cause| format!("Failed to print payload as table.\n  {cause}"))?;
            }
            OutputFormat::Json => {
                println!("{}", to_json(&payload, false)?);
            }
            OutputFormat::PrettyJson => {
                println!("{}", to_json(&payload, true)?);
            }
        }
        Ok(())
    }

    /// Fills a create form and submits it to a throwaway in-memory record manager.
    async fn project(self, options: FormOptions) -> crate::Result<SubmissionPayload> {
        let registry = Arc::new(load_registry()?);
        let schema = registry.lookup(self.kind)
            .map_err(|cause| cause.to_string())?;

        let values = self.values.into_iter()
            .map(|(id, value)| {
                let is_flag = schema.find_field(&id)
                    .is_some_and(|field| field.format == ValueFormat::Flag);
                let value = if is_flag {
                    parse_state(&value).map(FieldValue::Flag)?
                } else {
                    FieldValue::Text(value)
                };
                Ok((id, value))
            })
            .collect::<crate::Result<Vec<_>>>()?;

        let engine = FormEngine::new(Arc::clone(&registry), Arc::new(InMemoryRecordManager::new()), self.kind.family(), options);
        engine.open(None).map_err(|cause| cause.to_string())?;
        engine.select_kind(self.kind).map_err(|cause| cause.to_string())?;

        for (id, state) in self.toggles {
            engine.set_toggle(&id, state).map_err(|cause| cause.to_string())?;
        }
        for (id, value) in values {
            engine.set_value(&id, value).map_err(|cause| cause.to_string())?;
        }

        match engine.submit().await {
            Ok(SubmitOutcome::Submitted { record, .. }) => Ok(SubmissionPayload::new(record.name, record.params)),
            Ok(SubmitOutcome::AlreadyInFlight) => Err(String::from("Form is already being submitted.")),
            Err(SubmitError::Validation(cause)) => {
                let violations = cause.violations.iter()
                    .map(|(field, message)| format!("  {field}: {message}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                Err(format!("Form for '{}' contains invalid fields:\n{violations}", self.kind))
            }
            Err(cause) => Err(cause.to_string()),
        }
    }
}

fn parse_assignment(input: &str) -> Result<(String, String), String> {
    match input.split_once('=') {
        Some((id, value)) if !id.trim().is_empty() => Ok((String::from(id.trim()), String::from(value))),
        _ => Err(format!("Expected 'id=value', got '{input}'.")),
    }
}

fn parse_toggle(input: &str) -> Result<(String, bool), String> {
    let (id, state) = parse_assignment(input)?;
    Ok((id, parse_state(&state)?))
}

fn parse_state(state: &str) -> Result<bool, String> {
    match state.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        _ => Err(format!("Expected 'on' or 'off', got '{state}'.")),
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn cli(kind: Kind, values: &[(&str, &str)], toggles: &[(&str, bool)]) -> ProjectCli {
        ProjectCli {
            kind,
            values: values.iter().map(|(id, value)| (String::from(*id), String::from(*value))).collect(),
            toggles: toggles.iter().map(|(id, state)| (String::from(*id), *state)).collect(),
            output: OutputFormat::Json,
        }
    }

    #[tokio::test]
    async fn should_project_a_custom_smtp_configuration() -> anyhow::Result<()> {
        let cli = cli(Kind::Email, &[
            ("name", "ops"),
            ("emailIds", "a@x.com"),
            ("smtpServer", "smtp.example.com"),
            ("smtpPort", "465"),
            ("emailFrom", "alerts@example.com"),
            ("useSSL", "on"),
        ], &[("customSmtp", true)]);

        let payload = cli.project(FormOptions::default()).await.map_err(anyhow::Error::msg)?;

        assert_that!(payload.param("smtpData"), some(eq(&json!({
            "smtpServer": "smtp.example.com",
            "smtpPort": 465,
            "emailFrom": "alerts@example.com",
            "useSSL": true,
            "useTLS": false,
        }))));
        Ok(())
    }

    #[tokio::test]
    async fn should_project_an_alert_for_selected_universes() -> anyhow::Result<()> {
        let cli = cli(Kind::Alert, &[
            ("ALERT_CONFIGURATION_NAME", "lag"),
            ("ALERT_CONFIGURATION_DESCRIPTION", "Replication lag"),
            ("ALERT_METRICS_DURATION", "120"),
            ("ALERT_UNIVERSE_LIST", "u1,u2"),
        ], &[("allUniverses", false)]);

        let payload = cli.project(FormOptions::default()).await.map_err(anyhow::Error::msg)?;

        assert_that!(payload.name, eq("lag"));
        assert_that!(payload.param("target"), some(eq(&json!({ "uuids": ["u1", "u2"] }))));
        assert_that!(payload.param("durationSec"), some(eq(&json!(120))));
        Ok(())
    }

    #[tokio::test]
    async fn should_report_every_invalid_field() {
        let cli = cli(Kind::Nfs, &[("BACKUP_LOCATION", "mnt/backups")], &[]);

        let result = cli.project(FormOptions::default()).await;

        assert_that!(result, err(eq("Form for 'nfs' contains invalid fields:\n  BACKUP_LOCATION: Invalid field value 'mnt/backups'.")));
    }

    #[tokio::test]
    async fn should_reject_values_for_unknown_fields() {
        let cli = cli(Kind::Slack, &[("routingKey", "abc")], &[]);

        let result = cli.project(FormOptions::default()).await;

        assert_that!(result, err(eq("Unknown field 'routingKey'.")));
    }

    #[rstest]
    #[case("name=ops", Ok((String::from("name"), String::from("ops"))))]
    #[case("emailIds=a@x.com,b=c@x.com", Ok((String::from("emailIds"), String::from("a@x.com,b=c@x.com"))))]
    #[case("=ops", Err(String::from("Expected 'id=value', got '=ops'.")))]
    #[case("name", Err(String::from("Expected 'id=value', got 'name'.")))]
    fn should_parse_assignments(#[case] input: &str, #[case] expected: std::result::Result<(String, String), String>) {
        assert_that!(parse_assignment(input), eq(expected));
    }

    #[rstest]
    #[case("customSmtp=on", Ok((String::from("customSmtp"), true)))]
    #[case("customSmtp=False", Ok((String::from("customSmtp"), false)))]
    #[case("customSmtp=maybe", Err(String::from("Expected 'on' or 'off', got 'maybe'.")))]
    fn should_parse_toggles(#[case] input: &str, #[case] expected: std::result::Result<(String, bool), String>) {
        assert_that!(parse_toggle(input), eq(expected));
    }
}
