use cli_table::{print_stdout, Table, WithTitle};
use serde::Serialize;

use formwork_engine::registry::{FieldSpec, InputType, NameSource, ToggleSpec, VisibleWhen};
use formwork_engine::KindSchema;
use formwork_types::Kind;

use crate::commands::{load_registry, to_json};
use crate::OutputFormat;

/// Describe the form of a kind
#[derive(clap::Parser)]
pub struct DescribeKindCli {
    ///Kind of configuration record, e.g. 'email' or 's3'
    #[arg()]
    pub(crate) kind: Kind,
    ///JSON, prettified JSON or table as output format
    #[arg(value_enum, short, long, default_value_t=OutputFormat::Table)]
    pub(crate) output: OutputFormat,
}

#[derive(Debug, Serialize)]
struct KindDescription {
    kind: Kind,
    title: &'static str,
    name: String,
    constants: Vec<(&'static str, serde_json::Value)>,
    toggles: Vec<ToggleTable>,
    fields: Vec<FieldTable>,
}

#[derive(Table, Debug, Serialize)]
struct FieldTable {
    #[table(title = "Field")]
    id: &'static str,
    #[table(title = "Label")]
    label: &'static str,
    #[table(title = "Input")]
    input: String,
    #[table(title = "Required")]
    required: bool,
    #[table(title = "Parameter")]
    output: String,
    #[table(title = "Visible")]
    visible: String,
    #[table(title = "Locked On Update")]
    identity: bool,
}

#[derive(Table, Debug, Serialize)]
struct ToggleTable {
    #[table(title = "Toggle")]
    id: &'static str,
    #[table(title = "Label")]
    label: &'static str,
    #[table(title = "Default")]
    default: bool,
    #[table(title = "Flag")]
    flag: String,
}

impl DescribeKindCli {
    pub fn execute(self) -> crate::Result<()> {
        let registry = load_registry()?;
        let schema = registry.lookup(self.kind)
            .map_err(|cause| cause.to_string())?;
        let description = describe(schema);

        match self.output {
            OutputFormat::Table => {
                println!("{} ({}), named {}", description.title, description.kind, description.name);
                print_stdout(description.fields.with_title())
                    .map_err(|cause| format!("Failed to print fields as table.\n  {cause}"))?;
                if !description.toggles.is_empty() {
                    print_stdout(description.toggles.with_title())
                        .map_err(|cause| format!("Failed to print toggles as table.\n  {cause}"))?;
                }
            }
            OutputFormat::Json => {
                println!("{}", to_json(&description, false)?);
            }
            OutputFormat::PrettyJson => {
                println!("{}", to_json(&description, true)?);
            }
        }
        Ok(())
    }
}

fn describe(schema: &KindSchema) -> KindDescription {
    let name = match schema.name_source {
        NameSource::Field(field) => format!("after field '{field}'"),
        NameSource::Fixed(name) => format!("'{name}'"),
    };
    KindDescription {
        kind: schema.kind,
        title: schema.title,
        name,
        constants: schema.constants.iter()
            .map(|(key, value)| (*key, value.to_json()))
            .collect(),
        toggles: schema.toggles.iter().map(toggle_row).collect(),
        fields: schema.fields.iter().map(field_row).collect(),
    }
}

fn field_row(field: &FieldSpec) -> FieldTable {
    let visible = match field.visible_when {
        None => String::from("always"),
        Some(VisibleWhen { toggle, state }) => format!("{toggle}={}", if state { "on" } else { "off" }),
    };
    FieldTable {
        id: field.id,
        label: field.label,
        input: match field.input_type {
            InputType::Select { source } => format!("{} of {source}", field.input_type.name()),
            input_type => String::from(input_type.name()),
        },
        required: field.required,
        output: field.output.map(String::from).unwrap_or_else(|| String::from("-")),
        visible,
        identity: field.identity,
    }
}

fn toggle_row(toggle: &ToggleSpec) -> ToggleTable {
    let flag = match &toggle.flag {
        None => String::from("-"),
        Some(flag) => format!("{}={} while {}", flag.key, flag.value.to_json(), if flag.when { "on" } else { "off" }),
    };
    ToggleTable {
        id: toggle.id,
        label: toggle.label,
        default: toggle.default,
        flag,
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use formwork_engine::SchemaRegistry;

    use super::*;

    #[test]
    fn should_describe_the_smtp_fields_as_gated_by_their_toggle() -> anyhow::Result<()> {
        let registry = SchemaRegistry::builtin()?;

        let description = describe(registry.lookup(Kind::Email)?);

        let smtp_server = description.fields.iter()
            .find(|field| field.id == "smtpServer")
            .ok_or(anyhow::anyhow!("smtpServer should be described"))?;
        assert_that!(smtp_server.output, eq("smtpData.smtpServer"));
        assert_that!(smtp_server.visible, eq("customSmtp=on"));
        assert_that!(description.toggles.iter().map(|toggle| toggle.flag.as_str()).collect::<Vec<_>>(), elements_are![eq("defaultSmtpSettings=true while off")]);
        Ok(())
    }

    #[test]
    fn should_mark_the_storage_location_as_locked_on_update() -> anyhow::Result<()> {
        let registry = SchemaRegistry::builtin()?;

        let description = describe(registry.lookup(Kind::Nfs)?);

        assert_that!(description.name, eq("'NFS'"));
        assert_that!(description.fields.iter().map(|field| (field.id, field.identity)).collect::<Vec<_>>(), elements_are![eq(("BACKUP_LOCATION", true))]);
        Ok(())
    }

    #[test]
    fn should_describe_the_alert_destination_as_a_selection_of_channels() -> anyhow::Result<()> {
        let registry = SchemaRegistry::builtin()?;

        let description = describe(registry.lookup(Kind::Alert)?);

        let destination = description.fields.iter()
            .find(|field| field.id == "ALERT_DESTINATION_LIST")
            .ok_or(anyhow::anyhow!("ALERT_DESTINATION_LIST should be described"))?;
        assert_that!(destination.input, eq("select of alert_channel"));
        assert_that!(destination.output, eq("routeUUID"));
        assert!(description.constants.contains(&("defaultRoute", serde_json::Value::Bool(true))));
        Ok(())
    }
}
