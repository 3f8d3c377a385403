use cli_table::{print_stdout, Table, WithTitle};
use serde::Serialize;

use formwork_engine::SchemaRegistry;
use formwork_types::{Family, Kind};

use crate::commands::{load_registry, to_json};
use crate::OutputFormat;

/// List the kinds of configuration records
#[derive(clap::Parser)]
pub struct ListKindsCli {
    ///Only list kinds of this family, 'alert_channel', 'alert_definition' or 'storage'
    #[arg(long)]
    pub(crate) family: Option<Family>,
    ///JSON, prettified JSON or table as output format
    #[arg(value_enum, short, long, default_value_t=OutputFormat::Table)]
    pub(crate) output: OutputFormat,
}

#[derive(Table, Debug, Serialize)]
struct KindTable {
    #[table(title = "Kind")]
    kind: Kind,
    #[table(title = "Family")]
    family: Family,
    #[table(title = "Title")]
    title: &'static str,
    #[table(title = "Fields")]
    fields: usize,
}

impl ListKindsCli {
    pub fn execute(self) -> crate::Result<()> {
        let registry = load_registry()?;
        let kinds_table = kind_rows(&registry, self.family);

        match self.output {
            OutputFormat::Table => {
                print_stdout(kinds_table.with_title())
                    .map_err(|cause| format!("Failed to print kinds as table.\n  {cause}"))?;
            }
            OutputFormat::Json => {
                println!("{}", to_json(&kinds_table, false)?);
            }
            OutputFormat::PrettyJson => {
                println!("{}", to_json(&kinds_table, true)?);
            }
        }
        Ok(())
    }
}

fn kind_rows(registry: &SchemaRegistry, family: Option<Family>) -> Vec<KindTable> {
    registry.schemas()
        .filter(|schema| family.map_or(true, |family| schema.kind.family() == family))
        .map(|schema| KindTable {
            kind: schema.kind,
            family: schema.kind.family(),
            title: schema.title,
            fields: schema.fields.len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    #[test]
    fn should_list_the_kinds_of_one_family() -> anyhow::Result<()> {
        let registry = SchemaRegistry::builtin()?;

        let rows = kind_rows(&registry, Some(Family::AlertChannel));

        assert_that!(rows.iter().map(|row| row.kind).collect::<Vec<_>>(), elements_are![eq(Kind::Email), eq(Kind::Slack)]);
        Ok(())
    }

    #[test]
    fn should_list_all_kinds_without_filter() -> anyhow::Result<()> {
        let registry = SchemaRegistry::builtin()?;

        let rows = kind_rows(&registry, None);

        assert_that!(rows, len(eq(7)));
        Ok(())
    }
}
