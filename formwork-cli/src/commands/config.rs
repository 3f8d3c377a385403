use std::path::PathBuf;

use serde::Serialize;

use formwork_engine::FormOptions;
use formwork_util::settings::LoadedConfig;

use crate::commands::to_json;

#[derive(Debug, Serialize)]
struct ConfigReport<'a> {
    config_files_used: &'a [PathBuf],
    config_files_declared: &'a [PathBuf],
    form: &'a FormOptions,
}

pub fn execute(settings: &LoadedConfig, options: &FormOptions) -> crate::Result<()> {
    let report = ConfigReport {
        config_files_used: &settings.config_files_used,
        config_files_declared: &settings.config_files_declared,
        form: options,
    };
    println!("{}", to_json(&report, true)?);
    Ok(())
}
