use formwork_engine::SchemaRegistry;

pub mod config;
pub mod describe;
pub mod kinds;
pub mod project;

pub(crate) fn load_registry() -> crate::Result<SchemaRegistry> {
    SchemaRegistry::builtin()
        .map_err(|cause| format!("Failed to load the form schemas.\n  {cause}"))
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> crate::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.map_err(|cause| format!("Failed to serialize output as JSON.\n  {cause}"))
}
