use std::collections::BTreeSet;
use std::str::FromStr;

use strum::IntoEnumIterator;

use formwork_types::{Family, Kind};

pub use schema::{FieldSpec, InputType, KindSchema, NameSource, ParamValue, ToggleFlag, ToggleSpec, ValueFormat, VisibleWhen};

mod builtin;
mod schema;

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("No schema registered for kind '{kind}'.")]
pub struct UnknownKindError {
    pub kind: String,
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Schema for kind '{kind}' is already registered.")]
    DuplicateKind { kind: Kind },
    #[error("{0}")]
    UnknownKind(#[from] UnknownKindError),
    #[error("Schema for kind '{kind}' declares field '{field}' more than once.")]
    DuplicateField { kind: Kind, field: &'static str },
    #[error("Schema for kind '{kind}' takes its name from field '{field}', which it does not declare.")]
    UnknownNameField { kind: Kind, field: &'static str },
    #[error("Field '{field}' of kind '{kind}' depends on toggle '{toggle}', which is not declared.")]
    UnknownToggle { kind: Kind, field: &'static str, toggle: &'static str },
    #[error("Toggle '{toggle}' of kind '{kind}' emits its flag while field '{field}' is visible.")]
    ConflictingToggleGroup { kind: Kind, toggle: &'static str, field: &'static str },
}

/// Read-only mapping from kind to form schema, shared by all form instances.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    schemas: Vec<KindSchema>,
}

impl SchemaRegistry {

    /// Registry with the schemas of all alert channels, alert definitions and storage backends.
    pub fn builtin() -> Result<Self, RegistryError> {
        let registry = Self::from_schemas(builtin::schemas())?;
        registry.ensure_complete()?;
        Ok(registry)
    }

    pub fn from_schemas(schemas: impl IntoIterator<Item=KindSchema>) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for schema in schemas {
            registry.register(schema)?;
        }
        Ok(registry)
    }

    fn register(&mut self, schema: KindSchema) -> Result<(), RegistryError> {
        if self.schemas.iter().any(|registered| registered.kind == schema.kind) {
            return Err(RegistryError::DuplicateKind { kind: schema.kind });
        }
        check_consistency(&schema)?;
        self.schemas.push(schema);
        Ok(())
    }

    /// Fails unless every [`Kind`] has a schema.
    pub fn ensure_complete(&self) -> Result<(), RegistryError> {
        Kind::iter()
            .try_for_each(|kind| self.lookup(kind).map(|_| ()))
            .map_err(RegistryError::from)
    }

    pub fn lookup(&self, kind: Kind) -> Result<&KindSchema, UnknownKindError> {
        self.schemas.iter()
            .find(|schema| schema.kind == kind)
            .ok_or_else(|| UnknownKindError { kind: kind.to_string() })
    }

    pub fn lookup_str(&self, kind: &str) -> Result<&KindSchema, UnknownKindError> {
        let kind = Kind::from_str(kind)
            .map_err(|cause| UnknownKindError { kind: cause.value })?;
        self.lookup(kind)
    }

    pub fn kinds(&self, family: Family) -> impl Iterator<Item=Kind> + '_ {
        self.schemas.iter()
            .map(|schema| schema.kind)
            .filter(move |kind| kind.family() == family)
    }

    pub fn schemas(&self) -> impl Iterator<Item=&KindSchema> {
        self.schemas.iter()
    }
}

fn check_consistency(schema: &KindSchema) -> Result<(), RegistryError> {
    let kind = schema.kind;

    let mut field_ids = BTreeSet::new();
    for field in &schema.fields {
        if !field_ids.insert(field.id) {
            return Err(RegistryError::DuplicateField { kind, field: field.id });
        }
    }

    if let NameSource::Field(field) = schema.name_source {
        if !field_ids.contains(field) {
            return Err(RegistryError::UnknownNameField { kind, field });
        }
    }

    for field in &schema.fields {
        let Some(visible_when) = field.visible_when else { continue };

        let toggle = schema.find_toggle(visible_when.toggle)
            .ok_or(RegistryError::UnknownToggle { kind, field: field.id, toggle: visible_when.toggle })?;

        if let Some(flag) = &toggle.flag {
            if flag.when == visible_when.state {
                return Err(RegistryError::ConflictingToggleGroup { kind, toggle: toggle.id, field: field.id });
            }
        }
    }
    Ok(())
}
