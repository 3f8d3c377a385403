use std::collections::BTreeSet;

use serde_json::{Map, Number, Value};

use formwork_types::{Kind, Params, Record, SubmissionPayload};

use crate::registry::{FieldSpec, KindSchema, NameSource, SchemaRegistry, UnknownKindError, ValueFormat};
use crate::value::{FieldValue, FieldValues, Toggles};

const PATH_SEPARATOR: char = '.';

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("{0}")]
    UnknownKind(#[from] UnknownKindError),
    #[error("Required field '{field}' is empty.")]
    MissingRequiredField { field: String },
    #[error("Value of field '{field}' cannot be projected: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Turns form state into the payload handed to the record manager.
///
/// Projection is pure. Identical form state always yields an identical payload.
#[derive(Clone, Copy, Debug)]
pub struct Projector<'a> {
    registry: &'a SchemaRegistry,
    list_separator: &'a str,
}

impl<'a> Projector<'a> {
    pub fn new(registry: &'a SchemaRegistry, list_separator: &'a str) -> Self {
        Self { registry, list_separator }
    }

    pub fn project(&self, kind: Kind, values: &FieldValues, toggles: &Toggles) -> Result<SubmissionPayload, ProjectionError> {
        let schema = self.registry.lookup(kind)?;
        project_schema(schema, values, toggles, self.list_separator)
    }

    pub fn unproject(&self, record: &Record) -> Result<(FieldValues, Toggles), UnknownKindError> {
        let schema = self.registry.lookup(record.kind)?;
        Ok(unproject(schema, record, self.list_separator))
    }
}

pub fn project_schema(schema: &KindSchema, values: &FieldValues, toggles: &Toggles, list_separator: &str) -> Result<SubmissionPayload, ProjectionError> {
    let mut params = Params::new();

    for (key, value) in &schema.constants {
        insert_path(&mut params, key, value.to_json());
    }

    let mut field_name = None;

    for field in schema.visible_fields(toggles) {
        let Some(value) = coerce(field, values.get(field.id), list_separator)? else { continue };

        if schema.name_source == NameSource::Field(field.id) {
            field_name = value.as_str().map(String::from);
        }
        if let Some(output) = field.output {
            insert_path(&mut params, output, value);
        }
    }

    for toggle in &schema.toggles {
        if let Some(flag) = &toggle.flag {
            if schema.toggle_state(toggles, toggle.id) == flag.when {
                insert_path(&mut params, flag.key, flag.value.to_json());
            }
        }
    }

    let name = match schema.name_source {
        NameSource::Fixed(name) => String::from(name),
        NameSource::Field(field) => field_name
            .ok_or_else(|| ProjectionError::MissingRequiredField { field: String::from(field) })?,
    };

    Ok(SubmissionPayload::new(name, params))
}

/// Coerces the value of a visible field. `None` means the field is omitted from the payload.
fn coerce(field: &FieldSpec, value: Option<&FieldValue>, list_separator: &str) -> Result<Option<Value>, ProjectionError> {
    let invalid = |reason: String| ProjectionError::InvalidValue { field: String::from(field.id), reason };

    let text = match (field.format, value) {
        (ValueFormat::Flag, None) => return Ok(Some(Value::Bool(false))),
        (ValueFormat::Flag, Some(FieldValue::Flag(flag))) => return Ok(Some(Value::Bool(*flag))),
        (ValueFormat::Flag, Some(FieldValue::Text(text))) => {
            let flag = text.trim().parse::<bool>()
                .map_err(|_| invalid(format!("'{text}' is not a boolean")))?;
            return Ok(Some(Value::Bool(flag)));
        }
        (_, Some(FieldValue::Flag(flag))) => return Err(invalid(format!("expected text, got flag '{flag}'"))),
        (_, Some(FieldValue::Text(text))) => text.trim(),
        (_, None) => "",
    };

    let value = match field.format {
        ValueFormat::Text | ValueFormat::Flag => {
            (!text.is_empty()).then(|| Value::String(String::from(text)))
        }
        ValueFormat::List => {
            let elements = text.split(list_separator)
                .map(str::trim)
                .filter(|element| !element.is_empty())
                .map(|element| Value::String(String::from(element)))
                .collect::<Vec<_>>();
            (!elements.is_empty()).then_some(Value::Array(elements))
        }
        ValueFormat::Integer if text.is_empty() => None,
        ValueFormat::Integer => {
            let number = text.parse::<i64>()
                .map_err(|cause| invalid(format!("'{text}' is not an integer ({cause})")))?;
            Some(Value::Number(Number::from(number)))
        }
    };

    match value {
        None if field.required => Err(ProjectionError::MissingRequiredField { field: String::from(field.id) }),
        value => Ok(value),
    }
}

fn insert_path(params: &mut Params, path: &str, value: Value) {
    match path.split_once(PATH_SEPARATOR) {
        None => {
            params.insert(String::from(path), value);
        }
        Some((head, tail)) => {
            let nested = params.entry(head)
                .or_insert_with(|| Value::Object(Map::new()));
            if !nested.is_object() {
                *nested = Value::Object(Map::new());
            }
            if let Value::Object(nested) = nested {
                insert_path(nested, tail, value);
            }
        }
    }
}

fn lookup_path<'p>(params: &'p Params, path: &str) -> Option<&'p Value> {
    match path.split_once(PATH_SEPARATOR) {
        None => params.get(path),
        Some((head, tail)) => match params.get(head) {
            Some(Value::Object(nested)) => lookup_path(nested, tail),
            _ => None,
        },
    }
}

/// Reconstructs form values and toggle states from a stored record, to pre-populate an update form.
pub fn unproject(schema: &KindSchema, record: &Record, list_separator: &str) -> (FieldValues, Toggles) {
    let toggles = schema.toggles.iter()
        .map(|toggle| {
            let gated_state = schema.fields.iter()
                .filter(|field| field.visible_when.is_some_and(|visible_when| visible_when.toggle == toggle.id))
                .find_map(|field| {
                    let output = field.output?;
                    let visible_when = field.visible_when?;
                    lookup_path(&record.params, output).map(|_| visible_when.state)
                });
            let state = match &toggle.flag {
                Some(flag) if lookup_path(&record.params, flag.key) == Some(&flag.value.to_json()) => flag.when,
                Some(flag) => gated_state.unwrap_or(!flag.when),
                None => gated_state.unwrap_or(toggle.default),
            };
            (String::from(toggle.id), state)
        })
        .collect::<Toggles>();

    let values = schema.fields.iter()
        .map(|field| {
            let value = if schema.name_source == NameSource::Field(field.id) {
                FieldValue::from(record.name.as_str())
            } else {
                field.output
                    .and_then(|output| lookup_path(&record.params, output))
                    .map(|value| render(field, value, list_separator))
                    .unwrap_or_else(|| field.default_value())
            };
            (String::from(field.id), value)
        })
        .collect::<FieldValues>();

    (values, toggles)
}

fn render(field: &FieldSpec, value: &Value, list_separator: &str) -> FieldValue {
    match (field.format, value) {
        (ValueFormat::Flag, Value::Bool(flag)) => FieldValue::Flag(*flag),
        (ValueFormat::Flag, Value::String(text)) => FieldValue::Flag(text.eq_ignore_ascii_case("true")),
        (ValueFormat::Flag, _) => FieldValue::Flag(false),
        (_, Value::String(text)) => FieldValue::from(text.as_str()),
        (_, Value::Array(elements)) => {
            let elements = elements.iter()
                .map(|element| match element {
                    Value::String(text) => Clone::clone(text),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>();
            FieldValue::from(elements.join(list_separator))
        }
        (_, Value::Null) => FieldValue::empty(),
        (_, other) => FieldValue::from(other.to_string()),
    }
}

/// Top-level parameter keys of a projection in which every visible field is filled.
pub fn output_keys(schema: &KindSchema, toggles: &Toggles) -> BTreeSet<String> {
    let constants = schema.constants.iter()
        .map(|(key, _)| *key);

    let fields = schema.visible_fields(toggles)
        .filter_map(|field| field.output);

    let flags = schema.toggles.iter()
        .filter_map(|toggle| toggle.flag.as_ref().map(|flag| (toggle, flag)))
        .filter(|(toggle, flag)| schema.toggle_state(toggles, toggle.id) == flag.when)
        .map(|(_, flag)| flag.key);

    constants.chain(fields).chain(flags)
        .map(|path| String::from(path.split(PATH_SEPARATOR).next().unwrap_or(path)))
        .collect()
}
