use serde_json::Value;

use formwork_types::{Family, Kind};

use crate::validation::Check;
use crate::value::{FieldValue, Toggles};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputType {
    Text,
    Password,
    Toggle,
    /// Picks one record of `source`. The options are synced from that family's refreshes.
    Select { source: Family },
}

impl InputType {
    pub fn name(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Password => "password",
            InputType::Toggle => "toggle",
            InputType::Select { .. } => "select",
        }
    }
}

/// How the trimmed input of a field is coerced when projected into parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueFormat {
    Text,
    /// Delimited text, projected as a sequence of strings.
    List,
    Integer,
    Flag,
}

/// Field is only visible while `toggle` is in `state`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibleWhen {
    pub toggle: &'static str,
    pub state: bool,
}

/// Declarative description of one editable form field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub input_type: InputType,
    pub placeholder: &'static str,
    pub required: bool,
    /// Parameter path the value is written to. Dots denote nested objects.
    pub output: Option<&'static str>,
    pub format: ValueFormat,
    pub visible_when: Option<VisibleWhen>,
    /// Identifies the provisioned backing resource, thus never editable in update mode.
    pub identity: bool,
    pub check: Option<Check>,
}

impl FieldSpec {
    fn new(id: &'static str, label: &'static str, input_type: InputType, format: ValueFormat) -> Self {
        Self {
            id,
            label,
            input_type,
            placeholder: "",
            required: false,
            output: None,
            format,
            visible_when: None,
            identity: false,
            check: None,
        }
    }

    pub fn text(id: &'static str, label: &'static str) -> Self {
        Self::new(id, label, InputType::Text, ValueFormat::Text)
    }

    pub fn password(id: &'static str, label: &'static str) -> Self {
        Self::new(id, label, InputType::Password, ValueFormat::Text)
    }

    pub fn toggle(id: &'static str, label: &'static str) -> Self {
        Self::new(id, label, InputType::Toggle, ValueFormat::Flag)
    }

    pub fn select(id: &'static str, label: &'static str, source: Family) -> Self {
        Self::new(id, label, InputType::Select { source }, ValueFormat::Text)
    }

    pub fn placeholder(self, placeholder: &'static str) -> Self {
        Self { placeholder, ..self }
    }

    pub fn required(self) -> Self {
        Self { required: true, ..self }
    }

    pub fn output(self, output: &'static str) -> Self {
        Self { output: Some(output), ..self }
    }

    /// Projects the value under a key equal to the field id.
    pub fn output_as_id(self) -> Self {
        let output = self.id;
        self.output(output)
    }

    pub fn format(self, format: ValueFormat) -> Self {
        Self { format, ..self }
    }

    pub fn visible_when(self, toggle: &'static str, state: bool) -> Self {
        Self { visible_when: Some(VisibleWhen { toggle, state }), ..self }
    }

    pub fn identity(self) -> Self {
        Self { identity: true, ..self }
    }

    pub fn check(self, check: Check) -> Self {
        Self { check: Some(check), ..self }
    }

    /// Value of a freshly opened form.
    pub fn default_value(&self) -> FieldValue {
        match self.format {
            ValueFormat::Flag => FieldValue::Flag(false),
            ValueFormat::Text | ValueFormat::List | ValueFormat::Integer => FieldValue::empty(),
        }
    }

    /// Whether `value` has the shape this field expects, a flag for toggles and text otherwise.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self.format, value) {
            (ValueFormat::Flag, FieldValue::Flag(_)) => true,
            (ValueFormat::Flag, FieldValue::Text(_)) => false,
            (_, FieldValue::Text(_)) => true,
            (_, FieldValue::Flag(_)) => false,
        }
    }
}

/// Fixed parameter value of a constant or a toggle flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Bool(bool),
    Text(&'static str),
}

impl ParamValue {
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Bool(value) => Value::Bool(*value),
            ParamValue::Text(value) => Value::String(String::from(*value)),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&'static str> for ParamValue {
    fn from(value: &'static str) -> Self {
        ParamValue::Text(value)
    }
}

/// Parameter emitted while the owning toggle is in state `when`. Dots in `key` denote nested objects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToggleFlag {
    pub when: bool,
    pub key: &'static str,
    pub value: ParamValue,
}

/// Auxiliary switch gating a group of fields, e.g. "use custom SMTP configuration".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToggleSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub default: bool,
    pub flag: Option<ToggleFlag>,
}

impl ToggleSpec {
    pub fn new(id: &'static str, label: &'static str) -> Self {
        Self { id, label, default: false, flag: None }
    }

    pub fn default_on(self) -> Self {
        Self { default: true, ..self }
    }

    pub fn flag(self, when: bool, key: &'static str, value: impl Into<ParamValue>) -> Self {
        Self { flag: Some(ToggleFlag { when, key, value: value.into() }), ..self }
    }
}

/// Where the `name` of a submission payload comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameSource {
    Field(&'static str),
    Fixed(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KindSchema {
    pub kind: Kind,
    pub title: &'static str,
    pub name_source: NameSource,
    /// Parameters which are always part of the payload, e.g. the target type.
    pub constants: Vec<(&'static str, ParamValue)>,
    pub toggles: Vec<ToggleSpec>,
    pub fields: Vec<FieldSpec>,
}

impl KindSchema {
    pub fn new(kind: Kind, title: &'static str, name_source: NameSource) -> Self {
        Self {
            kind,
            title,
            name_source,
            constants: Vec::new(),
            toggles: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn constant(mut self, key: &'static str, value: impl Into<ParamValue>) -> Self {
        self.constants.push((key, value.into()));
        self
    }

    pub fn toggle(mut self, toggle: ToggleSpec) -> Self {
        self.toggles.push(toggle);
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn find_field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn find_toggle(&self, id: &str) -> Option<&ToggleSpec> {
        self.toggles.iter().find(|toggle| toggle.id == id)
    }

    /// State of a toggle, falling back to its default when the form never touched it.
    pub fn toggle_state(&self, toggles: &Toggles, id: &str) -> bool {
        toggles.get(id).copied()
            .or_else(|| self.find_toggle(id).map(|toggle| toggle.default))
            .unwrap_or(false)
    }

    pub fn default_toggles(&self) -> Toggles {
        self.toggles.iter()
            .map(|toggle| (String::from(toggle.id), toggle.default))
            .collect()
    }

    pub fn is_visible(&self, field: &FieldSpec, toggles: &Toggles) -> bool {
        match field.visible_when {
            None => true,
            Some(VisibleWhen { toggle, state }) => self.toggle_state(toggles, toggle) == state,
        }
    }

    pub fn visible_fields<'a>(&'a self, toggles: &'a Toggles) -> impl Iterator<Item=&'a FieldSpec> + 'a {
        self.fields.iter()
            .filter(move |field| self.is_visible(field, toggles))
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    fn schema() -> KindSchema {
        KindSchema::new(Kind::Email, "Email", NameSource::Field("name"))
            .toggle(ToggleSpec::new("customSmtp", "Custom SMTP Configuration"))
            .field(FieldSpec::text("name", "Name").required())
            .field(FieldSpec::text("smtpServer", "Server").visible_when("customSmtp", true))
            .field(FieldSpec::toggle("useSSL", "SSL").visible_when("customSmtp", true))
    }

    #[test]
    fn should_hide_gated_fields_while_the_toggle_is_off() {
        let schema = schema();

        let hidden = schema.visible_fields(&Toggles::new()).map(|field| field.id).collect::<Vec<_>>();
        let shown = schema.visible_fields(&Toggles::from([(String::from("customSmtp"), true)])).map(|field| field.id).collect::<Vec<_>>();

        assert_that!(hidden, elements_are![eq("name")]);
        assert_that!(shown, elements_are![eq("name"), eq("smtpServer"), eq("useSSL")]);
    }

    #[test]
    fn should_only_accept_values_of_the_expected_shape() {
        let schema = schema();
        let name = schema.find_field("name").expect("name field should exist");
        let use_ssl = schema.find_field("useSSL").expect("useSSL field should exist");

        assert!(name.accepts(&FieldValue::from("ops")));
        assert!(!name.accepts(&FieldValue::from(true)));
        assert!(use_ssl.accepts(&FieldValue::from(true)));
        assert!(!use_ssl.accepts(&FieldValue::from("true")));
        assert_that!(use_ssl.default_value(), eq(FieldValue::Flag(false)));
    }
}
