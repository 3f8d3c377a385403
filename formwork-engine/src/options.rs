use serde::{Deserialize, Deserializer, Serialize};

use formwork_types::{Family, Kind};

pub const DEFAULT_LIST_SEPARATOR: &str = ",";

/// Host-configurable behaviour of a form, read from the `form` config section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    pub default_kind: DefaultKinds,
    /// Delimiter of list fields such as email recipients. Never empty.
    #[serde(deserialize_with = "non_empty_separator")]
    pub list_separator: String,
}

fn non_empty_separator<'de, D>(deserializer: D) -> Result<String, D::Error>
where D: Deserializer<'de> {
    let separator = String::deserialize(deserializer)?;
    if separator.is_empty() {
        return Err(serde::de::Error::custom("list_separator must not be empty"));
    }
    Ok(separator)
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            default_kind: DefaultKinds::default(),
            list_separator: String::from(DEFAULT_LIST_SEPARATOR),
        }
    }
}

impl FormOptions {
    pub fn default_kind(&self, family: Family) -> Kind {
        match family {
            Family::AlertChannel => self.default_kind.alert_channel,
            Family::AlertDefinition => self.default_kind.alert_definition,
            Family::Storage => self.default_kind.storage,
        }
    }
}

/// Kind a freshly opened create form starts with, per family.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultKinds {
    pub alert_channel: Kind,
    pub alert_definition: Kind,
    pub storage: Kind,
}

impl Default for DefaultKinds {
    fn default() -> Self {
        Self {
            alert_channel: Kind::Email,
            alert_definition: Kind::Alert,
            storage: Kind::Nfs,
        }
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    #[test]
    fn should_fill_missing_options_with_defaults() -> anyhow::Result<()> {
        let options: FormOptions = serde_json::from_str(r#"{ "default_kind": { "storage": "s3" } }"#)?;

        assert_that!(options.default_kind(Family::AlertChannel), eq(Kind::Email));
        assert_that!(options.default_kind(Family::AlertDefinition), eq(Kind::Alert));
        assert_that!(options.default_kind(Family::Storage), eq(Kind::S3));
        assert_that!(options.list_separator, eq(DEFAULT_LIST_SEPARATOR));
        Ok(())
    }

    #[test]
    fn should_reject_unknown_default_kinds() {
        let result = serde_json::from_str::<FormOptions>(r#"{ "default_kind": { "storage": "ftp" } }"#);

        assert!(result.is_err());
    }

    #[test]
    fn should_reject_an_empty_list_separator() {
        let result = serde_json::from_str::<FormOptions>(r#"{ "list_separator": "" }"#);

        let Err(cause) = result else { panic!("An empty separator should be rejected.") };
        assert_that!(cause.to_string(), contains_substring("list_separator must not be empty"));
    }

    #[test]
    fn should_accept_a_custom_list_separator() -> anyhow::Result<()> {
        let options: FormOptions = serde_json::from_str(r#"{ "list_separator": ";" }"#)?;

        assert_that!(options.list_separator, eq(";"));
        Ok(())
    }
}
