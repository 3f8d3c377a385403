use std::collections::BTreeMap;

use url::Url;

use formwork_types::{Family, RecordId, SelectionOption};

use crate::ior::{FieldInput, Ior};
use crate::registry::{FieldSpec, InputType, KindSchema};
use crate::value::{FieldValue, FieldValues, Toggles};

pub const REQUIRED_MESSAGE: &str = "This field is required.";

const DEFAULT_SCHEME: &str = "https://";

/// Options of record-backed select fields, keyed by the family whose records they list.
pub type SyncedOptions = BTreeMap<Family, Vec<SelectionOption>>;

/// Client-side format check of a non-empty field value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Check {
    /// `/`, `//` or an absolute path of `[A-Za-z0-9_-]` segments.
    NfsPath,
    /// Bucket location starting with `s3://`.
    S3Bucket,
    /// URL with one of the given schemes. Values without scheme are checked as `https://`.
    Url { schemes: &'static [&'static str] },
    Port,
    Email,
    /// Delimited list of email addresses.
    EmailList,
    Json,
    /// Positive number of seconds.
    Duration,
}

impl Check {
    pub fn check(&self, value: &str, list_separator: &str) -> bool {
        match self {
            Check::NfsPath => is_nfs_path(value),
            Check::S3Bucket => value.starts_with("s3://"),
            Check::Url { schemes } => is_url(value, schemes),
            Check::Port => value.parse::<u16>().is_ok_and(|port| port > 0),
            Check::Email => is_email(value),
            Check::EmailList => value.split(list_separator)
                .map(str::trim)
                .all(is_email),
            Check::Json => serde_json::from_str::<serde_json::Value>(value).is_ok(),
            Check::Duration => value.parse::<u32>().is_ok_and(|seconds| seconds > 0),
        }
    }
}

fn is_nfs_path(value: &str) -> bool {
    if value == "/" || value == "//" {
        return true;
    }
    match value.strip_prefix('/') {
        None => false,
        Some(path) => path.split('/').all(|segment| {
            !segment.is_empty()
                && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }),
    }
}

fn is_url(value: &str, schemes: &[&str]) -> bool {
    let candidate = if value.contains("://") {
        String::from(value)
    } else {
        format!("{DEFAULT_SCHEME}{value}")
    };
    match Url::parse(&candidate) {
        Ok(url) => schemes.contains(&url.scheme()) && url.host().is_some(),
        Err(_) => false,
    }
}

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

fn invalid_value_message(value: &str) -> String {
    format!("Invalid field value '{value}'.")
}

/// Validates the current value of one field.
///
/// A select value must name one of the synced options of its source family.
/// Before the first sync of that family any record id is accepted.
pub fn validate_field(field: &FieldSpec, value: Option<&FieldValue>, list_separator: &str, synced: &SyncedOptions) -> FieldInput {
    let text = match value {
        None => String::new(),
        Some(FieldValue::Flag(flag)) => return Ior::Right(flag.to_string()),
        Some(FieldValue::Text(text)) => String::from(text.trim()),
    };

    if text.is_empty() {
        return if field.required {
            Ior::Left(String::from(REQUIRED_MESSAGE))
        } else {
            Ior::Right(text)
        };
    }

    if let InputType::Select { source } = field.input_type {
        let known = match synced.get(&source) {
            Some(options) => options.iter().any(|option| option.value.to_string() == text),
            None => RecordId::try_from(text.as_str()).is_ok(),
        };
        if !known {
            return Ior::Both(invalid_value_message(&text), text);
        }
    }

    match field.check {
        Some(check) if !check.check(&text, list_separator) => Ior::Both(invalid_value_message(&text), text),
        _ => Ior::Right(text),
    }
}

/// One message per invalid field, keyed by field id.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("Form contains invalid fields: {}", .violations.keys().cloned().collect::<Vec<_>>().join(", "))]
pub struct ValidationError {
    pub violations: BTreeMap<String, String>,
}

/// Validates every visible field, collecting all violations instead of stopping at the first.
pub fn validate(schema: &KindSchema, values: &FieldValues, toggles: &Toggles, list_separator: &str, synced: &SyncedOptions) -> Result<(), ValidationError> {
    let violations = schema.visible_fields(toggles)
        .filter_map(|field| {
            validate_field(field, values.get(field.id), list_separator, synced)
                .left()
                .map(|message| (String::from(field.id), message))
        })
        .collect::<BTreeMap<_, _>>();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use formwork_types::Kind;

    use crate::registry::{NameSource, ToggleSpec};

    use super::*;

    #[rstest]
    #[case("/", true)]
    #[case("//", true)]
    #[case("/mnt/backups", true)]
    #[case("/mnt/yb_backups-1", true)]
    #[case("mnt/backups", false)]
    #[case("/mnt//backups", false)]
    #[case("/mnt/backups/", false)]
    #[case("/mnt/my backups", false)]
    fn should_check_nfs_paths(#[case] value: &str, #[case] valid: bool) {
        assert_that!(Check::NfsPath.check(value, ","), eq(valid));
    }

    #[rstest]
    #[case("s3://backups", true)]
    #[case("backups", true)]
    #[case("https://storage.googleapis.com/backups", true)]
    #[case("gs://backups", false)]
    #[case("ftp://backups", false)]
    #[case("https://", false)]
    fn should_check_urls_against_allowed_schemes(#[case] value: &str, #[case] valid: bool) {
        let check = Check::Url { schemes: &["http", "https", "s3"] };
        assert_that!(check.check(value, ","), eq(valid));
    }

    #[rstest]
    #[case(Check::S3Bucket, "s3://backups", true)]
    #[case(Check::S3Bucket, "backups", false)]
    #[case(Check::Port, "587", true)]
    #[case(Check::Port, "0", false)]
    #[case(Check::Port, "70000", false)]
    #[case(Check::Port, "smtp", false)]
    #[case(Check::Email, "ops@example.com", true)]
    #[case(Check::Email, "ops.example.com", false)]
    #[case(Check::EmailList, "a@x.com, b@x.com", true)]
    #[case(Check::EmailList, "a@x.com,,b@x.com", false)]
    #[case(Check::Json, r#"{"type": "service_account"}"#, true)]
    #[case(Check::Json, "{type", false)]
    #[case(Check::Duration, "300", true)]
    #[case(Check::Duration, "0", false)]
    #[case(Check::Duration, "-5", false)]
    #[case(Check::Duration, "5m", false)]
    fn should_check_formats(#[case] check: Check, #[case] value: &str, #[case] valid: bool) {
        assert_that!(check.check(value, ","), eq(valid));
    }

    fn schema() -> KindSchema {
        KindSchema::new(Kind::Email, "Email", NameSource::Field("name"))
            .toggle(ToggleSpec::new("customSmtp", "Custom SMTP"))
            .field(FieldSpec::text("name", "Name").required())
            .field(FieldSpec::text("emailIds", "Emails").required().check(Check::EmailList))
            .field(FieldSpec::select("destination", "Destination", Family::AlertChannel))
            .field(FieldSpec::text("smtpServer", "Server").required().visible_when("customSmtp", true))
    }

    fn synced(options: Vec<SelectionOption>) -> SyncedOptions {
        SyncedOptions::from([(Family::AlertChannel, options)])
    }

    #[test]
    fn should_collect_all_violations_of_visible_fields() {
        let values = FieldValues::from([
            (String::from("name"), FieldValue::from("  ")),
            (String::from("emailIds"), FieldValue::from("ops")),
            (String::from("destination"), FieldValue::from("pagerduty")),
        ]);

        let result = validate(&schema(), &values, &Toggles::new(), ",", &SyncedOptions::new());

        let error = result.expect_err("Validation should fail.");
        assert_that!(error.violations, eq(BTreeMap::from([
            (String::from("destination"), String::from("Invalid field value 'pagerduty'.")),
            (String::from("emailIds"), String::from("Invalid field value 'ops'.")),
            (String::from("name"), String::from(REQUIRED_MESSAGE)),
        ])));
    }

    #[test]
    fn should_only_accept_synced_destinations_once_synced() {
        let field = FieldSpec::select("destination", "Destination", Family::AlertChannel);
        let ops = SelectionOption { value: RecordId::random(), label: String::from("ops") };
        let removed = RecordId::random().to_string();

        assert_that!(validate_field(&field, Some(&FieldValue::from(removed.as_str())), ",", &SyncedOptions::new()), eq(Ior::Right(Clone::clone(&removed))));
        assert_that!(validate_field(&field, Some(&FieldValue::from(removed.as_str())), ",", &synced(vec![Clone::clone(&ops)])), eq(Ior::Both(invalid_value_message(&removed), Clone::clone(&removed))));
        assert_that!(validate_field(&field, Some(&FieldValue::from(ops.value.to_string())), ",", &synced(vec![Clone::clone(&ops)])), eq(Ior::Right(ops.value.to_string())));
        assert_that!(validate_field(&field, Some(&FieldValue::from(ops.value.to_string())), ",", &synced(Vec::new())), eq(Ior::Both(invalid_value_message(&ops.value.to_string()), ops.value.to_string())));
    }

    #[test]
    fn should_validate_gated_fields_only_while_visible() {
        let values = FieldValues::from([
            (String::from("name"), FieldValue::from("ops")),
            (String::from("emailIds"), FieldValue::from("a@x.com")),
        ]);
        let custom_smtp = Toggles::from([(String::from("customSmtp"), true)]);

        assert_that!(validate(&schema(), &values, &Toggles::new(), ",", &SyncedOptions::new()), ok(eq(())));

        let error = validate(&schema(), &values, &custom_smtp, ",", &SyncedOptions::new()).expect_err("Validation should fail.");
        assert_that!(error.violations.keys().collect::<Vec<_>>(), elements_are![eq(&String::from("smtpServer"))]);
    }

    #[test]
    fn should_accept_empty_optional_fields_and_trim_values() {
        let field = FieldSpec::text("AWS_HOST_BASE", "Host Base").check(Check::Url { schemes: &["https"] });

        assert_that!(validate_field(&field, None, ",", &SyncedOptions::new()), eq(Ior::Right(String::new())));
        assert_that!(validate_field(&field, Some(&FieldValue::from(" s3.amazonaws.com ")), ",", &SyncedOptions::new()), eq(Ior::Right(String::from("s3.amazonaws.com"))));
    }
}
