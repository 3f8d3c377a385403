use formwork_types::{Family, Kind};

use crate::registry::schema::{FieldSpec, KindSchema, NameSource, ToggleSpec, ValueFormat};
use crate::validation::Check;

const NAME: &str = "name";
const BACKUP_LOCATION: &str = "BACKUP_LOCATION";

const ALERT_NAME: &str = "ALERT_CONFIGURATION_NAME";

const CUSTOM_SMTP: &str = "customSmtp";
const IAM_INSTANCE_PROFILE: &str = "iamInstanceProfile";
const ALL_UNIVERSES: &str = "allUniverses";

const S3_URL_SCHEMES: &[&str] = &["http", "https", "s3"];
const GCS_URL_SCHEMES: &[&str] = &["http", "https", "gs"];
const AZ_URL_SCHEMES: &[&str] = &["http", "https"];
const WEBHOOK_URL_SCHEMES: &[&str] = &["http", "https"];

pub(super) fn schemas() -> Vec<KindSchema> {
    vec![
        email(),
        slack(),
        alert(),
        s3(),
        nfs(),
        gcs(),
        azure(),
    ]
}

fn channel_name() -> FieldSpec {
    FieldSpec::text(NAME, "Name")
        .placeholder("Enter channel name")
        .required()
}

fn email() -> KindSchema {
    KindSchema::new(Kind::Email, "Email", NameSource::Field(NAME))
        .constant("targetType", "Email")
        .toggle(ToggleSpec::new(CUSTOM_SMTP, "Custom SMTP Configuration")
            .flag(false, "defaultSmtpSettings", true))
        .field(channel_name())
        .field(FieldSpec::text("emailIds", "Emails")
            .placeholder("Enter email addresses")
            .required()
            .output("recipients")
            .format(ValueFormat::List)
            .check(Check::EmailList))
        .field(FieldSpec::text("smtpServer", "Server")
            .placeholder("SMTP server address")
            .required()
            .output("smtpData.smtpServer")
            .visible_when(CUSTOM_SMTP, true))
        .field(FieldSpec::text("smtpPort", "Port")
            .placeholder("SMTP server port")
            .required()
            .output("smtpData.smtpPort")
            .format(ValueFormat::Integer)
            .visible_when(CUSTOM_SMTP, true)
            .check(Check::Port))
        .field(FieldSpec::text("emailFrom", "Email From")
            .placeholder("Send outgoing emails from")
            .required()
            .output("smtpData.emailFrom")
            .visible_when(CUSTOM_SMTP, true)
            .check(Check::Email))
        .field(FieldSpec::text("smtpUsername", "Username")
            .placeholder("SMTP server username")
            .output("smtpData.smtpUsername")
            .visible_when(CUSTOM_SMTP, true))
        .field(FieldSpec::password("smtpPassword", "Password")
            .placeholder("SMTP server password")
            .output("smtpData.smtpPassword")
            .visible_when(CUSTOM_SMTP, true))
        .field(FieldSpec::toggle("useSSL", "SSL")
            .output("smtpData.useSSL")
            .visible_when(CUSTOM_SMTP, true))
        .field(FieldSpec::toggle("useTLS", "TLS")
            .output("smtpData.useTLS")
            .visible_when(CUSTOM_SMTP, true))
}

fn slack() -> KindSchema {
    KindSchema::new(Kind::Slack, "Slack", NameSource::Field(NAME))
        .constant("targetType", "Slack")
        .field(channel_name()
            .output("channel"))
        .field(FieldSpec::text("webhookURL", "Slack Webhook URL")
            .placeholder("Enter webhook url")
            .required()
            .output("webhookUrl")
            .check(Check::Url { schemes: WEBHOOK_URL_SCHEMES }))
}

fn alert() -> KindSchema {
    KindSchema::new(Kind::Alert, "Universe Alert", NameSource::Field(ALERT_NAME))
        .constant("targetType", "UNIVERSE")
        .constant("template", "REPLICATION_LAG")
        .constant("thresholdUnit", "MILLISECOND")
        .constant("active", true)
        .constant("defaultRoute", true)
        .toggle(ToggleSpec::new(ALL_UNIVERSES, "All Universes")
            .default_on()
            .flag(true, "target.all", true))
        .field(FieldSpec::text(ALERT_NAME, "Name")
            .placeholder("Enter an alert name")
            .required())
        .field(FieldSpec::text("ALERT_CONFIGURATION_DESCRIPTION", "Description")
            .placeholder("Enter an alert description")
            .required()
            .output("description"))
        .field(FieldSpec::text("ALERT_UNIVERSE_LIST", "Universes")
            .placeholder("Enter universe UUIDs")
            .required()
            .output("target.uuids")
            .format(ValueFormat::List)
            .visible_when(ALL_UNIVERSES, false))
        .field(FieldSpec::text("ALERT_METRICS_DURATION", "Duration")
            .placeholder("Enter duration in seconds")
            .required()
            .output("durationSec")
            .format(ValueFormat::Integer)
            .check(Check::Duration))
        .field(FieldSpec::select("ALERT_DESTINATION_LIST", "Destinations", Family::AlertChannel)
            .output("routeUUID"))
}

fn s3() -> KindSchema {
    KindSchema::new(Kind::S3, "Amazon S3", NameSource::Fixed("S3"))
        .toggle(ToggleSpec::new(IAM_INSTANCE_PROFILE, "IAM Role")
            .flag(true, "IAM_INSTANCE_PROFILE", "true"))
        .field(FieldSpec::text("AWS_ACCESS_KEY_ID", "Access Key")
            .placeholder("AWS Access Key")
            .required()
            .output_as_id()
            .visible_when(IAM_INSTANCE_PROFILE, false))
        .field(FieldSpec::password("AWS_SECRET_ACCESS_KEY", "Access Secret")
            .placeholder("AWS Access Secret")
            .required()
            .output_as_id()
            .visible_when(IAM_INSTANCE_PROFILE, false))
        .field(FieldSpec::text(BACKUP_LOCATION, "S3 Bucket")
            .placeholder("s3://bucket_name")
            .required()
            .output_as_id()
            .identity()
            .check(Check::S3Bucket))
        .field(FieldSpec::text("AWS_HOST_BASE", "S3 Bucket Host Base")
            .placeholder("s3.amazonaws.com")
            .output_as_id()
            .check(Check::Url { schemes: S3_URL_SCHEMES }))
}

fn nfs() -> KindSchema {
    KindSchema::new(Kind::Nfs, "NFS Storage", NameSource::Fixed("NFS"))
        .field(FieldSpec::text(BACKUP_LOCATION, "NFS Storage Path")
            .placeholder("NFS Storage Path")
            .required()
            .output_as_id()
            .identity()
            .check(Check::NfsPath))
}

fn gcs() -> KindSchema {
    KindSchema::new(Kind::Gcs, "GCS Storage", NameSource::Fixed("GCS"))
        .field(FieldSpec::text(BACKUP_LOCATION, "GCS Bucket")
            .placeholder("GCS Bucket")
            .required()
            .output_as_id()
            .identity()
            .check(Check::Url { schemes: GCS_URL_SCHEMES }))
        .field(FieldSpec::text("GCS_CREDENTIALS_JSON", "GCS Credentials")
            .placeholder("GCS Credentials JSON")
            .required()
            .output_as_id()
            .check(Check::Json))
}

fn azure() -> KindSchema {
    KindSchema::new(Kind::Azure, "Azure Storage", NameSource::Fixed("AZ"))
        .field(FieldSpec::text(BACKUP_LOCATION, "Container URL")
            .placeholder("Container URL")
            .required()
            .output_as_id()
            .identity()
            .check(Check::Url { schemes: AZ_URL_SCHEMES }))
        .field(FieldSpec::password("AZURE_STORAGE_SAS_TOKEN", "SAS Token")
            .placeholder("SAS Token")
            .required()
            .output_as_id())
}
