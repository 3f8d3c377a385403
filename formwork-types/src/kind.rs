use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

/// Group of kinds which are offered together in one form, e.g. the tabs of the
/// storage configuration or the target selector of an alert destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    AlertChannel,
    AlertDefinition,
    Storage,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::AlertChannel => "alert_channel",
            Family::AlertDefinition => "alert_definition",
            Family::Storage => "storage",
        }
    }

    pub fn kinds(&self) -> impl Iterator<Item=Kind> + '_ {
        Kind::iter().filter(move |kind| kind.family() == *self)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("Illegal family '{value}'. Expected one of: alert_channel, alert_definition, storage")]
pub struct IllegalFamily {
    pub value: String,
}

impl FromStr for Family {
    type Err = IllegalFamily;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Family::iter()
            .find(|family| family.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| IllegalFamily { value: String::from(value) })
    }
}

/// Discriminant selecting which configuration schema is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter)]
#[serde(try_from = "String", into = "String")]
pub enum Kind {
    Email,
    Slack,
    Alert,
    S3,
    Nfs,
    Gcs,
    Azure,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Email => "email",
            Kind::Slack => "slack",
            Kind::Alert => "alert",
            Kind::S3 => "s3",
            Kind::Nfs => "nfs",
            Kind::Gcs => "gcs",
            Kind::Azure => "az",
        }
    }

    pub fn family(&self) -> Family {
        match self {
            Kind::Email | Kind::Slack => Family::AlertChannel,
            Kind::Alert => Family::AlertDefinition,
            Kind::S3 | Kind::Nfs | Kind::Gcs | Kind::Azure => Family::Storage,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("Unknown kind '{value}'.")]
pub struct IllegalKind {
    pub value: String,
}

impl FromStr for Kind {
    type Err = IllegalKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Kind::iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| IllegalKind { value: String::from(value) })
    }
}

impl TryFrom<String> for Kind {
    type Error = IllegalKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Kind::from_str(&value)
    }
}

impl From<Kind> for String {
    fn from(value: Kind) -> Self {
        String::from(value.as_str())
    }
}
