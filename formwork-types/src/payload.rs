use serde::{Deserialize, Serialize};

/// Kind-specific parameters of a configuration record.
/// Backed by a sorted map, so serialization is deterministic.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Request body handed to the record manager when a form is submitted.
///
/// A payload is derived fresh from the form state on every submit
/// and never modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub name: String,
    pub params: Params,
}

impl SubmissionPayload {
    pub fn new(name: impl Into<String>, params: Params) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn param(&self, key: &str) -> Option<&serde_json::Value> {
        self.params.get(key)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn should_serialize_name_and_params_only() -> anyhow::Result<()> {
        let mut params = Params::new();
        params.insert(String::from("targetType"), json!("Slack"));
        params.insert(String::from("channel"), json!("sl1"));

        let payload = SubmissionPayload::new("sl1", params);

        assert_eq!(
            serde_json::to_value(&payload)?,
            json!({ "name": "sl1", "params": { "channel": "sl1", "targetType": "Slack" } })
        );
        Ok(())
    }
}
