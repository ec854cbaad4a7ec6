//! The flat key-value record a proposal is generated from.
//!
//! Every field is optional. Values that are not strings (numbers, arrays,
//! nulls) are treated as absent rather than rejected, and unknown keys are
//! ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Raw proposal form values, keyed the same way as the JSON input contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_statement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_solution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_of_work: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
}

impl ProposalFields {
    /// Parse a JSON object into a fields record.
    ///
    /// Fails only when the payload is not JSON or not an object; individual
    /// fields with the wrong type are dropped with a warning.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Build a record from an already-parsed JSON value.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            Error::InvalidInput(format!("expected a JSON object, got {}", json_kind(value)))
        })?;

        let take = |key: &str| -> Option<String> {
            match map.get(key)? {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => {
                    log::warn!(
                        "Ignoring field '{key}': expected a string, got {}",
                        json_kind(other)
                    );
                    None
                }
            }
        };

        Ok(Self {
            client_name: take("clientName"),
            client_company: take("clientCompany"),
            project_title: take("projectTitle"),
            problem_statement: take("problemStatement"),
            proposed_solution: take("proposedSolution"),
            scope_of_work: take("scopeOfWork"),
            timeline: take("timeline"),
            pricing: take("pricing"),
            terms: take("terms"),
            contact_info: take("contactInfo"),
        })
    }

    /// Serialise back to the JSON input contract.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Returns the value only when it holds something other than whitespace.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_keys() {
        let fields =
            ProposalFields::from_json(r#"{"clientName":"Ada","pricing":"$10,000","extra":"x"}"#)
                .unwrap();
        assert_eq!(fields.client_name.as_deref(), Some("Ada"));
        assert_eq!(fields.pricing.as_deref(), Some("$10,000"));
        assert!(fields.timeline.is_none());
    }

    #[test]
    fn non_string_values_are_treated_as_absent() {
        let fields =
            ProposalFields::from_json(r#"{"clientName":42,"timeline":["a"],"terms":null}"#)
                .unwrap();
        assert_eq!(fields, ProposalFields::default());
    }

    #[test]
    fn rejects_non_object_payload() {
        let err = ProposalFields::from_json("[1, 2]").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn whitespace_only_counts_as_empty() {
        assert_eq!(non_empty(&Some("   \n".to_string())), None);
        assert_eq!(non_empty(&Some(" x ".to_string())), Some(" x "));
        assert_eq!(non_empty(&None), None);
    }
}
