use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::DomainError;

/// One meeting-record document as published in the assembly minutes dataset.
///
/// Every field is optional in the source files. Text fields are decoded
/// leniently (numbers, booleans and nested values become their JSON text,
/// `null` becomes empty) so that later stages can read plain strings without
/// defaulting at each access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    #[serde(deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub meeting_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub committee_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub meeting_number: String,
    #[serde(deserialize_with = "lenient_string")]
    pub session_number: String,
    #[serde(deserialize_with = "lenient_string")]
    pub agenda: String,
    #[serde(deserialize_with = "lenient_string")]
    pub law: String,
    #[serde(deserialize_with = "lenient_string")]
    pub questioner_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub questioner_position: String,
    #[serde(deserialize_with = "null_as_default")]
    pub question: Utterance,
    #[serde(deserialize_with = "lenient_string")]
    pub answerer_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub answerer_position: String,
    #[serde(deserialize_with = "lenient_string")]
    pub answerer_affiliation: String,
    #[serde(deserialize_with = "null_as_default")]
    pub answer: Utterance,
    #[serde(deserialize_with = "lenient_string")]
    pub context: String,
    #[serde(deserialize_with = "null_as_default")]
    pub context_summary: ContextSummary,
}

/// Question or answer statement attached to a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Utterance {
    #[serde(deserialize_with = "lenient_string")]
    pub comment: String,
    /// Comma-joined keyword list; arrays in the source are joined on read.
    #[serde(deserialize_with = "lenient_keywords")]
    pub keyword: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSummary {
    #[serde(deserialize_with = "lenient_string")]
    pub summary_q: String,
    #[serde(deserialize_with = "lenient_string")]
    pub summary_a: String,
}

impl Record {
    /// Decode and validate one record file.
    ///
    /// The root must be a JSON object and `context` must carry text; every
    /// other field falls back to its default.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, DomainError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|err| DomainError::parse(format!("invalid JSON: {err}")))?;

        if !value.is_object() {
            return Err(DomainError::parse(format!(
                "expected a JSON object at the root, found {}",
                json_kind(&value)
            )));
        }

        let record: Record = serde_json::from_value(value)
            .map_err(|err| DomainError::parse(format!("record schema mismatch: {err}")))?;

        if record.context.trim().is_empty() {
            return Err(DomainError::missing_field("context"));
        }

        Ok(record)
    }
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

/// Plain text for any JSON value; nested arrays and objects keep their JSON form.
fn scalar_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(scalar_text)
}

fn lenient_keywords<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(","),
        other => scalar_text(other),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
