//! Data structures for the join flow: access codes, session kinds, field
//! schemas and the payload submitted when a participant joins.

use crate::errors::{ClientError, ClientResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Longest access code accepted by the input.
pub const MAX_CODE_LEN: usize = 64;

/// Identifier name that switches the identifier input to an email input.
pub const EMAIL_IDENTIFIER: &str = "email";

/// A trimmed, non-empty access code of at most [`MAX_CODE_LEN`] characters.
///
/// Format is not checked here; the server is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AccessCode(String);

impl AccessCode {
    pub fn parse(raw: &str) -> ClientResult<Self> {
        let code = raw.trim();
        if code.is_empty() {
            return Err(ClientError::validation("Access code is required"));
        }
        if code.chars().count() > MAX_CODE_LEN {
            return Err(ClientError::validation(format!(
                "Access code must be at most {MAX_CODE_LEN} characters"
            )));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccessCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What an access code refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum SessionKind {
    Group,
    Selection,
    Unknown,
}

impl From<String> for SessionKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "group" => SessionKind::Group,
            "selection" => SessionKind::Selection,
            _ => SessionKind::Unknown,
        }
    }
}

impl SessionKind {
    /// Path segment of the endpoint family serving this kind.
    pub fn endpoint_family(&self) -> Option<&'static str> {
        match self {
            SessionKind::Group => Some("groups"),
            SessionKind::Selection => Some("selections"),
            SessionKind::Unknown => None,
        }
    }

    pub fn fields_fallback(&self) -> &'static str {
        match self {
            SessionKind::Group => "Failed to fetch group details",
            SessionKind::Selection => "Failed to fetch selection details",
            SessionKind::Unknown => "Unknown code type",
        }
    }

    pub fn join_fallback(&self) -> &'static str {
        match self {
            SessionKind::Group => "Failed to join group",
            SessionKind::Selection => "Failed to join selection",
            SessionKind::Unknown => "Unknown code type",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionKind::Group => "group",
            SessionKind::Selection => "selection",
            SessionKind::Unknown => "unknown",
        })
    }
}

/// Response of the code resolver.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolvedCode {
    pub kind: SessionKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
}

/// How the identifier input should be presented. Never affects validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Email,
    Text,
}

/// The inputs a session asks of a joining participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Ordered field names; may be empty.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Name of the field that uniquely identifies a participant.
    #[serde(default)]
    pub identifier: String,
}

impl FieldSchema {
    pub fn identifier_input(&self) -> InputKind {
        if self.identifier == EMAIL_IDENTIFIER {
            InputKind::Email
        } else {
            InputKind::Text
        }
    }

    /// Label shown for the identifier input.
    pub fn identifier_label(&self) -> &str {
        if self.identifier.trim().is_empty() {
            "identifier"
        } else {
            &self.identifier
        }
    }
}

/// Values entered for one schema, keyed by field name.
///
/// Built only from a schema; loading another schema means building a new
/// `FieldValues`, never editing this one, so no key outlives its schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    values: HashMap<String, String>,
}

impl FieldValues {
    /// One empty slot per field of `schema`.
    pub fn for_schema(schema: &FieldSchema) -> Self {
        Self {
            values: schema
                .fields
                .iter()
                .map(|field| (field.clone(), String::new()))
                .collect(),
        }
    }

    /// Sets a field's value. Fields outside the schema are rejected.
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> ClientResult<()> {
        match self.values.get_mut(field) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(ClientError::validation(format!("Unknown field: {field}"))),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Body of a join request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinPayload {
    pub code: AccessCode,
    pub member_data: HashMap<String, String>,
    pub member_identifier: String,
}

/// A completed join, carrying the server's response untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub kind: SessionKind,
    pub code: AccessCode,
    pub session_name: Option<String>,
    pub response: Value,
    pub joined_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_code_trimmed_and_bounded() {
        assert_eq!(AccessCode::parse("  ABC123 ").unwrap().as_str(), "ABC123");
        assert!(AccessCode::parse("").is_err());
        assert!(AccessCode::parse(" \t\n ").is_err());
        assert!(AccessCode::parse(&"x".repeat(MAX_CODE_LEN)).is_ok());
        assert!(AccessCode::parse(&"x".repeat(MAX_CODE_LEN + 1)).is_err());
        // padding does not count toward the limit
        assert!(AccessCode::parse(&format!("  {}  ", "x".repeat(MAX_CODE_LEN))).is_ok());
    }

    #[test]
    fn test_session_kind_from_wire() {
        let kind: SessionKind = serde_json::from_str(r#""group""#).unwrap();
        assert_eq!(kind, SessionKind::Group);
        let kind: SessionKind = serde_json::from_str(r#""selection""#).unwrap();
        assert_eq!(kind, SessionKind::Selection);
        let kind: SessionKind = serde_json::from_str(r#""raffle""#).unwrap();
        assert_eq!(kind, SessionKind::Unknown);
        assert_eq!(SessionKind::Unknown.endpoint_family(), None);
    }

    #[test]
    fn test_schema_tolerates_missing_parts() {
        let schema: FieldSchema = serde_json::from_str(r#"{"identifier": "phone"}"#).unwrap();
        assert!(schema.fields.is_empty());
        assert_eq!(schema.identifier_input(), InputKind::Text);

        let schema: FieldSchema =
            serde_json::from_str(r#"{"fields": ["name"], "identifier": "email"}"#).unwrap();
        assert_eq!(schema.identifier_input(), InputKind::Email);

        let schema: FieldSchema = serde_json::from_str(r#"{"fields": []}"#).unwrap();
        assert_eq!(schema.identifier_label(), "identifier");
    }

    #[test]
    fn test_field_values_reject_unknown_fields() {
        let schema = FieldSchema {
            name: None,
            description: None,
            fields: vec!["name".to_string()],
            identifier: "email".to_string(),
        };
        let mut values = FieldValues::for_schema(&schema);
        assert_eq!(values.get("name"), Some(""));
        values.set("name", "Jane").unwrap();
        assert_eq!(values.get("name"), Some("Jane"));
        assert!(values.set("department", "Eng").is_err());
        assert_eq!(values.len(), 1);
    }
}
