//! Host-side session forms and the wire shapes they turn into.
//!
//! A form collects what the host typed and is checked as a whole by
//! `into_request`; only a request that passed every check is ever sent.

use crate::errors::{ClientError, ClientResult, validation_failure};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Longest expiration the backend accepts: 7 days.
pub const MAX_EXPIRATION_MINUTES: u32 = 10_080;

pub const IDENTIFIER_CONFLICT_MESSAGE: &str =
    "Identifier must not be the same as any collected field.";
pub const NO_GROUP_NAMES_MESSAGE: &str = "Please add at least one group name.";
pub const NO_FIELDS_MESSAGE: &str = "Please add at least one field to collect.";
pub const INVALID_EXPIRATION_MESSAGE: &str = "Please set a valid expiration time.";
pub const EXPIRATION_TOO_LONG_MESSAGE: &str =
    "Expiration cannot exceed 7 days (10080 minutes). Please reduce the expiration time.";
pub const FIELD_IS_IDENTIFIER_MESSAGE: &str = "Field cannot be the same as identifier.";
pub const INVALID_CODE_MESSAGE: &str = "Please enter a valid selection access code.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpirationUnit {
    Minutes,
    #[default]
    Hours,
    Days,
}

impl ExpirationUnit {
    fn minutes(self) -> i64 {
        match self {
            ExpirationUnit::Minutes => 1,
            ExpirationUnit::Hours => 60,
            ExpirationUnit::Days => 1_440,
        }
    }
}

impl FromStr for ExpirationUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "min" | "minute" | "minutes" => Ok(ExpirationUnit::Minutes),
            "h" | "hour" | "hours" => Ok(ExpirationUnit::Hours),
            "d" | "day" | "days" => Ok(ExpirationUnit::Days),
            other => Err(format!("unknown expiration unit: {other}")),
        }
    }
}

impl fmt::Display for ExpirationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExpirationUnit::Minutes => "minutes",
            ExpirationUnit::Hours => "hours",
            ExpirationUnit::Days => "days",
        })
    }
}

/// How long a session accepts participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiration {
    pub value: i64,
    pub unit: ExpirationUnit,
}

impl Default for Expiration {
    fn default() -> Self {
        Self {
            value: 24,
            unit: ExpirationUnit::Hours,
        }
    }
}

impl Expiration {
    pub fn new(value: i64, unit: ExpirationUnit) -> Self {
        Self { value, unit }
    }

    /// Length in minutes, as the backend expects it.
    pub fn as_minutes(&self) -> ClientResult<u32> {
        if self.value <= 0 {
            return Err(ClientError::validation(INVALID_EXPIRATION_MESSAGE));
        }
        let minutes = self.value.saturating_mul(self.unit.minutes());
        if minutes > i64::from(MAX_EXPIRATION_MINUTES) {
            return Err(ClientError::validation(EXPIRATION_TOO_LONG_MESSAGE));
        }
        Ok(minutes as u32)
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Appends `raw` unless it is blank or already present (ignoring case).
/// Returns whether it was added.
pub fn push_unique(names: &mut Vec<String>, raw: &str) -> bool {
    let name = raw.trim();
    if name.is_empty() || names.iter().any(|existing| same_name(existing, name)) {
        return false;
    }
    names.push(name.to_string());
    true
}

fn identifier_conflicts(identifier: &str, fields: &[String]) -> bool {
    !identifier.trim().is_empty() && fields.iter().any(|field| same_name(field, identifier))
}

fn optional_text(raw: &str) -> Option<String> {
    let text = raw.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Fields and identifier shared by both session kinds.
#[derive(Debug, Clone, Default)]
pub struct CollectedFields {
    fields: Vec<String>,
    identifier: String,
}

impl CollectedFields {
    pub fn new(identifier: &str) -> Self {
        Self {
            fields: Vec::new(),
            identifier: identifier.trim().to_string(),
        }
    }

    /// Adds a field to collect. Duplicates are dropped silently; the
    /// identifier itself is refused.
    pub fn add_field(&mut self, raw: &str) -> ClientResult<bool> {
        if !self.identifier.is_empty() && same_name(raw, &self.identifier) {
            return Err(ClientError::validation(FIELD_IS_IDENTIFIER_MESSAGE));
        }
        Ok(push_unique(&mut self.fields, raw))
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    fn check(&self) -> ClientResult<()> {
        if identifier_conflicts(&self.identifier, &self.fields) {
            return Err(ClientError::validation(IDENTIFIER_CONFLICT_MESSAGE));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRule {
    pub field_key: String,
    pub max_per_group: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionRule {
    pub field_key: String,
    pub preference_max_selection: u32,
}

/// Body of `POST /groups/create`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateGroupSession {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1-255 characters"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Group size must be at least 1"))]
    pub max: u32,
    pub reveal: bool,
    pub expires_in: u32,
    pub group_names: Vec<String>,
    pub fields: Vec<String>,
    #[validate(length(min = 1, message = "Identifier is required"))]
    pub identifier: String,
    pub preferential_rules: Vec<GroupRule>,
}

/// Body of `POST /selections/create`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateSelectionSession {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1-255 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub expires_in: u32,
    pub fields: Vec<String>,
    #[validate(length(min = 1, message = "Identifier is required"))]
    pub identifier: String,
    pub preferential_rules: Vec<SelectionRule>,
}

/// What a host fills in to create a grouping session.
#[derive(Debug, Clone)]
pub struct GroupSessionForm {
    pub name: String,
    pub description: String,
    pub max: u32,
    pub reveal: bool,
    pub expiration: Expiration,
    pub collected: CollectedFields,
    group_names: Vec<String>,
    rules: Vec<GroupRule>,
}

impl GroupSessionForm {
    pub fn new(name: &str, identifier: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            description: String::new(),
            max: 4,
            reveal: false,
            expiration: Expiration::default(),
            collected: CollectedFields::new(identifier),
            group_names: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn add_group_name(&mut self, raw: &str) -> bool {
        push_unique(&mut self.group_names, raw)
    }

    pub fn group_names(&self) -> &[String] {
        &self.group_names
    }

    /// Adds a balancing rule. Blank keys and zero limits are ignored.
    pub fn add_rule(&mut self, field_key: &str, max_per_group: u32) -> bool {
        let field_key = field_key.trim();
        if field_key.is_empty() || max_per_group == 0 {
            return false;
        }
        self.rules.push(GroupRule {
            field_key: field_key.to_string(),
            max_per_group,
        });
        true
    }

    pub fn into_request(self) -> ClientResult<CreateGroupSession> {
        self.collected.check()?;
        if self.group_names.is_empty() {
            return Err(ClientError::validation(NO_GROUP_NAMES_MESSAGE));
        }
        if self.collected.fields.is_empty() {
            return Err(ClientError::validation(NO_FIELDS_MESSAGE));
        }
        let expires_in = self.expiration.as_minutes()?;

        let request = CreateGroupSession {
            name: self.name,
            description: optional_text(&self.description),
            max: self.max,
            reveal: self.reveal,
            expires_in,
            group_names: self.group_names,
            fields: self.collected.fields,
            identifier: self.collected.identifier,
            preferential_rules: self.rules,
        };
        request.validate().map_err(validation_failure)?;
        Ok(request)
    }
}

/// What a host fills in to create a selection session.
#[derive(Debug, Clone)]
pub struct SelectionSessionForm {
    pub name: String,
    pub description: String,
    pub expiration: Expiration,
    pub collected: CollectedFields,
    rules: Vec<SelectionRule>,
}

impl SelectionSessionForm {
    pub fn new(name: &str, identifier: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            description: String::new(),
            expiration: Expiration::default(),
            collected: CollectedFields::new(identifier),
            rules: Vec::new(),
        }
    }

    pub fn add_rule(&mut self, field_key: &str, preference_max_selection: u32) -> bool {
        let field_key = field_key.trim();
        if field_key.is_empty() || preference_max_selection == 0 {
            return false;
        }
        self.rules.push(SelectionRule {
            field_key: field_key.to_string(),
            preference_max_selection,
        });
        true
    }

    pub fn into_request(self) -> ClientResult<CreateSelectionSession> {
        self.collected.check()?;
        if self.collected.fields.is_empty() {
            return Err(ClientError::validation(NO_FIELDS_MESSAGE));
        }
        let expires_in = self.expiration.as_minutes()?;

        let request = CreateSelectionSession {
            name: self.name,
            description: optional_text(&self.description),
            expires_in,
            fields: self.collected.fields,
            identifier: self.collected.identifier,
            preferential_rules: self.rules,
        };
        request.validate().map_err(validation_failure)?;
        Ok(request)
    }
}

/// A session as returned by either create endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedSession {
    pub id: i64,
    pub name: String,
    /// Access code to share with participants.
    #[serde(default, alias = "code_id")]
    pub code: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `POST /selections/select`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectMembersRequest {
    pub code: String,
    pub count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferential_selection: Option<HashMap<String, String>>,
}

impl SelectMembersRequest {
    /// Checks a selection run before it is sent.
    ///
    /// `preference` is sent only when both key and value are non-blank.
    /// `preference_max` is checked against `count` here and never sent.
    pub fn new(
        code: &str,
        count: i64,
        preference: Option<(&str, &str)>,
        preference_max: Option<i64>,
    ) -> ClientResult<Self> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ClientError::validation(INVALID_CODE_MESSAGE));
        }
        if count <= 0 {
            return Err(ClientError::validation("Count must be a positive number."));
        }
        if let Some(max) = preference_max {
            if max < 0 {
                return Err(ClientError::validation(
                    "Preferential max must be a non-negative number.",
                ));
            }
            if max > count {
                return Err(ClientError::validation(
                    "Preferential max cannot be greater than Count.",
                ));
            }
        }
        let count = u32::try_from(count)
            .map_err(|_| ClientError::validation("Count must be a positive number."))?;

        let preferential_selection = preference.and_then(|(key, value)| {
            let (key, value) = (key.trim(), value.trim());
            (!key.is_empty() && !value.is_empty())
                .then(|| HashMap::from([(key.to_string(), value.to_string())]))
        });

        Ok(Self {
            code: code.to_string(),
            count,
            preferential_selection,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectionResult {
    pub selected_count: u32,
    pub preferential_count: u32,
    pub random_count: u32,
    #[serde(default)]
    pub member_identifiers: Vec<String>,
}
