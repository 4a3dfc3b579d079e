//! Host dashboard queries and the summaries the backend returns for them.
//!
//! Timestamps are kept as the server's strings; the backend may send naive
//! datetimes.

use crate::errors::{ClientError, ClientResult, validation_failure};
use crate::exports::ExportFormat;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

pub const CHOOSE_KIND_MESSAGE: &str = "Choose a group or selection session.";

/// Session filter understood by the dashboard endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionType {
    #[default]
    All,
    Group,
    Selection,
}

impl SessionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionType::All => "all",
            SessionType::Group => "group",
            SessionType::Selection => "selection",
        }
    }

    /// Endpoints addressing one session need its concrete kind.
    pub fn require_concrete(self) -> ClientResult<Self> {
        match self {
            SessionType::All => Err(ClientError::validation(CHOOSE_KIND_MESSAGE)),
            concrete => Ok(concrete),
        }
    }
}

impl FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(SessionType::All),
            "group" | "groups" => Ok(SessionType::Group),
            "selection" | "selections" => Ok(SessionType::Selection),
            other => Err(format!("unknown session type: {other}")),
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type QueryPairs = Vec<(&'static str, String)>;

#[derive(Debug, Clone, Validate)]
pub struct ActiveQuery {
    pub session_type: SessionType,
    #[validate(range(min = 1, max = 50, message = "Limit must be between 1 and 50."))]
    pub limit: u32,
}

impl Default for ActiveQuery {
    fn default() -> Self {
        Self {
            session_type: SessionType::All,
            limit: 10,
        }
    }
}

impl ActiveQuery {
    pub fn pairs(&self) -> ClientResult<QueryPairs> {
        self.validate().map_err(validation_failure)?;
        Ok(vec![
            ("session_type", self.session_type.to_string()),
            ("limit", self.limit.to_string()),
        ])
    }
}

/// Filters for the session history listing. Blank `status` and `search`
/// are left out of the request.
#[derive(Debug, Clone, Validate)]
pub struct HistoryQuery {
    pub session_type: SessionType,
    pub status: Option<String>,
    pub search: Option<String>,
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100."))]
    pub limit: u32,
    pub offset: u32,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            session_type: SessionType::All,
            status: None,
            search: None,
            limit: 20,
            offset: 0,
        }
    }
}

impl HistoryQuery {
    pub fn pairs(&self) -> ClientResult<QueryPairs> {
        self.validate().map_err(validation_failure)?;

        let mut pairs = vec![
            ("session_type", self.session_type.to_string()),
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];
        if let Some(status) = non_blank(&self.status) {
            pairs.push(("status", status.to_ascii_lowercase()));
        }
        if let Some(search) = non_blank(&self.search) {
            pairs.push(("q", search.to_string()));
        }
        Ok(pairs)
    }
}

#[derive(Debug, Clone, Validate)]
pub struct ParticipantsQuery {
    pub session_type: SessionType,
    #[validate(range(min = 1, max = 500, message = "Limit must be between 1 and 500."))]
    pub limit: u32,
    pub offset: u32,
}

impl ParticipantsQuery {
    pub fn new(session_type: SessionType) -> Self {
        Self {
            session_type,
            limit: 100,
            offset: 0,
        }
    }

    pub fn pairs(&self) -> ClientResult<QueryPairs> {
        let session_type = self.session_type.require_concrete()?;
        self.validate().map_err(validation_failure)?;
        Ok(vec![
            ("session_type", session_type.to_string()),
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ])
    }
}

#[derive(Debug, Clone, Validate)]
pub struct ExportsQuery {
    #[validate(range(min = 1, max = 50, message = "Limit must be between 1 and 50."))]
    pub limit: u32,
    pub file_type: Option<ExportFormat>,
}

impl Default for ExportsQuery {
    fn default() -> Self {
        Self {
            limit: 25,
            file_type: None,
        }
    }
}

impl ExportsQuery {
    pub fn pairs(&self) -> ClientResult<QueryPairs> {
        self.validate().map_err(validation_failure)?;
        let mut pairs = vec![("limit", self.limit.to_string())];
        if let Some(format) = self.file_type {
            pairs.push(("file_type", format.path_segment().to_string()));
        }
        Ok(pairs)
    }
}

#[derive(Debug, Clone, Validate)]
pub struct ActivityQuery {
    #[validate(range(min = 1, max = 365, message = "Days must be between 1 and 365."))]
    pub days: u32,
    #[validate(range(min = 1, max = 200, message = "Limit must be between 1 and 200."))]
    pub limit: u32,
}

impl Default for ActivityQuery {
    fn default() -> Self {
        Self { days: 7, limit: 10 }
    }
}

impl ActivityQuery {
    pub fn pairs(&self) -> ClientResult<QueryPairs> {
        self.validate().map_err(validation_failure)?;
        Ok(vec![
            ("days", self.days.to_string()),
            ("limit", self.limit.to_string()),
        ])
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Overview {
    pub active_sessions: i64,
    pub total_participants: i64,
    pub sessions_created: i64,
    pub success_rate: f64,
    pub completed_groups: i64,
    pub avg_session_duration: f64,
    pub user_country: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActiveSession {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub access_code: String,
    #[serde(default)]
    pub participant_count: i64,
    #[serde(default)]
    pub max_participants: Option<i64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub participant_count: i64,
    #[serde(default)]
    pub access_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub max_group_size: Option<i64>,
    /// Groups formed so far; group sessions only.
    #[serde(default)]
    pub group_created: Option<i64>,
    /// Members picked so far; selection sessions only.
    #[serde(default)]
    pub selected: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionHistory {
    #[serde(default)]
    pub sessions: Vec<HistoryEntry>,
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub limit: i64,
}

impl SessionHistory {
    /// Whether rows remain past this page.
    pub fn has_more(&self) -> bool {
        self.offset + (self.sessions.len() as i64) < self.total_count
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Participant {
    pub id: i64,
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub is_selected: Option<bool>,
    #[serde(default)]
    pub joined_at: Option<String>,
    /// The values the member submitted, keyed by field name.
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Participants {
    pub session_id: i64,
    #[serde(default)]
    pub session_type: String,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub total_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentExport {
    pub id: i64,
    pub file_name: String,
    pub file_type: String,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default)]
    pub session_name: String,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub download_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(default)]
    pub session_name: String,
    #[serde(default)]
    pub session_type: String,
    #[serde(default)]
    pub participant_identifier: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndedSession {
    #[serde(default)]
    pub message: Option<String>,
    pub session_id: i64,
    #[serde(default)]
    pub ended_at: Option<String>,
}
