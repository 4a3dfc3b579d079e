//! Command-line surface of the `groupify` binary.

use crate::dashboard::models::SessionType;
use crate::exports::{ExportFormat, ExportKind};
use crate::sessions::models::ExpirationUnit;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "groupify")]
#[command(version, about = "Join and host GroupifyAssist grouping and selection sessions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Join a group or selection session with an access code or join link
    Join {
        /// Access code, or a full join link
        code: String,
        /// Value for a requested field, as NAME=VALUE (repeatable)
        #[arg(short, long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
        /// Your unique identifier for this session (email, phone, ...)
        #[arg(short, long)]
        identifier: Option<String>,
        /// Fail instead of asking for missing values
        #[arg(long)]
        no_prompt: bool,
    },
    /// Show what an access code opens and which details it asks for
    Resolve { code: String },
    /// Print the shareable join link for an access code
    Link {
        #[arg(value_parser = ["group", "selection"])]
        kind: String,
        code: String,
    },
    /// Create an account; asks for the emailed verification code
    Signup {
        email: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        password: Option<String>,
    },
    Login {
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    Logout,
    /// Show the logged in account
    Whoami,
    ChangePassword {
        #[arg(long)]
        current: Option<String>,
        #[arg(long = "new")]
        new_password: Option<String>,
    },
    /// Reset a forgotten password; asks for the emailed code and the new
    /// password
    ForgotPassword { email: String },
    /// Create a grouping session
    CreateGroup {
        name: String,
        #[arg(long)]
        identifier: String,
        /// Field to collect from participants (repeatable)
        #[arg(long = "field")]
        fields: Vec<String>,
        /// Group name (repeatable)
        #[arg(long = "group")]
        groups: Vec<String>,
        /// Members per group
        #[arg(long, default_value_t = 4)]
        max: u32,
        /// Let participants see their group
        #[arg(long)]
        reveal: bool,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value_t = 24, allow_negative_numbers = true)]
        expires: i64,
        #[arg(long, default_value = "hours")]
        unit: ExpirationUnit,
        /// Balancing rule FIELD=MAX_PER_GROUP (repeatable)
        #[arg(long = "rule", value_parser = parse_rule)]
        rules: Vec<(String, u32)>,
    },
    /// Create a selection session
    CreateSelection {
        name: String,
        #[arg(long)]
        identifier: String,
        #[arg(long = "field")]
        fields: Vec<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value_t = 24, allow_negative_numbers = true)]
        expires: i64,
        #[arg(long, default_value = "hours")]
        unit: ExpirationUnit,
        /// Preference rule FIELD=MAX_SELECTED (repeatable)
        #[arg(long = "rule", value_parser = parse_rule)]
        rules: Vec<(String, u32)>,
    },
    /// Select members from a selection session
    Select {
        code: String,
        #[arg(allow_negative_numbers = true)]
        count: i64,
        /// Prefer members with FIELD=VALUE
        #[arg(long, value_parser = parse_key_value)]
        prefer: Option<(String, String)>,
        /// Upper bound on preferred members; checked locally only
        #[arg(long, allow_negative_numbers = true)]
        prefer_max: Option<i64>,
    },
    /// Clear all selections made under a code
    ClearSelection { code: String },
    /// Download session reports
    Export {
        kind: ExportKind,
        session_id: i64,
        /// The session's current access code
        #[arg(long)]
        code: String,
        /// Only this format (default: both)
        #[arg(long)]
        format: Option<ExportFormat>,
        /// Directory to write the files to
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Your host dashboard
    Dashboard {
        #[command(subcommand)]
        command: DashboardCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum DashboardCommand {
    /// Totals across all your sessions
    Overview,
    /// List your sessions with their ids and access codes
    Sessions {
        /// group, selection or all
        #[arg(long = "type", default_value = "all")]
        session_type: SessionType,
        /// Only active or expired sessions
        #[arg(long, value_parser = ["active", "expired"])]
        status: Option<String>,
        /// Name contains this text
        #[arg(long)]
        search: Option<String>,
        /// Only sessions that can still be joined
        #[arg(long, conflicts_with_all = ["status", "search", "offset"])]
        active: bool,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Members who joined a session
    Participants {
        session_type: SessionType,
        session_id: i64,
        #[arg(long, default_value_t = 100)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Reports generated recently
    Exports {
        #[arg(long)]
        format: Option<ExportFormat>,
        #[arg(long, default_value_t = 25)]
        limit: u32,
    },
    /// Joins, selections and other events from the last few days
    Activity {
        #[arg(long, default_value_t = 7)]
        days: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Stop a session early; its access code stops working
    End {
        session_type: SessionType,
        session_id: i64,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {raw}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing name in {raw}"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_rule(raw: &str) -> Result<(String, u32), String> {
    let (key, value) = parse_key_value(raw)?;
    let value = value
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("expected a positive number in {raw}"))?;
    Ok((key, value))
}
