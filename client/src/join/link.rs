//! Shareable join links: `{app}/join?code=…` for groups and
//! `{app}/selection/join?code=…` for selections.

use crate::errors::{ClientError, ClientResult};
use crate::join::models::{AccessCode, SessionKind};
use reqwest::Url;

const GROUP_JOIN_PATH: &str = "join";
const SELECTION_JOIN_PATH: &str = "selection/join";

/// A join link parsed back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinLink {
    /// Kind implied by the link's path, when recognisable.
    pub kind: Option<SessionKind>,
    pub code: AccessCode,
}

/// Builds the link a host can share for `code`.
pub fn build_join_link(app_base_url: &str, kind: SessionKind, code: &AccessCode) -> ClientResult<Url> {
    let path = match kind {
        SessionKind::Group => GROUP_JOIN_PATH,
        SessionKind::Selection => SELECTION_JOIN_PATH,
        SessionKind::Unknown => return Err(ClientError::validation("Unknown code type")),
    };

    let mut url = Url::parse(&format!("{}/{}", app_base_url.trim_end_matches('/'), path))
        .map_err(|e| ClientError::validation(format!("Invalid app URL {app_base_url}: {e}")))?;
    url.query_pairs_mut().append_pair("code", code.as_str());
    Ok(url)
}

/// Reads the code (and kind, if the path says) out of a join link.
pub fn parse_join_link(raw: &str) -> ClientResult<JoinLink> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ClientError::validation(format!("Invalid join link: {e}")))?;

    let code = url
        .query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| ClientError::validation("Join link has no code"))?;
    let code = AccessCode::parse(&code)?;

    let path = url.path().trim_end_matches('/');
    let kind = if path.ends_with(&format!("/{SELECTION_JOIN_PATH}")) {
        Some(SessionKind::Selection)
    } else if path.ends_with(&format!("/{GROUP_JOIN_PATH}")) {
        Some(SessionKind::Group)
    } else {
        None
    };

    Ok(JoinLink { kind, code })
}
