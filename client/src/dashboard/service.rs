//! Read-mostly views over the host's own sessions under `/dashboard`.

use crate::api::client::ApiClient;
use crate::dashboard::models::*;
use crate::errors::ClientResult;

const OVERVIEW_FALLBACK: &str = "Failed to load dashboard";
const SESSIONS_FALLBACK: &str = "Failed to load sessions";
const PARTICIPANTS_FALLBACK: &str = "Failed to load participants";
const EXPORTS_FALLBACK: &str = "Failed to load exports";
const ACTIVITY_FALLBACK: &str = "Failed to load activity";
const END_FALLBACK: &str = "Failed to end session";

fn borrowed<'a>(pairs: &'a [(&'static str, String)]) -> Vec<(&'static str, &'a str)> {
    pairs.iter().map(|(key, value)| (*key, value.as_str())).collect()
}

/// Service for the authenticated dashboard endpoints.
pub struct DashboardService<'a> {
    client: &'a ApiClient,
}

impl<'a> DashboardService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn overview(&self) -> ClientResult<Overview> {
        self.client
            .get_json("/dashboard/overview", &[])
            .await
            .map_err(|e| e.into_failure(OVERVIEW_FALLBACK))
    }

    /// Sessions whose access code has not expired.
    pub async fn active_sessions(&self, query: &ActiveQuery) -> ClientResult<Vec<ActiveSession>> {
        let pairs = query.pairs()?;
        self.client
            .get_json("/dashboard/sessions/active", &borrowed(&pairs))
            .await
            .map_err(|e| e.into_failure(SESSIONS_FALLBACK))
    }

    /// One page of every session the host created, newest first. This is
    /// where a session's numeric id is found after creation.
    pub async fn session_history(&self, query: &HistoryQuery) -> ClientResult<SessionHistory> {
        let pairs = query.pairs()?;
        let history: SessionHistory = self
            .client
            .get_json("/dashboard/sessions/history", &borrowed(&pairs))
            .await
            .map_err(|e| e.into_failure(SESSIONS_FALLBACK))?;

        tracing::debug!(
            "Loaded {} of {} session(s) at offset {}",
            history.sessions.len(),
            history.total_count,
            query.offset
        );
        Ok(history)
    }

    pub async fn participants(
        &self,
        session_id: i64,
        query: &ParticipantsQuery,
    ) -> ClientResult<Participants> {
        let pairs = query.pairs()?;
        self.client
            .get_json(
                &format!("/dashboard/sessions/{session_id}/participants"),
                &borrowed(&pairs),
            )
            .await
            .map_err(|e| e.into_failure(PARTICIPANTS_FALLBACK))
    }

    pub async fn recent_exports(&self, query: &ExportsQuery) -> ClientResult<Vec<RecentExport>> {
        let pairs = query.pairs()?;
        self.client
            .get_json("/dashboard/exports/recent", &borrowed(&pairs))
            .await
            .map_err(|e| e.into_failure(EXPORTS_FALLBACK))
    }

    pub async fn activity(&self, query: &ActivityQuery) -> ClientResult<Vec<Activity>> {
        let pairs = query.pairs()?;
        self.client
            .get_json("/dashboard/user-activity", &borrowed(&pairs))
            .await
            .map_err(|e| e.into_failure(ACTIVITY_FALLBACK))
    }

    /// Ends a session early by expiring its access code. Members can no
    /// longer join afterwards.
    pub async fn end_session(
        &self,
        session_id: i64,
        session_type: SessionType,
    ) -> ClientResult<EndedSession> {
        let session_type = session_type.require_concrete()?;
        let ended: EndedSession = self
            .client
            .delete_query(
                &format!("/dashboard/sessions/{session_id}/end"),
                &[("session_type", session_type.as_str())],
            )
            .await
            .map_err(|e| e.into_failure(END_FALLBACK))?;

        tracing::info!("Ended {} session {}", session_type, session_id);
        Ok(ended)
    }
}
