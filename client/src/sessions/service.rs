//! Host operations: creating sessions and running selections.

use crate::api::client::ApiClient;
use crate::api::common::MessageResponse;
use crate::errors::{ClientError, ClientResult};
use crate::sessions::models::*;

const CREATE_FALLBACK: &str = "Failed to create";
const SELECT_FALLBACK: &str = "Selection failed. Check your code and try again.";
const CLEAR_FALLBACK: &str = "Failed to clear selections. Check the code and try again.";
const CLEAR_SUCCESS: &str = "Selections cleared successfully.";

/// Service for the authenticated host endpoints under `/groups` and
/// `/selections`.
pub struct HostService<'a> {
    client: &'a ApiClient,
}

impl<'a> HostService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn create_group(&self, form: GroupSessionForm) -> ClientResult<CreatedSession> {
        let request = form.into_request()?;
        let session: CreatedSession = self
            .client
            .post_json("/groups/create", &request)
            .await
            .map_err(|e| e.into_failure(CREATE_FALLBACK))?;

        tracing::info!("Created group session {} ({})", session.id, session.name);
        Ok(session)
    }

    pub async fn create_selection(
        &self,
        form: SelectionSessionForm,
    ) -> ClientResult<CreatedSession> {
        let request = form.into_request()?;
        let session: CreatedSession = self
            .client
            .post_json("/selections/create", &request)
            .await
            .map_err(|e| e.into_failure(CREATE_FALLBACK))?;

        tracing::info!("Created selection session {} ({})", session.id, session.name);
        Ok(session)
    }

    /// Runs a selection. Who gets picked is decided by the server.
    pub async fn select_members(&self, request: SelectMembersRequest) -> ClientResult<SelectionResult> {
        let result: SelectionResult = self
            .client
            .post_json("/selections/select", &request)
            .await
            .map_err(|e| e.into_failure(SELECT_FALLBACK))?;

        tracing::info!(
            "Selected {} member(s) for {} ({} preferential, {} random)",
            result.selected_count,
            request.code,
            result.preferential_count,
            result.random_count
        );
        Ok(result)
    }

    /// Clears every selection made under `code`.
    pub async fn clear_selections(&self, code: &str) -> ClientResult<String> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ClientError::validation(INVALID_CODE_MESSAGE));
        }

        let response: MessageResponse = self
            .client
            .post_query("/selections/clear", &[("code", code)])
            .await
            .map_err(|e| e.into_failure(CLEAR_FALLBACK))?;
        Ok(response.message_or(CLEAR_SUCCESS))
    }
}
