//! The join workflow as an explicit state machine.
//!
//! ```text
//! Idle ──check──▶ Resolving ──ok──▶ SchemaLoaded ──submit──▶ Submitting ──ok──▶ JoinSucceeded
//!                    │                    ▲                      │
//!                    └──err──▶ ResolutionError                   └──err──┘ (message kept inline)
//! ```
//!
//! Each check or submission is issued an attempt id. A response is applied
//! only if its attempt id is still the latest one issued, so an earlier
//! request that finishes late can never overwrite a newer result.

use crate::errors::{ClientError, ClientResult};
use crate::join::backend::{JoinBackend, RESOLVE_FALLBACK, resolve_and_fetch};
use crate::join::link::JoinLink;
use crate::join::models::{
    AccessCode, Confirmation, FieldSchema, FieldValues, JoinPayload, SessionKind,
};
use crate::join::validation::{can_submit, missing_inputs};
use chrono::Utc;
use serde_json::Value;

pub type AttemptId = u64;

/// Whether a finished request changed the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A newer attempt was started meanwhile; the response was dropped.
    Superseded,
}

/// Form state for a loaded schema.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinForm {
    kind: SessionKind,
    code: AccessCode,
    schema: FieldSchema,
    values: FieldValues,
    identifier: String,
    error: Option<String>,
}

impl JoinForm {
    fn new(kind: SessionKind, code: AccessCode, schema: FieldSchema) -> Self {
        Self {
            kind,
            code,
            values: FieldValues::for_schema(&schema),
            schema,
            identifier: String::new(),
            error: None,
        }
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn code(&self) -> &AccessCode {
        &self.code
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Message from the last rejected join, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn can_submit(&self) -> bool {
        can_submit(
            &self.schema,
            self.values.as_map(),
            &self.identifier,
            self.code.as_str(),
        )
    }

    pub fn missing_inputs(&self) -> Vec<String> {
        missing_inputs(&self.schema, self.values.as_map(), &self.identifier)
    }

    fn payload(&self) -> JoinPayload {
        JoinPayload {
            code: self.code.clone(),
            member_data: self
                .values
                .as_map()
                .iter()
                .map(|(field, value)| (field.clone(), value.trim().to_string()))
                .collect(),
            member_identifier: self.identifier.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum JoinState {
    #[default]
    Idle,
    Resolving {
        code: AccessCode,
        attempt: AttemptId,
    },
    SchemaLoaded(JoinForm),
    Submitting {
        form: JoinForm,
        attempt: AttemptId,
    },
    JoinSucceeded(Confirmation),
    ResolutionError {
        code: AccessCode,
        message: String,
    },
}

impl JoinState {
    pub fn name(&self) -> &'static str {
        match self {
            JoinState::Idle => "idle",
            JoinState::Resolving { .. } => "resolving",
            JoinState::SchemaLoaded(_) => "schema_loaded",
            JoinState::Submitting { .. } => "submitting",
            JoinState::JoinSucceeded(_) => "join_succeeded",
            JoinState::ResolutionError { .. } => "resolution_error",
        }
    }

    /// The form, while one is loaded or being submitted.
    pub fn form(&self) -> Option<&JoinForm> {
        match self {
            JoinState::SchemaLoaded(form) | JoinState::Submitting { form, .. } => Some(form),
            _ => None,
        }
    }

    /// The message to show inline, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            JoinState::ResolutionError { message, .. } => Some(message),
            JoinState::SchemaLoaded(form) => form.error(),
            _ => None,
        }
    }
}

/// Handle for an in-flight code check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTicket {
    pub attempt: AttemptId,
    pub code: AccessCode,
}

/// Handle for an in-flight join submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTicket {
    pub attempt: AttemptId,
    pub kind: SessionKind,
    pub payload: JoinPayload,
}

/// One participant's join attempt, from access code to confirmation.
#[derive(Debug, Default)]
pub struct JoinWorkflow {
    state: JoinState,
    latest_attempt: AttemptId,
    resumed: bool,
}

impl JoinWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &JoinState {
        &self.state
    }

    pub fn can_submit(&self) -> bool {
        matches!(&self.state, JoinState::SchemaLoaded(form) if form.can_submit())
    }

    fn next_attempt(&mut self) -> AttemptId {
        self.latest_attempt += 1;
        self.latest_attempt
    }

    /// Starts resolving `raw_code`, superseding anything in flight.
    ///
    /// A blank or over-long code is rejected here and the state is left as
    /// it was.
    pub fn begin_check(&mut self, raw_code: &str) -> ClientResult<CheckTicket> {
        let code = AccessCode::parse(raw_code)?;
        let attempt = self.next_attempt();
        tracing::debug!("Checking code {} (attempt {})", code, attempt);

        self.state = JoinState::Resolving {
            code: code.clone(),
            attempt,
        };
        Ok(CheckTicket { attempt, code })
    }

    /// Applies the outcome of a code check.
    ///
    /// Success replaces any previous form wholesale: every field of the new
    /// schema starts empty, as does the identifier.
    pub fn finish_check(
        &mut self,
        ticket: CheckTicket,
        outcome: ClientResult<(SessionKind, FieldSchema)>,
    ) -> Completion {
        let in_flight = matches!(
            &self.state,
            JoinState::Resolving { attempt, .. } if *attempt == ticket.attempt
        );
        if !in_flight || ticket.attempt != self.latest_attempt {
            tracing::debug!("Dropping stale check result (attempt {})", ticket.attempt);
            return Completion::Superseded;
        }

        self.state = match outcome {
            Ok((kind, schema)) => {
                tracing::info!(
                    "Loaded {} schema for {} with {} field(s)",
                    kind,
                    ticket.code,
                    schema.fields.len()
                );
                JoinState::SchemaLoaded(JoinForm::new(kind, ticket.code, schema))
            }
            Err(e) => {
                let message = e.user_message(RESOLVE_FALLBACK);
                tracing::warn!("Code {} could not be resolved: {}", ticket.code, message);
                JoinState::ResolutionError {
                    code: ticket.code,
                    message,
                }
            }
        };
        Completion::Applied
    }

    /// Sets the value of one schema field.
    pub fn set_field(&mut self, field: &str, value: impl Into<String>) -> ClientResult<()> {
        self.editable_form()?.values.set(field, value)
    }

    pub fn set_identifier(&mut self, value: impl Into<String>) -> ClientResult<()> {
        self.editable_form()?.identifier = value.into();
        Ok(())
    }

    fn editable_form(&mut self) -> ClientResult<&mut JoinForm> {
        match &mut self.state {
            JoinState::SchemaLoaded(form) => Ok(form),
            JoinState::Submitting { .. } => Err(ClientError::validation(
                "A join request is already in progress",
            )),
            _ => Err(ClientError::validation(
                "Check an access code before entering details",
            )),
        }
    }

    /// Moves to `Submitting` if every input is filled.
    ///
    /// Rejected submissions (incomplete inputs, a join already in flight, no
    /// schema) leave the state untouched.
    pub fn begin_submit(&mut self) -> ClientResult<SubmitTicket> {
        let mut form = match std::mem::take(&mut self.state) {
            JoinState::SchemaLoaded(form) if form.can_submit() => form,
            other => {
                let err = match &other {
                    JoinState::SchemaLoaded(form) => ClientError::validation(format!(
                        "Please fill in: {}",
                        form.missing_inputs().join(", ")
                    )),
                    JoinState::Submitting { .. } => {
                        ClientError::validation("A join request is already in progress")
                    }
                    _ => ClientError::validation("Check an access code before joining"),
                };
                self.state = other;
                return Err(err);
            }
        };
        form.error = None;

        let attempt = self.next_attempt();
        let ticket = SubmitTicket {
            attempt,
            kind: form.kind,
            payload: form.payload(),
        };
        tracing::debug!("Submitting join for {} (attempt {})", form.code, attempt);

        self.state = JoinState::Submitting { form, attempt };
        Ok(ticket)
    }

    /// Applies the outcome of a join submission.
    ///
    /// On failure the form comes back exactly as submitted, with the
    /// server's message attached.
    pub fn finish_submit(&mut self, ticket: SubmitTicket, outcome: ClientResult<Value>) -> Completion {
        let latest = self.latest_attempt;
        let mut form = match std::mem::take(&mut self.state) {
            JoinState::Submitting { form, attempt }
                if attempt == ticket.attempt && attempt == latest =>
            {
                form
            }
            other => {
                self.state = other;
                tracing::debug!("Dropping stale join result (attempt {})", ticket.attempt);
                return Completion::Superseded;
            }
        };

        self.state = match outcome {
            Ok(response) => {
                tracing::info!("Joined {} session {}", form.kind, form.code);
                JoinState::JoinSucceeded(Confirmation {
                    kind: form.kind,
                    code: form.code,
                    session_name: form.schema.name,
                    response,
                    joined_at: Utc::now(),
                })
            }
            Err(e) => {
                let fallback = form.kind.join_fallback();
                let message = e.into_join(fallback).user_message(fallback);
                tracing::warn!("Join for {} rejected: {}", form.code, message);
                form.error = Some(message);
                JoinState::SchemaLoaded(form)
            }
        };
        Completion::Applied
    }

    /// Checks a code end to end against `backend`.
    ///
    /// Returns an error only when the code is rejected locally; the result
    /// of the check itself is reported through [`JoinWorkflow::state`].
    pub async fn check_code<B: JoinBackend + ?Sized>(
        &mut self,
        backend: &B,
        raw_code: &str,
    ) -> ClientResult<Completion> {
        let ticket = self.begin_check(raw_code)?;
        let outcome = resolve_and_fetch(backend, &ticket.code).await;
        Ok(self.finish_check(ticket, outcome))
    }

    /// Submits the current form end to end against `backend`.
    ///
    /// Returns an error only when submission is not allowed; the result of
    /// the join is reported through [`JoinWorkflow::state`].
    pub async fn submit<B: JoinBackend + ?Sized>(&mut self, backend: &B) -> ClientResult<Completion> {
        let ticket = self.begin_submit()?;
        let outcome = backend.join(ticket.kind, &ticket.payload).await;
        Ok(self.finish_submit(ticket, outcome))
    }

    /// Starts a check from a shared link. Only the first call per workflow
    /// does anything; later calls return `Ok(None)`.
    pub async fn resume_from_link<B: JoinBackend + ?Sized>(
        &mut self,
        backend: &B,
        link: &JoinLink,
    ) -> ClientResult<Option<Completion>> {
        if self.resumed {
            return Ok(None);
        }
        self.resumed = true;
        self.check_code(backend, link.code.as_str()).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::models::ResolvedCode;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Resolve(String),
        Fields(SessionKind, String),
        Join(SessionKind, JoinPayload),
    }

    /// In-memory backend keyed by access code.
    #[derive(Default)]
    struct FakeBackend {
        kinds: HashMap<String, &'static str>,
        schemas: HashMap<String, FieldSchema>,
        join_error: Mutex<Option<ClientError>>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeBackend {
        fn with_code(mut self, code: &str, kind: &'static str, schema: FieldSchema) -> Self {
            self.kinds.insert(code.to_string(), kind);
            self.schemas.insert(code.to_string(), schema);
            self
        }

        fn fail_next_join(&self, err: ClientError) {
            *self.join_error.lock().unwrap() = Some(err);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JoinBackend for FakeBackend {
        async fn resolve_kind(&self, code: &AccessCode) -> ClientResult<ResolvedCode> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Resolve(code.to_string()));
            match self.kinds.get(code.as_str()) {
                Some(kind) => Ok(ResolvedCode {
                    kind: SessionKind::from(kind.to_string()),
                    name: None,
                    identifier: None,
                }),
                None => Err(ClientError::api(
                    404,
                    Some("Access code not recognized".to_string()),
                )),
            }
        }

        async fn fetch_fields(
            &self,
            kind: SessionKind,
            code: &AccessCode,
        ) -> ClientResult<FieldSchema> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Fields(kind, code.to_string()));
            self.schemas
                .get(code.as_str())
                .cloned()
                .ok_or_else(|| ClientError::api(500, None))
        }

        async fn join(&self, kind: SessionKind, payload: &JoinPayload) -> ClientResult<Value> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Join(kind, payload.clone()));
            if let Some(err) = self.join_error.lock().unwrap().take() {
                return Err(err);
            }
            Ok(json!({ "group_name": "Team Blue", "member_identifier": payload.member_identifier }))
        }
    }

    fn schema(fields: &[&str], identifier: &str) -> FieldSchema {
        FieldSchema {
            name: Some("Workshop".to_string()),
            description: None,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            identifier: identifier.to_string(),
        }
    }

    fn loaded_form(workflow: &JoinWorkflow) -> &JoinForm {
        match workflow.state() {
            JoinState::SchemaLoaded(form) => form,
            other => panic!("expected schema_loaded, got {}", other.name()),
        }
    }

    #[tokio::test]
    async fn test_group_join_happy_path() {
        let backend =
            FakeBackend::default().with_code("ABC123", "group", schema(&["name", "department"], "email"));
        let mut workflow = JoinWorkflow::new();

        let done = workflow.check_code(&backend, "ABC123").await.unwrap();
        assert_eq!(done, Completion::Applied);
        assert!(!workflow.can_submit());

        workflow.set_field("name", "Jane").unwrap();
        workflow.set_field("department", "Eng").unwrap();
        assert!(!workflow.can_submit());
        workflow.set_identifier("jane@x.com").unwrap();
        assert!(workflow.can_submit());

        workflow.submit(&backend).await.unwrap();

        let expected_payload = JoinPayload {
            code: AccessCode::parse("ABC123").unwrap(),
            member_data: HashMap::from([
                ("name".to_string(), "Jane".to_string()),
                ("department".to_string(), "Eng".to_string()),
            ]),
            member_identifier: "jane@x.com".to_string(),
        };
        assert_eq!(
            backend.calls(),
            vec![
                Call::Resolve("ABC123".to_string()),
                Call::Fields(SessionKind::Group, "ABC123".to_string()),
                Call::Join(SessionKind::Group, expected_payload),
            ]
        );

        match workflow.state() {
            JoinState::JoinSucceeded(confirmation) => {
                assert_eq!(confirmation.kind, SessionKind::Group);
                assert_eq!(confirmation.session_name.as_deref(), Some("Workshop"));
                assert_eq!(confirmation.response["group_name"], "Team Blue");
            }
            other => panic!("expected join_succeeded, got {}", other.name()),
        }
    }

    #[tokio::test]
    async fn test_blank_code_never_reaches_resolver() {
        let backend = FakeBackend::default();
        let mut workflow = JoinWorkflow::new();

        for raw in ["", "   ", "\t\n"] {
            let err = workflow.check_code(&backend, raw).await.unwrap_err();
            assert!(matches!(err, ClientError::Validation { .. }));
        }
        assert!(backend.calls().is_empty());
        assert_eq!(workflow.state(), &JoinState::Idle);
    }

    #[tokio::test]
    async fn test_unknown_kind_stops_before_schema_fetch() {
        let backend = FakeBackend::default().with_code("RAFFLE", "raffle", schema(&[], "email"));
        let mut workflow = JoinWorkflow::new();

        workflow.check_code(&backend, "RAFFLE").await.unwrap();

        assert_eq!(workflow.state().error(), Some("Unknown code type"));
        assert_eq!(backend.calls(), vec![Call::Resolve("RAFFLE".to_string())]);
    }

    #[tokio::test]
    async fn test_resolution_error_surfaces_server_message_and_allows_retry() {
        let backend = FakeBackend::default().with_code("GOOD", "selection", schema(&["name"], "phone"));
        let mut workflow = JoinWorkflow::new();

        workflow.check_code(&backend, "BAD").await.unwrap();
        assert!(matches!(workflow.state(), JoinState::ResolutionError { .. }));
        assert_eq!(workflow.state().error(), Some("Access code not recognized"));

        workflow.check_code(&backend, "GOOD").await.unwrap();
        let form = loaded_form(&workflow);
        assert_eq!(form.kind(), SessionKind::Selection);
        assert_eq!(form.schema().identifier, "phone");
    }

    #[tokio::test]
    async fn test_join_error_keeps_schema_and_values() {
        let backend = FakeBackend::default().with_code("ABC123", "group", schema(&["name"], "email"));
        let mut workflow = JoinWorkflow::new();
        workflow.check_code(&backend, "ABC123").await.unwrap();
        workflow.set_field("name", "Jane").unwrap();
        workflow.set_identifier("jane@x.com").unwrap();
        let before = loaded_form(&workflow).clone();

        backend.fail_next_join(ClientError::api(400, Some("Code expired".to_string())));
        workflow.submit(&backend).await.unwrap();

        let form = loaded_form(&workflow);
        assert_eq!(form.error(), Some("Code expired"));
        assert_eq!(form.schema(), before.schema());
        assert_eq!(form.values(), before.values());
        assert_eq!(form.identifier(), "jane@x.com");

        // resubmitting clears the inline error
        workflow.submit(&backend).await.unwrap();
        assert!(matches!(workflow.state(), JoinState::JoinSucceeded(_)));
    }

    #[tokio::test]
    async fn test_join_error_without_message_uses_fallback() {
        let backend =
            FakeBackend::default().with_code("SEL", "selection", schema(&[], "matric"));
        let mut workflow = JoinWorkflow::new();
        workflow.check_code(&backend, "SEL").await.unwrap();
        workflow.set_identifier("U123").unwrap();

        backend.fail_next_join(ClientError::api(503, None));
        workflow.submit(&backend).await.unwrap();
        assert_eq!(workflow.state().error(), Some("Failed to join selection"));
    }

    #[tokio::test]
    async fn test_schema_replacement_resets_shared_fields() {
        let backend = FakeBackend::default()
            .with_code("A", "group", schema(&["name", "team"], "email"))
            .with_code("B", "selection", schema(&["name", "level"], "phone"));
        let mut workflow = JoinWorkflow::new();

        workflow.check_code(&backend, "A").await.unwrap();
        workflow.set_field("name", "Jane").unwrap();
        workflow.set_field("team", "Red").unwrap();
        workflow.set_identifier("jane@x.com").unwrap();

        workflow.check_code(&backend, "B").await.unwrap();
        let form = loaded_form(&workflow);
        assert_eq!(form.values().get("name"), Some(""));
        assert_eq!(form.values().get("level"), Some(""));
        assert_eq!(form.values().get("team"), None);
        assert_eq!(form.identifier(), "");
        assert!(workflow.set_field("team", "Red").is_err());
    }

    #[tokio::test]
    async fn test_refetching_same_schema_is_idempotent() {
        let backend = FakeBackend::default().with_code("A", "group", schema(&["name"], "email"));
        let mut workflow = JoinWorkflow::new();

        let mut verdicts = Vec::new();
        for _ in 0..2 {
            workflow.check_code(&backend, "A").await.unwrap();
            workflow.set_field("name", "Jane").unwrap();
            verdicts.push(workflow.can_submit());
            workflow.set_identifier("j@x.com").unwrap();
            verdicts.push(workflow.can_submit());
        }
        assert_eq!(verdicts, vec![false, true, false, true]);
    }

    #[test]
    fn test_stale_check_result_is_ignored() {
        let mut workflow = JoinWorkflow::new();
        let first = workflow.begin_check("FIRST").unwrap();
        let second = workflow.begin_check("SECOND").unwrap();
        assert!(second.attempt > first.attempt);

        let applied = workflow.finish_check(
            second,
            Ok((SessionKind::Selection, schema(&["level"], "phone"))),
        );
        assert_eq!(applied, Completion::Applied);

        let stale = workflow.finish_check(
            first,
            Ok((SessionKind::Group, schema(&["team"], "email"))),
        );
        assert_eq!(stale, Completion::Superseded);

        let form = loaded_form(&workflow);
        assert_eq!(form.code().as_str(), "SECOND");
        assert_eq!(form.schema().fields, vec!["level".to_string()]);
    }

    #[test]
    fn test_stale_failure_does_not_clobber_newer_success() {
        let mut workflow = JoinWorkflow::new();
        let first = workflow.begin_check("FIRST").unwrap();
        let second = workflow.begin_check("SECOND").unwrap();

        let _ = workflow.finish_check(second, Ok((SessionKind::Group, schema(&[], "email"))));
        let stale = workflow.finish_check(first, Err(ClientError::resolution("boom")));
        assert_eq!(stale, Completion::Superseded);
        assert!(matches!(workflow.state(), JoinState::SchemaLoaded(_)));
    }

    #[test]
    fn test_double_submit_is_rejected_while_in_flight() {
        let mut workflow = JoinWorkflow::new();
        let check = workflow.begin_check("A").unwrap();
        let _ = workflow.finish_check(check, Ok((SessionKind::Group, schema(&[], "email"))));
        workflow.set_identifier("a@b.c").unwrap();

        let ticket = workflow.begin_submit().unwrap();
        let err = workflow.begin_submit().unwrap_err();
        assert!(matches!(err, ClientError::Validation { .. }));
        assert!(workflow.set_identifier("other").is_err());
        assert_eq!(workflow.state().name(), "submitting");

        let _ = workflow.finish_submit(ticket, Ok(json!({})));
        assert_eq!(workflow.state().name(), "join_succeeded");
    }

    #[test]
    fn test_new_check_supersedes_pending_submission() {
        let mut workflow = JoinWorkflow::new();
        let check = workflow.begin_check("A").unwrap();
        let _ = workflow.finish_check(check, Ok((SessionKind::Group, schema(&[], "email"))));
        workflow.set_identifier("a@b.c").unwrap();
        let submit = workflow.begin_submit().unwrap();

        let recheck = workflow.begin_check("B").unwrap();
        assert_eq!(
            workflow.finish_submit(submit, Ok(json!({"ok": true}))),
            Completion::Superseded
        );
        assert_eq!(workflow.state().name(), "resolving");

        let _ = workflow.finish_check(recheck, Ok((SessionKind::Selection, schema(&[], "email"))));
        assert_eq!(loaded_form(&workflow).code().as_str(), "B");
    }

    #[test]
    fn test_incomplete_submit_is_rejected_without_state_change() {
        let mut workflow = JoinWorkflow::new();
        assert!(workflow.begin_submit().is_err());

        let check = workflow.begin_check("A").unwrap();
        let _ = workflow.finish_check(check, Ok((SessionKind::Group, schema(&["name"], "email"))));
        workflow.set_field("name", "  ").unwrap();
        workflow.set_identifier("a@b.c").unwrap();

        let err = workflow.begin_submit().unwrap_err();
        assert_eq!(err.user_message(""), "Please fill in: name");
        assert_eq!(workflow.state().name(), "schema_loaded");
    }

    #[test]
    fn test_submitted_values_are_trimmed() {
        let mut workflow = JoinWorkflow::new();
        let check = workflow.begin_check(" A ").unwrap();
        let _ = workflow.finish_check(check, Ok((SessionKind::Group, schema(&["name"], "email"))));
        workflow.set_field("name", "  Jane ").unwrap();
        workflow.set_identifier(" jane@x.com ").unwrap();

        let ticket = workflow.begin_submit().unwrap();
        assert_eq!(ticket.payload.code.as_str(), "A");
        assert_eq!(ticket.payload.member_data["name"], "Jane");
        assert_eq!(ticket.payload.member_identifier, "jane@x.com");
    }

    #[tokio::test]
    async fn test_resume_from_link_runs_once() {
        let backend = FakeBackend::default().with_code("ABC123", "group", schema(&["name"], "email"));
        let link = JoinLink {
            kind: Some(SessionKind::Group),
            code: AccessCode::parse("ABC123").unwrap(),
        };
        let mut workflow = JoinWorkflow::new();

        assert_eq!(
            workflow.resume_from_link(&backend, &link).await.unwrap(),
            Some(Completion::Applied)
        );
        assert_eq!(workflow.resume_from_link(&backend, &link).await.unwrap(), None);
        assert_eq!(
            backend
                .calls()
                .iter()
                .filter(|c| matches!(c, Call::Resolve(_)))
                .count(),
            1
        );
    }
}
