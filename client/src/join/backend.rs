//! The remote operations the join workflow depends on.

use crate::api::client::ApiClient;
use crate::errors::{ClientError, ClientResult};
use crate::join::models::{AccessCode, FieldSchema, JoinPayload, ResolvedCode, SessionKind};
use async_trait::async_trait;
use serde_json::{Value, json};

pub const RESOLVE_FALLBACK: &str = "Invalid access code";
pub const UNKNOWN_KIND_MESSAGE: &str = "Unknown code type";

/// Backend calls needed to resolve a code and join its session.
///
/// Errors are returned unlabeled; the workflow decides which stage they
/// belong to.
#[async_trait]
pub trait JoinBackend: Send + Sync {
    /// Maps an access code to the kind of session it opens.
    async fn resolve_kind(&self, code: &AccessCode) -> ClientResult<ResolvedCode>;
    /// Fetches the inputs a participant must provide for `code`.
    async fn fetch_fields(&self, kind: SessionKind, code: &AccessCode)
    -> ClientResult<FieldSchema>;
    /// Submits a join; the response body is passed through untouched.
    async fn join(&self, kind: SessionKind, payload: &JoinPayload) -> ClientResult<Value>;
}

fn family(kind: SessionKind) -> ClientResult<&'static str> {
    kind.endpoint_family()
        .ok_or_else(|| ClientError::resolution(UNKNOWN_KIND_MESSAGE))
}

#[async_trait]
impl JoinBackend for ApiClient {
    async fn resolve_kind(&self, code: &AccessCode) -> ClientResult<ResolvedCode> {
        self.post_json("/join/resolve", &json!({ "code": code })).await
    }

    async fn fetch_fields(
        &self,
        kind: SessionKind,
        code: &AccessCode,
    ) -> ClientResult<FieldSchema> {
        let path = format!("/{}/fields", family(kind)?);
        self.get_json(&path, &[("code", code.as_str())]).await
    }

    async fn join(&self, kind: SessionKind, payload: &JoinPayload) -> ClientResult<Value> {
        let path = format!("/{}/join", family(kind)?);
        self.post_json(&path, payload).await
    }
}

/// Resolves `code` and loads its schema: the whole `Resolving` stage.
///
/// An unknown kind stops before any schema request. Every failure comes
/// back as a resolution or schema-fetch error with a displayable message.
pub async fn resolve_and_fetch<B: JoinBackend + ?Sized>(
    backend: &B,
    code: &AccessCode,
) -> ClientResult<(SessionKind, FieldSchema)> {
    let resolved = backend
        .resolve_kind(code)
        .await
        .map_err(|e| e.into_resolution(RESOLVE_FALLBACK))?;

    let kind = resolved.kind;
    if kind == SessionKind::Unknown {
        tracing::info!("Code {} resolved to an unknown session kind", code);
        return Err(ClientError::resolution(UNKNOWN_KIND_MESSAGE));
    }
    tracing::info!("Code {} resolved to a {} session", code, kind);

    let mut schema = backend
        .fetch_fields(kind, code)
        .await
        .map_err(|e| e.into_schema_fetch(kind.fields_fallback()))?;

    // the resolver may know the name when the fields endpoint does not
    if schema.name.is_none() {
        schema.name = resolved.name;
    }
    if schema.identifier.trim().is_empty() {
        if let Some(identifier) = resolved.identifier {
            schema.identifier = identifier;
        }
    }

    Ok((kind, schema))
}
