//! Report downloads for host sessions.
//!
//! The backend renders the reports; the client only fetches the bytes and
//! writes them to disk.

use crate::api::client::{ApiClient, Download};
use crate::errors::{ClientError, ClientResult};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DOWNLOAD_FALLBACK: &str = "Failed to start download";
const MISSING_CODE_MESSAGE: &str = "Provide access code";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Group,
    Selection,
}

impl ExportKind {
    fn path_segment(self) -> &'static str {
        match self {
            ExportKind::Group => "group-session",
            ExportKind::Selection => "selection-session",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportKind::Group => "group",
            ExportKind::Selection => "selection",
        })
    }
}

impl FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "group" => Ok(ExportKind::Group),
            "selection" => Ok(ExportKind::Selection),
            other => Err(format!("unknown session kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Excel,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Excel, ExportFormat::Pdf];

    pub fn path_segment(self) -> &'static str {
        match self {
            ExportFormat::Excel => "excel",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// Name used when the server does not suggest one.
pub fn default_filename(
    kind: ExportKind,
    session_id: i64,
    format: ExportFormat,
    at: DateTime<Utc>,
) -> String {
    format!(
        "{}_session_{}_{}.{}",
        kind,
        session_id,
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

fn usable_filename(name: Option<&str>) -> Option<&str> {
    name.filter(|n| !n.is_empty() && *n != "." && *n != "..")
}

pub struct ExportService<'a> {
    client: &'a ApiClient,
}

impl<'a> ExportService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Fetches one report. The session's current access code authorizes the
    /// export alongside the bearer token.
    pub async fn download(
        &self,
        kind: ExportKind,
        session_id: i64,
        format: ExportFormat,
        access_code: &str,
    ) -> ClientResult<Download> {
        let access_code = access_code.trim();
        if access_code.is_empty() {
            return Err(ClientError::validation(MISSING_CODE_MESSAGE));
        }

        let path = format!(
            "/export/{}/{}/{}",
            kind.path_segment(),
            session_id,
            format.path_segment()
        );
        self.client
            .get_bytes(&path, &[("access_code", access_code)])
            .await
            .map_err(|e| e.into_failure(DOWNLOAD_FALLBACK))
    }

    /// Downloads one report into `dir` and returns the written path.
    pub async fn save(
        &self,
        kind: ExportKind,
        session_id: i64,
        format: ExportFormat,
        access_code: &str,
        dir: &Path,
    ) -> ClientResult<PathBuf> {
        let download = self.download(kind, session_id, format, access_code).await?;

        let filename = match usable_filename(download.filename.as_deref()) {
            Some(name) => name.to_string(),
            None => default_filename(kind, session_id, format, Utc::now()),
        };
        let path = dir.join(filename);

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ClientError::failed(format!("Could not create {}: {e}", dir.display())))?;
        tokio::fs::write(&path, &download.bytes)
            .await
            .map_err(|e| ClientError::failed(format!("Could not write {}: {e}", path.display())))?;

        tracing::info!(
            "Saved {} export of {} session {} to {} ({} bytes)",
            format.extension(),
            kind,
            session_id,
            path.display(),
            download.bytes.len()
        );
        Ok(path)
    }

    /// Downloads several formats concurrently. Each format succeeds or fails
    /// on its own; results come back in the order of `formats`.
    pub async fn save_all(
        &self,
        kind: ExportKind,
        session_id: i64,
        formats: &[ExportFormat],
        access_code: &str,
        dir: &Path,
    ) -> Vec<ClientResult<PathBuf>> {
        let downloads = formats
            .iter()
            .map(|format| self.save(kind, session_id, *format, access_code, dir));
        join_all(downloads).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubBackend, client_for};
    use axum::{
        Router,
        extract::{Path as UrlPath, Query},
        http::{StatusCode, header},
        routing::get,
    };
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("groupify-export-{}", uuid::Uuid::now_v7()))
    }

    #[test]
    fn test_default_filename() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 5, 7).unwrap();
        assert_eq!(
            default_filename(ExportKind::Group, 42, ExportFormat::Excel, at),
            "group_session_42_20250301_090507.xlsx"
        );
        assert_eq!(
            default_filename(ExportKind::Selection, 7, ExportFormat::Pdf, at),
            "selection_session_7_20250301_090507.pdf"
        );
    }

    #[test]
    fn test_parse_kind_and_format() {
        assert_eq!("Group".parse::<ExportKind>().unwrap(), ExportKind::Group);
        assert_eq!("xlsx".parse::<ExportFormat>().unwrap(), ExportFormat::Excel);
        assert!("csv".parse::<ExportFormat>().is_err());
    }

    #[tokio::test]
    async fn test_save_all_writes_both_formats() {
        let app = Router::new().route(
            "/api/export/group-session/{id}/{format}",
            get(
                |UrlPath((id, format)): UrlPath<(i64, String)>,
                 Query(query): Query<HashMap<String, String>>| async move {
                    let code = query.get("access_code").map(String::as_str);
                    if id != 42 || code != Some("GRP42") {
                        (
                            StatusCode::NOT_FOUND,
                            [(header::CONTENT_TYPE, "text/plain")],
                            Vec::new(),
                        )
                    } else if format == "excel" {
                        (
                            StatusCode::OK,
                            [(header::CONTENT_DISPOSITION, "attachment; filename=\"lab.xlsx\"")],
                            b"xlsx-bytes".to_vec(),
                        )
                    } else {
                        (
                            StatusCode::OK,
                            [(header::CONTENT_TYPE, "application/pdf")],
                            b"%PDF-1.4".to_vec(),
                        )
                    }
                },
            ),
        );
        let backend = StubBackend::spawn(app).await;
        let client = client_for(&backend);
        let dir = temp_dir();

        let results = ExportService::new(&client)
            .save_all(ExportKind::Group, 42, &ExportFormat::ALL, " GRP42 ", &dir)
            .await;
        assert_eq!(results.len(), 2);

        let excel = results[0].as_ref().unwrap();
        assert_eq!(excel.file_name().unwrap(), "lab.xlsx");
        assert_eq!(tokio::fs::read(excel).await.unwrap(), b"xlsx-bytes");

        let pdf = results[1].as_ref().unwrap();
        let name = pdf.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("group_session_42_"));
        assert!(name.ends_with(".pdf"));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_export_requires_access_code() {
        let client = ApiClient::with_base_url(
            "http://127.0.0.1:9/api",
            std::time::Duration::from_secs(1),
            crate::auth::session::AuthSession::in_memory(),
        )
        .unwrap();
        let err = ExportService::new(&client)
            .download(ExportKind::Selection, 1, ExportFormat::Pdf, "  ")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(""), MISSING_CODE_MESSAGE);
    }

    #[tokio::test]
    async fn test_export_failure_message() {
        let app = Router::new().route(
            "/api/export/selection-session/{id}/{format}",
            get(|| async { StatusCode::FORBIDDEN }),
        );
        let backend = StubBackend::spawn(app).await;
        let client = client_for(&backend);

        let err = ExportService::new(&client)
            .download(ExportKind::Selection, 3, ExportFormat::Excel, "SEL3")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), DOWNLOAD_FALLBACK);
    }
}
