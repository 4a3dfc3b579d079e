//! Thin HTTP wrapper around the backend REST API.
//!
//! Every request goes through [`ApiClient::execute`], which attaches the
//! bearer token and a request id, turns non-success statuses into
//! [`ClientError`]s carrying the server's message, and treats any 401 as a
//! global signal: the token is cleared and the login redirect is armed.

use crate::api::common::{error_message_from_body, filename_from_content_disposition};
use crate::auth::session::AuthSession;
use crate::config::Config;
use crate::errors::{ClientError, ClientResult};
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "X-Request-Id";
const USER_AGENT: &str = concat!("groupify-client/", env!("CARGO_PKG_VERSION"));

/// Raw file returned by a download endpoint.
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: AuthSession,
}

impl ApiClient {
    /// Creates a client from the loaded configuration.
    pub fn new(config: &Config, session: AuthSession) -> ClientResult<Self> {
        Self::with_base_url(&config.api_base_url, config.request_timeout(), session)
    }

    pub fn with_base_url(
        base_url: &str,
        timeout: Duration,
        session: AuthSession,
    ) -> ClientResult<Self> {
        // The cookie store carries the server's verification session between
        // sign-up, confirmation and resend calls.
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ClientResult<T> {
        let response = self
            .execute(Method::GET, path, |request| request.query(query))
            .await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(Method::POST, path, |request| request.json(body))
            .await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(Method::PUT, path, |request| request.json(body))
            .await?;
        Ok(response.json::<T>().await?)
    }

    /// POST without a body, parameters in the query string.
    pub async fn post_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ClientResult<T> {
        let response = self
            .execute(Method::POST, path, |request| request.query(query))
            .await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn delete_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ClientResult<T> {
        let response = self
            .execute(Method::DELETE, path, |request| request.query(query))
            .await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn get_bytes(&self, path: &str, query: &[(&str, &str)]) -> ClientResult<Download> {
        let response = self
            .execute(Method::GET, path, |request| request.query(query))
            .await?;

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_content_disposition);
        let bytes = response.bytes().await?.to_vec();

        Ok(Download { filename, bytes })
    }

    /// Sends one request. No retries: a failure is reported as-is.
    async fn execute<F>(&self, method: Method, path: &str, build: F) -> ClientResult<Response>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let request_id = Uuid::now_v7();
        let mut request = build(self.http.request(method.clone(), self.url(path)))
            .header(REQUEST_ID_HEADER, request_id.to_string());

        if let Some(token) = self.session.token().await {
            request = request.bearer_auth(token);
        }

        tracing::debug!("{} {} (request {})", method, path, request_id);

        let response = request.send().await.map_err(|e| {
            tracing::error!("{} {} failed (request {}): {}", method, path, request_id, e);
            ClientError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = error_message_from_body(&body);

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(
                "{} {} returned 401 (request {}); clearing session",
                method,
                path,
                request_id
            );
            self.session.expire().await;
            return Err(ClientError::unauthorized(
                message.unwrap_or_else(|| "Session expired. Please log in again.".to_string()),
            ));
        }

        tracing::warn!(
            "{} {} returned {} (request {}): {}",
            method,
            path,
            status,
            request_id,
            message.as_deref().unwrap_or("<no message>")
        );
        Err(ClientError::api(status.as_u16(), message))
    }
}
