//! In-process stand-in for the backend API, for tests that exercise the
//! real HTTP path.

use crate::api::client::ApiClient;
use crate::auth::session::AuthSession;
use axum::Router;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct StubBackend {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl StubBackend {
    /// Serves `app` on an ephemeral loopback port. Routes are expected under
    /// `/api`, matching the production base URL.
    pub async fn spawn(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub backend");
        let addr = listener.local_addr().expect("stub backend address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub backend crashed");
        });
        Self { addr, handle }
    }

    pub fn api_base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn client_for(backend: &StubBackend) -> ApiClient {
    ApiClient::with_base_url(
        &backend.api_base_url(),
        Duration::from_secs(5),
        AuthSession::in_memory(),
    )
    .expect("build client")
}
