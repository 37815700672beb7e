//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;

use collab_gateway::config::GatewayConfig;
use collab_gateway::gateway::Gateway;
use collab_gateway::http::HttpServer;
use collab_gateway::lifecycle::Lifecycle;
use collab_gateway::net::Acceptor;
use collab_gateway::persistence::{MemoryPersistence, ReadinessGate};
use collab_gateway::realtime::{cookie, LocalRealtime, MemorySessionStore};

pub const SECRET: &str = "integration secret";

/// Everything a test needs to poke at a running gateway.
pub struct Harness {
    pub config: GatewayConfig,
    pub lifecycle: Arc<Lifecycle>,
    pub persistence: Arc<MemoryPersistence>,
    pub realtime: Arc<LocalRealtime>,
    pub sessions: Arc<MemorySessionStore>,
    pub gateway: Arc<Gateway>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: GatewayConfig) -> Self {
        let lifecycle = Arc::new(Lifecycle::new());
        let persistence = Arc::new(MemoryPersistence::new());
        let realtime = Arc::new(LocalRealtime::new());
        let sessions = Arc::new(MemorySessionStore::new());
        let gateway = Arc::new(Gateway::new(
            &config,
            lifecycle.clone(),
            realtime.clone(),
            sessions.clone(),
        ));

        Self {
            config,
            lifecycle,
            persistence,
            realtime,
            sessions,
            gateway,
        }
    }

    pub fn gate(&self) -> ReadinessGate {
        ReadinessGate::new(self.persistence.clone(), self.realtime.clone())
    }

    /// Serve on an ephemeral port until the returned sender fires or drops.
    pub async fn serve(&self) -> (SocketAddr, oneshot::Sender<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let server = HttpServer::new(self.gateway.clone(), None);
        tokio::spawn(server.run(Acceptor::Tcp(listener), async move {
            let _ = rx.await;
        }));
        self.lifecycle.mark_ready();

        (addr, tx)
    }

    /// Store a logged-in session and return its `Cookie` header value.
    pub fn login(&self, sid: &str, user: &str) -> String {
        self.sessions
            .insert(sid, collab_gateway::realtime::SessionRecord::for_user(user));
        cookie_header(sid)
    }
}

pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.session.secret = SECRET.to_string();
    config
}

pub fn cookie_header(sid: &str) -> String {
    format!("connect.sid={}", cookie::encode_session_id(sid, SECRET))
}

/// Build a WebSocket client request for `/realtime`, optionally with a cookie.
pub fn realtime_request(
    addr: SocketAddr,
    cookie: Option<&str>,
) -> tokio_tungstenite::tungstenite::handshake::client::Request {
    let mut request = format!("ws://{addr}/realtime").into_client_request().unwrap();
    if let Some(cookie) = cookie {
        request
            .headers_mut()
            .insert("cookie", HeaderValue::from_str(cookie).unwrap());
    }
    request
}

/// Poll `f` until it holds or a second has passed.
pub async fn eventually(mut f: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if f() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    f()
}
