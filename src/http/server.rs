//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the realtime and operational routes
//! - Wire up middleware (request ID, tracing, overload shedding)
//! - Serve on whichever acceptor startup bound (TCP, TLS or unix socket)
//! - Stop accepting when the shutdown future resolves

use axum::{
    error_handling::HandleErrorLayer,
    extract::FromRef,
    http::StatusCode,
    routing::get,
    Router,
};
use axum_server::Handle;
use metrics_exporter_prometheus::PrometheusHandle;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tower::{
    limit::GlobalConcurrencyLimitLayer,
    load_shed::{error::Overloaded, LoadShedLayer},
    BoxError, ServiceBuilder,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::gateway::{socket, Gateway};
use crate::http::status;
use crate::net::Acceptor;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub metrics: Option<PrometheusHandle>,
}

impl FromRef<AppState> for Arc<Gateway> {
    fn from_ref(state: &AppState) -> Self {
        state.gateway.clone()
    }
}

/// HTTP server for the realtime gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(gateway: Arc<Gateway>, metrics: Option<PrometheusHandle>) -> Self {
        let router = Self::build_router(AppState { gateway, metrics });
        Self { router }
    }

    fn build_router(state: AppState) -> Router {
        let max_in_flight = state.gateway.max_connections();
        let router = Router::new()
            .route("/realtime", get(socket::realtime_upgrade))
            .route("/status", get(status::get_status))
            .route("/metrics", get(status::get_metrics))
            .with_state(state);

        with_overload_guard(router, max_in_flight).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    /// Run the server until `shutdown` resolves.
    pub async fn run<F>(self, acceptor: Acceptor, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(address = %acceptor.describe(), scheme = acceptor.scheme(), "HTTP server starting");

        match acceptor {
            Acceptor::Tcp(listener) => {
                axum::serve(listener, self.router)
                    .with_graceful_shutdown(shutdown)
                    .await?;
            }
            #[cfg(unix)]
            Acceptor::Unix(listener) => {
                axum::serve(listener, self.router)
                    .with_graceful_shutdown(shutdown)
                    .await?;
            }
            Acceptor::Tls { listener, config } => {
                let handle = Handle::new();
                let trigger = handle.clone();
                tokio::spawn(async move {
                    shutdown.await;
                    trigger.graceful_shutdown(Some(Duration::from_secs(1)));
                });

                axum_server::from_tcp_rustls(listener, config)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Refuse requests with 503 once `max_in_flight` are being handled.
///
/// One limit is shared by every route.
fn with_overload_guard(router: Router, max_in_flight: usize) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(overloaded))
            .layer(LoadShedLayer::new())
            .layer(GlobalConcurrencyLimitLayer::new(max_in_flight)),
    )
}

async fn overloaded(err: BoxError) -> (StatusCode, &'static str) {
    if err.is::<Overloaded>() {
        tracing::warn!("Request limit reached, shedding load");
        (StatusCode::SERVICE_UNAVAILABLE, "Server is too busy")
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tokio::sync::{mpsc, Notify};
    use tower::ServiceExt;

    fn get_slow() -> Request<Body> {
        Request::get("/slow").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn saturated_router_sheds_load() {
        let (entered_tx, mut entered_rx) = mpsc::channel::<()>(1);
        let release = Arc::new(Notify::new());
        let gate = release.clone();
        let slow = Router::new().route(
            "/slow",
            get(move || {
                let entered = entered_tx.clone();
                let gate = gate.clone();
                async move {
                    let _ = entered.send(()).await;
                    gate.notified().await;
                    "done"
                }
            }),
        );
        let router = with_overload_guard(slow, 1);

        let first = tokio::spawn(router.clone().oneshot(get_slow()));
        entered_rx.recv().await.unwrap();

        let refused = router.clone().oneshot(get_slow()).await.unwrap();
        assert_eq!(refused.status(), StatusCode::SERVICE_UNAVAILABLE);

        release.notify_one();
        assert_eq!(first.await.unwrap().unwrap().status(), StatusCode::OK);
    }
}
