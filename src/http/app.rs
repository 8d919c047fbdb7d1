//! Router construction and the listener loop.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::Request,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{
    LatencyUnit,
    trace::{DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};

use super::handlers;
use crate::finder::Verifier;
use crate::mx::LookupMx;
use crate::ratelimit::RequestRateLimiter;
use crate::smtp_verify::MailboxProber;

/// Shared handler state: the engine and the request quota.
pub struct AppState<R, P> {
    pub verifier: Arc<Verifier<R, P>>,
    pub limiter: Arc<RequestRateLimiter>,
}

impl<R, P> AppState<R, P> {
    pub fn new(verifier: Arc<Verifier<R, P>>, limiter: Arc<RequestRateLimiter>) -> Self {
        Self { verifier, limiter }
    }
}

impl<R, P> Clone for AppState<R, P> {
    fn clone(&self) -> Self {
        Self {
            verifier: Arc::clone(&self.verifier),
            limiter: Arc::clone(&self.limiter),
        }
    }
}

pub fn build_app<R, P>(state: AppState<R, P>) -> Router
where
    R: LookupMx + Send + Sync + 'static,
    P: MailboxProber + Send + Sync + 'static,
{
    Router::new()
        .route("/api/check-email", post(handlers::check_email::<R, P>))
        .route(
            "/api/validate-email",
            post(handlers::validate_email_handler::<R, P>),
        )
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "http-request",
                        method = request.method().as_str(),
                        path = request.uri().path(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                )
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR)
                        .latency_unit(LatencyUnit::Micros),
                ),
        )
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP service listening");
    }
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}
