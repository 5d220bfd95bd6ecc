//! HTTP wiring: routes, ingress layers and the serve loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use apikit::{context::REQUEST_ID_HEADER, Dispatcher, SignatureError};
use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Extension, Router,
};
use runtime::ServerConfig;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::notes::{self, NotesService};

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Clone, Default)]
pub struct MakeReqId;

impl MakeRequestId for MakeReqId {
    fn make_request_id<B>(&mut self, _req: &Request<B>) -> Option<RequestId> {
        let id = nanoid::nanoid!();
        Some(RequestId::new(id.parse().ok()?))
    }
}

/// Register every handler and wrap the router in the ingress layers.
///
/// Fails if any handler has an unsupported shape.
pub fn build_router(
    dispatcher: &Dispatcher,
    notes: Arc<NotesService>,
    server: &ServerConfig,
) -> Result<Router, SignatureError> {
    let mut router = Router::new()
        .route("/health", get(dispatcher.handle(notes::health)?))
        .route(
            "/notes",
            get(dispatcher.handle(notes::list_notes)?).post(dispatcher.handle(notes::create_note)?),
        )
        .route("/notes/get", post(dispatcher.handle(notes::get_note)?))
        .route("/notes/search", post(dispatcher.handle(notes::search_notes)?))
        .route("/notes/export", get(dispatcher.handle(notes::export_notes)?))
        .layer(Extension(notes));

    if server.timeout_sec > 0 {
        router = router.layer(TimeoutLayer::new(Duration::from_secs(server.timeout_sec)));
    }

    // Outermost first: the id exists before tracing and handlers see the request.
    let ingress = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeReqId))
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                let rid = req
                    .headers()
                    .get(&REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("n/a");
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri().path(),
                    request_id = %rid,
                )
            }),
        )
        .layer(RequestBodyLimitLayer::new(dispatcher.config().max_body_bytes));

    Ok(router.layer(ingress))
}

/// Bind `host:port` and serve until a shutdown signal arrives.
pub async fn serve(router: Router, server: &ServerConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((server.host.as_str(), server.port))
        .await
        .with_context(|| format!("invalid bind address {}:{}", server.host, server.port))?;
    tracing::info!("HTTP server bound on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {},
                    _ = tokio::signal::ctrl_c() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("HTTP server shutting down gracefully");
}
