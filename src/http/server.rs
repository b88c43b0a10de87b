//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build every module router and nest it under its prefix
//! - Wire up middleware (tracing, request ID, timeout, body limit)
//! - Bind server to listener
//! - Stop accepting on shutdown and drain in-flight requests

use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::LabConfig;
use crate::http::request::{MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
use crate::http::response;
use crate::lifecycle::startup::{prepare_filesystem, StartupError};
use crate::lifecycle::Shutdown;

/// HTTP server hosting every lab module.
pub struct LabServer {
    router: Router,
    config: LabConfig,
    shutdown: Shutdown,
}

impl LabServer {
    /// Prepare the filesystem, open the database and build all routers.
    pub async fn new(config: LabConfig) -> Result<Self, StartupError> {
        prepare_filesystem(&config)?;
        let router = Self::build_router(&config).await?;
        Ok(Self {
            router,
            config,
            shutdown: Shutdown::new(),
        })
    }

    /// Build the Axum router with all modules and middleware layers.
    #[allow(deprecated)]
    pub async fn build_router(config: &LabConfig) -> Result<Router, StartupError> {
        let sqli = crate::sqli::router(&config.sqli).await?;

        let router = Router::new()
            .route("/", get(response::index))
            .route("/health", get(response::health))
            .nest("/cmdi", crate::cmdi::router(&config.cmdi))
            .nest("/idor", crate::idor::router(&config.idor))
            .nest("/upload", crate::upload::router(&config.upload))
            .nest("/lfi", crate::lfi::router(&config.lfi)?)
            .nest("/sqli", sqli)
            .nest("/ssrf", crate::ssrf::router(&config.ssrf)?)
            .nest("/xss", crate::xss::router(&config.xss)?)
            .nest("/xxe", crate::xxe::router(&config.xxe))
            .fallback(response::not_found);

        Ok(router
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = request.request_id().unwrap_or("-"),
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)))
    }

    /// Handle used to stop the server.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// the shutdown handle fires.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.timeouts.request_secs,
            max_body_size = self.config.security.max_body_size,
            "HTTP server starting"
        );

        // Subscribe before serving so an early trigger is not lost.
        let mut stop = self.shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &LabConfig {
        &self.config
    }
}

/// Bind the configured listener address.
pub async fn bind(config: &LabConfig) -> Result<TcpListener, StartupError> {
    TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })
}
