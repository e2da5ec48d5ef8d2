//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the OData and health handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Serve on a listener until shutdown is signalled

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::books::BookService;
use crate::config::ServiceConfig;
use crate::http::handlers;
use crate::http::request::request_id;
use crate::lifecycle::shutdown;
use crate::odata::QueryLimits;

/// Per-service OData settings resolved from configuration.
#[derive(Debug, Clone)]
pub struct ODataSettings {
    /// Path of the service root, e.g. `/odata/`.
    pub service_root: String,
    /// Limits of `GET /Books`.
    pub list_limits: QueryLimits,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: BookService,
    pub settings: Arc<ODataSettings>,
}

/// HTTP server for the book service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    pub fn new(config: ServiceConfig, service: BookService) -> Self {
        let state = AppState {
            service,
            settings: Arc::new(ODataSettings {
                service_root: config.odata.service_root(),
                list_limits: config.odata.list_limits(),
            }),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Runtime order, outermost first: SetRequestId → PropagateRequestId →
    /// Trace → Timeout → BodyLimit → handlers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let root = config.odata.service_root();
        let mut router = Router::new().route("/health", get(handlers::health));

        router = if root == "/" {
            router
                .route("/", any(handlers::odata_root))
                .route("/{*path}", any(handlers::odata_resource))
        } else {
            router
                .route(root.trim_end_matches('/'), any(handlers::odata_root))
                .route(&root, any(handlers::odata_root))
                .route(&format!("{root}{{*path}}"), any(handlers::odata_resource))
        };

        router
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        path = %req.uri().path(),
                        request_id = %request_id(req.headers()),
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, e.g. for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown_rx` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service_root = %self.config.odata.service_root(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
