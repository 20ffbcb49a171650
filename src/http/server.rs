//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router; every path and method goes to the gateway
//! - Wire up middleware (request ID, tracing)
//! - Swap in a freshly built gateway when the config changes
//! - Serve until shutdown, draining in-flight requests

use std::net::SocketAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::comments::KvStore;
use crate::config::{EnvMap, GatewayConfig};
use crate::http::request::X_REQUEST_ID;
use crate::proxy::{BuildError, Gateway, HttpUpstream};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ArcSwap<Gateway>>,
}

/// Everything that survives a config reload.
struct GatewayFactory {
    env: EnvMap,
    store: Arc<dyn KvStore>,
}

impl GatewayFactory {
    fn build(&self, config: &GatewayConfig) -> Result<Gateway, BuildError> {
        let upstream = HttpUpstream::new(&config.timeouts, &config.forwarding)?;
        Gateway::new(config, &self.env, Arc::new(upstream), self.store.clone())
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
    factory: GatewayFactory,
}

impl HttpServer {
    pub fn new(config: &GatewayConfig, env: EnvMap, store: Arc<dyn KvStore>) -> Result<Self, BuildError> {
        let factory = GatewayFactory { env, store };
        let state = AppState {
            gateway: Arc::new(ArcSwap::from_pointee(factory.build(config)?)),
        };

        Ok(Self {
            router: Self::build_router(state.clone()),
            state,
            factory,
        })
    }

    /// Shared handle to the live gateway.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    fn build_router(state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id());

        Router::new()
            .fallback(gateway_handler)
            .with_state(state)
            .layer(middleware)
    }

    /// Serve on `listener` until `shutdown` fires. Configs arriving on
    /// `config_updates` replace the gateway for subsequent requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let gateway = self.state.gateway.clone();
        let factory = self.factory;
        let mut reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(config) => match factory.build(&config) {
                            Ok(next) => {
                                gateway.store(Arc::new(next));
                                tracing::info!("Configuration reloaded");
                            }
                            Err(e) => tracing::error!(
                                error = %e,
                                "Failed to apply reloaded configuration. Keeping current gateway."
                            ),
                        },
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let gateway = state.gateway.load_full();
    gateway.handle(request, peer).await
}
