//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the snapshot echo handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Apply snapshot setting updates from the config watcher
//! - Stop gracefully on the shutdown signal

use std::time::Duration;

use axum::{
    extract::FromRef,
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::http::extract::{Snapshot, SnapshotSettings};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::snapshot::RequestSnapshot;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: SnapshotSettings,
}

impl FromRef<AppState> for SnapshotSettings {
    fn from_ref(state: &AppState) -> Self {
        state.settings.clone()
    }
}

/// Diagnostic server answering every request with its snapshot as JSON.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    settings: SnapshotSettings,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        let settings = SnapshotSettings::new(config.snapshot.clone());
        let state = AppState {
            settings: settings.clone(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            settings,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .fallback(snapshot_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// The router, for serving it elsewhere or driving it in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Snapshot settings in use; storing into them affects new requests.
    pub fn settings(&self) -> &SnapshotSettings {
        &self.settings
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            application_path = %self.config.snapshot.application_path,
            "HTTP server starting"
        );

        let settings = self.settings.clone();
        let current = self.config.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                if new_config.listener != current.listener || new_config.timeouts != current.timeouts {
                    tracing::warn!("Listener and timeout changes take effect after a restart");
                }
                tracing::info!(
                    application_path = %new_config.snapshot.application_path,
                    trust_forwarded_headers = new_config.snapshot.trust_forwarded_headers,
                    "Snapshot settings reloaded"
                );
                settings.store(new_config.snapshot);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn snapshot_handler(Snapshot(snapshot): Snapshot) -> Json<RequestSnapshot> {
    Json(snapshot)
}
