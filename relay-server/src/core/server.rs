//! HTTP server and background task startup

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::config::Config;
use super::state::ServerState;
use crate::orders::{CleanupScheduler, SyncReducer};
use crate::store::SortDirection;
use crate::utils::time::parse_timezone;

/// The terminal gateway server
pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    /// Run until ctrl-c or an explicit shutdown
    pub async fn run(self) -> anyhow::Result<()> {
        // Cache lifecycle: precache the shell, prune stale deploys, start
        // intercepting immediately.
        self.state.cache.install().await;
        self.state.cache.activate().await;

        self.start_background_tasks().await?;

        let app = router(self.state.clone());
        let listener = tokio::net::TcpListener::bind(&self.config.listen_addr).await?;
        tracing::info!("listening on {}", self.config.listen_addr);

        let shutdown = self.state.shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.cancelled() => {}
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("ctrl-c received, shutting down");
                    }
                }
            })
            .await?;

        // Stop the reducer and the cleanup scheduler with the server.
        self.state.shutdown.cancel();
        Ok(())
    }

    /// Spawn the sync reducer and the cleanup scheduler
    async fn start_background_tasks(&self) -> anyhow::Result<()> {
        let store = self.state.store.clone();

        // Cold entry point: identity before the subscription is set up.
        store.ensure_identity().await?;
        let subscription = store.subscribe(SortDirection::Desc).await?;

        let reducer = SyncReducer::new(self.state.board.clone(), self.state.events.clone());
        tokio::spawn(reducer.run(subscription, self.state.shutdown.clone()));

        let tz = parse_timezone(&self.config.timezone);
        let scheduler = CleanupScheduler::new(
            store,
            self.config.clear_hour,
            tz,
            self.state.shutdown.clone(),
        );
        tokio::spawn(scheduler.run());

        Ok(())
    }
}

/// Build the router: API routes first, everything else through the gateway
fn router(state: ServerState) -> Router {
    Router::new()
        .merge(crate::api::health::router())
        .merge(crate::api::orders::router())
        .merge(crate::api::cache::router())
        .fallback(crate::cache::gateway::handle)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
