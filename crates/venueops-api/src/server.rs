//! Router assembly and the serve loop.

use std::sync::Arc;

use axum::middleware;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use venueops_core::db;
use venueops_core::materializer::TaskMaterializer;
use venueops_core::repository::SqliteRepository;

use crate::auth::{require_auth, JwtVerifier};
use crate::config::Config;
use crate::routes;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub materializer: TaskMaterializer<SqliteRepository>,
    pub verifier: Arc<JwtVerifier>,
}

impl AppState {
    pub fn new(repository: SqliteRepository, config: &Config) -> anyhow::Result<Self> {
        let verifier = JwtVerifier::new(&config.jwt)?;
        Ok(Self {
            materializer: TaskMaterializer::new(Arc::new(repository), config.materialization()),
            verifier: Arc::new(verifier),
        })
    }

    pub fn repository(&self) -> &SqliteRepository {
        self.materializer.repository()
    }
}

/// Builds the application router; task routes sit behind [`require_auth`].
pub fn router(state: AppState) -> Router {
    let protected = routes::authenticated_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    routes::public_routes()
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Opens the database, runs migrations and serves until ctrl-c.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let pool = db::establish_connection(&config.database_url).await?;
    let state = AppState::new(SqliteRepository::new(pool), &config)?;

    let listener = TcpListener::bind(config.bind_addr.as_str()).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
