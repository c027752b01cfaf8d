//! # projctl: project records with atomic file ingestion
//!
//! `projctl` is an HTTP backend for project records. A project carries descriptive fields,
//! "looking for" tags, a list of team members, and two kinds of attachments: pitch decks (PDF)
//! and images (JPEG, PNG, SVG).
//!
//! ## Overview
//!
//! The interesting part is project creation. One request carries the project fields plus any
//! number of attachments. The attachments are validated and written to local storage
//! concurrently (with a configurable upper bound), then the project row and the attachment
//! names are inserted in a single database transaction. Whatever fails, the request either
//! produces a committed project whose attachments are all on disk, or an error with no
//! attachments left behind. Cleanup that itself fails is reported alongside the original error,
//! never swallowed.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum); persistence is SQLite through
//! `sqlx`, with migrations embedded in the binary and run at startup.
//!
//! - The **API layer** ([`api`]) parses requests, including the multipart creation form, and
//!   maps errors ([`errors`]) to status codes.
//! - The **ingestion pipeline** ([`ingest`]) fans uploads out over a bounded set of tasks,
//!   collects every failure, and compensates by deleting what was written.
//! - The **storage layer** ([`storage`]) names and writes attachments under `pdfs/` and
//!   `images/` below the configured root.
//! - The **database layer** ([`db`]) uses repositories over a borrowed connection, so the same
//!   code runs inside or outside a transaction.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use projctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = projctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     projctl::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod ingest;
mod openapi;
pub mod storage;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{openapi::ApiDoc, storage::FileStorage};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{self, HeaderValue},
    routing::{get, post, put},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};
use std::{str::FromStr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{ProjectId, TeamMemberId};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .storage(storage)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    /// Where attachments are written and read back from
    pub storage: Arc<dyn FileStorage>,
}

/// Get the projctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open the SQLite pool described by `config.database` and bring the schema up to date
#[instrument(skip_all)]
async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let settings = &config.database.pool;
    let options = SqliteConnectOptions::from_str(&config.database.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs));
    if settings.idle_timeout_secs > 0 {
        pool_options = pool_options.idle_timeout(Duration::from_secs(settings.idle_timeout_secs));
    }

    let pool = pool_options.connect_with(options).await?;
    migrator().run(&pool).await?;
    info!("Database ready");

    Ok(pool)
}

/// Create CORS layer from configuration. Returns `None` when no origins are configured.
fn create_cors_layer(config: &Config) -> anyhow::Result<Option<CorsLayer>> {
    let cors_config = &config.cors;
    if cors_config.allowed_origins.is_empty() {
        return Ok(None);
    }

    let wildcard = cors_config.allowed_origins.iter().any(|origin| origin == "*");
    let allow_origin = if wildcard {
        AllowOrigin::any()
    } else {
        let origins = cors_config
            .allowed_origins
            .iter()
            .map(|origin| origin.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    // Browsers reject credentials on wildcard responses
    if wildcard && cors_config.allow_credentials {
        anyhow::bail!("cors.allow_credentials cannot be combined with a \"*\" origin");
    }

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PUT])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(cors_config.allow_credentials)
        .expose_headers(vec![http::header::CONTENT_DISPOSITION]);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(Some(cors))
}

/// Build the application router with all endpoints and middleware.
///
/// - `/healthz` liveness probe
/// - `/api/v1/*` project, file and team member routes
/// - `/api-docs/openapi.json` and the Scalar UI at `/docs`
/// - `/internal/metrics` when metrics are enabled
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let create_limit = state.config.uploads.max_request_size;
    let create_router = Router::new().route(
        "/projects",
        post(api::handlers::projects::create_project).layer(DefaultBodyLimit::max(create_limit)),
    );

    let api_routes = Router::new()
        .merge(create_router)
        .route("/projects", get(api::handlers::projects::list_projects))
        .route("/projects/{id}", get(api::handlers::projects::get_project))
        .route("/projects/file/{filename}", get(api::handlers::files::retrieve_file))
        .route(
            "/projects/{project_id}/team-members",
            get(api::handlers::team_members::list_team_members).post(api::handlers::team_members::add_team_member),
        )
        .route("/team-members/{member_id}/role", put(api::handlers::team_members::update_team_member_role))
        .with_state(state.clone());

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    if let Some(cors_layer) = create_cors_layer(&state.config)? {
        router = router.layer(cors_layer);
    }

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns the router, the pool and the configuration.
///
/// # Lifecycle
///
/// 1. **Initialization** (`new`): connects to SQLite, runs migrations, prepares storage, builds the router
/// 2. **Serving** (`serve`): runs the HTTP server until the shutdown future resolves
/// 3. **Shutdown**: closes the pool and flushes telemetry
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application, reusing `pool` instead of connecting when one is given
    pub async fn new_with_pool(config: Config, pool: Option<SqlitePool>) -> anyhow::Result<Self> {
        debug!("Starting projctl with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => pool,
            None => setup_database(&config).await?,
        };

        let storage = storage::create_file_storage(&config.storage).await?;

        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).storage(storage).build();
        let router = build_router(&app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("projctl listening on http://{}, docs at http://localhost:{}/docs", bind_addr, self.config.port);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
