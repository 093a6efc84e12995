#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the GDELT Pulse dashboard.
//!
//! Exposes the aggregator as `GET /api/events`, plus read-only tables of
//! the supported categories and time windows for front ends. There is no
//! persistence: every events request fans out to the upstream API.

mod handlers;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use gdelt_pulse_aggregator::{Aggregator, AggregatorConfig};

/// Shared application state.
pub struct AppState {
    /// Upstream client used by every events request.
    pub aggregator: Aggregator,
}

/// Bind address, port, and upstream settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to listen on.
    pub bind_addr: String,
    /// TCP port to listen on.
    pub port: u16,
    /// Upstream base URL and request timeout.
    pub aggregator: AggregatorConfig,
}

impl ServerConfig {
    /// Reads `BIND_ADDR` (default `127.0.0.1`), `PORT` (default 8080),
    /// and the aggregator variables described on
    /// [`AggregatorConfig::from_env`].
    #[must_use]
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        Self {
            bind_addr,
            port,
            aggregator: AggregatorConfig::from_env(),
        }
    }
}

/// Registers the `/api` routes. Shared by [`run_server`] and tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::QueryConfig::default().error_handler(handlers::query_error))
            .route("/health", web::get().to(handlers::health))
            .route("/categories", web::get().to(handlers::categories))
            .route("/time-windows", web::get().to(handlers::time_windows))
            .route("/events", web::get().to(handlers::events)),
    );
}

/// Starts the API server.
///
/// The caller is responsible for logger initialization and for providing
/// the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the upstream client cannot be
/// built, or if the HTTP server fails to bind or encounters a runtime
/// error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let aggregator = Aggregator::new(&config.aggregator).map_err(std::io::Error::other)?;
    let state = web::Data::new(AppState { aggregator });

    log::info!(
        "Starting server on {}:{} (upstream {})",
        config.bind_addr,
        config.port,
        config.aggregator.base_url
    );

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}
