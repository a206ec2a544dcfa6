//! Homework Results Server - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use homework_results_lib::api;
use homework_results_lib::config::{Config, StoreKind};
use homework_results_lib::middleware::RequestLogger;
use homework_results_lib::services::{
    GitHubOidcVerifier, IngestionService, MemoryResultStore, QueryService, RedisResultStore,
    ResultStore, TokenVerifier,
};

/// Perform health check (for Docker healthcheck).
async fn health_check() -> bool {
    // Simple check - just verify we can load config
    Config::from_env().is_ok()
}

/// Build the configured result store, connecting eagerly when it is Redis.
async fn build_store(config: &Config) -> Option<Arc<dyn ResultStore>> {
    match config.store.kind {
        StoreKind::Redis => {
            let store = match RedisResultStore::new(&config.store) {
                Ok(store) => store,
                Err(e) => {
                    error!("Failed to configure Redis store: {}", e);
                    return None;
                }
            };
            if let Err(e) = store.connect().await {
                error!("Failed to connect to Redis: {}", e);
                return None;
            }
            info!("Redis connection established");
            Some(Arc::new(store))
        }
        StoreKind::Memory => {
            warn!("Using in-memory result store - results are lost on restart");
            Some(Arc::new(MemoryResultStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Check for --health-check flag (used by Docker HEALTHCHECK)
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|arg| arg == "--health-check") {
        dotenvy::dotenv().ok();
        if health_check().await {
            std::process::exit(0);
        } else {
            std::process::exit(1);
        }
    }

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, REDIS_URL and HRS_OIDC_AUDIENCE must be set");
            error!("  - In production, HRS_STORE must be 'redis'");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Homework Results Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        info!("Using development defaults for REDIS_URL and HRS_OIDC_AUDIENCE");
    }

    let Some(store) = build_store(&config).await else {
        std::process::exit(1);
    };

    let verifier: Arc<dyn TokenVerifier> = match GitHubOidcVerifier::new(&config.oidc) {
        Ok(verifier) => Arc::new(verifier),
        Err(e) => {
            error!("Failed to initialize OIDC verifier: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Accepting OIDC tokens from {} for audience '{}'",
        config.oidc.issuer, config.oidc.audience
    );

    let ingestion = IngestionService::new(verifier, store.clone());
    let query = QueryService::new(store.clone());

    let bind_address = config.bind_address();
    let max_body_size = config.max_body_size;
    let is_development = config.is_development();

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    // Start HTTP server
    let server = HttpServer::new(move || {
        // Configure CORS
        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::CONTENT_TYPE,
                ])
                .max_age(3600)
        } else {
            // Same-origin only
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::CONTENT_TYPE,
                ])
                .max_age(3600)
        };

        App::new()
            // Add CORS middleware (must be before other middleware)
            .wrap(cors)
            .wrap(RequestLogger)
            .app_data(web::Data::from(store.clone()))
            .app_data(web::Data::new(ingestion.clone()))
            .app_data(web::Data::new(query.clone()))
            .app_data(api::json_config(max_body_size))
            .service(web::scope("/api/v1").configure(api::configure_routes))
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
