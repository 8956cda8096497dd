mod config;
mod core;
mod models;
mod routes;
mod services;

use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use config::Settings;
use core::{CandidateSelector, MatchPolicy};
use models::ScoringWeights;
use routes::matches::AppState;
use services::{
    spawn_expiry_sweeper, CacheManager, DirectoryClient, DirectoryCollections, EventPublisher,
    PostgresStore,
};
use std::sync::Arc;
use tracing::{error, info};

/// JSON error response for payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .content_type("application/json")
            .body(serde_json::to_string(self).unwrap())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(
    err: error::JsonPayloadError,
    req: &actix_web::HttpRequest,
) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(
    err: error::QueryPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let subscriber = tracing_subscriber::fmt().with_target(false).with_level(true);
    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting Nestmate Algo matching service...");

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    info!("Configuration loaded successfully");

    // Initialize the directory client
    let directory = Arc::new(DirectoryClient::new(
        settings.directory.base_url,
        settings.directory.api_key,
        DirectoryCollections {
            profiles: settings.directory.profiles_collection,
            properties: settings.directory.properties_collection,
        },
    ));

    info!("Directory client initialized");

    // Initialize cache manager
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

    let cache = match CacheManager::new(&settings.cache.redis_url, l1_cache_size, cache_ttl).await {
        Ok(c) => {
            info!(
                "Cache manager initialized (L1: {} entries, TTL: {}s)",
                l1_cache_size, cache_ttl
            );
            Arc::new(c)
        }
        Err(e) => {
            error!("Failed to connect to Redis ({})", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "Redis connection required",
            ));
        }
    };

    // Initialize PostgreSQL store
    let db_max_conn = settings.database.max_connections.unwrap_or(10);
    let store = Arc::new(
        PostgresStore::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
        )
        .await
        .unwrap_or_else(|e| {
            error!("Failed to connect to PostgreSQL: {}", e);
            panic!("PostgreSQL connection error: {}", e);
        }),
    );

    info!("PostgreSQL store initialized (max: {} connections)", db_max_conn);

    // Initialize the event publisher
    let events = Arc::new(EventPublisher::new(settings.events.webhook_url.clone()));
    if settings.events.webhook_url.is_some() {
        info!("Event publisher initialized");
    } else {
        info!("Event publishing disabled (no webhook configured)");
    }

    // Scoring weights and lifecycle policy are deployment constants
    let weights = ScoringWeights {
        location: settings.scoring.weights.location,
        budget: settings.scoring.weights.budget,
        lifestyle: settings.scoring.weights.lifestyle,
        preferences: settings.scoring.weights.preferences,
        schedule: settings.scoring.weights.schedule,
        cleanliness: settings.scoring.weights.cleanliness,
        social: settings.scoring.weights.social,
    };

    let policy = MatchPolicy {
        offer_window_days: settings.matching.offer_window_days,
        extend_max_days: settings.matching.extend_max_days,
        sweep_batch: settings.matching.sweep_batch,
    };

    let selector = CandidateSelector::new(weights);

    info!("Selector initialized with weights: {:?}", weights);

    // Background expiry sweep
    spawn_expiry_sweeper(
        store.clone(),
        events.clone(),
        policy,
        settings.matching.sweep_interval_secs,
    );

    info!(
        "Expiry sweeper scheduled every {}s (offer window: {} days)",
        settings.matching.sweep_interval_secs, settings.matching.offer_window_days
    );

    // Build application state
    let app_state = AppState {
        directory,
        cache,
        store,
        events,
        selector,
        weights,
        policy,
        pool_multiplier: settings.matching.pool_multiplier,
        max_limit: settings.matching.max_limit,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
