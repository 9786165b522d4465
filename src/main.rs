use aurovest_backend::api::{self, AppState};
use aurovest_backend::config::AppConfig;
use aurovest_backend::database;
use aurovest_backend::health::{HealthChecker, HealthState, HealthStatus};
use aurovest_backend::logging::init_tracing;
use aurovest_backend::middleware::logging::{request_logging_middleware, UuidRequestId};
use aurovest_backend::payments::factory::PaymentGatewayFactory;
use axum::{extract::State, routing::get, Json, Router};
use dotenv::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::{error, info};

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenv().ok();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        "Starting Aurovest backend service"
    );

    let config = AppConfig::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        anyhow::anyhow!(e.to_string())
    })?;

    info!("Initializing database connection pool...");
    let pool = database::init_pool_from_config(&config.database)
        .await
        .map_err(|e| {
            error!("Failed to initialize database pool: {}", e);
            anyhow::anyhow!(e.to_string())
        })?;
    info!("Database connection pool initialized");

    let gateways = Arc::new(PaymentGatewayFactory::from_env().map_err(|e| {
        error!("Failed to initialize payment gateways: {}", e);
        anyhow::anyhow!(e.to_string())
    })?);

    let health_checker = HealthChecker::new(pool.clone());

    let state = AppState {
        pool,
        gateways,
        frontend_url: config.frontend_url.clone(),
    };

    info!("Setting up application routes...");
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health).with_state(health_checker.clone()))
        .route(
            "/health/ready",
            get(health).with_state(health_checker.clone()),
        )
        .route("/health/live", get(liveness))
        .nest("/api/v1", api::router(state))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(axum::middleware::from_fn(request_logging_middleware))
                .layer(PropagateRequestIdLayer::x_request_id()),
        );
    info!("Routes configured");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to address {}: {}", addr, e);
        e
    })?;

    info!(address = %addr, "Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn root() -> &'static str {
    "Welcome to Aurovest Backend API"
}

async fn health(
    State(checker): State<HealthChecker>,
) -> Result<Json<HealthStatus>, (axum::http::StatusCode, String)> {
    let status = checker.check_health().await;
    if status.status == HealthState::Unhealthy {
        error!("Health check failed - service unhealthy");
        return Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "Service Unavailable".to_string(),
        ));
    }
    Ok(Json(status))
}

/// Liveness probe - checks if the service is alive (basic check)
async fn liveness() -> &'static str {
    "OK"
}
