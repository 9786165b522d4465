//! Health check module
//! Provides health status for the application and its dependencies

use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: HealthState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub database: ComponentHealth,
    pub timestamp: String,
}

#[derive(Clone)]
pub struct HealthChecker {
    pool: PgPool,
}

impl HealthChecker {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn check_health(&self) -> HealthStatus {
        let database = match crate::database::health_check(&self.pool).await {
            Ok(()) => ComponentHealth {
                status: HealthState::Healthy,
                error: None,
            },
            Err(e) => ComponentHealth {
                status: HealthState::Unhealthy,
                error: Some(e.to_string()),
            },
        };

        HealthStatus {
            status: database.status,
            database,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
