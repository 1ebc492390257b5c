use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::time::Instant;
use tracing::warn;
use utoipa::ToSchema;

use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentCheck {
    pub healthy: bool,
    pub message: String,
    pub latency_ms: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub postgresql: ComponentCheck,
    pub redis: ComponentCheck,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Process is up", body = HealthResponse))
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe: PostgreSQL and Redis must both answer
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Dependencies reachable", body = ReadinessResponse),
        (status = 503, description = "A dependency is down", body = ReadinessResponse)
    )
)]
pub async fn readiness(state: web::Data<AppState>) -> HttpResponse {
    let start = Instant::now();
    let postgresql = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => check(true, "PostgreSQL connection successful".into(), start),
        Err(e) => {
            warn!("readiness: PostgreSQL check failed: {}", e);
            check(false, format!("PostgreSQL connection failed: {}", e), start)
        }
    };

    let start = Instant::now();
    let redis = match redis_utils::ping(&state.redis, state.config.redis.command_timeout()).await {
        Ok(()) => check(true, "Redis ping successful".into(), start),
        Err(e) => {
            warn!("readiness: Redis check failed: {}", e);
            check(false, format!("Redis ping failed: {}", e), start)
        }
    };

    let body = ReadinessResponse {
        ready: postgresql.healthy && redis.healthy,
        postgresql,
        redis,
    };

    if body.ready {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

fn check(healthy: bool, message: String, start: Instant) -> ComponentCheck {
    ComponentCheck {
        healthy,
        message,
        latency_ms: start.elapsed().as_millis() as u64,
    }
}
