use axum::{extract::State, Json};
use serde::Serialize;
use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub redis: String,
    pub resolver_cache_entries: usize,
}

fn redis_status<E: std::fmt::Display>(ping: Result<String, E>) -> String {
    match ping {
        Ok(_) => "connected".to_string(),
        Err(err) => {
            tracing::warn!("Redis health check failed: {}", err);
            "disconnected".to_string()
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut conn = state.redis.clone();
    let ping: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        redis: redis_status(ping),
        resolver_cache_entries: state.resolver.cache().len().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redis_status_maps_ping_result() {
        assert_eq!(redis_status::<String>(Ok("PONG".to_string())), "connected");
        assert_eq!(redis_status(Err("connection refused")), "disconnected");
    }
}
