use serde::Deserialize;
use std::env;

// Top-level configuration container, built once at startup and never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub resilience: ResilienceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Object storage for event images.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

// Read-path retry and circuit-breaker settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ResilienceConfig {
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub read_timeout_ms: u64,
    pub breaker_failure_ratio: f64,
    pub breaker_min_calls: u32,
    pub breaker_cooldown_seconds: u64,
    pub breaker_window_seconds: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "event_catalog=debug,tower_http=debug".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                pool_size: env::var("DB_POOL_SIZE")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .expect("DB_POOL_SIZE must be a valid number"),
            },
            storage: StorageConfig {
                bucket: env::var("STORAGE_BUCKET")
                    .unwrap_or_else(|_| "event-catalog-images".to_string()),
                region: env::var("STORAGE_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                endpoint: env::var("STORAGE_ENDPOINT").ok(),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            },
            resilience: ResilienceConfig {
                retry_max_attempts: env::var("RETRY_MAX_ATTEMPTS")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .expect("RETRY_MAX_ATTEMPTS must be a valid number"),
                retry_base_delay_ms: env::var("RETRY_BASE_DELAY_MS")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()
                    .expect("RETRY_BASE_DELAY_MS must be a valid number"),
                read_timeout_ms: env::var("READ_TIMEOUT_MS")
                    .unwrap_or_else(|_| "2000".to_string())
                    .parse()
                    .expect("READ_TIMEOUT_MS must be a valid number"),
                breaker_failure_ratio: env::var("CIRCUIT_BREAKER_FAILURE_RATIO")
                    .unwrap_or_else(|_| "0.5".to_string())
                    .parse()
                    .expect("CIRCUIT_BREAKER_FAILURE_RATIO must be a valid number"),
                breaker_min_calls: env::var("CIRCUIT_BREAKER_MIN_CALLS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .expect("CIRCUIT_BREAKER_MIN_CALLS must be a valid number"),
                breaker_cooldown_seconds: env::var("CIRCUIT_BREAKER_COOLDOWN_SECONDS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .expect("CIRCUIT_BREAKER_COOLDOWN_SECONDS must be a valid number"),
                breaker_window_seconds: env::var("CIRCUIT_BREAKER_WINDOW_SECONDS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .expect("CIRCUIT_BREAKER_WINDOW_SECONDS must be a valid number"),
            },
        }
    }
}
