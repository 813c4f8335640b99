use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub directory: DirectoryConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Pool size for the shared (registry/default schema) pool
    pub shared_pool_max_connections: u32,
    /// Pool size for each per-tenant schema pool. Kept intentionally small:
    /// total connections scale as pool_size x tenant_count.
    pub tenant_pool_max_connections: u32,
    /// Bound on establishing a new pooled connection, in seconds
    pub connect_timeout_secs: u64,
    /// Bound on checking a connection out of a pool, in seconds
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Read-cache TTL for tenant lookups, in seconds. 0 disables the cache.
    /// Bounds how stale a status transition can look to new requests.
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_SHARED_POOL_MAX_CONNECTIONS") {
            self.database.shared_pool_max_connections =
                v.parse().unwrap_or(self.database.shared_pool_max_connections);
        }
        if let Ok(v) = env::var("DATABASE_TENANT_POOL_MAX_CONNECTIONS") {
            self.database.tenant_pool_max_connections =
                v.parse().unwrap_or(self.database.tenant_pool_max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs =
                v.parse().unwrap_or(self.database.connect_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs =
                v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }

        // Directory overrides
        if let Ok(v) = env::var("DIRECTORY_CACHE_TTL_SECS") {
            self.directory.cache_ttl_secs = v.parse().unwrap_or(self.directory.cache_ttl_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                shared_pool_max_connections: 10,
                tenant_pool_max_connections: 2,
                connect_timeout_secs: 30,
                acquire_timeout_secs: 30,
            },
            directory: DirectoryConfig { cache_ttl_secs: 0 },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                shared_pool_max_connections: 20,
                tenant_pool_max_connections: 2,
                connect_timeout_secs: 10,
                acquire_timeout_secs: 10,
            },
            directory: DirectoryConfig { cache_ttl_secs: 15 },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                shared_pool_max_connections: 50,
                tenant_pool_max_connections: 2,
                connect_timeout_secs: 5,
                acquire_timeout_secs: 5,
            },
            directory: DirectoryConfig { cache_ttl_secs: 30 },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database.tenant_pool_max_connections, 2);
        assert_eq!(config.directory.cache_ttl_secs, 0);
        assert!(config.security.enable_cors);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.database.connect_timeout_secs, 5);
        assert_eq!(config.directory.cache_ttl_secs, 30);
        assert_eq!(config.security.jwt_expiry_hours, 4);
    }
}
