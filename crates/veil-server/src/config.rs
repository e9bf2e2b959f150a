//! Configuration management

use serde::{Deserialize, Serialize};

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/veil";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default base URL of the noisy-statistics engine.
pub const DEFAULT_ENGINE_BASE_URL: &str = "http://localhost:5000";

/// Default request timeout against the engine, in seconds.
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 30;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Required length of the token-encryption key, in bytes (AES-256).
pub const ENCRYPTION_KEY_LEN: usize = 32;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub engine: EngineConfig,
    pub cors: CorsConfig,
    pub encryption: EncryptionConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// Noisy-statistics engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Token-encryption configuration
///
/// The key is supplied hex-encoded in `ENCRYPTION_SECRET_KEY` and must
/// decode to exactly 32 bytes. A bad key is a startup failure, never a
/// per-request one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionConfig {
    pub secret_key_hex: String,
}

impl EncryptionConfig {
    /// Decode the configured key, enforcing the AES-256 key length
    pub fn key_bytes(&self) -> anyhow::Result<[u8; ENCRYPTION_KEY_LEN]> {
        let decoded = hex::decode(self.secret_key_hex.trim())
            .map_err(|e| anyhow::anyhow!("ENCRYPTION_SECRET_KEY is not valid hex: {}", e))?;

        let len = decoded.len();
        decoded.try_into().map_err(|_| {
            anyhow::anyhow!(
                "ENCRYPTION_SECRET_KEY must decode to exactly {} bytes, got {}",
                ENCRYPTION_KEY_LEN,
                len
            )
        })
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: std::env::var("VEIL_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: std::env::var("VEIL_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: std::env::var("VEIL_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
                min_connections: std::env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MIN_CONNECTIONS),
                connect_timeout_secs: std::env::var("DATABASE_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS),
                idle_timeout_secs: std::env::var("DATABASE_IDLE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_IDLE_TIMEOUT_SECS),
            },
            engine: EngineConfig {
                base_url: std::env::var("ENGINE_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_ENGINE_BASE_URL.to_string()),
                timeout_secs: std::env::var("ENGINE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_ENGINE_TIMEOUT_SECS),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
                allow_credentials: std::env::var("CORS_ALLOW_CREDENTIALS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(true),
            },
            encryption: EncryptionConfig {
                secret_key_hex: std::env::var("ENCRYPTION_SECRET_KEY").map_err(|_| {
                    anyhow::anyhow!("ENCRYPTION_SECRET_KEY must be set (64 hex characters)")
                })?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        // Validate port
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        // Validate database URL
        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        // Validate connection pool settings
        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        // Validate engine settings
        if !self.engine.base_url.starts_with("http://") && !self.engine.base_url.starts_with("https://")
        {
            anyhow::bail!("Engine base URL must start with http:// or https://");
        }

        if self.engine.timeout_secs == 0 {
            anyhow::bail!("Engine timeout must be greater than 0");
        }

        // Validate CORS origins
        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        // Validate the token-encryption key; the system refuses to start
        // with anything other than a 32-byte key
        self.encryption.key_bytes()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            engine: EngineConfig {
                base_url: DEFAULT_ENGINE_BASE_URL.to_string(),
                timeout_secs: DEFAULT_ENGINE_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
            encryption: EncryptionConfig {
                secret_key_hex: "00".repeat(ENCRYPTION_KEY_LEN),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_short_key_fails_validation() {
        let mut config = valid_config();
        config.encryption.secret_key_hex = "00".repeat(16);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_hex_key_fails_validation() {
        let mut config = valid_config();
        config.encryption.secret_key_hex = "zz".repeat(ENCRYPTION_KEY_LEN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_key_bytes_round_trip() {
        let config = valid_config();
        let key = config.encryption.key_bytes().unwrap();
        assert_eq!(key, [0u8; ENCRYPTION_KEY_LEN]);
    }

    #[test]
    fn test_zero_port_fails_validation() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_engine_url_fails_validation() {
        let mut config = valid_config();
        config.engine.base_url = "localhost:5000".to_string();
        assert!(config.validate().is_err());
    }
}
