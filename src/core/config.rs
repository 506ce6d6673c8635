use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Local content directory for uploaded review images
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub root_dir: String,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Read an env var and parse it, falling back to `default` when unset
fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number", key)),
        Err(_) => Ok(default),
    }
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // A missing .env is fine; any other load failure is worth a warning
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: could not load .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        // CORS origins arrive as a comma-separated list
        let cors_allowed_origins = env_string("CORS_ALLOWED_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: env_string("HOST", "127.0.0.1"),
            port: env_parse("PORT", 3000)?,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    // Conservative pool defaults for a single-node deployment
    const DEFAULT_URL: &'static str = "sqlite:yorum.db";
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800;

    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            url: env_string("DATABASE_URL", Self::DEFAULT_URL),
            max_connections: env_parse("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: env_parse("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: env_parse(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: env_parse("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: env_parse("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

impl StorageConfig {
    const DEFAULT_ROOT_DIR: &'static str = "uploads";

    pub fn from_env() -> Result<Self, String> {
        let root_dir = env_string("STORAGE_ROOT", Self::DEFAULT_ROOT_DIR);
        if root_dir.trim().is_empty() {
            return Err("STORAGE_ROOT must not be empty".to_string());
        }

        Ok(Self { root_dir })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            title: env_string("SWAGGER_TITLE", "Yorum API"),
            version: env_string("SWAGGER_VERSION", "0.1.0"),
            description: env_string(
                "SWAGGER_DESCRIPTION",
                "Facility review, moderation and attachment storage API",
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_prefers_default_when_unset() {
        assert_eq!(
            env_parse("YORUM_TEST_UNSET_NUMERIC_KEY", 42u32),
            Ok(42u32)
        );
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        std::env::set_var("YORUM_TEST_GARBAGE_NUMERIC_KEY", "not-a-number");
        let result: Result<u16, String> = env_parse("YORUM_TEST_GARBAGE_NUMERIC_KEY", 1);
        assert!(result.is_err());
        std::env::remove_var("YORUM_TEST_GARBAGE_NUMERIC_KEY");
    }
}
