use std::env;
use std::net::SocketAddr;

#[derive(Clone)]
pub struct Config {
    // Token signing
    pub jwt_secret: String,
    pub token_ttl_secs: u64,

    // Admin credential fallback (used when the store has no value)
    pub admin_username: String,
    pub admin_password: String,

    // Redis
    pub redis_url: String,

    // Server
    pub bind_addr: SocketAddr,
    pub cors_allowed_origins: Vec<String>,

    // Limits
    pub max_body_bytes: usize,
    pub attendance_page_size: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("bind_addr", &self.bind_addr)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("attendance_page_size", &self.attendance_page_size)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

/// Fallback admin username when `ADMIN_USER` is unset.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
/// Fallback admin password when `ADMIN_PASS` is unset.
pub const DEFAULT_ADMIN_PASSWORD: &str = "123456";

/// Hard ceiling for `ATTENDANCE_PAGE_SIZE`.
const MAX_ATTENDANCE_PAGE_SIZE: usize = 10_000;

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        // (env vars may be set directly in production)
        let _ = dotenvy::dotenv();

        // Signing secret - required, no default
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingVar("JWT_SECRET".to_string()))?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET".to_string(),
                "cannot be empty".to_string(),
            ));
        }

        let token_ttl_secs: u64 = parse_env_or_default("TOKEN_TTL_SECS", 7_200)?;
        if token_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "TOKEN_TTL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let admin_username = env::var("ADMIN_USER")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string());
        let admin_password = env::var("ADMIN_PASS")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string());

        // Redis - required, no default
        let redis_url =
            env::var("REDIS_URL").map_err(|_| ConfigError::MissingVar("REDIS_URL".to_string()))?;

        // Server: BIND_ADDR wins, otherwise all interfaces on PORT
        let bind_addr_str = match env::var("BIND_ADDR") {
            Ok(addr) => addr,
            Err(_) => {
                let port: u16 = parse_env_or_default("PORT", 3000)?;
                format!("0.0.0.0:{}", port)
            }
        };
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;

        let cors_allowed_origins: Vec<String> = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Limits
        let max_body_bytes = parse_env_or_default("MAX_BODY_BYTES", 16_384)?;
        let attendance_page_size: usize = parse_env_or_default("ATTENDANCE_PAGE_SIZE", 2_000)?;
        if attendance_page_size == 0 || attendance_page_size > MAX_ATTENDANCE_PAGE_SIZE {
            return Err(ConfigError::InvalidValue(
                "ATTENDANCE_PAGE_SIZE".to_string(),
                format!("must be between 1 and {}", MAX_ATTENDANCE_PAGE_SIZE),
            ));
        }

        Ok(Config {
            jwt_secret,
            token_ttl_secs,
            admin_username,
            admin_password,
            redis_url,
            bind_addr,
            cors_allowed_origins,
            max_body_bytes,
            attendance_page_size,
        })
    }

    /// Names of the admin fallback variables that were left at their defaults.
    pub fn defaulted_admin_vars(&self) -> Vec<&'static str> {
        let mut defaulted = Vec::new();
        if self.admin_username == DEFAULT_ADMIN_USERNAME {
            defaulted.push("ADMIN_USER");
        }
        if self.admin_password == DEFAULT_ADMIN_PASSWORD {
            defaulted.push("ADMIN_PASS");
        }
        defaulted
    }
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}
