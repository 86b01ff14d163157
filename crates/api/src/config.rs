use std::time::Duration;

/// Server configuration loaded from environment variables.
///
/// All fields except the session secret have defaults suitable for local
/// development. `DATABASE_URL` is read separately by the binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Deadline for a single store call in seconds (default: `3`).
    pub store_timeout_secs: u64,
    /// Session cookie configuration.
    pub session: SessionConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default   |
    /// |------------------------|-----------|
    /// | `HOST`                 | `0.0.0.0` |
    /// | `PORT`                 | `8080`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`      |
    /// | `STORE_TIMEOUT_SECS`   | `3`       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("PORT must be a valid u16");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let store_timeout_secs: u64 = std::env::var("STORE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("STORE_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            request_timeout_secs,
            store_timeout_secs,
            session: SessionConfig::from_env(),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

/// Configuration for the signed session cookie.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// HMAC-SHA256 secret used to sign and verify session tokens.
    pub secret: String,
    /// Session lifetime in hours (default: 24).
    pub lifetime_hours: i64,
    /// Mark the cookie `Secure` (default: false).
    pub secure_cookie: bool,
}

/// Default session lifetime in hours.
const DEFAULT_SESSION_LIFETIME_HOURS: i64 = 24;

impl SessionConfig {
    /// Load session configuration from environment variables.
    ///
    /// | Env Var                  | Required | Default |
    /// |--------------------------|----------|---------|
    /// | `SESSION_SECRET`         | **yes**  | --      |
    /// | `SESSION_LIFETIME_HOURS` | no       | `24`    |
    /// | `IN_PRODUCTION`          | no       | `false` |
    ///
    /// # Panics
    ///
    /// Panics if `SESSION_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret = std::env::var("SESSION_SECRET")
            .expect("SESSION_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "SESSION_SECRET must not be empty");

        let lifetime_hours: i64 = std::env::var("SESSION_LIFETIME_HOURS")
            .unwrap_or_else(|_| DEFAULT_SESSION_LIFETIME_HOURS.to_string())
            .parse()
            .expect("SESSION_LIFETIME_HOURS must be a valid i64");

        let secure_cookie: bool = std::env::var("IN_PRODUCTION")
            .unwrap_or_else(|_| "false".into())
            .parse()
            .expect("IN_PRODUCTION must be true or false");

        Self {
            secret,
            lifetime_hours,
            secure_cookie,
        }
    }

    /// Session lifetime in seconds, used for both `exp` and `Max-Age`.
    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_hours * 60 * 60
    }
}
