use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::Context;
use serde::Deserialize;

/// Upper bound for token lifetime and refresh window: one year.
pub const MAX_TOKEN_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub identity_key: String,
    pub ttl_minutes: i64,
    pub max_refresh_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
}

/// Argon2 cost parameters, fixed for the lifetime of the process.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_secs: u64,
    pub db_connect_timeout_secs: u64,
    pub static_dir: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    pub password: PasswordConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").context("DATABASE_URL not set")?;
        let jwt = JwtConfig {
            secret: get("JWT_SECRET").context("JWT_SECRET not set")?,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "todoapp".into()),
            identity_key: get("JWT_IDENTITY_KEY").unwrap_or_else(|| "email".into()),
            ttl_minutes: number(get("JWT_TTL_MINUTES"), "JWT_TTL_MINUTES", 60 * 24)?,
            max_refresh_minutes: number(
                get("JWT_MAX_REFRESH_MINUTES"),
                "JWT_MAX_REFRESH_MINUTES",
                60 * 24,
            )?,
        };
        anyhow::ensure!(
            (1..=MAX_TOKEN_MINUTES).contains(&jwt.ttl_minutes),
            "JWT_TTL_MINUTES must be between 1 and {MAX_TOKEN_MINUTES}"
        );
        anyhow::ensure!(
            (0..=MAX_TOKEN_MINUTES).contains(&jwt.max_refresh_minutes),
            "JWT_MAX_REFRESH_MINUTES must be between 0 and {MAX_TOKEN_MINUTES}"
        );

        let cookie = CookieConfig {
            name: get("COOKIE_NAME").unwrap_or_else(|| "jwt".into()),
            secure: get("APP_MODE").as_deref() == Some("release"),
        };

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: number(get("ARGON2_MEMORY_KIB"), "ARGON2_MEMORY_KIB", defaults.memory_kib)?,
            iterations: number(get("ARGON2_ITERATIONS"), "ARGON2_ITERATIONS", defaults.iterations)?,
            parallelism: number(
                get("ARGON2_PARALLELISM"),
                "ARGON2_PARALLELISM",
                defaults.parallelism,
            )?,
        };

        let db_max_connections: u32 = number(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 10)?;
        anyhow::ensure!(db_max_connections > 0, "DB_MAX_CONNECTIONS must be positive");

        Ok(Self {
            database_url,
            db_max_connections,
            db_timeout_secs: number(get("DB_TIMEOUT_SECS"), "DB_TIMEOUT_SECS", 5)?,
            db_connect_timeout_secs: number(
                get("DB_CONNECT_TIMEOUT_SECS"),
                "DB_CONNECT_TIMEOUT_SECS",
                10,
            )?,
            static_dir: get("STATIC_DIR").unwrap_or_else(|| "./static".into()),
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: number(get("APP_PORT"), "APP_PORT", 8080)?,
            jwt,
            cookie,
            password,
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn db_timeout(&self) -> Duration {
        Duration::from_secs(self.db_timeout_secs)
    }

    pub fn db_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.db_connect_timeout_secs)
    }
}

/// Parses an optional value into the target type, so out-of-range or negative
/// input is rejected instead of wrapping.
fn number<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v
            .parse::<T>()
            .with_context(|| format!("{key} must be a number in range, got {v:?}")),
        None => Ok(default),
    }
}
