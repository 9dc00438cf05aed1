use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

const DEFAULT_JWT_SECRET: &str = "fallback_secret_do_not_use_in_production";
const JWT_EXPIRATION_DAYS_RANGE: RangeInclusive<i64> = 1..=365;

/// Runtime configuration, read once from the environment at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// The single origin allowed to make cross-origin calls
    pub frontend_url: String,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_expiration_days: i64,
    /// Built SPA assets; served for non-API paths when present
    pub static_dir: PathBuf,
    pub password_hash_iterations: u32,
    pub password_hash_memory_kib: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            frontend_url: "http://localhost:8080".to_string(),
            database_path: PathBuf::from("./data/users.db"),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expiration_days: 7,
            static_dir: PathBuf::from("./dist"),
            password_hash_iterations: 2,
            password_hash_memory_kib: 19_456,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, falling back to
    /// defaults for anything missing or unparsable
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let jwt_secret = lookup("JWT_SECRET").filter(|s| !s.is_empty());
        if jwt_secret.is_none() {
            warn!("JWT_SECRET is not set, using the insecure development fallback");
        }

        Self {
            port: parse_or(&lookup, "PORT", defaults.port),
            frontend_url: lookup("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            database_path: lookup("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            jwt_secret: jwt_secret.unwrap_or(defaults.jwt_secret),
            jwt_expiration_days: parse_in_range(
                &lookup,
                "JWT_EXPIRATION_DAYS",
                defaults.jwt_expiration_days,
                JWT_EXPIRATION_DAYS_RANGE,
            ),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            password_hash_iterations: parse_or(
                &lookup,
                "PASSWORD_HASH_ITERATIONS",
                defaults.password_hash_iterations,
            ),
            password_hash_memory_kib: parse_or(
                &lookup,
                "PASSWORD_HASH_MEMORY_KIB",
                defaults.password_hash_memory_kib,
            ),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, default = %default, "Invalid config value, using default");
            default
        }),
        None => default,
    }
}

/// Like `parse_or`, but values outside `range` also fall back to the default
fn parse_in_range<F, T>(lookup: &F, key: &str, default: T, range: RangeInclusive<T>) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + PartialOrd + std::fmt::Display,
{
    let value = parse_or(lookup, key, default);
    if range.contains(&value) {
        value
    } else {
        warn!(
            key,
            value = %value,
            min = %range.start(),
            max = %range.end(),
            default = %default,
            "Config value out of range, using default"
        );
        default
    }
}
