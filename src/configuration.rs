use std::env;
use std::str::FromStr;
use std::time::Duration;
use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub sqlx_logging: bool,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    /// Delay applied before every facade call to mimic a remote backend.
    pub simulated_latency: Duration,
    pub seed_demo_data: bool,
}

impl Settings {
    /// Reads settings from the process environment. Call `dotenv()` first to
    /// pick up a local `.env` file.
    pub fn from_env() -> Result<Self> {
        let url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        // an in-memory SQLite database exists per connection
        let default_max = if url.starts_with("sqlite::memory:") { 1 } else { 10 };

        Ok(Self {
            database: DatabaseSettings {
                url,
                max_connections: read_var("DATABASE_MAX_CONNECTIONS", default_max)?,
                min_connections: read_var("DATABASE_MIN_CONNECTIONS", 1)?,
                connect_timeout: Duration::from_secs(read_var("DATABASE_CONNECT_TIMEOUT_SECS", 8)?),
                sqlx_logging: read_var("DATABASE_SQLX_LOGGING", false)?,
            },
            simulated_latency: Duration::from_millis(read_var("APP_SIMULATED_LATENCY_MS", 0)?),
            seed_demo_data: read_var("APP_SEED_DEMO_DATA", true)?,
        })
    }
}

fn read_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variable_uses_default() {
        let value: u64 = read_var("DEFECT_TRACKER_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
