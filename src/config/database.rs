use super::parse_env;
use sea_orm::ConnectOptions;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
}

impl DatabaseConfig {
    /// Reads `DATABASE_URL`, or assembles one from the discrete `DB_*` variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let url = match env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => url_from_parts()?,
        };

        Ok(Self {
            url,
            max_connections: parse_env("DB_MAX_CONNECTIONS", 10),
            min_connections: parse_env("DB_MIN_CONNECTIONS", 1),
            idle_timeout: Duration::from_secs(parse_env("DB_IDLE_TIMEOUT_SECS", 20)),
            connect_timeout: Duration::from_secs(parse_env("DB_CONNECT_TIMEOUT_SECS", 5)),
        })
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            idle_timeout: Duration::from_secs(20),
            connect_timeout: Duration::from_secs(5),
        }
    }

    pub fn connect_options(&self) -> ConnectOptions {
        let mut opt = ConnectOptions::new(self.url.clone());
        opt.max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(self.connect_timeout)
            .idle_timeout(self.idle_timeout)
            .sqlx_logging(true);
        opt
    }
}

fn url_from_parts() -> anyhow::Result<String> {
    let host = env::var("DB_HOST").map_err(|_| {
        anyhow::anyhow!("DATABASE_URL or DB_HOST environment variable must be set")
    })?;
    let port: u16 = parse_env("DB_PORT", 5432);
    let name = env::var("DB_NAME").unwrap_or_else(|_| "postgres".to_string());
    let user = env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string());
    let password = env::var("DB_PASSWORD").unwrap_or_default();
    let sslmode = env::var("DB_SSLMODE").unwrap_or_else(|_| "prefer".to_string());

    Ok(build_url(&host, port, &name, &user, &password, &sslmode))
}

fn build_url(host: &str, port: u16, name: &str, user: &str, password: &str, sslmode: &str) -> String {
    let credentials = if password.is_empty() {
        user.to_string()
    } else {
        format!("{}:{}", user, password)
    };
    format!(
        "postgres://{}@{}:{}/{}?sslmode={}",
        credentials, host, port, name, sslmode
    )
}
