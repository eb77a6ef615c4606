use std::{fmt, str::FromStr, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            other => anyhow::bail!("unknown APP_ENV {other:?} (development|staging|production)"),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        })
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub max_idle: Duration,
    /// Upper bound for every single store call.
    pub query_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: Environment,
    pub db: DbConfig,
    /// Origins allowed by CORS; empty means any origin.
    pub cors_trusted_origins: Vec<String>,
}

const MIN_QUERY_TIMEOUT_SECS: u64 = 1;
const MAX_QUERY_TIMEOUT_SECS: u64 = 5;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(default)
        };

        let url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let db = DbConfig {
            url,
            max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(25),
            max_idle: Duration::from_secs(parsed("DB_MAX_IDLE_SECS", 15 * 60)),
            query_timeout: Duration::from_secs(
                parsed("DB_QUERY_TIMEOUT_SECS", 3)
                    .clamp(MIN_QUERY_TIMEOUT_SECS, MAX_QUERY_TIMEOUT_SECS),
            ),
        };

        let env = match lookup("APP_ENV") {
            Some(v) => v.parse()?,
            None => Environment::Development,
        };

        Ok(Self {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: lookup("APP_PORT")
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(4000),
            env,
            db,
            cors_trusted_origins: lookup("CORS_TRUSTED_ORIGINS")
                .map(|v| v.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")]))
            .expect("config");
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.env, Environment::Development);
        assert_eq!(cfg.db.max_connections, 25);
        assert_eq!(cfg.db.query_timeout, Duration::from_secs(3));
        assert_eq!(cfg.bind_addr(), "0.0.0.0:4000");
        assert!(cfg.cors_trusted_origins.is_empty());
    }

    #[test]
    fn trusted_origins_are_space_separated() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            (
                "CORS_TRUSTED_ORIGINS",
                "https://a.example  https://b.example\thttp://localhost:9000",
            ),
        ]))
        .expect("config");
        assert_eq!(
            cfg.cors_trusted_origins,
            vec!["https://a.example", "https://b.example", "http://localhost:9000"]
        );
    }

    #[test]
    fn oversized_pool_size_falls_back_instead_of_truncating() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("DB_MAX_CONNECTIONS", "4294967306"),
        ]))
        .expect("config");
        assert_eq!(cfg.db.max_connections, 25);

        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("DB_MAX_CONNECTIONS", "40"),
        ]))
        .expect("config");
        assert_eq!(cfg.db.max_connections, 40);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn query_timeout_is_clamped() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("DB_QUERY_TIMEOUT_SECS", "60"),
        ]))
        .expect("config");
        assert_eq!(cfg.db.query_timeout, Duration::from_secs(5));

        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("DB_QUERY_TIMEOUT_SECS", "0"),
        ]))
        .expect("config");
        assert_eq!(cfg.db.query_timeout, Duration::from_secs(1));
    }

    #[test]
    fn garbage_numbers_fall_back_and_unknown_env_fails() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("APP_PORT", "not-a-port"),
            ("APP_ENV", "production"),
        ]))
        .expect("config");
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.env, Environment::Production);

        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("APP_ENV", "qa"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("qa"));
    }
}
