use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    Memory,
}

/// Accepted report years: `min_year ..= current year + years_ahead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReportConfig {
    pub min_year: i32,
    pub years_ahead: i32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            min_year: 2000,
            years_ahead: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    pub reports: ReportConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_or = |key: &str, default: i64| -> anyhow::Result<i64> {
            match var(key) {
                Some(v) => v
                    .trim()
                    .parse::<i64>()
                    .with_context(|| format!("{} must be an integer", key)),
                None => Ok(default),
            }
        };
        let parse_u32 = |key: &str, default: u32| -> anyhow::Result<u32> {
            u32::try_from(parse_or(key, default.into())?)
                .with_context(|| format!("{} must be a non-negative 32-bit integer", key))
        };
        let parse_i32 = |key: &str, default: i32| -> anyhow::Result<i32> {
            i32::try_from(parse_or(key, default.into())?)
                .with_context(|| format!("{} is out of range", key))
        };

        let backend = var("STORAGE_BACKEND").unwrap_or_else(|| "postgres".into());
        let storage = match backend.trim().to_lowercase().as_str() {
            "postgres" => StorageConfig::Postgres {
                database_url: var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: parse_u32("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            "memory" => StorageConfig::Memory,
            other => anyhow::bail!("unknown STORAGE_BACKEND: {}", other),
        };

        let jwt = JwtConfig {
            secret: var("JWT_SECRET").context("JWT_SECRET is required")?,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "coffee-tracker".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "coffee-tracker-users".into()),
            ttl_minutes: parse_or("JWT_TTL_MINUTES", 60)?,
            refresh_ttl_minutes: parse_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14)?,
        };

        let defaults = ReportConfig::default();
        let reports = ReportConfig {
            min_year: parse_i32("REPORT_MIN_YEAR", defaults.min_year)?,
            years_ahead: parse_i32("REPORT_YEARS_AHEAD", defaults.years_ahead)?,
        };

        Ok(Self {
            storage,
            jwt,
            reports,
        })
    }
}
