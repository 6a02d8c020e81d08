use crate::database::DEFAULT_DATABASE_URL;
use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Server settings read from the environment (and `.env`, when present)
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub environment: String,
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            port: DEFAULT_PORT,
            environment: "development".to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            port: parse_var("PORT", DEFAULT_PORT)?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            default_page_size: parse_var("API_DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            max_page_size: parse_var("API_MAX_PAGE_SIZE", MAX_PAGE_SIZE)?,
        };

        if config.max_page_size < 1 {
            bail!("API_MAX_PAGE_SIZE must be positive, got {}", config.max_page_size);
        }
        if config.default_page_size < 1 || config.default_page_size > config.max_page_size {
            bail!(
                "API_DEFAULT_PAGE_SIZE must be between 1 and API_MAX_PAGE_SIZE ({}), got {}",
                config.max_page_size,
                config.default_page_size
            );
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Apply paging defaults and limits to a request.
    ///
    /// Returns `(limit, offset)`; the error is a client-facing message.
    pub fn page(&self, limit: Option<i64>, offset: Option<i64>) -> Result<(i64, i64), String> {
        let limit = limit.unwrap_or(self.default_page_size);
        let offset = offset.unwrap_or(0);
        if limit < 0 {
            return Err(format!("limit must not be negative, got {}", limit));
        }
        if offset < 0 {
            return Err(format!("offset must not be negative, got {}", offset));
        }
        Ok((limit.min(self.max_page_size), offset))
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}
