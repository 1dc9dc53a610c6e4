use anyhow::{bail, Context};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_port: u16,
    pub metrics_port: u16,
    pub database: DatabaseConfig,
    pub vision: VisionConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBackend {
    Postgrest,
    Memory,
}

impl FromStr for DataBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgrest" | "supabase" => Ok(DataBackend::Postgrest),
            "memory" => Ok(DataBackend::Memory),
            other => bail!("Unknown DATA_BACKEND: {}", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DataBackend,
    pub url: String,
    pub service_key: String,
    pub timeout_secs: u64,
    pub retry_max_elapsed_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Zero disables the background sync
    pub interval_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_port: 8000,
            metrics_port: 9090,
            database: DatabaseConfig {
                backend: DataBackend::Memory,
                url: String::new(),
                service_key: String::new(),
                timeout_secs: 15,
                retry_max_elapsed_ms: 3_000,
            },
            vision: VisionConfig {
                api_key: None,
                model: "gpt-5.2".to_string(),
                base_url: "https://api.openai.com".to_string(),
            },
            sync: SyncConfig { interval_seconds: 0 },
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend: DataBackend = env::var("DATA_BACKEND")
            .unwrap_or_else(|_| "postgrest".to_string())
            .parse()?;

        let (url, service_key) = match backend {
            DataBackend::Postgrest => (
                non_empty("SUPABASE_URL").context("SUPABASE_URL must be set")?,
                non_empty("SUPABASE_SERVICE_ROLE_KEY")
                    .context("SUPABASE_SERVICE_ROLE_KEY must be set")?,
            ),
            DataBackend::Memory => (String::new(), String::new()),
        };

        Ok(Config {
            api_port: non_empty("API_PORT")
                .or_else(|| non_empty("PORT"))
                .unwrap_or_else(|| "8000".to_string())
                .parse()
                .context("API_PORT must be a port number")?,
            metrics_port: env::var("METRICS_PORT")
                .unwrap_or_else(|_| "9090".to_string())
                .parse()?,
            database: DatabaseConfig {
                backend,
                url,
                service_key,
                timeout_secs: env::var("UPSTREAM_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()?,
                retry_max_elapsed_ms: env::var("UPSTREAM_RETRY_MAX_ELAPSED_MS")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()?,
            },
            vision: VisionConfig {
                api_key: non_empty("OPENAI_API_KEY").or_else(|| non_empty("OPEN_AI_KEY")),
                model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-5.2".to_string()),
                base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            },
            sync: SyncConfig {
                interval_seconds: env::var("SYNC_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "0".to_string())
                    .parse()?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_backend_parsing() {
        assert_eq!("memory".parse::<DataBackend>().unwrap(), DataBackend::Memory);
        assert_eq!(" Supabase ".parse::<DataBackend>().unwrap(), DataBackend::Postgrest);
        assert!("sqlite".parse::<DataBackend>().is_err());
    }

    #[test]
    fn test_default_config_is_offline() {
        let config = Config::default();
        assert_eq!(config.database.backend, DataBackend::Memory);
        assert!(config.vision.api_key.is_none());
        assert_eq!(config.sync.interval_seconds, 0);
    }
}
