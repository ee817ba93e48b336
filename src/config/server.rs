use serde::Deserialize;

use super::env_parse;
use crate::core::Result;

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env_parse("SERVER_HOST", "127.0.0.1".to_string())?,
            port: env_parse("SERVER_PORT", 8080)?,
            workers: env_parse("SERVER_WORKERS", available_cores())?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
}
