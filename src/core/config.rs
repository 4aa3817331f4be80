use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

pub const DEFAULT_USER_AGENT: &str = "software@example.com";

#[derive(Clone, Debug)]
pub struct Config {
    pub user_agent: String,
    pub export_dir: PathBuf,
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let user_agent = std::env::var("EDGAR_USER_AGENT")
            .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

        let export_dir = PathBuf::from(
            std::env::var("EXPORT_DIR").unwrap_or_else(|_| "exports".to_string()),
        );

        let data_dir = PathBuf::from(
            std::env::var("EDGAR_DATA_DIR").unwrap_or_else(|_| "edgar_data".to_string()),
        );

        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| anyhow!("Invalid BIND_ADDR: {}", e))?;

        Ok(Self {
            user_agent,
            export_dir,
            data_dir,
            bind_addr,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            export_dir: PathBuf::from("exports"),
            data_dir: PathBuf::from("edgar_data"),
            bind_addr: ([127, 0, 0, 1], 8080).into(),
        }
    }
}
