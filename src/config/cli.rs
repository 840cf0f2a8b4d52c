use crate::config::toml_config::{GatewayConfig, OperatingMode};
use crate::utils::error::{GatewayError, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "latex-gateway")]
#[command(about = "Forwards LaTeX compilation requests to a remote compilation service")]
pub struct CliArgs {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host address to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Operating mode: development or production
    #[arg(long)]
    pub mode: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// 載入設定：預設值 → 設定檔 → 環境變數 → 命令列參數
    pub fn load_config(&self) -> Result<GatewayConfig> {
        let mut config = match &self.config {
            Some(path) => GatewayConfig::from_file(path)?,
            None => GatewayConfig::default(),
        };

        config.apply_env_overrides()?;

        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(mode) = &self.mode {
            config.mode =
                OperatingMode::parse(mode).ok_or_else(|| GatewayError::InvalidConfigValueError {
                    field: "--mode".to_string(),
                    value: mode.clone(),
                    reason: "Expected 'development' or 'production'".to_string(),
                })?;
        }

        Ok(config)
    }
}
