use crate::utils::error::{GatewayError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_not_above, validate_positive_number, validate_range,
    validate_url, Validate,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const MIB: usize = 1024 * 1024;

static ENV_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    Development,
    #[default]
    Production,
}

impl OperatingMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub mode: OperatingMode,
    pub server: ServerConfig,
    pub remote: RemoteConfig,
    pub limits: Limits,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 空陣列代表允許任何來源
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub engine: String,
    pub timeout_seconds: Option<u64>,
    pub user_agent: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://latexonline.cc/data".to_string(),
            engine: "pdflatex".to_string(),
            timeout_seconds: None,
            user_agent: format!("latex-gateway/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl RemoteConfig {
    /// 未指定時，開發模式 60 秒、正式環境 90 秒
    pub fn timeout(&self, mode: OperatingMode) -> Duration {
        let seconds = self.timeout_seconds.unwrap_or(match mode {
            OperatingMode::Development => 60,
            OperatingMode::Production => 90,
        });
        Duration::from_secs(seconds)
    }
}

/// Resource ceilings enforced before and around the remote call. All sizes in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_source_bytes: usize,
    pub max_files: usize,
    pub max_text_file_bytes: usize,
    pub max_binary_file_bytes: usize,
    pub max_archive_bytes: usize,
    pub max_request_body_bytes: usize,
    pub max_response_body_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_source_bytes: MIB,
            max_files: 50,
            max_text_file_bytes: MIB,
            max_binary_file_bytes: 10 * MIB,
            max_archive_bytes: 50 * MIB,
            max_request_body_bytes: 100 * MIB,
            max_response_body_bytes: 100 * MIB,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub max_records: usize,
    pub max_message_chars: usize,
    pub max_error_chars: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            max_records: 20,
            max_message_chars: 200,
            max_error_chars: 1000,
        }
    }
}

impl GatewayConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| GatewayError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${COMPILER_ENDPOINT})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_PLACEHOLDER
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 以環境變數覆寫設定
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(mode) = std::env::var("GATEWAY_MODE") {
            self.mode =
                OperatingMode::parse(&mode).ok_or_else(|| GatewayError::InvalidConfigValueError {
                    field: "GATEWAY_MODE".to_string(),
                    value: mode.clone(),
                    reason: "Expected 'development' or 'production'".to_string(),
                })?;
        }
        if let Ok(endpoint) = std::env::var("COMPILER_ENDPOINT") {
            self.remote.endpoint = endpoint;
        }
        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| GatewayError::InvalidConfigValueError {
                    field: "PORT".to_string(),
                    value: port.clone(),
                    reason: "Expected a port number".to_string(),
                })?;
        }
        Ok(())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_url("remote.endpoint", &self.remote.endpoint)?;
        validate_non_empty_string("remote.engine", &self.remote.engine)?;
        validate_non_empty_string("remote.user_agent", &self.remote.user_agent)?;
        if let Some(timeout) = self.remote.timeout_seconds {
            validate_range("remote.timeout_seconds", timeout, 1, 600)?;
        }

        let limits = &self.limits;
        validate_positive_number("limits.max_source_bytes", limits.max_source_bytes, 1)?;
        validate_positive_number("limits.max_text_file_bytes", limits.max_text_file_bytes, 1)?;
        validate_positive_number(
            "limits.max_binary_file_bytes",
            limits.max_binary_file_bytes,
            1,
        )?;
        validate_positive_number("limits.max_archive_bytes", limits.max_archive_bytes, 1)?;
        validate_not_above(
            "limits.max_archive_bytes",
            limits.max_archive_bytes,
            "limits.max_request_body_bytes",
            limits.max_request_body_bytes,
        )?;
        validate_positive_number(
            "limits.max_response_body_bytes",
            limits.max_response_body_bytes,
            1,
        )?;

        validate_positive_number("diagnostics.max_records", self.diagnostics.max_records, 1)?;
        validate_positive_number(
            "diagnostics.max_message_chars",
            self.diagnostics.max_message_chars,
            1,
        )?;
        validate_positive_number(
            "diagnostics.max_error_chars",
            self.diagnostics.max_error_chars,
            1,
        )?;

        Ok(())
    }

    /// 取得遠端請求逾時
    pub fn request_timeout(&self) -> Duration {
        self.remote.timeout(self.mode)
    }
}

impl Validate for GatewayConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
