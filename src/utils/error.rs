use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Payload too large: {message}")]
    PayloadTooLarge { message: String },

    #[error("Compilation service returned status {status}")]
    UpstreamFailure { status: u16, log: String },

    #[error("Compilation timeout")]
    UpstreamTimeout,

    #[error("Service temporarily unavailable")]
    UpstreamUnreachable,

    #[error("Compilation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Compilation service response exceeded {limit} bytes")]
    ResponseTooLarge { limit: usize },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Internal error: {message}")]
    InternalFault { message: String },
}

/// 錯誤分類，決定回應狀態碼與對外訊息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 呼叫端輸入問題 (400)
    Client,
    /// 遠端編譯服務回報的錯誤
    Upstream,
    /// 網路層失敗：逾時、無法連線、傳輸中斷
    Network,
    /// 設定錯誤，只會在啟動時出現
    Configuration,
    /// 未預期的內部錯誤
    Internal,
}

impl GatewayError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::PayloadTooLarge {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } | Self::PayloadTooLarge { .. } => ErrorCategory::Client,
            Self::UpstreamFailure { .. } => ErrorCategory::Upstream,
            Self::UpstreamTimeout
            | Self::UpstreamUnreachable
            | Self::Transport(_)
            | Self::ResponseTooLarge { .. } => ErrorCategory::Network,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            Self::ZipError(_) | Self::IoError(_) | Self::InternalFault { .. } => {
                ErrorCategory::Internal
            }
        }
    }

    /// HTTP-equivalent status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput { .. } | Self::PayloadTooLarge { .. } => 400,
            Self::UpstreamFailure { status, .. } => *status,
            _ => 500,
        }
    }

    /// Text that is safe to show to the caller.
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidInput { message } | Self::PayloadTooLarge { message } => message.clone(),
            Self::UpstreamFailure { log, .. } if !log.trim().is_empty() => log.clone(),
            Self::UpstreamFailure { .. } => "Compilation failed".to_string(),
            Self::UpstreamTimeout => "Compilation timeout".to_string(),
            Self::UpstreamUnreachable => "Service temporarily unavailable".to_string(),
            Self::Transport(_) | Self::ResponseTooLarge { .. } => {
                "Failed to compile LaTeX document".to_string()
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => self.to_string(),
            Self::ZipError(_) | Self::IoError(_) | Self::InternalFault { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
