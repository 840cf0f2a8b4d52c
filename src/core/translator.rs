use crate::config::{DiagnosticsConfig, OperatingMode};
use crate::core::diagnostics::truncate_chars;
use crate::domain::model::{CompilationFailure, CompilationOutcome, DiagnosticRecord, FailureKind};
use crate::utils::error::{GatewayError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Wire envelope returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<DiagnosticRecord>>,
}

impl CompileResponse {
    pub fn failure(message: impl Into<String>, errors: Vec<DiagnosticRecord>) -> Self {
        Self {
            success: false,
            pdf: None,
            error: Some(message.into()),
            errors: Some(errors),
        }
    }

    /// Caller-side decode of the `pdf` field.
    pub fn decode_pdf(&self) -> Result<Vec<u8>> {
        let encoded = self
            .pdf
            .as_deref()
            .ok_or_else(|| GatewayError::invalid_input("Response carries no pdf"))?;

        STANDARD
            .decode(encoded)
            .map_err(|e| GatewayError::invalid_input(format!("Invalid pdf encoding: {}", e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedResponse {
    pub status: u16,
    pub body: CompileResponse,
}

#[derive(Debug, Clone, Copy)]
pub struct ResponseTranslator {
    mode: OperatingMode,
    max_error_chars: usize,
    max_records: usize,
}

impl ResponseTranslator {
    pub fn new(mode: OperatingMode, config: DiagnosticsConfig) -> Self {
        Self {
            mode,
            max_error_chars: config.max_error_chars,
            max_records: config.max_records,
        }
    }

    pub fn translate(&self, outcome: CompilationOutcome) -> TranslatedResponse {
        match outcome {
            CompilationOutcome::Success(pdf) => TranslatedResponse {
                status: 200,
                body: CompileResponse {
                    success: true,
                    pdf: Some(STANDARD.encode(pdf)),
                    error: None,
                    errors: None,
                },
            },
            CompilationOutcome::Failure(failure) => self.translate_failure(failure),
        }
    }

    /// Used at the HTTP boundary for faults that never produced an outcome (panics,
    /// unreadable bodies).
    pub fn internal_fault(&self, detail: &str) -> TranslatedResponse {
        self.translate_failure(CompilationFailure {
            kind: FailureKind::Internal,
            message: detail.to_string(),
            diagnostics: Vec::new(),
            status: None,
        })
    }

    fn translate_failure(&self, failure: CompilationFailure) -> TranslatedResponse {
        let status = match failure.kind {
            FailureKind::InvalidInput | FailureKind::PayloadTooLarge => 400,
            FailureKind::Upstream => failure.status.unwrap_or(500),
            FailureKind::Timeout
            | FailureKind::Unreachable
            | FailureKind::Transport
            | FailureKind::Internal => 500,
        };

        let message = if failure.kind == FailureKind::Internal && self.mode.is_production() {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            truncate_chars(&failure.message, self.max_error_chars)
        };

        let mut errors = failure.diagnostics;
        errors.truncate(self.max_records);

        TranslatedResponse {
            status,
            body: CompileResponse::failure(message, errors),
        }
    }
}

impl From<GatewayError> for CompilationFailure {
    fn from(err: GatewayError) -> Self {
        let kind = match &err {
            GatewayError::InvalidInput { .. } => FailureKind::InvalidInput,
            GatewayError::PayloadTooLarge { .. } => FailureKind::PayloadTooLarge,
            GatewayError::UpstreamFailure { .. } => FailureKind::Upstream,
            GatewayError::UpstreamTimeout => FailureKind::Timeout,
            GatewayError::UpstreamUnreachable => FailureKind::Unreachable,
            GatewayError::Transport(_) | GatewayError::ResponseTooLarge { .. } => {
                FailureKind::Transport
            }
            GatewayError::ZipError(_)
            | GatewayError::IoError(_)
            | GatewayError::ConfigError { .. }
            | GatewayError::InvalidConfigValueError { .. }
            | GatewayError::InternalFault { .. } => FailureKind::Internal,
        };

        // 內部錯誤保留完整訊息，是否揭露交給 ResponseTranslator 依模式決定
        let message = match kind {
            FailureKind::Internal => err.to_string(),
            _ => err.user_friendly_message(),
        };
        let status = match &err {
            GatewayError::UpstreamFailure { status, .. } => Some(*status),
            _ => None,
        };

        Self {
            kind,
            message,
            diagnostics: Vec::new(),
            status,
        }
    }
}
