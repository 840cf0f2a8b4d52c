use serde::{Deserialize, Serialize};

/// Name under which the primary source is archived and compiled.
pub const ENTRY_POINT: &str = "main.tex";

/// 原始請求主體，欄位保持未型別化以便區分「缺少」與「型別錯誤」
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCompileRequest {
    #[serde(default)]
    pub latex_code: Option<serde_json::Value>,
    #[serde(default)]
    pub project_files: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Text,
    #[serde(alias = "binary")]
    Image,
}

impl FileKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "image" | "binary" => Some(Self::Image),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryFile {
    pub name: String,
    /// Raw text, or base64 when `kind` is [`FileKind::Image`].
    pub content: String,
    pub kind: FileKind,
}

/// Validated request, ready to be archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationRequest {
    pub source: String,
    pub files: Vec<AuxiliaryFile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnsafeName,
    DuplicateName,
    InvalidEncoding,
    TooLarge,
}

/// Finalized zip container. Consumed by value when sent.
#[derive(Debug, Clone)]
pub struct Archive {
    data: Vec<u8>,
    entries: Vec<String>,
    skipped: Vec<(String, SkipReason)>,
}

impl Archive {
    pub(crate) fn new(
        data: Vec<u8>,
        entries: Vec<String>,
        skipped: Vec<(String, SkipReason)>,
    ) -> Self {
        Self {
            data,
            entries,
            skipped,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Entry names in the order they were written.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn skipped(&self) -> &[(String, SkipReason)] {
        &self.skipped
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub line: u32,
    pub message: String,
    #[serde(rename = "type")]
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidInput,
    PayloadTooLarge,
    Upstream,
    Timeout,
    Unreachable,
    Transport,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationFailure {
    pub kind: FailureKind,
    pub message: String,
    pub diagnostics: Vec<DiagnosticRecord>,
    /// Status reported by the compilation service, when it answered at all.
    pub status: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilationOutcome {
    Success(Vec<u8>),
    Failure(CompilationFailure),
}

impl CompilationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}
