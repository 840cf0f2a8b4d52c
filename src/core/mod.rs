pub mod archive;
pub mod diagnostics;
pub mod service;
pub mod translator;
pub mod validator;

pub use crate::domain::model::{CompilationOutcome, DiagnosticRecord, RawCompileRequest};
pub use crate::domain::ports::Compiler;
pub use crate::utils::error::Result;
