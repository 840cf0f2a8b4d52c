use crate::config::GatewayConfig;
use crate::core::archive::ArchiveBuilder;
use crate::core::diagnostics::DiagnosticsParser;
use crate::core::translator::{ResponseTranslator, TranslatedResponse};
use crate::core::validator::InputValidator;
use crate::domain::model::{CompilationFailure, CompilationOutcome, RawCompileRequest};
use crate::domain::ports::Compiler;
use crate::utils::error::GatewayError;
use std::time::Instant;

/// Runs one request through validate → archive → compile → (parse) → translate.
pub struct CompileService<C: Compiler> {
    compiler: C,
    validator: InputValidator,
    archive_builder: ArchiveBuilder,
    parser: DiagnosticsParser,
    translator: ResponseTranslator,
}

impl<C: Compiler> CompileService<C> {
    pub fn new(compiler: C, config: &GatewayConfig) -> Self {
        Self {
            compiler,
            validator: InputValidator::new(config.limits),
            archive_builder: ArchiveBuilder::new(config.limits),
            parser: DiagnosticsParser::new(config.diagnostics),
            translator: ResponseTranslator::new(config.mode, config.diagnostics),
        }
    }

    pub fn translator(&self) -> &ResponseTranslator {
        &self.translator
    }

    pub async fn compile(&self, raw: RawCompileRequest) -> CompilationOutcome {
        let started = Instant::now();

        let request = match self.validator.validate(&raw) {
            Ok(request) => request,
            Err(e) => {
                tracing::info!("Rejected compile request: {}", e);
                return self.failure(e);
            }
        };

        tracing::debug!(
            source_bytes = request.source.len(),
            files = request.files.len(),
            "Request validated"
        );

        let archive = match self.archive_builder.build(&request) {
            Ok(archive) => archive,
            Err(e) => {
                tracing::info!("Failed to build project archive: {}", e);
                return self.failure(e);
            }
        };

        if !archive.skipped().is_empty() {
            tracing::info!(
                skipped = archive.skipped().len(),
                "Some project files were left out of the archive"
            );
        }

        match self.compiler.compile(archive).await {
            Ok(pdf) => {
                tracing::info!(
                    pdf_bytes = pdf.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Compilation succeeded"
                );
                CompilationOutcome::Success(pdf)
            }
            Err(GatewayError::UpstreamFailure { status, log }) => {
                let diagnostics = self.parser.parse(&log);
                tracing::warn!(
                    status,
                    diagnostics = diagnostics.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Compilation service reported failure"
                );
                let mut failure =
                    CompilationFailure::from(GatewayError::UpstreamFailure { status, log });
                failure.diagnostics = diagnostics;
                CompilationOutcome::Failure(failure)
            }
            Err(e) => {
                tracing::error!(
                    category = ?e.category(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Compilation request failed: {}",
                    e
                );
                self.failure(e)
            }
        }
    }

    pub async fn handle(&self, raw: RawCompileRequest) -> TranslatedResponse {
        let outcome = self.compile(raw).await;
        self.translator.translate(outcome)
    }

    fn failure(&self, err: GatewayError) -> CompilationOutcome {
        CompilationOutcome::Failure(CompilationFailure::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Archive, FailureKind, Severity};
    use crate::utils::error::Result;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Records every archive it receives and replies with a canned result.
    #[derive(Clone)]
    struct StubCompiler {
        received: Arc<Mutex<Vec<Vec<String>>>>,
        reply: Arc<dyn Fn() -> Result<Vec<u8>> + Send + Sync>,
    }

    impl StubCompiler {
        fn new(reply: impl Fn() -> Result<Vec<u8>> + Send + Sync + 'static) -> Self {
            Self {
                received: Arc::new(Mutex::new(Vec::new())),
                reply: Arc::new(reply),
            }
        }

        async fn calls(&self) -> Vec<Vec<String>> {
            self.received.lock().await.clone()
        }
    }

    #[async_trait]
    impl Compiler for StubCompiler {
        async fn compile(&self, archive: Archive) -> Result<Vec<u8>> {
            self.received.lock().await.push(archive.entries().to_vec());
            (self.reply)()
        }
    }

    fn raw(value: serde_json::Value) -> RawCompileRequest {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_successful_compile() {
        let stub = StubCompiler::new(|| Ok(b"%PDF-1.5".to_vec()));
        let service = CompileService::new(stub.clone(), &GatewayConfig::default());

        let outcome = service
            .compile(raw(json!({
                "latexCode": "\\documentclass{article}\\begin{document}Hi\\end{document}",
                "projectFiles": [
                    {"name": "intro.tex", "content": "Intro", "kind": "text"},
                    {"name": "bad.png", "content": "%%%", "kind": "image"}
                ]
            })))
            .await;

        assert_eq!(outcome, CompilationOutcome::Success(b"%PDF-1.5".to_vec()));
        assert_eq!(stub.calls().await, vec![vec!["main.tex", "intro.tex"]]);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_compiler() {
        let stub = StubCompiler::new(|| Ok(Vec::new()));
        let service = CompileService::new(stub.clone(), &GatewayConfig::default());

        let response = service.handle(raw(json!({"latexCode": ""}))).await;

        assert_eq!(response.status, 400);
        assert!(!response.body.success);
        assert!(stub.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_source_never_reaches_compiler() {
        let stub = StubCompiler::new(|| Ok(Vec::new()));
        let service = CompileService::new(stub.clone(), &GatewayConfig::default());

        let outcome = service
            .compile(raw(json!({"latexCode": "x".repeat(1024 * 1024 + 1)})))
            .await;

        match outcome {
            CompilationOutcome::Failure(failure) => {
                assert_eq!(failure.kind, FailureKind::PayloadTooLarge)
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(stub.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_upstream_log_is_parsed_into_diagnostics() {
        let stub = StubCompiler::new(|| {
            Err(GatewayError::UpstreamFailure {
                status: 400,
                log: "! Undefined control sequence.\nl.5 \\foo\nLaTeX Warning: Reference undefined"
                    .to_string(),
            })
        });
        let service = CompileService::new(stub, &GatewayConfig::default());

        let response = service.handle(raw(json!({"latexCode": "\\foo"}))).await;

        assert_eq!(response.status, 400);
        let errors = response.body.errors.unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, 0);
        assert_eq!(errors[0].message, "Undefined control sequence.");
        assert_eq!(errors[1].severity, Severity::Warning);
        assert!(response
            .body
            .error
            .unwrap()
            .starts_with("! Undefined control sequence."));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_timeout_envelope() {
        let stub = StubCompiler::new(|| Err(GatewayError::UpstreamTimeout));
        let service = CompileService::new(stub, &GatewayConfig::default());

        let response = service.handle(raw(json!({"latexCode": "\\relax"}))).await;

        assert_eq!(response.status, 500);
        assert_eq!(response.body.error.as_deref(), Some("Compilation timeout"));
        assert_eq!(response.body.errors, Some(vec![]));
    }

    #[tokio::test]
    async fn test_unreachable_maps_to_unavailable_message() {
        let stub = StubCompiler::new(|| Err(GatewayError::UpstreamUnreachable));
        let service = CompileService::new(stub, &GatewayConfig::default());

        let response = service.handle(raw(json!({"latexCode": "\\relax"}))).await;

        assert_eq!(
            response.body.error.as_deref(),
            Some("Service temporarily unavailable")
        );
    }
}
