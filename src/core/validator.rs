use crate::config::Limits;
use crate::domain::model::{AuxiliaryFile, CompilationRequest, FileKind, RawCompileRequest};
use crate::utils::error::{GatewayError, Result};
use serde_json::Value;

/// Shape and size checks on an inbound request, run before anything expensive.
#[derive(Debug, Clone, Copy)]
pub struct InputValidator {
    limits: Limits,
}

impl InputValidator {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn validate(&self, raw: &RawCompileRequest) -> Result<CompilationRequest> {
        let source = self.validate_source(raw.latex_code.as_ref())?;
        let files = self.validate_files(raw.project_files.as_ref())?;

        Ok(CompilationRequest { source, files })
    }

    fn validate_source(&self, value: Option<&Value>) -> Result<String> {
        let source = match value {
            None | Some(Value::Null) => {
                return Err(GatewayError::invalid_input("latexCode is required"))
            }
            Some(Value::String(source)) => source,
            Some(_) => return Err(GatewayError::invalid_input("latexCode must be a string")),
        };

        if source.is_empty() {
            return Err(GatewayError::invalid_input("latexCode cannot be empty"));
        }

        if source.len() > self.limits.max_source_bytes {
            return Err(GatewayError::payload_too_large(format!(
                "latexCode exceeds the maximum size of {} bytes",
                self.limits.max_source_bytes
            )));
        }

        Ok(source.clone())
    }

    fn validate_files(&self, value: Option<&Value>) -> Result<Vec<AuxiliaryFile>> {
        let items = match value {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(GatewayError::invalid_input("projectFiles must be an array")),
        };

        if items.len() > self.limits.max_files {
            return Err(GatewayError::invalid_input(format!(
                "Too many project files: {} (maximum {})",
                items.len(),
                self.limits.max_files
            )));
        }

        let files = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let file = normalize_file(item);
                if file.is_none() {
                    tracing::debug!(index, "Dropping malformed project file");
                }
                file
            })
            .collect();

        Ok(files)
    }
}

/// 缺少 name / content / kind 的檔案直接略過，不視為錯誤
fn normalize_file(item: &Value) -> Option<AuxiliaryFile> {
    let object = item.as_object()?;

    let name = object.get("name")?.as_str()?;
    let content = object.get("content")?.as_str()?;
    let kind = object
        .get("kind")
        .or_else(|| object.get("type"))?
        .as_str()
        .and_then(FileKind::parse)?;

    if name.is_empty() || content.is_empty() {
        return None;
    }

    Some(AuxiliaryFile {
        name: name.to_string(),
        content: content.to_string(),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> InputValidator {
        InputValidator::new(Limits::default())
    }

    fn raw(latex_code: Value, project_files: Option<Value>) -> RawCompileRequest {
        RawCompileRequest {
            latex_code: Some(latex_code),
            project_files,
        }
    }

    #[test]
    fn test_missing_source_is_invalid_input() {
        let err = validator().validate(&RawCompileRequest::default()).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput { .. }));

        let err = validator().validate(&raw(Value::Null, None)).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput { .. }));
    }

    #[test]
    fn test_non_string_or_empty_source_is_invalid_input() {
        for value in [json!(42), json!(["\\documentclass"]), json!({"a": 1}), json!("")] {
            let err = validator().validate(&raw(value, None)).unwrap_err();
            assert!(matches!(err, GatewayError::InvalidInput { .. }));
        }
    }

    #[test]
    fn test_oversized_source_is_payload_too_large() {
        let limits = Limits {
            max_source_bytes: 16,
            ..Limits::default()
        };
        let validator = InputValidator::new(limits);

        assert!(validator.validate(&raw(json!("x".repeat(16)), None)).is_ok());
        let err = validator
            .validate(&raw(json!("x".repeat(17)), None))
            .unwrap_err();
        assert!(matches!(err, GatewayError::PayloadTooLarge { .. }));
    }

    #[test]
    fn test_project_files_must_be_an_array() {
        let err = validator()
            .validate(&raw(json!("\\relax"), Some(json!({"name": "a.tex"}))))
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput { .. }));

        let request = validator()
            .validate(&raw(json!("\\relax"), Some(Value::Null)))
            .unwrap();
        assert!(request.files.is_empty());
    }

    #[test]
    fn test_too_many_project_files() {
        let files: Vec<Value> = (0..51)
            .map(|i| json!({"name": format!("f{}.tex", i), "content": "x", "kind": "text"}))
            .collect();

        let err = validator()
            .validate(&raw(json!("\\relax"), Some(Value::Array(files[..51].to_vec()))))
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput { .. }));

        let request = validator()
            .validate(&raw(json!("\\relax"), Some(Value::Array(files[..50].to_vec()))))
            .unwrap();
        assert_eq!(request.files.len(), 50);
    }

    #[test]
    fn test_malformed_files_are_dropped_in_order() {
        let files = json!([
            {"name": "chapter1.tex", "content": "Hello", "kind": "text"},
            {"name": "missing-content.tex", "kind": "text"},
            "not an object",
            {"name": "logo.png", "content": "iVBORw0KGgo=", "type": "image"},
            {"name": "weird.bin", "content": "AAAA", "kind": "video"},
            {"name": "", "content": "x", "kind": "text"},
            {"name": "refs.bib", "content": "@book{}", "kind": "text"}
        ]);

        let request = validator()
            .validate(&raw(json!("\\relax"), Some(files)))
            .unwrap();

        let names: Vec<&str> = request.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["chapter1.tex", "logo.png", "refs.bib"]);
        assert_eq!(request.files[1].kind, FileKind::Image);
    }
}
