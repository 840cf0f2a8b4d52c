use crate::config::Limits;
use crate::domain::model::{
    Archive, AuxiliaryFile, CompilationRequest, FileKind, SkipReason, ENTRY_POINT,
};
use crate::utils::error::{GatewayError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::{Component, Path};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::{CompressionMethod, DateTime};

/// Packs a validated request into an in-memory zip, entry point first.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveBuilder {
    limits: Limits,
}

impl ArchiveBuilder {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn build(&self, request: &CompilationRequest) -> Result<Archive> {
        // 固定時間戳與權限，相同請求產生相同的位元組
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut entries = Vec::with_capacity(request.files.len() + 1);
        let mut skipped = Vec::new();
        let mut seen = HashSet::new();

        zip.start_file(ENTRY_POINT, options)?;
        zip.write_all(request.source.as_bytes())?;
        seen.insert(ENTRY_POINT.to_string());
        entries.push(ENTRY_POINT.to_string());

        for file in &request.files {
            let (name, bytes) = match self.prepare_entry(file, &seen) {
                Ok(entry) => entry,
                Err(reason) => {
                    tracing::debug!(name = %file.name, ?reason, "Skipping project file");
                    skipped.push((file.name.clone(), reason));
                    continue;
                }
            };

            zip.start_file(name.as_str(), options)?;
            zip.write_all(&bytes)?;
            seen.insert(name.clone());
            entries.push(name);
        }

        let data = zip.finish()?.into_inner();

        tracing::debug!(
            entries = entries.len(),
            skipped = skipped.len(),
            bytes = data.len(),
            "Archive finalized"
        );

        if data.len() > self.limits.max_archive_bytes {
            return Err(GatewayError::payload_too_large(format!(
                "Project archive is {} bytes, exceeding the maximum of {} bytes",
                data.len(),
                self.limits.max_archive_bytes
            )));
        }

        Ok(Archive::new(data, entries, skipped))
    }

    fn prepare_entry(
        &self,
        file: &AuxiliaryFile,
        seen: &HashSet<String>,
    ) -> std::result::Result<(String, Vec<u8>), SkipReason> {
        let name = normalize_entry_name(&file.name).ok_or(SkipReason::UnsafeName)?;
        if seen.contains(&name) {
            return Err(SkipReason::DuplicateName);
        }

        let bytes = match file.kind {
            FileKind::Image => {
                let bytes = decode_binary(&file.content).ok_or(SkipReason::InvalidEncoding)?;
                if bytes.len() > self.limits.max_binary_file_bytes {
                    return Err(SkipReason::TooLarge);
                }
                bytes
            }
            FileKind::Text => {
                if file.content.len() > self.limits.max_text_file_bytes {
                    return Err(SkipReason::TooLarge);
                }
                file.content.as_bytes().to_vec()
            }
        };

        Ok((name, bytes))
    }
}

/// Canonical `/`-joined form of a relative path, so `./a.tex`, `b//c.tex` and `a.tex`
/// compare equal. `None` for `..`, root, drive prefix, backslash or NUL.
fn normalize_entry_name(name: &str) -> Option<String> {
    if name.is_empty() || name.contains('\\') || name.contains('\0') || name.ends_with('/') {
        return None;
    }

    let mut parts = Vec::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Accepts plain base64 or a `data:<mime>;base64,` URL.
fn decode_binary(content: &str) -> Option<Vec<u8>> {
    let payload = match content.strip_prefix("data:") {
        Some(rest) => rest.split_once(";base64,")?.1,
        None => content,
    };

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact).ok()
}
