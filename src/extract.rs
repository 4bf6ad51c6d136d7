//! Text extraction: the external collaborator boundary.
//!
//! The engine only ever sees UTF-8 text; everything about file formats
//! lives behind [`TextExtractor`]. The bundled implementation handles
//! plain-text formats and rejects everything else — richer extractors
//! (PDF, DOCX) plug in through the same trait.

use crate::error::{EngineError, Result};

/// Turns an uploaded file into indexable text.
pub trait TextExtractor: Send + Sync {
    /// Extract UTF-8 text from file bytes. Unsupported formats, undecodable
    /// bytes, and empty documents fail with `EngineError::Extraction`.
    fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<String>;
}

/// Extractor for plain-text files (.txt, .md, .text).
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        if !matches!(extension.as_str(), "txt" | "md" | "text") {
            return Err(EngineError::Extraction {
                reason: format!(
                    "unsupported file type {file_name:?}; allowed: .txt, .md, .text"
                ),
            });
        }

        let text = std::str::from_utf8(bytes).map_err(|_| EngineError::Extraction {
            reason: format!("{file_name:?} is not valid UTF-8"),
        })?;

        if text.trim().is_empty() {
            return Err(EngineError::Extraction {
                reason: format!("{file_name:?} contains no text"),
            });
        }

        Ok(text.to_string())
    }
}

/// Derive a document name from an uploaded file name: the final path
/// segment with its extension stripped.
pub fn document_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => base.to_string(),
    }
}
