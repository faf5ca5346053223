//! Reference document preloaded into memory.

use crate::error::LlmError;
use avatalk_types::Part;
use base64::Engine;
use std::path::Path;

/// A document attached as an inline part to every completion request.
///
/// Read and encoded once at startup; shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    part: Part,
    size_bytes: usize,
}

impl KnowledgeBase {
    /// Reads `path` and encodes it as an inline part of type `mime_type`.
    pub async fn load(path: impl AsRef<Path>, mime_type: &str) -> Result<Self, LlmError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| LlmError::Knowledge(format!("failed to read {:?}: {}", path, e)))?;
        let knowledge = Self::from_bytes(&bytes, mime_type)?;
        tracing::info!(
            path = %path.display(),
            bytes = knowledge.size_bytes,
            "knowledge document loaded into memory"
        );
        Ok(knowledge)
    }

    pub fn from_bytes(bytes: &[u8], mime_type: &str) -> Result<Self, LlmError> {
        if bytes.is_empty() {
            return Err(LlmError::Knowledge("document is empty".to_string()));
        }
        let data = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(Self {
            part: Part::inline(mime_type, data),
            size_bytes: bytes.len(),
        })
    }

    pub fn part(&self) -> &Part {
        &self.part
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}
