use std::path::Path;

use async_trait::async_trait;

use crate::error::IngestError;

use super::{has_extension, DocumentExtractor};

/// Plain-text files. UTF-8 first, Windows-1252 for the legacy exports that
/// are not.
#[derive(Debug, Default)]
pub struct TextExtractor;

#[async_trait]
impl DocumentExtractor for TextExtractor {
    fn handles(&self, path: &Path) -> bool {
        has_extension(path, &["txt"])
    }

    async fn extract(&self, path: &Path) -> Result<String, IngestError> {
        let bytes = tokio::fs::read(path).await?;
        Ok(decode_text(&bytes))
    }
}

fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}
