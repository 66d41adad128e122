use std::path::Path;

use async_trait::async_trait;

use crate::error::IngestError;

use super::{has_extension, DocumentExtractor};

/// Parses PDFs with `lopdf`, one page at a time. Parsing is CPU-bound so it
/// runs on the blocking pool.
#[derive(Debug, Default)]
pub struct PdfExtractor;

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    fn handles(&self, path: &Path) -> bool {
        has_extension(path, &["pdf"])
    }

    async fn extract(&self, path: &Path) -> Result<String, IngestError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || read_pdf_text(&path))
            .await
            .map_err(|error| IngestError::PdfParse(error.to_string()))?
    }
}

fn read_pdf_text(path: &Path) -> Result<String, IngestError> {
    let document =
        lopdf::Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;

    let mut pages = Vec::new();
    for (page_no, _page_id) in document.get_pages() {
        let text = document
            .extract_text(&[page_no])
            .map_err(|error| IngestError::PdfParse(error.to_string()))?;
        if !text.trim().is_empty() {
            pages.push(text);
        }
    }

    Ok(pages.join("\n"))
}
