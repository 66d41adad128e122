use std::path::Path;

use async_trait::async_trait;

use crate::error::IngestError;
use crate::models::Document;

pub mod audio;
pub mod docx;
pub mod pdf;
pub mod text;

pub use audio::{AudioExtractor, AudioTranscriber, TranscriberConfig};
pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;
pub use text::TextExtractor;

/// One file format's text extraction. `handles` is a pure path check so
/// dispatch can pick an extractor without touching the filesystem.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    fn handles(&self, path: &Path) -> bool;

    async fn extract(&self, path: &Path) -> Result<String, IngestError>;
}

/// The configured extractors, in dispatch order. Audio is only present when a
/// transcription endpoint was configured.
pub struct ExtractorSet {
    extractors: Vec<Box<dyn DocumentExtractor>>,
}

impl ExtractorSet {
    pub fn with_defaults(transcriber: Option<AudioTranscriber>) -> Self {
        let mut extractors: Vec<Box<dyn DocumentExtractor>> = vec![
            Box::new(TextExtractor),
            Box::new(PdfExtractor),
            Box::new(DocxExtractor),
        ];
        if let Some(transcriber) = transcriber {
            extractors.push(Box::new(AudioExtractor::new(transcriber)));
        }
        Self { extractors }
    }

    /// Extracts one file into a `Document`. Legacy `.doc` and unknown formats
    /// are `Unsupported`; audio without a configured transcriber is
    /// `TranscriberUnavailable`; readable files with no text are `NoContent`.
    pub async fn extract_document(&self, path: &Path) -> Result<Document, IngestError> {
        let filename = file_name(path)?;
        for extractor in &self.extractors {
            if extractor.handles(path) {
                let text = extractor.extract(path).await?;
                if text.trim().is_empty() {
                    return Err(IngestError::NoContent(filename));
                }
                return Document::new(filename, text);
            }
        }
        if audio::is_audio_file(path) {
            return Err(IngestError::TranscriberUnavailable);
        }
        Err(IngestError::Unsupported(filename))
    }
}

pub(crate) fn file_name(path: &Path) -> Result<String, IngestError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
        .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))
}

pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            extensions.iter().any(|candidate| *candidate == ext)
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn defaults() -> ExtractorSet {
        ExtractorSet::with_defaults(None)
    }

    #[tokio::test]
    async fn plain_text_file_becomes_a_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Torah study is the foundation of daily practice.")
            .expect("write fixture");

        let document = defaults().extract_document(&path).await.expect("extracted");

        assert_eq!(document.filename(), "notes.txt");
        assert!(document.content().contains("foundation"));
    }

    #[tokio::test]
    async fn blank_text_file_is_no_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "   \n\t  ").expect("write fixture");

        let error = defaults().extract_document(&path).await.unwrap_err();
        assert!(matches!(error, IngestError::NoContent(name) if name == "empty.txt"));
    }

    #[tokio::test]
    async fn legacy_doc_is_unsupported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("old.doc");
        std::fs::write(&path, b"\xd0\xcf\x11\xe0").expect("write fixture");

        let error = defaults().extract_document(&path).await.unwrap_err();
        assert!(matches!(error, IngestError::Unsupported(name) if name == "old.doc"));
    }

    #[tokio::test]
    async fn audio_without_transcriber_is_reported_as_such() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("note.wav");
        std::fs::write(&path, b"RIFF").expect("write fixture");

        let error = defaults().extract_document(&path).await.unwrap_err();
        assert!(matches!(error, IngestError::TranscriberUnavailable));
    }

    #[tokio::test]
    async fn corrupt_pdf_surfaces_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, "not a pdf at all").expect("write fixture");

        let error = defaults().extract_document(&path).await.unwrap_err();
        assert!(matches!(error, IngestError::PdfParse(_)));
    }

    #[tokio::test]
    async fn docx_paragraphs_are_extracted_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sermon.docx");
        let file = std::fs::File::create(&path).expect("create fixture");
        let mut archive = zip::ZipWriter::new(file);
        archive
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .expect("start entry");
        archive
            .write_all(
                br#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">Second </w:t></w:r><w:r><w:t>half.</w:t></w:r></w:p>
  </w:body>
</w:document>"#,
            )
            .expect("write entry");
        archive.finish().expect("finish archive");

        let document = defaults().extract_document(&path).await.expect("extracted");
        assert_eq!(document.content(), "First paragraph.\nSecond half.");
    }

    #[test]
    fn extension_matching_is_case_insensitive() {
        assert!(has_extension(Path::new("A.PDF"), &["pdf"]));
        assert!(has_extension(Path::new("b.Txt"), &["txt"]));
        assert!(!has_extension(Path::new("c.md"), &["pdf", "txt"]));
        assert!(!has_extension(Path::new("noext"), &["txt"]));
    }
}
