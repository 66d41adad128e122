use std::path::{Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::extract::{has_extension, ExtractorSet};
use crate::models::{Document, DocumentSummary, IngestionReport, SkippedFile};

/// Extensions the pipeline will pick up during discovery. `.doc` is listed so
/// legacy files show up in the skip report instead of vanishing silently.
pub const INGEST_EXTENSIONS: &[&str] = &["pdf", "docx", "doc", "txt", "wav", "mp3", "dat"];

pub fn discover_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if has_extension(entry.path(), INGEST_EXTENSIONS) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Walks directories and turns every supported file into a `Document`,
/// recording failures instead of aborting on them.
pub struct Ingestor {
    extractors: ExtractorSet,
}

impl Ingestor {
    pub fn new(extractors: ExtractorSet) -> Self {
        Self { extractors }
    }

    pub async fn ingest_directories(
        &self,
        directories: &[PathBuf],
    ) -> (Vec<Document>, IngestionReport) {
        let mut documents = Vec::new();
        let mut summaries = Vec::new();
        let mut skipped = Vec::new();

        for directory in directories {
            if !directory.is_dir() {
                tracing::warn!(directory = %directory.display(), "directory not found");
                skipped.push(SkippedFile {
                    path: directory.display().to_string(),
                    reason: "directory not found".to_string(),
                });
                continue;
            }

            for path in discover_files(directory) {
                match self.extractors.extract_document(&path).await {
                    Ok(document) => {
                        summaries.push(DocumentSummary {
                            filename: document.filename().to_string(),
                            chars: document.content().chars().count(),
                            digest: digest_text(document.content()),
                        });
                        documents.push(document);
                    }
                    Err(error) => {
                        tracing::warn!(path = %path.display(), %error, "skipping file");
                        skipped.push(SkippedFile {
                            path: path.display().to_string(),
                            reason: error.to_string(),
                        });
                    }
                }
            }
        }

        let report = IngestionReport {
            documents: summaries,
            skipped,
            ingested_at: Utc::now(),
        };
        (documents, report)
    }
}
