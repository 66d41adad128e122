use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// One ingested document: the name it is cited by plus its extracted text.
/// Immutable once constructed; re-ingestion replaces documents wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    filename: String,
    content: String,
}

impl Document {
    pub fn new(
        filename: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, IngestError> {
        let filename = filename.into();
        if filename.trim().is_empty() {
            return Err(IngestError::MissingFileName(filename));
        }
        Ok(Self {
            filename,
            content: content.into(),
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// A bounded slice of one document, the unit of retrieval. Scoped to a single
/// ranking call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    pub content: String,
    pub source: String,
}

/// Ranked passage. `similarity` is only comparable to other passages scored in
/// the same call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoredPassage {
    pub content: String,
    pub source: String,
    pub similarity: f64,
    pub term_matches: usize,
}

/// Output of context assembly: the attributed text block handed to the prompt
/// layer plus the distinct sources it drew from.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AssembledContext {
    pub text: String,
    pub sources: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkingOptions {
    pub target_chars: usize,
    pub overlap_chars: usize,
    pub min_chars: usize,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            target_chars: 1_000,
            overlap_chars: 200,
            min_chars: 50,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VocabularyOptions {
    /// Cap on vocabulary size, keeping the highest corpus-frequency terms.
    pub max_terms: usize,
    /// A term must appear in at least this many chunks.
    pub min_chunk_freq: usize,
    /// A term must appear in at most this fraction of chunks.
    pub max_chunk_ratio: f64,
}

impl Default for VocabularyOptions {
    fn default() -> Self {
        Self {
            max_terms: 5_000,
            min_chunk_freq: 2,
            max_chunk_ratio: 0.95,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RankingOptions {
    pub max_passages: usize,
    /// Strict lower bound a score must exceed to be selected.
    pub score_threshold: f64,
    /// Minimum character count for a query word to act as a key term.
    pub key_term_min_chars: usize,
    /// Candidate pool size as a multiple of `max_passages`.
    pub candidate_factor: usize,
    pub chunking: ChunkingOptions,
    pub vocabulary: VocabularyOptions,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            max_passages: 10,
            score_threshold: 0.05,
            key_term_min_chars: 4,
            candidate_factor: 2,
            chunking: ChunkingOptions::default(),
            vocabulary: VocabularyOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SamplingOptions {
    pub max_documents: usize,
    pub max_chars: usize,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            max_documents: 5,
            max_chars: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub presence_penalty: f64,
    pub frequency_penalty: f64,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 1_000,
            presence_penalty: 0.6,
            frequency_penalty: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub filename: String,
    pub chars: usize,
    pub digest: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub documents: Vec<DocumentSummary>,
    pub skipped: Vec<SkippedFile>,
    pub ingested_at: DateTime<Utc>,
}
