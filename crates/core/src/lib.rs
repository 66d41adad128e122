pub mod assembler;
pub mod chat;
pub mod chunking;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod matcher;
pub mod models;
pub mod ranker;
pub mod select;
pub mod stopwords;
pub mod store;
pub mod tfidf;

pub use assembler::assemble;
pub use chat::{build_messages, ChatClient, ChatConfig, DEFAULT_SYSTEM_PREAMBLE};
pub use chunking::Chunker;
pub use error::{ChatError, IngestError, VectorizeError};
pub use extract::{
    AudioTranscriber, DocumentExtractor, ExtractorSet, TranscriberConfig,
};
pub use ingest::{discover_files, digest_text, Ingestor, INGEST_EXTENSIONS};
pub use matcher::key_terms;
pub use models::{
    AssembledContext, ChatMessage, ChatRole, ChunkingOptions, Document, DocumentSummary,
    GenerationOptions, IngestionReport, Passage, RankingOptions, SamplingOptions, ScoredPassage,
    SkippedFile, VocabularyOptions,
};
pub use ranker::PassageRanker;
pub use store::DocumentStore;
pub use tfidf::VectorSpace;
