use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("docx parse error: {0}")]
    DocxParse(String),

    #[error("regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("no text content in {0}")]
    NoContent(String),

    #[error("unsupported file type: {0}")]
    Unsupported(String),

    #[error("transcription endpoint not configured")]
    TranscriberUnavailable,

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

/// Vector-space construction failed; callers degrade to lexical overlap.
#[derive(Debug, Error)]
pub enum VectorizeError {
    #[error("empty vocabulary: {0}")]
    EmptyVocabulary(String),

    #[error("document frequency bounds conflict: {0}")]
    FrequencyBounds(String),
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion endpoint returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("json error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
