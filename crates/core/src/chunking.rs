use crate::error::IngestError;
use crate::models::ChunkingOptions;
use regex::Regex;

/// Splits one document's text into overlapping, size-bounded passages.
///
/// Paragraphs are greedily packed until the buffer would exceed the target
/// size; each closed chunk seeds the next buffer with its trailing characters
/// so context survives the boundary. Sizes count characters, not bytes, and
/// the overlap seed may start mid-word.
pub struct Chunker {
    break_re: Regex,
    noise_re: Regex,
    options: ChunkingOptions,
}

impl Chunker {
    pub fn new(options: ChunkingOptions) -> Result<Self, IngestError> {
        Ok(Self {
            break_re: Regex::new(r"\n\s*\n")?,
            noise_re: Regex::new(r"^[\d\s\W]+$")?,
            options,
        })
    }

    /// Raw accumulation stage, before whitespace normalization and filtering.
    /// Exposed so the overlap seeding is observable.
    pub fn split_raw(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for paragraph in self.break_re.split(text) {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }

            if current.is_empty() {
                current.push_str(paragraph);
                continue;
            }

            if char_len(&current) + char_len(paragraph) > self.options.target_chars {
                let seed = tail_chars(&current, self.options.overlap_chars);
                chunks.push(current.trim().to_string());
                current = format!("{seed}\n\n{paragraph}");
            } else {
                current.push_str("\n\n");
                current.push_str(paragraph);
            }
        }

        if !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
        }

        chunks
    }

    /// Normalized, filtered passages ready for ranking. Short chunks and
    /// chunks with no alphabetic content are dropped.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        self.split_raw(text)
            .into_iter()
            .map(|chunk| normalize_whitespace(&chunk))
            .filter(|chunk| char_len(chunk) >= self.options.min_chars)
            .filter(|chunk| !self.noise_re.is_match(chunk))
            .collect()
    }
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn tail_chars(text: &str, count: usize) -> String {
    let total = char_len(text);
    text.chars().skip(total.saturating_sub(count)).collect()
}
