use std::collections::HashMap;

use regex::Regex;

use crate::error::VectorizeError;
use crate::models::VocabularyOptions;
use crate::stopwords;

/// Token pattern: runs of at least two word characters.
pub const TOKEN_PATTERN: &str = r"\b\w\w+\b";

/// Sparse vector as (column, weight) pairs sorted by column.
pub type SparseVector = Vec<(usize, f64)>;

/// Lower-cases, tokenizes, strips stop words, then emits unigrams and bigrams
/// over the remaining token stream. Bigrams bridge removed stop words, so
/// "study of torah" yields the term "study torah".
pub fn analyze(text: &str, token_re: &Regex) -> Vec<String> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = token_re
        .find_iter(&lowered)
        .map(|found| found.as_str())
        .filter(|token| !stopwords::is_stop_word(token))
        .collect();

    let mut terms = Vec::with_capacity(tokens.len().saturating_mul(2));
    for token in &tokens {
        terms.push((*token).to_string());
    }
    for pair in tokens.windows(2) {
        terms.push(format!("{} {}", pair[0], pair[1]));
    }
    terms
}

/// Term-weighted representation of one chunk corpus. Weights are raw term
/// counts scaled by smoothed inverse chunk frequency, each row L2-normalized
/// so cosine similarity reduces to a sparse dot product. Rebuilt per ranking
/// call; columns are assigned in alphabetical term order for determinism.
pub struct VectorSpace {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    rows: Vec<SparseVector>,
}

impl VectorSpace {
    pub fn build(
        texts: &[&str],
        token_re: &Regex,
        options: &VocabularyOptions,
    ) -> Result<Self, VectorizeError> {
        let chunk_terms: Vec<HashMap<String, usize>> = texts
            .iter()
            .map(|text| {
                let mut counts = HashMap::new();
                for term in analyze(text, token_re) {
                    *counts.entry(term).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        // (chunk frequency, total corpus count) per term
        let mut stats: HashMap<&str, (usize, usize)> = HashMap::new();
        for counts in &chunk_terms {
            for (term, count) in counts {
                let entry = stats.entry(term.as_str()).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += count;
            }
        }

        if stats.is_empty() {
            return Err(VectorizeError::EmptyVocabulary(
                "the corpus contains only stop words or single characters".to_string(),
            ));
        }

        let chunk_count = texts.len();
        let min_freq = options.min_chunk_freq as f64;
        let max_freq = options.max_chunk_ratio * chunk_count as f64;
        if max_freq < min_freq {
            return Err(VectorizeError::FrequencyBounds(format!(
                "ratio {} of {} chunks admits fewer than the {} occurrences required",
                options.max_chunk_ratio, chunk_count, options.min_chunk_freq
            )));
        }

        let mut kept: Vec<(&str, usize, usize)> = stats
            .iter()
            .filter_map(|(term, &(freq, total))| {
                let freq_f = freq as f64;
                (freq_f >= min_freq && freq_f <= max_freq).then_some((*term, freq, total))
            })
            .collect();

        if kept.is_empty() {
            return Err(VectorizeError::EmptyVocabulary(
                "no terms remain after chunk-frequency pruning".to_string(),
            ));
        }

        if kept.len() > options.max_terms {
            kept.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(b.0)));
            kept.truncate(options.max_terms);
        }

        kept.sort_by(|a, b| a.0.cmp(b.0));

        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (column, (term, freq, _)) in kept.iter().enumerate() {
            vocabulary.insert((*term).to_string(), column);
            idf.push(((1.0 + chunk_count as f64) / (1.0 + *freq as f64)).ln() + 1.0);
        }

        let rows = chunk_terms
            .iter()
            .map(|counts| {
                let mut row: SparseVector = counts
                    .iter()
                    .filter_map(|(term, &count)| {
                        vocabulary
                            .get(term.as_str())
                            .map(|&column| (column, count as f64 * idf[column]))
                    })
                    .collect();
                row.sort_unstable_by_key(|&(column, _)| column);
                l2_normalize(&mut row);
                row
            })
            .collect();

        Ok(Self {
            vocabulary,
            idf,
            rows,
        })
    }

    /// Projects arbitrary text into this space. Terms outside the vocabulary
    /// contribute nothing; a query of unknown terms maps to the zero vector.
    pub fn transform(&self, text: &str, token_re: &Regex) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in analyze(text, token_re) {
            if let Some(&column) = self.vocabulary.get(&term) {
                *counts.entry(column).or_insert(0.0) += 1.0;
            }
        }

        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(column, count)| (column, count * self.idf[column]))
            .collect();
        vector.sort_unstable_by_key(|&(column, _)| column);
        l2_normalize(&mut vector);
        vector
    }

    /// Cosine similarity of the query against every row, in corpus order.
    pub fn similarities(&self, query: &SparseVector) -> Vec<f64> {
        self.rows.iter().map(|row| sparse_dot(row, query)).collect()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }
}

fn l2_normalize(vector: &mut SparseVector) {
    let norm = vector
        .iter()
        .map(|(_, weight)| weight * weight)
        .sum::<f64>()
        .sqrt();
    if norm > 0.0 {
        for (_, weight) in vector.iter_mut() {
            *weight /= norm;
        }
    }
}

fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f64 {
    let mut total = 0.0;
    let mut left = 0;
    let mut right = 0;
    while left < a.len() && right < b.len() {
        match a[left].0.cmp(&b[right].0) {
            std::cmp::Ordering::Less => left += 1,
            std::cmp::Ordering::Greater => right += 1,
            std::cmp::Ordering::Equal => {
                total += a[left].1 * b[right].1;
                left += 1;
                right += 1;
            }
        }
    }
    total
}
