use std::collections::HashSet;

use crate::models::{Passage, RankingOptions, ScoredPassage};
use crate::select::{self, Candidate};

/// Significant query words used to gate passage inclusion: lower-cased,
/// stripped of edge punctuation, at least `min_chars` characters, deduplicated.
pub fn key_terms(query: &str, min_chars: usize) -> Vec<String> {
    let mut terms: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_string()
        })
        .filter(|word| word.chars().count() >= min_chars)
        .collect();
    terms.sort();
    terms.dedup();
    terms
}

/// Number of key terms appearing in the text, by case-insensitive substring.
pub fn count_term_matches(text: &str, terms: &[String]) -> usize {
    let lowered = text.to_lowercase();
    terms
        .iter()
        .filter(|term| lowered.contains(term.as_str()))
        .count()
}

/// Fraction of the query's words that also occur in the text. Plain
/// whitespace tokens, lower-cased; zero when the query has no words.
pub fn overlap_score(query_words: &HashSet<String>, text: &str) -> f64 {
    if query_words.is_empty() {
        return 0.0;
    }
    let text_words: HashSet<String> = text
        .to_lowercase()
        .split_whitespace()
        .map(|word| word.to_string())
        .collect();
    let shared = query_words.intersection(&text_words).count();
    shared as f64 / query_words.len() as f64
}

/// Lexical word-overlap ranking over prepared passages. Runs when the vector
/// space cannot be built, and stands alone as a cheap keyword matcher. Uses
/// the same two-pass selection as the vector path.
pub fn match_passages(
    query: &str,
    passages: &[Passage],
    options: &RankingOptions,
) -> Vec<ScoredPassage> {
    let query_words: HashSet<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(|word| word.to_string())
        .collect();
    let terms = key_terms(query, options.key_term_min_chars);

    let candidates = passages
        .iter()
        .enumerate()
        .map(|(index, passage)| Candidate {
            index,
            score: overlap_score(&query_words, &passage.content),
            term_matches: count_term_matches(&passage.content, &terms),
        })
        .collect();

    select::select_diverse(passages, candidates, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(content: &str, source: &str) -> Passage {
        Passage {
            content: content.to_string(),
            source: source.to_string(),
        }
    }

    #[test]
    fn key_terms_trim_punctuation_and_deduplicate() {
        let terms = key_terms("What about technology? Technology, really!", 4);
        assert_eq!(
            terms,
            vec![
                "about".to_string(),
                "really".to_string(),
                "technology".to_string(),
                "what".to_string()
            ]
        );
    }

    #[test]
    fn short_words_are_not_key_terms() {
        assert!(key_terms("is it a he was", 4).is_empty());
    }

    #[test]
    fn term_matches_count_distinct_terms_by_substring() {
        let terms = key_terms("Purpose of Technology", 4);
        let count = count_term_matches("The purpose of technology is clear.", &terms);
        assert_eq!(count, 2);
    }

    #[test]
    fn overlap_score_is_the_shared_word_fraction() {
        let query_words: HashSet<String> = "what is torah study"
            .split_whitespace()
            .map(|word| word.to_string())
            .collect();

        let half = overlap_score(&query_words, "torah study begins tonight");
        assert!((half - 0.5).abs() < 1e-12);

        assert_eq!(overlap_score(&HashSet::new(), "anything"), 0.0);
    }

    #[test]
    fn match_passages_ranks_by_overlap() {
        let passages = vec![
            passage("torah study begins with humility and patience", "a.txt"),
            passage("modern technology reshapes how communities study torah", "b.txt"),
        ];

        let ranked = match_passages(
            "how does technology change torah study",
            &passages,
            &RankingOptions::default(),
        );

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].source, "b.txt");
        assert!(ranked[0].similarity > ranked[1].similarity);
        assert!(ranked[0].term_matches >= 2);
    }
}
