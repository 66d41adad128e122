use regex::Regex;

use crate::chunking::Chunker;
use crate::error::IngestError;
use crate::matcher;
use crate::models::{Document, Passage, RankingOptions, ScoredPassage};
use crate::select::{self, Candidate};
use crate::tfidf::{VectorSpace, TOKEN_PATTERN};

/// Scores and selects passages for a query across the whole document
/// collection. Stateless between calls: passages and the vector space are
/// rebuilt from the documents every time, so concurrent ingestion can never
/// leave a stale index behind.
pub struct PassageRanker {
    chunker: Chunker,
    token_re: Regex,
    options: RankingOptions,
}

impl PassageRanker {
    pub fn new(options: RankingOptions) -> Result<Self, IngestError> {
        Ok(Self {
            chunker: Chunker::new(options.chunking)?,
            token_re: Regex::new(TOKEN_PATTERN)?,
            options,
        })
    }

    pub fn options(&self) -> &RankingOptions {
        &self.options
    }

    /// Ranked passages in descending `(similarity, term_matches)` order.
    /// Returns an empty list for an empty collection, a blank query, or when
    /// nothing clears the selection gates; those cases are not errors.
    pub fn rank(&self, query: &str, documents: &[Document]) -> Vec<ScoredPassage> {
        if documents.is_empty() || query.trim().is_empty() {
            return Vec::new();
        }

        let passages = self.collect_passages(documents);
        if passages.is_empty() {
            return Vec::new();
        }

        let texts: Vec<&str> = passages
            .iter()
            .map(|passage| passage.content.as_str())
            .collect();

        match VectorSpace::build(&texts, &self.token_re, &self.options.vocabulary) {
            Ok(space) => {
                let query_vector = space.transform(query, &self.token_re);
                let scores = space.similarities(&query_vector);
                let terms = matcher::key_terms(query, self.options.key_term_min_chars);
                let candidates = scores
                    .iter()
                    .enumerate()
                    .map(|(index, &score)| Candidate {
                        index,
                        score,
                        term_matches: matcher::count_term_matches(
                            &passages[index].content,
                            &terms,
                        ),
                    })
                    .collect();
                select::select_diverse(&passages, candidates, &self.options)
            }
            Err(error) => {
                tracing::debug!(%error, "vector scoring unavailable, using lexical overlap");
                matcher::match_passages(query, &passages, &self.options)
            }
        }
    }

    /// Every document chunked into source-tagged passages, in document order.
    pub fn collect_passages(&self, documents: &[Document]) -> Vec<Passage> {
        let mut passages = Vec::new();
        for document in documents {
            for chunk in self.chunker.chunk(document.content()) {
                passages.push(Passage {
                    content: chunk,
                    source: document.filename().to_string(),
                });
            }
        }
        passages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(filename: &str, content: &str) -> Document {
        Document::new(filename, content).expect("valid document")
    }

    fn ranker() -> PassageRanker {
        PassageRanker::new(RankingOptions::default()).expect("ranker builds")
    }

    #[test]
    fn empty_collection_and_blank_query_return_nothing() {
        let ranker = ranker();
        assert!(ranker.rank("torah", &[]).is_empty());

        let docs = [document("a.txt", "Torah study is central to communal life and learning.")];
        assert!(ranker.rank("   ", &docs).is_empty());
        assert!(ranker.rank("", &docs).is_empty());
    }

    #[test]
    fn collection_of_short_noise_yields_no_passages() {
        let ranker = ranker();
        let docs = [document("noise.txt", "12345 6789"), document("tiny.txt", "too short")];
        assert!(ranker.rank("anything relevant", &docs).is_empty());
    }

    #[test]
    fn two_document_scenario_ranks_the_relevant_source_first() {
        let ranker = ranker();
        let docs = [
            document(
                "a.txt",
                "Torah study is the foundation that sustains Jewish communities, \
                 and daily learning refines character through steady discipline.",
            ),
            document(
                "b.txt",
                "The purpose of technology is to reveal divine wisdom hidden \
                 within the material world, and its purpose grows with use.",
            ),
        ];

        let ranked = ranker.rank("What is the purpose of technology?", &docs);

        assert!(!ranked.is_empty());
        assert_eq!(ranked[0].source, "b.txt");
        assert!(ranked[0].term_matches >= 1);
    }

    #[test]
    fn both_sources_appear_when_each_has_a_qualifying_passage() {
        let options = RankingOptions {
            max_passages: 5,
            ..RankingOptions::default()
        };
        let ranker = PassageRanker::new(options).expect("ranker builds");
        let docs = [
            document(
                "a.txt",
                "Torah study is the foundation of daily practice, and its \
                 purpose includes refining character over many years.",
            ),
            document(
                "b.txt",
                "The purpose of technology is to reveal divine wisdom hidden \
                 within the material world around us.",
            ),
        ];

        let ranked = ranker.rank("What is the purpose of technology?", &docs);

        let sources: Vec<&str> = ranked.iter().map(|p| p.source.as_str()).collect();
        assert!(sources.contains(&"a.txt"));
        assert!(sources.contains(&"b.txt"));
        assert_eq!(ranked[0].source, "b.txt");
    }

    #[test]
    fn distinct_documents_fill_distinct_slots() {
        let options = RankingOptions {
            max_passages: 3,
            ..RankingOptions::default()
        };
        let ranker = PassageRanker::new(options).expect("ranker builds");
        let docs = [
            document(
                "s1.txt",
                "Quantum theory and entropy measurements anchor the first \
                 laboratory course offered in the spring semester.",
            ),
            document(
                "s2.txt",
                "Quantum gravity remains the central open problem discussed \
                 throughout the advanced seminar series this year.",
            ),
            document(
                "s3.txt",
                "Gravity and entropy together shape the thermodynamic view \
                 presented in the closing lectures of the course.",
            ),
        ];

        let ranked = ranker.rank("quantum gravity entropy", &docs);

        assert_eq!(ranked.len(), 3);
        let mut sources: Vec<&str> = ranked.iter().map(|p| p.source.as_str()).collect();
        sources.sort_unstable();
        sources.dedup();
        assert_eq!(sources.len(), 3);
    }

    #[test]
    fn tiny_corpus_falls_back_to_lexical_overlap() {
        let ranker = ranker();
        let docs = [document(
            "only.txt",
            "Candle lighting before sunset marks the start of rest each week.",
        )];

        let ranked = ranker.rank("when is candle lighting before sunset", &docs);
        let passages = ranker.collect_passages(&docs);
        let matched = matcher::match_passages(
            "when is candle lighting before sunset",
            &passages,
            ranker.options(),
        );

        assert!(!ranked.is_empty());
        assert_eq!(ranked, matched);
    }

    #[test]
    fn ranking_is_idempotent() {
        let ranker = ranker();
        let docs = [
            document(
                "a.txt",
                "Torah study is the foundation of communal life, guiding daily \
                 choices and the rhythm of each week.",
            ),
            document(
                "b.txt",
                "The purpose of technology is to reveal wisdom hidden within \
                 the material world and to serve daily study.",
            ),
        ];

        let first = ranker.rank("purpose of technology in study", &docs);
        let second = ranker.rank("purpose of technology in study", &docs);
        assert_eq!(first, second);
    }

    #[test]
    fn stop_word_query_selects_nothing() {
        let ranker = ranker();
        let docs = [document(
            "a.txt",
            "Torah study is the foundation of communal life and daily practice \
             in every generation.",
        )];

        assert!(ranker.rank("is it a", &docs).is_empty());
    }
}
