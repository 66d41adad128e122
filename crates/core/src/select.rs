use std::collections::HashSet;

use crate::models::{Passage, RankingOptions, ScoredPassage};

/// One scored passage index, produced by either scoring path.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub index: usize,
    pub score: f64,
    pub term_matches: usize,
}

/// Two-pass diversity-aware selection shared by the vector and lexical paths.
///
/// Candidates are ordered by descending score and truncated to a pool of
/// `candidate_factor * max_passages`. Pass one takes the best qualifying
/// passage per source so no document monopolizes the context; pass two fills
/// the remaining capacity in pure score order, deduplicating by exact content.
/// A candidate qualifies when its score strictly exceeds the threshold and it
/// contains at least one query key term.
pub fn select_diverse(
    passages: &[Passage],
    mut candidates: Vec<Candidate>,
    options: &RankingOptions,
) -> Vec<ScoredPassage> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(options.candidate_factor.saturating_mul(options.max_passages));

    let mut selected: Vec<Candidate> = Vec::new();
    let mut used_sources: HashSet<&str> = HashSet::new();

    for candidate in &candidates {
        let passage = &passages[candidate.index];
        if candidate.score > options.score_threshold
            && candidate.term_matches >= 1
            && !used_sources.contains(passage.source.as_str())
        {
            used_sources.insert(passage.source.as_str());
            selected.push(*candidate);
        }
    }

    for candidate in &candidates {
        if selected.len() >= options.max_passages {
            break;
        }
        let passage = &passages[candidate.index];
        if candidate.score > options.score_threshold
            && candidate.term_matches >= 1
            && !selected
                .iter()
                .any(|chosen| passages[chosen.index].content == passage.content)
        {
            selected.push(*candidate);
        }
    }

    selected.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.term_matches.cmp(&a.term_matches))
    });

    selected
        .into_iter()
        .map(|candidate| {
            let passage = &passages[candidate.index];
            ScoredPassage {
                content: passage.content.clone(),
                source: passage.source.clone(),
                similarity: candidate.score,
                term_matches: candidate.term_matches,
            }
        })
        .collect()
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

    fn candidate(index: usize, score: f64, term_matches: usize) -> Candidate {
        Candidate {
            index,
            score,
            term_matches,
        }
    }

    fn options(max_passages: usize) -> RankingOptions {
        RankingOptions {
            max_passages,
            ..RankingOptions::default()
        }
    }

    #[test]
    fn first_pass_spreads_selections_across_sources() {
        let passages = vec![
            passage("a first", "a.txt"),
            passage("a second", "a.txt"),
            passage("b first", "b.txt"),
        ];
        let candidates = vec![
            candidate(0, 0.9, 1),
            candidate(1, 0.8, 1),
            candidate(2, 0.7, 1),
        ];

        let selected = select_diverse(&passages, candidates, &options(2));

        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].source, "a.txt");
        assert_eq!(selected[1].source, "b.txt");
    }

    #[test]
    fn second_pass_fills_remaining_capacity_from_used_sources() {
        let passages = vec![
            passage("a first", "a.txt"),
            passage("a second", "a.txt"),
            passage("b first", "b.txt"),
        ];
        let candidates = vec![
            candidate(0, 0.9, 1),
            candidate(1, 0.8, 1),
            candidate(2, 0.7, 1),
        ];

        let selected = select_diverse(&passages, candidates, &options(3));

        assert_eq!(selected.len(), 3);
        assert_eq!(selected[1].content, "a second");
    }

    #[test]
    fn duplicate_content_is_not_selected_twice() {
        let passages = vec![
            passage("shared text", "a.txt"),
            passage("shared text", "a.txt"),
            passage("other text", "a.txt"),
        ];
        let candidates = vec![
            candidate(0, 0.9, 1),
            candidate(1, 0.85, 1),
            candidate(2, 0.8, 1),
        ];

        let selected = select_diverse(&passages, candidates, &options(3));

        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].content, "shared text");
        assert_eq!(selected[1].content, "other text");
    }

    #[test]
    fn threshold_is_a_strict_bound() {
        let passages = vec![passage("at threshold", "a.txt"), passage("above it", "b.txt")];
        let candidates = vec![candidate(0, 0.05, 1), candidate(1, 0.06, 1)];

        let selected = select_diverse(&passages, candidates, &options(5));

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].source, "b.txt");
    }

    #[test]
    fn candidates_without_term_matches_are_rejected() {
        let passages = vec![passage("high score no terms", "a.txt")];
        let candidates = vec![candidate(0, 0.95, 0)];

        assert!(select_diverse(&passages, candidates, &options(5)).is_empty());
    }

    #[test]
    fn pool_is_bounded_by_candidate_factor() {
        let passages: Vec<Passage> = (0..30)
            .map(|i| passage(&format!("passage {i}"), &format!("{i}.txt")))
            .collect();
        let candidates: Vec<Candidate> = (0..30)
            .map(|i| candidate(i, 1.0 - i as f64 / 100.0, 1))
            .collect();

        let opts = RankingOptions {
            max_passages: 5,
            candidate_factor: 2,
            ..RankingOptions::default()
        };
        let selected = select_diverse(&passages, candidates, &opts);

        // every source is distinct, so pass one alone fills the pool cap
        assert_eq!(selected.len(), 10);
        assert!(selected.iter().all(|chosen| chosen.similarity > 0.79));
    }

    #[test]
    fn final_order_is_score_then_term_matches() {
        let passages = vec![
            passage("one", "a.txt"),
            passage("two", "b.txt"),
            passage("three", "c.txt"),
        ];
        let candidates = vec![
            candidate(0, 0.5, 1),
            candidate(1, 0.5, 3),
            candidate(2, 0.9, 1),
        ];

        let selected = select_diverse(&passages, candidates, &options(3));

        assert_eq!(selected[0].content, "three");
        assert_eq!(selected[1].content, "two");
        assert_eq!(selected[2].content, "one");
    }
}
