use std::collections::BTreeSet;

use crate::models::{AssembledContext, Document, SamplingOptions, ScoredPassage};

/// Formats ranked passages into the attributed context block handed to the
/// prompt layer. When ranking selected nothing, samples the head of the first
/// few documents instead so the model still sees what the collection holds.
pub fn assemble(
    passages: &[ScoredPassage],
    documents: &[Document],
    options: &SamplingOptions,
) -> AssembledContext {
    if !passages.is_empty() {
        let mut sources = BTreeSet::new();
        let blocks: Vec<String> = passages
            .iter()
            .map(|passage| {
                sources.insert(passage.source.clone());
                format!("[Source: {}]\n{}\n", passage.source, passage.content)
            })
            .collect();
        return AssembledContext {
            text: blocks.join("\n\n"),
            sources,
        };
    }

    let mut sources = BTreeSet::new();
    let blocks: Vec<String> = documents
        .iter()
        .take(options.max_documents)
        .map(|document| {
            sources.insert(document.filename().to_string());
            format!(
                "[Source: {}]\n{}\n",
                document.filename(),
                truncate_chars(document.content(), options.max_chars)
            )
        })
        .collect();
    AssembledContext {
        text: blocks.join("\n\n"),
        sources,
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{head}...")
}
