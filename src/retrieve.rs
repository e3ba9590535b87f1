//! Query rendering against the in-memory document collection.
//!
//! Two-phase policy, reproduced exactly and deliberately naive:
//!
//! 1. concatenate, in collection order, every document containing the query
//!    as an exact case-sensitive substring;
//! 2. only when that yields nothing, lowercase the query and append each
//!    fallback topic's document when the query mentions one of the topic's
//!    keywords.
//!
//! No ranking, no deduplication of overlapping matches, no token-aware
//! truncation. Non-empty output is wrapped in the context delimiter before
//! prompt injection.

use crate::models::{DocumentCollection, RetrievalResult, TOPICS};

const CONTEXT_OPEN: &str = "<context>";
const CONTEXT_CLOSE: &str = "</context>";

pub fn render(collection: &DocumentCollection, query: &str) -> RetrievalResult {
    if query.is_empty() {
        return RetrievalResult::empty();
    }

    let mut matched = String::new();
    for doc in &collection.documents {
        if doc.text.contains(query) {
            matched.push_str(&doc.text);
        }
    }

    if matched.is_empty() {
        let lowered = query.to_lowercase();
        for (slot, topic) in TOPICS.iter().enumerate() {
            if !topic.keywords.iter().any(|k| lowered.contains(k)) {
                continue;
            }
            if let Some(index) = collection.topics.document_index(slot) {
                if let Some(doc) = collection.documents.get(index) {
                    matched.push_str(&doc.text);
                }
            }
        }
    }

    if matched.is_empty() {
        return RetrievalResult::empty();
    }

    RetrievalResult {
        length: matched.chars().count(),
        output: format!("{CONTEXT_OPEN}{matched}{CONTEXT_CLOSE}"),
        too_long: false,
    }
}
