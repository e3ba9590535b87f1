//! Core data models for the ingestion and retrieval pipeline.

/// Fallback topics, in evaluation order: tag plus the keywords that trigger
/// it in a lowercased query or match a document file name.
pub const TOPICS: [Topic; 3] = [
    Topic {
        tag: "history",
        keywords: ["history", "company"],
    },
    Topic {
        tag: "perks",
        keywords: ["perksplus", "program"],
    },
    Topic {
        tag: "health",
        keywords: ["northwind", "health"],
    },
];

/// One fixed fallback topic.
#[derive(Debug, Clone, Copy)]
pub struct Topic {
    pub tag: &'static str,
    pub keywords: [&'static str; 2],
}

/// One ingested source file, reduced to plain text. For PDFs the text is all
/// page text in page order followed by any serialized tables.
#[derive(Debug, Clone)]
pub struct Document {
    /// Source file name. Used for topic mapping and logging; retrieval
    /// output exposes only the text.
    pub name: String,
    pub text: String,
}

/// Ordered documents in mirror listing order, plus the topic map consulted
/// by the keyword fallback. Built once per sync and replaced wholesale;
/// `loaded_at` tells an operator how stale the collection is.
#[derive(Debug, Clone)]
pub struct DocumentCollection {
    pub documents: Vec<Document>,
    pub topics: TopicMap,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

/// Explicit topic → document binding, built at ingestion time.
///
/// Each topic binds to the first document whose file name mentions one of
/// its keywords. When no name matches, the topic falls back to its legacy
/// position in listing order (history = 0, perks = 1, health = 2), so
/// repositories with keyword-opaque file names keep the historical matching
/// behavior. A slot past the end of the collection contributes nothing.
#[derive(Debug, Clone, Default)]
pub struct TopicMap {
    slots: [Option<usize>; TOPICS.len()],
}

impl TopicMap {
    pub fn from_names<'a>(names: impl Iterator<Item = &'a str>) -> Self {
        let lowered: Vec<String> = names.map(str::to_lowercase).collect();
        let mut slots = [None; TOPICS.len()];
        for (slot, topic) in TOPICS.iter().enumerate() {
            let by_name = lowered
                .iter()
                .position(|name| topic.keywords.iter().any(|k| name.contains(k)));
            let by_position = (slot < lowered.len()).then_some(slot);
            slots[slot] = by_name.or(by_position);
        }
        Self { slots }
    }

    /// Document index bound to the topic at `slot`, if any.
    pub fn document_index(&self, slot: usize) -> Option<usize> {
        self.slots.get(slot).copied().flatten()
    }
}

/// Result of rendering a query against the collection.
///
/// `too_long` is carried for wire parity with the historical shape and is
/// never computed against a token budget; it is always `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalResult {
    /// Matched text wrapped in the context delimiter, or empty.
    pub output: String,
    /// Character length of the unwrapped concatenation.
    pub length: usize,
    pub too_long: bool,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self {
            output: String::new(),
            length: 0,
            too_long: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_map_prefers_file_name_match() {
        let names = ["benefits_program.txt", "contoso_history.txt"];
        let map = TopicMap::from_names(names.iter().copied());
        // "history" keyword matches the second file even though it sits at
        // position 1.
        assert_eq!(map.document_index(0), Some(1));
        // "program" matches the first file.
        assert_eq!(map.document_index(1), Some(0));
    }

    #[test]
    fn topic_map_falls_back_to_position() {
        let names = ["a.txt", "b.txt", "c.txt"];
        let map = TopicMap::from_names(names.iter().copied());
        assert_eq!(map.document_index(0), Some(0));
        assert_eq!(map.document_index(1), Some(1));
        assert_eq!(map.document_index(2), Some(2));
    }

    #[test]
    fn topic_map_out_of_range_is_empty() {
        let names = ["only.txt"];
        let map = TopicMap::from_names(names.iter().copied());
        assert_eq!(map.document_index(0), Some(0));
        assert_eq!(map.document_index(1), None);
        assert_eq!(map.document_index(2), None);
    }
}
