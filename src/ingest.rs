//! Document ingestion from the mirror root.
//!
//! One non-recursive pass over the mirror root's immediate entries, in
//! `read_dir` order. That order is filesystem-dependent and unsorted; the
//! collection preserves it, and the topic map's file-name convention is the
//! guard against it (see [`crate::models::TopicMap`]). A file that fails to
//! read or parse is logged and skipped — one bad file never aborts a load.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::extract;
use crate::models::{Document, DocumentCollection, TopicMap};

pub fn load_all(root: &Path, config: &IngestConfig) -> Result<DocumentCollection> {
    let include_set = build_globset(&config.include_globs)?;
    let exclude_set = build_globset(&config.exclude_globs)?;

    let entries = std::fs::read_dir(root)
        .with_context(|| format!("Failed to list mirror root: {}", root.display()))?;

    let mut documents = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        if exclude_set.is_match(&name) || !include_set.is_match(&name) {
            continue;
        }

        match load_entry(&path, &name) {
            Ok(text) => documents.push(Document { name, text }),
            Err(e) => tracing::warn!(file = %name, error = %e, "skipping document"),
        }
    }

    tracing::info!(documents = documents.len(), "ingested mirror root");

    let topics = TopicMap::from_names(documents.iter().map(|d| d.name.as_str()));
    Ok(DocumentCollection {
        documents,
        topics,
        loaded_at: chrono::Utc::now(),
    })
}

fn load_entry(path: &Path, name: &str) -> Result<String, IngestError> {
    if is_pdf(name) {
        let bytes = std::fs::read(path).map_err(|source| IngestError::Read {
            name: name.to_string(),
            source,
        })?;
        extract::extract_pdf(&bytes).map_err(|e| IngestError::Pdf {
            name: name.to_string(),
            message: e.to_string(),
        })
    } else {
        std::fs::read_to_string(path).map_err(|source| IngestError::Read {
            name: name.to_string(),
            source,
        })
    }
}

fn is_pdf(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_plain_files_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "Hello").unwrap();
        let collection = load_all(tmp.path(), &IngestConfig::default()).unwrap();
        assert_eq!(collection.documents.len(), 1);
        assert_eq!(collection.documents[0].text, "Hello");
        assert_eq!(collection.documents[0].name, "notes.txt");
    }

    #[test]
    fn corrupt_pdf_is_skipped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("good.txt"), "valid contents").unwrap();
        std::fs::write(tmp.path().join("broken.pdf"), b"not a pdf").unwrap();
        let collection = load_all(tmp.path(), &IngestConfig::default()).unwrap();
        assert_eq!(collection.documents.len(), 1);
        assert_eq!(collection.documents[0].name, "good.txt");
    }

    #[test]
    fn non_utf8_file_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("ok.md"), "readable").unwrap();
        std::fs::write(tmp.path().join("blob.bin"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
        let collection = load_all(tmp.path(), &IngestConfig::default()).unwrap();
        assert_eq!(collection.documents.len(), 1);
    }

    #[test]
    fn subdirectories_and_dotfiles_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("nested")).unwrap();
        std::fs::write(tmp.path().join("nested/inner.txt"), "hidden").unwrap();
        std::fs::write(tmp.path().join(".gitignore"), "target").unwrap();
        std::fs::write(tmp.path().join("top.txt"), "visible").unwrap();
        let collection = load_all(tmp.path(), &IngestConfig::default()).unwrap();
        assert_eq!(collection.documents.len(), 1);
        assert_eq!(collection.documents[0].name, "top.txt");
    }

    #[test]
    fn exclude_globs_filter_entries() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("keep.md"), "keep").unwrap();
        std::fs::write(tmp.path().join("README.md"), "skip").unwrap();
        let config = IngestConfig {
            include_globs: vec!["*".to_string()],
            exclude_globs: vec!["README.*".to_string()],
        };
        let collection = load_all(tmp.path(), &config).unwrap();
        assert_eq!(collection.documents.len(), 1);
        assert_eq!(collection.documents[0].name, "keep.md");
    }

    #[test]
    fn missing_root_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        assert!(load_all(&missing, &IngestConfig::default()).is_err());
    }
}
