//! Conversation turn handling and shared assistant state.
//!
//! One inbound message produces exactly one of three outcomes:
//!
//! - `update_repo` — sync the mirror, re-ingest it, swap the collection,
//!   confirm;
//! - `read_file <path>` — raw file read from the mirror;
//! - anything else — retrieval-augmented completion.
//!
//! [`Assistant::handle`] returns `Result<String, TurnError>`; converting a
//! failure into the fixed user-facing fault reply is the boundary adapter's
//! job (HTTP server or CLI), which logs the error chain first. Mirror and
//! ingestion work is blocking and runs on the blocking pool so in-flight
//! turns are not stalled.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::completion::{self, CompletionModel};
use crate::config::Config;
use crate::error::TurnError;
use crate::ingest;
use crate::mirror::Mirror;
use crate::models::{DocumentCollection, RetrievalResult};
use crate::retrieve;

/// Replies fixed by the conversation contract.
pub const UPDATED_REPLY: &str = "Repository has been updated.";
pub const NOT_FOUND_REPLY: &str = "File not found.";
pub const USAGE_REPLY: &str =
    "Please provide a file path with the command (e.g., 'read_file data/sample.txt').";
pub const FAULT_REPLY: &str = "The assistant encountered an error or bug.";

const UPDATE_COMMAND: &str = "update_repo";
const READ_COMMAND: &str = "read_file";
const READ_COMMAND_PREFIX: &str = "read_file ";

pub struct Assistant {
    config: Config,
    mirror: Arc<Mirror>,
    model: Box<dyn CompletionModel>,
    /// Read-locked per render; write-locked only by the `update_repo` swap.
    collection: RwLock<DocumentCollection>,
}

impl Assistant {
    /// Sync the mirror, ingest it, and construct the shared state.
    pub async fn bootstrap(
        config: Config,
        model: Box<dyn CompletionModel>,
    ) -> Result<Self, TurnError> {
        let mirror = Arc::new(Mirror::new(&config.mirror));
        let collection = sync_and_ingest(mirror.clone(), config.clone()).await?;
        tracing::info!(
            model = model.model_name(),
            documents = collection.documents.len(),
            "assistant ready"
        );
        Ok(Self {
            config,
            mirror,
            model,
            collection: RwLock::new(collection),
        })
    }

    pub async fn document_count(&self) -> usize {
        self.collection.read().await.documents.len()
    }

    /// When the serving collection was last (re)built.
    pub async fn collection_loaded_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.collection.read().await.loaded_at
    }

    /// One conversational turn.
    pub async fn handle(&self, text: &str) -> Result<String, TurnError> {
        let trimmed = text.trim();
        if trimmed == UPDATE_COMMAND {
            return self.update_repo().await;
        }
        if trimmed == READ_COMMAND {
            return Ok(USAGE_REPLY.to_string());
        }
        if let Some(arg) = trimmed.strip_prefix(READ_COMMAND_PREFIX) {
            let arg = arg.trim();
            if arg.is_empty() {
                return Ok(USAGE_REPLY.to_string());
            }
            return self.read_file(arg).await;
        }
        self.answer(trimmed).await
    }

    /// Render the collection against a query without calling the model.
    pub async fn render(&self, query: &str) -> RetrievalResult {
        let collection = self.collection.read().await;
        retrieve::render(&collection, query)
    }

    async fn update_repo(&self) -> Result<String, TurnError> {
        let collection = sync_and_ingest(self.mirror.clone(), self.config.clone()).await?;
        // The refreshed mirror must be visible without a restart; swap the
        // collection wholesale.
        *self.collection.write().await = collection;
        Ok(UPDATED_REPLY.to_string())
    }

    async fn read_file(&self, path: &str) -> Result<String, TurnError> {
        let mirror = self.mirror.clone();
        let relative = path.to_string();
        let contents = tokio::task::spawn_blocking(move || mirror.read_relative(&relative))
            .await
            .map_err(join_error)?
            .map_err(|e| TurnError::Internal(e.into()))?;

        Ok(match contents {
            Some(text) => format!("Contents of {}:\n{}", path, text),
            None => NOT_FOUND_REPLY.to_string(),
        })
    }

    async fn answer(&self, message: &str) -> Result<String, TurnError> {
        let rendered = self.render(message).await;
        let system_prompt =
            completion::assemble_system_prompt(&self.config.completion, &rendered.output);
        let reply = self.model.complete(&system_prompt, message).await?;
        Ok(reply)
    }
}

async fn sync_and_ingest(
    mirror: Arc<Mirror>,
    config: Config,
) -> Result<DocumentCollection, TurnError> {
    tokio::task::spawn_blocking(move || -> Result<DocumentCollection, TurnError> {
        mirror.ensure_up_to_date()?;
        Ok(ingest::load_all(mirror.dir(), &config.ingest)?)
    })
    .await
    .map_err(join_error)?
}

fn join_error(e: tokio::task::JoinError) -> TurnError {
    TurnError::Internal(anyhow::anyhow!("blocking task failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompletionConfig, IngestConfig, MirrorConfig, ServerConfig};
    use crate::error::CompletionError;
    use crate::models::{Document, TopicMap};
    use async_trait::async_trait;
    use std::path::Path;

    /// Echoes the prompts back so dispatch and prompt assembly are visible.
    struct EchoModel;

    #[async_trait]
    impl CompletionModel for EchoModel {
        fn model_name(&self) -> &str {
            "echo"
        }
        async fn complete(
            &self,
            system_prompt: &str,
            user_message: &str,
        ) -> Result<String, CompletionError> {
            Ok(format!("{system_prompt}|{user_message}"))
        }
    }

    struct FailingModel;

    #[async_trait]
    impl CompletionModel for FailingModel {
        fn model_name(&self) -> &str {
            "failing"
        }
        async fn complete(&self, _: &str, _: &str) -> Result<String, CompletionError> {
            Err(CompletionError::Api {
                status: 500,
                body: "boom".to_string(),
            })
        }
    }

    fn test_config(mirror_dir: &Path) -> Config {
        Config {
            mirror: MirrorConfig {
                url: "https://example.com/docs.git".to_string(),
                branch: "main".to_string(),
                path: Some(mirror_dir.to_path_buf()),
                data_dir: mirror_dir.to_path_buf(),
                shallow: false,
                timeout_secs: 30,
            },
            ingest: IngestConfig::default(),
            completion: CompletionConfig {
                model: "echo".to_string(),
                base_url: "https://api.openai.com/v1".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                timeout_secs: 30,
                max_retries: 5,
                system_prompt: None,
            },
            server: ServerConfig {
                bind: "127.0.0.1:0".to_string(),
                app_id: None,
            },
        }
    }

    fn assistant_with(
        mirror_dir: &Path,
        model: Box<dyn CompletionModel>,
        documents: Vec<Document>,
    ) -> Assistant {
        let config = test_config(mirror_dir);
        let topics = TopicMap::from_names(documents.iter().map(|d| d.name.as_str()));
        Assistant {
            mirror: Arc::new(Mirror::new(&config.mirror)),
            config,
            model,
            collection: RwLock::new(DocumentCollection {
                documents,
                topics,
                loaded_at: chrono::Utc::now(),
            }),
        }
    }

    fn sample_documents() -> Vec<Document> {
        vec![Document {
            name: "history.txt".to_string(),
            text: "Contoso was founded in 1984.".to_string(),
        }]
    }

    #[tokio::test]
    async fn free_text_runs_the_completion_pipeline_with_context() {
        let tmp = tempfile::tempdir().unwrap();
        let assistant = assistant_with(tmp.path(), Box::new(EchoModel), sample_documents());
        let reply = assistant.handle("founded in 1984").await.unwrap();
        assert!(reply.contains("<context>Contoso was founded in 1984.</context>"));
        assert!(reply.ends_with("|founded in 1984"));
    }

    #[tokio::test]
    async fn free_text_without_match_omits_context() {
        let tmp = tempfile::tempdir().unwrap();
        let assistant = assistant_with(tmp.path(), Box::new(EchoModel), sample_documents());
        let reply = assistant.handle("completely unrelated").await.unwrap();
        assert!(!reply.contains("<context>"));
    }

    #[tokio::test]
    async fn read_file_returns_prefixed_contents() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "Hello").unwrap();
        let assistant = assistant_with(tmp.path(), Box::new(EchoModel), Vec::new());
        let reply = assistant.handle("read_file notes.txt").await.unwrap();
        assert_eq!(reply, "Contents of notes.txt:\nHello");
    }

    #[tokio::test]
    async fn read_file_missing_replies_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let assistant = assistant_with(tmp.path(), Box::new(EchoModel), Vec::new());
        let reply = assistant.handle("read_file missing.txt").await.unwrap();
        assert_eq!(reply, NOT_FOUND_REPLY);
    }

    #[tokio::test]
    async fn read_file_without_argument_replies_usage_hint() {
        let tmp = tempfile::tempdir().unwrap();
        let assistant = assistant_with(tmp.path(), Box::new(EchoModel), Vec::new());
        assert_eq!(assistant.handle("read_file").await.unwrap(), USAGE_REPLY);
        assert_eq!(assistant.handle("read_file   ").await.unwrap(), USAGE_REPLY);
    }

    #[tokio::test]
    async fn read_file_argument_may_contain_spaces() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("my notes.txt"), "spaced").unwrap();
        let assistant = assistant_with(tmp.path(), Box::new(EchoModel), Vec::new());
        let reply = assistant.handle("read_file my notes.txt").await.unwrap();
        assert_eq!(reply, "Contents of my notes.txt:\nspaced");
    }

    #[tokio::test]
    async fn completion_failure_propagates_as_turn_error() {
        let tmp = tempfile::tempdir().unwrap();
        let assistant = assistant_with(tmp.path(), Box::new(FailingModel), sample_documents());
        let err = assistant.handle("anything").await.unwrap_err();
        assert!(matches!(err, TurnError::Completion(_)));
    }

    #[tokio::test]
    async fn unrelated_prefix_is_not_a_command() {
        let tmp = tempfile::tempdir().unwrap();
        let assistant = assistant_with(tmp.path(), Box::new(EchoModel), Vec::new());
        // "read_filex" must fall through to the completion pipeline.
        let reply = assistant.handle("read_filex").await.unwrap();
        assert!(reply.ends_with("|read_filex"));
    }
}
