//! Typed errors for the mirror, ingestion, completion, and turn layers.
//!
//! Every turn-level failure funnels into [`TurnError`]; the boundary adapter
//! (HTTP server or CLI) is responsible for converting it into the single
//! fixed user-facing fault reply after logging the full chain.

use std::path::PathBuf;
use thiserror::Error;

/// Clone/pull failure. Never retried automatically.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to run git (is git installed?): {0}")]
    Spawn(#[source] std::io::Error),

    #[error("git {command} failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("git {command} timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("failed to create mirror directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-file ingestion failure. Logged and skipped; never aborts a load.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF extraction failed for {name}: {message}")]
    Pdf { name: String, message: String },
}

/// Completion endpoint failure, including bounded-timeout expiry.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("API key environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion endpoint returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("completion endpoint returned no message content")]
    EmptyResponse,

    #[error("completion failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

/// Umbrella error for one conversational turn.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
