//! # DocDesk
//!
//! A repository-backed document assistant for chat surfaces.
//!
//! DocDesk mirrors a remote git repository of documents (plain text and
//! PDF), ingests the top-level files into an in-memory collection, and
//! answers chat messages by substring/keyword retrieval over that
//! collection feeding a chat-completion endpoint. Two command messages
//! bypass the AI pipeline: `update_repo` re-syncs the mirror (and
//! re-ingests it), `read_file <path>` returns a raw file.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌────────────┐
//! │  Mirror   │──▶│ Ingest  │──▶│ Collection │
//! │ (git)    │   │ txt/PDF │   │ (memory)   │
//! └──────────┘   └─────────┘   └─────┬──────┘
//!                                    │ render(query)
//!                      ┌─────────────┴──────┐
//!                      ▼                    ▼
//!                 ┌──────────┐       ┌───────────┐
//!                 │   CLI    │       │   HTTP    │
//!                 │  (desk)  │       │ /messages │──▶ completion endpoint
//!                 └──────────┘       └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! desk sync                     # clone or pull the document mirror
//! desk render "health plan"     # preview retrieved context
//! desk ask "what does PerksPlus cover?"
//! desk serve                    # start the chat HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`mirror`] | Git mirror (clone/pull, file read) |
//! | [`extract`] | PDF text and table extraction |
//! | [`ingest`] | Top-level document ingestion |
//! | [`retrieve`] | Substring + keyword-fallback rendering |
//! | [`completion`] | Chat-completion endpoint abstraction |
//! | [`turn`] | Message dispatch and shared state |
//! | [`server`] | HTTP boundary |
//! | [`error`] | Typed error taxonomy |

pub mod completion;
pub mod config;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod mirror;
pub mod models;
pub mod retrieve;
pub mod server;
pub mod turn;
