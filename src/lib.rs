//! # Documenter
//!
//! Reads a manifest of source files from a hosted repository, fetches each
//! file's raw content, asks a chat-completion model for the file's language
//! and a plain-language summary, and stores one record per file in a
//! document store.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌───────────────┐   ┌──────────┐
//! │ Manifest │──▶│ Raw fetch    │──▶│ Classify +    │──▶│ MongoDB  │
//! │  (YAML)  │   │ + SHA-256    │   │ Summarize LLM │   │ upsert   │
//! └──────────┘   └──────────────┘   └───────────────┘   └──────────┘
//!                         ▲
//!                  ┌──────┴──────┐
//!                  │ HTTP / CLI  │
//!                  └─────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML + environment configuration |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Records and requests |
//! | [`remote`] | Raw URL mapping and fetching |
//! | [`manifest`] | Manifest loading and validation |
//! | [`hash`] | Content fingerprinting |
//! | [`llm`] | Chat-completion client |
//! | [`classify`] | Language detection |
//! | [`summarize`] | Code summaries and the system-role template |
//! | [`store`] | Record store trait and backends |
//! | [`pipeline`] | Orchestration of one analysis run |
//! | [`server`] | HTTP endpoints |

pub mod classify;
pub mod config;
pub mod error;
pub mod hash;
pub mod llm;
pub mod manifest;
pub mod models;
pub mod pipeline;
pub mod remote;
pub mod server;
pub mod store;
pub mod summarize;
