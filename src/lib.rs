//! cardforge - AI Flashcard Generation and Unification Engine
//!
//! Turns a free-text topic request into a validated, deduplicated,
//! categorized persistent record, degrading gracefully across an unreliable
//! upstream generation provider and tolerating concurrent writers.
//!
//! ## Core Features
//!
//! - **Model Fallback**: ordered candidate list with rotate-on-rate-limit,
//!   abort-on-anything-else routing
//! - **Incremental Parsing**: best-effort structural parsing of a streaming
//!   JSON document, publishing fully-formed items early
//! - **Category Resolution**: translate/slugify/find-or-create taxonomy
//!   entries, tolerant of creation races
//! - **Unification**: identity-keyed merge of fresh content into the
//!   earliest-created record per topic, plus an idempotent consolidation job
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use cardforge::{Database, GeminiProvider, FallbackController};
//! use cardforge::service::{GenerationService, GenerationRequest, TopicCache};
//!
//! let db = Arc::new(Database::open(".cardforge/cardforge.db")?);
//! db.initialize()?;
//! let provider = Arc::new(GeminiProvider::new(&config.llm)?);
//! let service = GenerationService::new(db, provider, controller, "Vietnamese");
//! let outcome = service
//!     .generate(&GenerationRequest::new("Rust Ownership"), &mut TopicCache::default())
//!     .await?;
//! ```
//!
//! ## Modules
//!
//! - [`provider`]: generation provider trait, fallback controller, retry policy
//! - [`parser`]: tolerant partial parsing and incremental stream parsing
//! - [`category`]: label normalization, slugs, taxonomy resolution
//! - [`service`]: generation pipeline, merge engine, maintenance jobs
//! - [`store`]: SQLite persistence with connection pooling

pub mod category;
pub mod cli;
pub mod config;
pub mod constants;
pub mod parser;
pub mod provider;
pub mod service;
pub mod store;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, LlmConfig};

// Error Types
pub use types::error::{CardforgeError, ProviderErrorKind, Result, ResultExt};

// Domain Types
pub use types::{Category, FlashcardItem, FlashcardSet, GenerationPayload};

// Storage
pub use store::{CategoryStore, Database, PoolConfig, SetStore, SharedDatabase};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use service::{
    BackfillJob, GenerationOutcome, GenerationRequest, GenerationService, MergeEngine,
    MergeRequest, TopicCache, consolidate, sync_categories,
};

// =============================================================================
// Provider Re-exports
// =============================================================================

pub use provider::{
    FallbackController, GeminiProvider, GenerationProvider, RetryPolicy, RetryState,
    SharedProvider,
};

// =============================================================================
// Parser Re-exports
// =============================================================================

pub use parser::{Snapshot, StreamParser, parse_partial, parse_payload};
