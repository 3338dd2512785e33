//! Service Layer
//!
//! Orchestration over the provider, parser, category, and store components:
//! the generation pipeline, the unification merge engine, and the privileged
//! maintenance jobs (consolidation, category sync, backfill).

pub mod backfill;
pub mod cache;
pub mod consolidate;
pub mod generate;
pub mod merge;
pub mod sync;

pub use backfill::{BackfillJob, BackfillRecord, BackfillReport, BackfillStatus};
pub use cache::TopicCache;
pub use consolidate::{ConsolidationReport, GroupOutcome, GroupStatus, consolidate};
pub use generate::{GenerationOutcome, GenerationRequest, GenerationService};
pub use merge::{MergeEngine, MergeRequest};
pub use sync::{SyncReport, sync_categories};
