//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Model fallback controller constants
pub mod fallback {
    /// Fixed pause before rotating to the next candidate after a
    /// rate-limit or availability failure (milliseconds)
    pub const ROTATION_DELAY_MS: u64 = 2_000;

    /// Default ordered model candidate list, highest priority first
    pub const DEFAULT_MODELS: &[&str] = &[
        "gemini-3-flash-preview",
        "gemini-2.5-flash",
        "gemini-2.5-flash-lite",
        "gemma-3-27b-it",
    ];
}

/// Retry policy constants (caller-side, across whole requests)
pub mod retry {
    /// Delay schedule in seconds; attempts beyond the schedule reuse the last entry
    pub const DELAY_SCHEDULE_SECS: &[u64] = &[2, 5, 10, 15, 20];

    /// Maximum retries for a retryable request
    pub const MAX_RETRIES: u32 = 5;
}

/// Generation request constants
pub mod generation {
    /// Default number of flashcards per request
    pub const DEFAULT_ITEM_COUNT: usize = 5;
}

/// Category backfill job constants
pub mod backfill {
    /// Records processed per execution
    pub const DEFAULT_BATCH_LIMIT: usize = 3;

    /// Fixed cooldown between records (seconds). Rate shaping against
    /// provider quota, not retry backoff.
    pub const ITEM_DELAY_SECS: u64 = 7;

    /// Maximum length of a model-produced category label
    pub const LABEL_MAX_LEN: usize = 50;
}

/// Session cache constants
pub mod cache {
    /// Maximum entries in the per-session topic cache
    pub const MAX_TOPIC_CACHE_ENTRIES: usize = 64;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;
}
