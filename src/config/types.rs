//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/cardforge/) and project (.cardforge/) level
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{backfill, fallback, generation, network};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Generation provider settings
    pub llm: LlmConfig,

    /// Generation request defaults
    pub generation: GenerationConfig,

    /// Category backfill job settings
    pub backfill: BackfillConfig,

    /// Storage settings
    pub database: DatabaseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            generation: GenerationConfig::default(),
            backfill: BackfillConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> crate::types::Result<()> {
        if self.llm.models.is_empty() {
            return Err(crate::types::CardforgeError::Config(
                "llm.models must list at least one candidate".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(crate::types::CardforgeError::Config(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.generation.item_count == 0 {
            return Err(crate::types::CardforgeError::Config(
                "generation.item_count must be greater than 0".to_string(),
            ));
        }

        if self.backfill.batch_limit == 0 {
            return Err(crate::types::CardforgeError::Config(
                "backfill.batch_limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Provider Configuration
// =============================================================================

/// Generation provider settings.
///
/// `models` is the ordered candidate list the fallback controller walks,
/// highest priority first.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider type (currently "gemini")
    pub provider: String,

    /// Ordered model candidates, tried in priority order
    pub models: Vec<String>,

    /// API key; never serialized to output
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Fixed pause before rotating to the next candidate (milliseconds)
    pub rotation_delay_ms: u64,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("models", &self.models)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("rotation_delay_ms", &self.rotation_delay_ms)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            models: fallback::DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            api_key: None,
            api_base: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            rotation_delay_ms: fallback::ROTATION_DELAY_MS,
        }
    }
}

// =============================================================================
// Generation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Flashcards per request when the caller does not specify a count
    pub item_count: usize,

    /// Output language for generated content
    pub language: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            item_count: generation::DEFAULT_ITEM_COUNT,
            language: "Vietnamese".to_string(),
        }
    }
}

// =============================================================================
// Backfill Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillConfig {
    /// Records processed per execution
    pub batch_limit: usize,

    /// Fixed cooldown between records (seconds)
    pub item_delay_secs: u64,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            batch_limit: backfill::DEFAULT_BATCH_LIMIT,
            item_delay_secs: backfill::ITEM_DELAY_SECS,
        }
    }
}

// =============================================================================
// Database Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file path, relative to the project root
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".cardforge/cardforge.db"),
        }
    }
}
