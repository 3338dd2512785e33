//! CLI Common Utilities
//!
//! Shared initialization and context management for CLI commands.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, ConfigLoader};
use crate::provider::{FallbackController, GeminiProvider, SharedProvider};
use crate::store::{Database, SharedDatabase};
use crate::types::{CardforgeError, Result};

/// cardforge directory name
pub const CARDFORGE_DIR: &str = ".cardforge";

/// Command execution context
///
/// Provides unified access to common resources needed by CLI commands.
pub struct CommandContext {
    /// cardforge directory path (.cardforge)
    pub cardforge_dir: PathBuf,
    /// Shared database handle
    pub db: SharedDatabase,
    /// Loaded configuration
    pub config: Config,
}

impl CommandContext {
    /// Load full command context: validates initialization, loads config,
    /// and opens the database.
    pub fn load() -> Result<Self> {
        let cardforge_dir = require_initialized()?;
        let config = ConfigLoader::load()?;
        let db = Database::open(&config.database.path)?;
        db.initialize()?;

        Ok(Self {
            cardforge_dir,
            db: Arc::new(db),
            config,
        })
    }

    /// Build the generation provider from configuration.
    pub fn provider(&self) -> Result<SharedProvider> {
        match self.config.llm.provider.as_str() {
            "gemini" => Ok(Arc::new(GeminiProvider::new(&self.config.llm)?)),
            other => Err(CardforgeError::Config(format!(
                "Unknown provider: {}. Supported: gemini",
                other
            ))),
        }
    }

    /// Build the fallback controller from the configured candidate list.
    pub fn fallback_controller(&self) -> FallbackController {
        FallbackController::new(
            self.config.llm.models.clone(),
            Duration::from_millis(self.config.llm.rotation_delay_ms),
        )
    }
}

/// Ensure the project is initialized, returning the project directory.
pub fn require_initialized() -> Result<PathBuf> {
    let dir = PathBuf::from(CARDFORGE_DIR);
    if !dir.exists() {
        return Err(CardforgeError::NotInitialized);
    }
    Ok(dir)
}
