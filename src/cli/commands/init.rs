//! Init Command
//!
//! Initialize cardforge in the current directory.

use crate::config::ConfigLoader;
use crate::store::Database;
use crate::types::{CardforgeError, Result};

pub fn run(force: bool) -> Result<()> {
    let cardforge_dir = std::path::PathBuf::from(crate::cli::util::CARDFORGE_DIR);

    if cardforge_dir.exists() && !force {
        return Err(CardforgeError::Config(
            "Already initialized. Use --force to overwrite.".to_string(),
        ));
    }

    ConfigLoader::init_project()?;

    // Initialize global config if not exists (don't force overwrite)
    if let Err(e) = ConfigLoader::init_global(false) {
        tracing::debug!("Global config init skipped: {}", e);
    }

    let config = ConfigLoader::load()?;
    let db = Database::open(&config.database.path)?;
    db.initialize()?;

    println!("✓ Initialized cardforge in .cardforge/");
    println!();
    println!("Next steps:");
    println!("  1. Set GEMINI_API_KEY in your environment");
    println!("  2. Run 'cardforge generate <topic>' to create your first flashcard set");

    Ok(())
}
