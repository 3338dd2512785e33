//! Sync-Categories Command
//!
//! Privileged: create missing taxonomy rows, correct sentinel rows, and
//! re-link records that carry a label without a taxonomy id.

use crate::cli::output::Output;
use crate::cli::util::CommandContext;
use crate::service::sync_categories;
use crate::types::Result;

pub fn run(as_json: bool) -> Result<()> {
    let out = Output::new();
    let ctx = CommandContext::load()?;

    let report = sync_categories(&ctx.db)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    out.section("Category Sync");
    println!("Records scanned:      {}", report.sets_scanned);
    println!("Categories created:   {}", report.categories_created);
    println!("Categories corrected: {}", report.categories_corrected);
    println!("Records re-linked:    {}", report.sets_relinked);

    for failure in &report.failures {
        out.error(&format!(
            "set {} ('{}'): {}",
            failure.set_id, failure.category, failure.error
        ));
    }

    if report.failures.is_empty() {
        out.success("Sync completed");
    } else {
        out.warning("Sync completed with failures; rerun to retry the failed subset");
    }

    Ok(())
}
