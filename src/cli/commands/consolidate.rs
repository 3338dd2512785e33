//! Consolidate Command
//!
//! Privileged: fold duplicate records per topic key into their
//! earliest-created survivor.

use crate::cli::output::Output;
use crate::cli::util::CommandContext;
use crate::service::{GroupStatus, consolidate};
use crate::types::Result;

pub fn run(as_json: bool) -> Result<()> {
    let out = Output::new();
    let ctx = CommandContext::load()?;

    let report = consolidate(&ctx.db)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    out.section("Consolidation");
    println!("Topic groups found: {}", report.groups_found);
    println!("Groups merged:      {}", report.merged_groups);

    for outcome in &report.outcomes {
        match outcome.status {
            GroupStatus::Merged => out.success(&format!(
                "'{}': folded {} records into 1 ({} items)",
                outcome.key, outcome.merged_count, outcome.total_items
            )),
            GroupStatus::Partial => out.warning(&format!(
                "'{}': merged but duplicates not deleted, rerun to retry ({})",
                outcome.key,
                outcome.error.as_deref().unwrap_or("unknown error")
            )),
            GroupStatus::Error => out.error(&format!(
                "'{}': merge failed ({})",
                outcome.key,
                outcome.error.as_deref().unwrap_or("unknown error")
            )),
        }
    }

    if report.outcomes.is_empty() {
        out.info("No duplicate groups; store already consolidated");
    }

    Ok(())
}
