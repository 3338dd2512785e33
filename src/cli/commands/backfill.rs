//! Backfill Command
//!
//! Privileged: categorize records whose category is missing or still the
//! sentinel, one provider call per record.

use std::time::Duration;

use crate::cli::output::Output;
use crate::cli::util::CommandContext;
use crate::service::{BackfillJob, BackfillStatus};
use crate::types::Result;

pub async fn run(limit: Option<usize>, as_json: bool) -> Result<()> {
    let out = Output::new();
    let ctx = CommandContext::load()?;

    let job = BackfillJob::new(
        ctx.db.clone(),
        ctx.provider()?,
        ctx.fallback_controller(),
        Duration::from_secs(ctx.config.backfill.item_delay_secs),
    );

    let limit = limit.unwrap_or(ctx.config.backfill.batch_limit);
    let report = job.run(limit).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    out.section("Category Backfill");
    if report.scanned == 0 {
        out.info("No uncategorized records found. All done!");
        return Ok(());
    }

    for record in &report.records {
        match record.status {
            BackfillStatus::Updated => out.success(&format!(
                "'{}' -> '{}' (via {})",
                record.topic,
                record.category.as_deref().unwrap_or("?"),
                record.model.as_deref().unwrap_or("?")
            )),
            BackfillStatus::Failed => out.error(&format!(
                "'{}': {}",
                record.topic,
                record.error.as_deref().unwrap_or("unknown error")
            )),
            BackfillStatus::RateLimited => out.warning(&format!(
                "'{}': all models rate-limited, run again later",
                record.topic
            )),
        }
    }

    if report.stopped_early {
        out.warning(&format!(
            "Stopped early to preserve quota. Processed {} of {} records.",
            report.records.len(),
            report.scanned
        ));
    }

    Ok(())
}
