//! Generate Command
//!
//! Drive one generation request through the full pipeline, retrying with a
//! visible countdown when every model candidate is exhausted.

use std::time::Duration;

use console::style;
use tokio::time::sleep;

use crate::cli::output::Output;
use crate::cli::util::CommandContext;
use crate::parser::Snapshot;
use crate::provider::{RetryPolicy, RetryState};
use crate::service::{GenerationOutcome, GenerationRequest, GenerationService, TopicCache};
use crate::types::Result;

pub struct GenerateOptions {
    pub topic: String,
    pub count: Option<usize>,
    pub category: Option<String>,
    pub contributor: Option<String>,
    pub stream: bool,
}

pub async fn run(options: GenerateOptions) -> Result<()> {
    let out = Output::new();
    let ctx = CommandContext::load()?;

    let service = GenerationService::new(
        ctx.db.clone(),
        ctx.provider()?,
        ctx.fallback_controller(),
        ctx.config.generation.language.clone(),
    );

    let request = GenerationRequest {
        topic: options.topic.clone(),
        count: options.count.unwrap_or(ctx.config.generation.item_count),
        category_label: options.category,
        contributor_id: options.contributor,
    };

    let mut cache = TopicCache::default();
    let policy = RetryPolicy::default();
    let mut retry = RetryState::idle();

    let outcome = loop {
        let attempt = if options.stream {
            let mut published = 0usize;
            service
                .generate_streaming(&request, &mut cache, |snapshot: &Snapshot| {
                    render_snapshot(snapshot, &mut published);
                })
                .await
        } else {
            service.generate(&request, &mut cache).await
        };

        match attempt {
            Ok(outcome) => {
                retry.settle();
                break outcome;
            }
            Err(err) if policy.should_retry(&err, retry.attempt_count) => {
                let delay = policy.delay_for(retry.attempt_count);
                retry.begin_wait(delay);
                out.warning(&format!(
                    "{} Retrying in {}s (attempt {})",
                    err,
                    retry.remaining.as_secs(),
                    retry.attempt_count + 1
                ));
                while retry.remaining > Duration::ZERO {
                    sleep(Duration::from_secs(1)).await;
                    retry.tick(Duration::from_secs(1));
                }
            }
            Err(err) => return Err(err),
        }
    };

    render_outcome(&out, &outcome);
    Ok(())
}

/// Print only the items that appeared since the previous snapshot. Earlier
/// entries are already on screen; a trailing entry still being revised is
/// reprinted on the next growth.
fn render_snapshot(snapshot: &Snapshot, published: &mut usize) {
    if snapshot.items.len() > *published {
        for item in &snapshot.items[*published..] {
            println!("  {} {}", style("▸").cyan(), item.front);
        }
        *published = snapshot.items.len();
    }
}

fn render_outcome(out: &Output, outcome: &GenerationOutcome) {
    out.header(&outcome.normalized_topic);
    if let Some(category) = &outcome.category {
        println!("Category: {}", category);
    }

    for (i, item) in outcome.items.iter().enumerate() {
        println!();
        println!("{}. {}", i + 1, style(&item.front).bold());
        println!("   {}", item.back);
    }
    println!();

    if outcome.from_store {
        out.info("Served from existing records (no generation needed)");
    } else if let Some(model) = &outcome.model {
        out.info(&format!("Generated by {}", model));
    }

    match (&outcome.set_id, &outcome.persistence_error) {
        (Some(_), _) if !outcome.from_store => out.success("Saved"),
        (None, Some(err)) => {
            out.warning("Generated content could not be saved; items shown above are not lost");
            out.error(err);
        }
        _ => {}
    }
}
