//! Category Backfill Job
//!
//! Batch categorization of records whose category is missing or still the
//! uncategorized sentinel. Each record gets one fallback-controlled provider
//! call asking for a short category label. A fixed inter-item delay shapes
//! request rate against provider quota; it is not retry backoff.
//!
//! Outcomes are reported per record. Exhaustion of the candidate list on any
//! record stops the rest of the batch: the remaining records would only burn
//! an already-exhausted quota.

use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::category::{CategoryResolver, UNCATEGORIZED_NAME};
use crate::constants::backfill::LABEL_MAX_LEN;
use crate::provider::{FallbackController, SharedProvider};
use crate::store::{SetStore, SharedDatabase};
use crate::types::{CardforgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackfillStatus {
    Updated,
    Failed,
    /// Every model candidate was rate-limited; run again later
    RateLimited,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackfillRecord {
    pub id: String,
    pub topic: String,
    pub category: Option<String>,
    pub model: Option<String>,
    pub status: BackfillStatus,
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct BackfillReport {
    pub scanned: usize,
    /// The batch was cut short because the candidate list was exhausted
    pub stopped_early: bool,
    pub records: Vec<BackfillRecord>,
}

pub struct BackfillJob {
    db: SharedDatabase,
    provider: SharedProvider,
    controller: FallbackController,
    item_delay: Duration,
}

impl BackfillJob {
    pub fn new(
        db: SharedDatabase,
        provider: SharedProvider,
        controller: FallbackController,
        item_delay: Duration,
    ) -> Self {
        Self {
            db,
            provider,
            controller,
            item_delay,
        }
    }

    /// Process up to `limit` uncategorized records.
    pub async fn run(&self, limit: usize) -> Result<BackfillReport> {
        let sets = SetStore::new(&self.db);
        let targets = sets.find_uncategorized(UNCATEGORIZED_NAME, limit)?;

        let mut report = BackfillReport {
            scanned: targets.len(),
            ..Default::default()
        };

        for (i, mut set) in targets.into_iter().enumerate() {
            // Cooldown between records, skipped for the first
            if i > 0 && !self.item_delay.is_zero() {
                sleep(self.item_delay).await;
            }

            let topic = if set.normalized_topic.trim().is_empty() {
                set.topic.clone()
            } else {
                set.normalized_topic.clone()
            };
            let prompt = categorize_prompt(&topic);

            match self.controller.generate(self.provider.as_ref(), &prompt).await {
                Ok((text, model)) => {
                    let label = sanitize_label(&text);
                    if label.is_empty() {
                        report.records.push(BackfillRecord {
                            id: set.id,
                            topic,
                            category: None,
                            model: Some(model),
                            status: BackfillStatus::Failed,
                            error: Some("empty label from model".to_string()),
                        });
                        continue;
                    }

                    let record = match self.apply_label(&sets, &mut set, &label) {
                        Ok(canonical) => {
                            info!(topic = %topic, category = %canonical, model = %model, "Backfilled category");
                            BackfillRecord {
                                id: set.id.clone(),
                                topic,
                                category: Some(canonical),
                                model: Some(model),
                                status: BackfillStatus::Updated,
                                error: None,
                            }
                        }
                        Err(e) => BackfillRecord {
                            id: set.id.clone(),
                            topic,
                            category: Some(label),
                            model: Some(model),
                            status: BackfillStatus::Failed,
                            error: Some(e.to_string()),
                        },
                    };
                    report.records.push(record);
                }
                Err(CardforgeError::ProviderExhausted { last }) => {
                    warn!(topic = %topic, "Candidate list exhausted, stopping batch early");
                    report.records.push(BackfillRecord {
                        id: set.id,
                        topic,
                        category: None,
                        model: None,
                        status: BackfillStatus::RateLimited,
                        error: Some(last.to_string()),
                    });
                    report.stopped_early = true;
                    break;
                }
                Err(e) => {
                    report.records.push(BackfillRecord {
                        id: set.id,
                        topic,
                        category: None,
                        model: None,
                        status: BackfillStatus::Failed,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(report)
    }

    fn apply_label(
        &self,
        sets: &SetStore<'_>,
        set: &mut crate::types::FlashcardSet,
        label: &str,
    ) -> Result<String> {
        let resolved = CategoryResolver::new(&self.db).resolve(Some(label))?;
        set.category = Some(resolved.name.clone());
        set.category_id = Some(resolved.id);
        sets.update(set)?;
        Ok(resolved.name)
    }
}

fn categorize_prompt(topic: &str) -> String {
    format!(
        r#"Categorize this study topic into a short 1-2 word Vietnamese category label.
Examples: Công nghệ, Y tế, Lịch sử, Ngôn ngữ, Khoa học, Địa lý, Kinh doanh, Toán học.
Topic: "{topic}"
Return ONLY the category label. No punctuation, no markdown."#
    )
}

/// Strip quotes and periods, trim, and bound the length.
fn sanitize_label(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '"' && *c != '.' && *c != '`')
        .collect();
    cleaned.trim().chars().take(LABEL_MAX_LEN).collect()
}
