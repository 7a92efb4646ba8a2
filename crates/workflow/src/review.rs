//! Review and approval workflow.
//!
//! Admin-facing queue over pending check records: offset-paginated
//! listing, the guarded approve/reject transition, and per-record
//! drill-down. Decisions are durable first; notifying the submitting
//! driver is best-effort.

use std::collections::HashMap;

use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::warn;

use database::models::{KIND_COMMENT, KIND_SKIP_REASON};
use database::{check, checklist, driver, DatabaseError, PendingSummary};
use fleet_core::{Decision, MediaKind, Notifier};

use crate::error::Result;

/// Admin review queue with per-admin pagination state.
#[derive(Debug)]
pub struct ReviewQueue {
    /// Offset into the pending queue per admin identity. Advances by
    /// the page size on each continuation and resets when the admin
    /// re-enters the queue view.
    offsets: RwLock<HashMap<String, i64>>,
    page_size: i64,
}

impl ReviewQueue {
    /// Create a queue with the given page size.
    pub fn new(page_size: i64) -> Self {
        Self {
            offsets: RwLock::new(HashMap::new()),
            page_size,
        }
    }

    /// Enter the queue view: reset the admin's offset and return the
    /// first page, most recent first.
    pub async fn first_page(
        &self,
        pool: &SqlitePool,
        admin_id: &str,
    ) -> Result<Vec<PendingSummary>> {
        let page = check::list_pending(pool, self.page_size, 0).await?;
        self.offsets
            .write()
            .await
            .insert(admin_id.to_string(), self.page_size);
        Ok(page)
    }

    /// Continue from where the admin's last page ended.
    pub async fn next_page(
        &self,
        pool: &SqlitePool,
        admin_id: &str,
    ) -> Result<Vec<PendingSummary>> {
        let offset = self
            .offsets
            .read()
            .await
            .get(admin_id)
            .copied()
            .unwrap_or(0);

        let page = check::list_pending(pool, self.page_size, offset).await?;
        self.offsets
            .write()
            .await
            .insert(admin_id.to_string(), offset + self.page_size);
        Ok(page)
    }

    /// Approve or reject a pending check record, then notify the
    /// submitting driver.
    ///
    /// The status transition is the durable source of truth: it is
    /// guarded against double decisions at the store, and a failed
    /// notification is logged without rolling it back.
    pub async fn decide<N: Notifier>(
        &self,
        pool: &SqlitePool,
        notifier: &N,
        check_id: i64,
        decision: Decision,
    ) -> Result<()> {
        let record = check::get_check(pool, check_id).await?;

        check::decide(pool, check_id, decision.as_status()).await?;

        let item_label = item_label(pool, record.item_id).await;
        let verdict = match decision {
            Decision::Approve => "approved",
            Decision::Reject => "rejected",
        };
        let text = format!("Your submission for \"{}\" was {}.", item_label, verdict);

        if let Err(e) = notifier.send_text(&record.driver_id, &text).await {
            warn!(
                "Failed to notify driver {} about check {}: {}",
                record.driver_id, check_id, e
            );
        }

        Ok(())
    }

    /// Send the full drill-down for one check record to an admin:
    /// caption, attached media, comment, and skip reason.
    pub async fn send_detail<N: Notifier>(
        &self,
        pool: &SqlitePool,
        notifier: &N,
        admin_id: &str,
        check_id: i64,
    ) -> Result<()> {
        let record = check::get_check(pool, check_id).await?;
        let attachments = check::attachments_for(pool, check_id).await?;
        let annotations = check::annotations_for(pool, check_id).await?;

        let submitter = match driver::get_driver(pool, &record.driver_id).await {
            Ok(d) => match d.handle {
                Some(handle) => format!("{} (@{})", d.name, handle),
                None => d.name,
            },
            Err(_) => record.driver_id.clone(),
        };

        let mut caption = format!(
            "Check #{} by {}\nTask: {}\nStatus: {}{}\nSubmitted: {}",
            record.id,
            submitter,
            item_label(pool, record.item_id).await,
            record.status,
            if record.skipped { " (task skipped)" } else { "" },
            record.created_at,
        );

        for annotation in &annotations {
            if annotation.kind == KIND_COMMENT {
                if let Some(text) = &annotation.text {
                    caption.push_str(&format!("\nComment: {}", text));
                }
            } else if annotation.kind == KIND_SKIP_REASON {
                if let Some(text) = &annotation.text {
                    caption.push_str(&format!("\nSkip reason: {}", text));
                }
            }
        }

        match attachments.len() {
            0 => notifier.send_text(admin_id, &caption).await?,
            1 => {
                let kind = MediaKind::from_str(&attachments[0].kind).unwrap_or(MediaKind::Photo);
                notifier
                    .send_media(admin_id, &attachments[0].file_ref, kind, Some(&caption))
                    .await?;
            }
            _ => {
                let items: Vec<(MediaKind, String)> = attachments
                    .iter()
                    .map(|a| {
                        (
                            MediaKind::from_str(&a.kind).unwrap_or(MediaKind::Photo),
                            a.file_ref.clone(),
                        )
                    })
                    .collect();
                notifier
                    .send_media_group(admin_id, &items, Some(&caption))
                    .await?;
            }
        }

        // Voice annotations stream separately.
        for annotation in &annotations {
            if let Some(voice_ref) = &annotation.voice_ref {
                let label = if annotation.kind == KIND_SKIP_REASON {
                    "Skip reason (voice)"
                } else {
                    "Comment (voice)"
                };
                notifier
                    .send_voice(admin_id, voice_ref, Some(label))
                    .await?;
            }
        }

        Ok(())
    }
}

/// Item description for captions; deleted items fall back to the ID.
async fn item_label(pool: &SqlitePool, item_id: i64) -> String {
    match checklist::get_item(pool, item_id).await {
        Ok(item) => item.description,
        Err(DatabaseError::NotFound { .. }) => format!("task #{}", item_id),
        Err(e) => {
            warn!("Failed to load item {} for caption: {}", item_id, e);
            format!("task #{}", item_id)
        }
    }
}
