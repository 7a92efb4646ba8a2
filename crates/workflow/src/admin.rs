//! Administrative command handling.
//!
//! Fleet management (trucks, checklist items, driver assignment), the
//! review queue entry points, the recent-media feed, and simple
//! counts. The engine checks the allow-list before anything here runs.

use std::collections::HashMap;

use sqlx::SqlitePool;
use tokio::sync::RwLock;

use database::models::{STATUS_ACTIVE, STATUS_RETIRED};
use database::{check, checklist, driver, truck, MediaFeedItem, SkippedSummary};
use fleet_core::{AdminCommand, MediaKind, Notifier};

use crate::error::{Result, WorkflowError};
use crate::review::ReviewQueue;

/// Per-admin offset tracking for a "show more" feed, mirroring the
/// review queue's pagination discipline.
#[derive(Debug)]
struct FeedPager {
    offsets: RwLock<HashMap<String, i64>>,
    page_size: i64,
}

impl FeedPager {
    fn new(page_size: i64) -> Self {
        Self {
            offsets: RwLock::new(HashMap::new()),
            page_size,
        }
    }

    /// Reset the admin's walk and return the first page's offset.
    async fn first(&self, admin_id: &str) -> i64 {
        self.offsets
            .write()
            .await
            .insert(admin_id.to_string(), self.page_size);
        0
    }

    /// Return the offset where the admin's last page ended and advance
    /// past it.
    async fn next(&self, admin_id: &str) -> i64 {
        let offset = self
            .offsets
            .read()
            .await
            .get(admin_id)
            .copied()
            .unwrap_or(0);

        self.offsets
            .write()
            .await
            .insert(admin_id.to_string(), offset + self.page_size);
        offset
    }
}

/// Handler for the administrative command surface.
#[derive(Debug)]
pub struct AdminPanel {
    review: ReviewQueue,
    media: FeedPager,
    skipped: FeedPager,
}

impl AdminPanel {
    /// Create a panel whose review queue and feeds page at the given
    /// size.
    pub fn new(page_size: i64) -> Self {
        Self {
            review: ReviewQueue::new(page_size),
            media: FeedPager::new(page_size),
            skipped: FeedPager::new(page_size),
        }
    }

    /// The underlying review queue.
    pub fn review(&self) -> &ReviewQueue {
        &self.review
    }

    /// Execute one admin command, replying through the notifier.
    pub async fn handle<N: Notifier>(
        &self,
        pool: &SqlitePool,
        notifier: &N,
        admin_id: &str,
        command: AdminCommand,
    ) -> Result<()> {
        match command {
            AdminCommand::AddTruck { number, model } => {
                let number = require_non_empty(&number, "Truck number")?;
                let model = require_non_empty(&model, "Truck model")?;
                let id = truck::create_truck(pool, number, model).await?;
                notifier
                    .send_text(admin_id, &format!("Truck #{} added: {} ({})", id, number, model))
                    .await?;
            }

            AdminCommand::EditTruck { truck_id, model } => {
                let model = require_non_empty(&model, "Truck model")?;
                truck::update_model(pool, truck_id, model).await?;
                notifier
                    .send_text(admin_id, &format!("Truck #{} updated.", truck_id))
                    .await?;
            }

            AdminCommand::SetTruckStatus { truck_id, active } => {
                let status = if active { STATUS_ACTIVE } else { STATUS_RETIRED };
                truck::set_status(pool, truck_id, status).await?;
                notifier
                    .send_text(admin_id, &format!("Truck #{} is now {}.", truck_id, status))
                    .await?;
            }

            AdminCommand::DeleteTruck { truck_id } => {
                truck::delete_truck(pool, truck_id).await?;
                notifier
                    .send_text(
                        admin_id,
                        &format!("Truck #{} deleted along with its checklist items.", truck_id),
                    )
                    .await?;
            }

            AdminCommand::ListTrucks => {
                let trucks = truck::list_trucks(pool).await?;
                let text = if trucks.is_empty() {
                    "No trucks registered.".to_string()
                } else {
                    trucks
                        .iter()
                        .map(|t| format!("#{} {} - {} ({})", t.id, t.number, t.model, t.status))
                        .collect::<Vec<_>>()
                        .join("\n")
                };
                notifier.send_text(admin_id, &text).await?;
            }

            AdminCommand::AddItem {
                truck_id,
                description,
            } => {
                let description = require_non_empty(&description, "Item description")?;
                let id = checklist::create_item(pool, truck_id, description).await?;
                notifier
                    .send_text(
                        admin_id,
                        &format!("Item #{} added to truck #{}: {}", id, truck_id, description),
                    )
                    .await?;
            }

            AdminCommand::EditItem {
                item_id,
                description,
            } => {
                let description = require_non_empty(&description, "Item description")?;
                checklist::update_description(pool, item_id, description).await?;
                notifier
                    .send_text(admin_id, &format!("Item #{} updated.", item_id))
                    .await?;
            }

            AdminCommand::SetItemActive { item_id, active } => {
                checklist::set_active(pool, item_id, active).await?;
                let state = if active { "active" } else { "inactive" };
                notifier
                    .send_text(admin_id, &format!("Item #{} is now {}.", item_id, state))
                    .await?;
            }

            AdminCommand::ListItems { truck_id } => {
                let items = checklist::list_items(pool, truck_id).await?;
                let text = if items.is_empty() {
                    format!("Truck #{} has no checklist items.", truck_id)
                } else {
                    items
                        .iter()
                        .map(|i| {
                            let marker = if i.is_active { "" } else { " (inactive)" };
                            format!("#{} {}{}", i.id, i.description, marker)
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                };
                notifier.send_text(admin_id, &text).await?;
            }

            AdminCommand::AssignDriver {
                driver_id,
                truck_id,
            } => {
                // Verify the target truck before touching the driver so
                // a typo'd ID fails cleanly.
                if let Some(id) = truck_id {
                    truck::get_truck(pool, id).await?;
                }
                driver::assign_truck(pool, &driver_id, truck_id).await?;

                let text = match truck_id {
                    Some(id) => format!("Driver {} assigned to truck #{}.", driver_id, id),
                    None => format!("Driver {} unassigned.", driver_id),
                };
                notifier.send_text(admin_id, &text).await?;
            }

            AdminCommand::ListDrivers => {
                let drivers = driver::list_drivers(pool).await?;
                let text = if drivers.is_empty() {
                    "No drivers registered.".to_string()
                } else {
                    drivers
                        .iter()
                        .map(|d| {
                            let handle = d
                                .handle
                                .as_deref()
                                .map(|h| format!(" (@{})", h))
                                .unwrap_or_default();
                            let assignment = d
                                .truck_id
                                .map(|id| format!("truck #{}", id))
                                .unwrap_or_else(|| "unassigned".to_string());
                            format!("{}{} - {} [{}]", d.name, handle, assignment, d.status)
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                };
                notifier.send_text(admin_id, &text).await?;
            }

            AdminCommand::ListPending => {
                let page = self.review.first_page(pool, admin_id).await?;
                self.send_pending_page(notifier, admin_id, &page, "No pending submissions.")
                    .await?;
            }

            AdminCommand::ShowMorePending => {
                let page = self.review.next_page(pool, admin_id).await?;
                self.send_pending_page(notifier, admin_id, &page, "No more pending submissions.")
                    .await?;
            }

            AdminCommand::Decide { check_id, decision } => {
                self.review.decide(pool, notifier, check_id, decision).await?;
                notifier
                    .send_text(
                        admin_id,
                        &format!(
                            "Check #{} {}. The driver has been notified.",
                            check_id,
                            decision.as_status()
                        ),
                    )
                    .await?;
            }

            AdminCommand::Detail { check_id } => {
                self.review
                    .send_detail(pool, notifier, admin_id, check_id)
                    .await?;
            }

            AdminCommand::RecentMedia => {
                let offset = self.media.first(admin_id).await;
                let page = check::recent_media(pool, self.media.page_size, offset).await?;
                self.send_media_page(notifier, admin_id, &page, "No media submitted yet.")
                    .await?;
            }

            AdminCommand::MoreMedia => {
                let offset = self.media.next(admin_id).await;
                let page = check::recent_media(pool, self.media.page_size, offset).await?;
                self.send_media_page(notifier, admin_id, &page, "No more media.")
                    .await?;
            }

            AdminCommand::ListSkipped => {
                let offset = self.skipped.first(admin_id).await;
                let page = check::list_skipped(pool, self.skipped.page_size, offset).await?;
                self.send_skipped_page(notifier, admin_id, &page, "No skipped tasks.")
                    .await?;
            }

            AdminCommand::MoreSkipped => {
                let offset = self.skipped.next(admin_id).await;
                let page = check::list_skipped(pool, self.skipped.page_size, offset).await?;
                self.send_skipped_page(notifier, admin_id, &page, "No more skipped tasks.")
                    .await?;
            }

            AdminCommand::Stats => {
                let total = check::count_checks(pool).await?;
                let skipped = check::count_skipped(pool).await?;
                let pending = check::count_pending(pool).await?;
                let per_item = check::completions_by_item(pool).await?;

                let mut text = format!(
                    "Submissions: {} total, {} skipped, {} pending review.",
                    total, skipped, pending
                );
                if !per_item.is_empty() {
                    text.push_str("\n\nCompletions by task:");
                    for stat in per_item {
                        text.push_str(&format!("\n{}: {}", stat.description, stat.completions));
                    }
                }
                notifier.send_text(admin_id, &text).await?;
            }

            AdminCommand::WhoAmI => {
                notifier
                    .send_text(admin_id, &format!("Your ID: {}", admin_id))
                    .await?;
            }
        }

        Ok(())
    }

    async fn send_pending_page<N: Notifier>(
        &self,
        notifier: &N,
        admin_id: &str,
        page: &[database::PendingSummary],
        empty_text: &str,
    ) -> Result<()> {
        if page.is_empty() {
            notifier.send_text(admin_id, empty_text).await?;
            return Ok(());
        }

        let lines: Vec<String> = page
            .iter()
            .map(|s| {
                let task = s.item_description.as_deref().unwrap_or("(task removed)");
                let truck = s.truck_number.as_deref().unwrap_or("?");
                let kind = if s.skipped {
                    "skipped".to_string()
                } else {
                    format!("{} media", s.media_count)
                };
                format!(
                    "#{} {} / truck {} - {} ({}) at {}",
                    s.id, s.driver_name, truck, task, kind, s.created_at
                )
            })
            .collect();

        notifier.send_text(admin_id, &lines.join("\n")).await?;
        Ok(())
    }

    async fn send_skipped_page<N: Notifier>(
        &self,
        notifier: &N,
        admin_id: &str,
        page: &[SkippedSummary],
        empty_text: &str,
    ) -> Result<()> {
        if page.is_empty() {
            notifier.send_text(admin_id, empty_text).await?;
            return Ok(());
        }

        for entry in page {
            let task = entry.item_description.as_deref().unwrap_or("(task removed)");
            let reason = match (&entry.reason_text, &entry.reason_voice) {
                (Some(text), _) => format!("\nReason: {}", text),
                (None, Some(_)) => "\nReason: voice note follows".to_string(),
                (None, None) => "\nNo reason given.".to_string(),
            };
            let text = format!(
                "#{} {} skipped {} ({}) at {}{}",
                entry.id, entry.driver_name, task, entry.status, entry.created_at, reason
            );
            notifier.send_text(admin_id, &text).await?;

            if let Some(voice_ref) = &entry.reason_voice {
                notifier
                    .send_voice(admin_id, voice_ref, Some("Skip reason (voice)"))
                    .await?;
            }
        }

        Ok(())
    }

    async fn send_media_page<N: Notifier>(
        &self,
        notifier: &N,
        admin_id: &str,
        page: &[MediaFeedItem],
        empty_text: &str,
    ) -> Result<()> {
        if page.is_empty() {
            notifier.send_text(admin_id, empty_text).await?;
            return Ok(());
        }

        for item in page {
            let task = item.item_description.as_deref().unwrap_or("(task removed)");
            let caption = format!("{} - {} - {}", item.driver_name, task, item.created_at);
            let kind = MediaKind::from_str(&item.kind).unwrap_or(MediaKind::Photo);
            notifier
                .send_media(admin_id, &item.file_ref, kind, Some(&caption))
                .await?;
        }

        Ok(())
    }
}

fn require_non_empty<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(WorkflowError::Validation(format!(
            "{} cannot be empty.",
            field
        )));
    }
    Ok(trimmed)
}
