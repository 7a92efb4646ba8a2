//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Check record status: awaiting review.
pub const STATUS_PENDING: &str = "pending";
/// Check record status: accepted by an admin.
pub const STATUS_APPROVED: &str = "approved";
/// Check record status: rejected by an admin.
pub const STATUS_REJECTED: &str = "rejected";

/// Truck or driver status: in service.
pub const STATUS_ACTIVE: &str = "active";
/// Truck or driver status: out of service.
pub const STATUS_RETIRED: &str = "retired";

/// Annotation kind: commentary on a completed task.
pub const KIND_COMMENT: &str = "comment";
/// Annotation kind: the stated reason a task was skipped.
pub const KIND_SKIP_REASON: &str = "skip_reason";

/// A tracked vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Truck {
    /// Auto-incrementing ID.
    pub id: i64,
    /// External fleet number (unique).
    pub number: String,
    /// Vehicle model description.
    pub model: String,
    /// "active" or "retired".
    pub status: String,
}

/// A driver, identified by their chat identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Driver {
    /// Chat identity (e.g. a Telegram user ID or Signal UUID).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional handle (e.g. @username).
    pub handle: Option<String>,
    /// Currently assigned truck, if any.
    pub truck_id: Option<i64>,
    /// "active" or "retired".
    pub status: String,
}

/// A recurring inspection task scoped to one truck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ChecklistItem {
    /// Auto-incrementing ID; ascending ID is the walk order.
    pub id: i64,
    /// Owning truck.
    pub truck_id: i64,
    /// What to inspect.
    pub description: String,
    /// Whether the item is part of the current checklist.
    pub is_active: bool,
}

/// One driver's submission (or skip) against one checklist item.
///
/// `truck_id` and `item_id` are snapshots taken at submission time;
/// they are not rewritten when fleet entities change later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CheckRecord {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Truck the driver was assigned to at submission time.
    pub truck_id: i64,
    /// Submitting driver.
    pub driver_id: String,
    /// Checklist item the submission answers.
    pub item_id: i64,
    /// "pending", "approved", or "rejected".
    pub status: String,
    /// Whether the task was skipped instead of completed.
    pub skipped: bool,
    /// Creation timestamp.
    pub created_at: String,
}

/// A photo or video proof attached to a check record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MediaAttachment {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning check record.
    pub check_id: i64,
    /// Transport-side file reference.
    pub file_ref: String,
    /// "photo" or "video".
    pub kind: String,
}

/// A text or voice note on a check record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Annotation {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning check record.
    pub check_id: i64,
    /// Authoring driver.
    pub driver_id: String,
    /// Text body; null for voice annotations.
    pub text: Option<String>,
    /// Voice file reference; null for text annotations.
    pub voice_ref: Option<String>,
    /// "comment" or "skip_reason".
    pub kind: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// The body of an annotation: exactly one of text or voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationBody {
    /// A typed note.
    Text(String),
    /// A recorded voice note, by file reference.
    Voice(String),
}

impl AnnotationBody {
    /// Text body, if this is a text annotation.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            Self::Voice(_) => None,
        }
    }

    /// Voice reference, if this is a voice annotation.
    pub fn voice_ref(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Voice(v) => Some(v),
        }
    }
}

/// A new submission, written atomically by [`crate::check::create_check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCheck {
    /// Truck the driver is assigned to.
    pub truck_id: i64,
    /// Submitting driver.
    pub driver_id: String,
    /// Checklist item being answered.
    pub item_id: i64,
    /// Whether the task was skipped.
    pub skipped: bool,
    /// Proof media as (kind, file reference) pairs.
    pub media: Vec<(String, String)>,
    /// Optional commentary.
    pub comment: Option<AnnotationBody>,
    /// Optional skip reason.
    pub skip_reason: Option<AnnotationBody>,
}

/// One row of the admin review queue, joined with display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PendingSummary {
    /// Check record ID.
    pub id: i64,
    /// Submitting driver's chat identity.
    pub driver_id: String,
    /// Driver display name.
    pub driver_name: String,
    /// Driver handle, if any.
    pub driver_handle: Option<String>,
    /// Fleet number of the truck at submission time.
    pub truck_number: Option<String>,
    /// Checklist item description at submission time.
    pub item_description: Option<String>,
    /// Whether the task was skipped.
    pub skipped: bool,
    /// Submission timestamp.
    pub created_at: String,
    /// Number of attached proof items.
    pub media_count: i64,
}

/// One row of the admin skipped-task feed, joined with the skip
/// reason if the driver gave one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SkippedSummary {
    /// Check record ID.
    pub id: i64,
    /// Submitting driver's display name.
    pub driver_name: String,
    /// Driver handle, if any.
    pub driver_handle: Option<String>,
    /// Checklist item description at submission time.
    pub item_description: Option<String>,
    /// "pending", "approved", or "rejected".
    pub status: String,
    /// Submission timestamp.
    pub created_at: String,
    /// Text reason; null when declined or given by voice.
    pub reason_text: Option<String>,
    /// Voice reason file reference; null when declined or given as text.
    pub reason_voice: Option<String>,
}

/// One row of the admin recent-media feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MediaFeedItem {
    /// Transport-side file reference.
    pub file_ref: String,
    /// "photo" or "video".
    pub kind: String,
    /// Submitting driver's display name.
    pub driver_name: String,
    /// Driver handle, if any.
    pub driver_handle: Option<String>,
    /// Checklist item description.
    pub item_description: Option<String>,
    /// Submission timestamp.
    pub created_at: String,
}

/// Completion count for one checklist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ItemStat {
    /// Checklist item description.
    pub description: String,
    /// Number of submissions against the item.
    pub completions: i64,
}
