//! Inbound event alphabet for the workflow engine.
//!
//! The presentation shell decodes raw transport input (button presses,
//! media messages, commands) into these events exactly once. The engine
//! never re-interprets free text as control input.

use serde::{Deserialize, Serialize};

/// Kind of proof media attached to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// A photo proof.
    Photo,
    /// A video proof.
    Video,
}

impl MediaKind {
    /// Storage string for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
        }
    }

    /// Parse a storage string back into a kind.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(Self::Photo),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}

/// Review decision on a pending check record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Accept the submission.
    Approve,
    /// Reject the submission.
    Reject,
}

impl Decision {
    /// The check record status this decision transitions to.
    pub fn as_status(&self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Reject => "rejected",
        }
    }
}

/// Administrative commands, decoded at the shell boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdminCommand {
    /// Register a new truck.
    AddTruck { number: String, model: String },
    /// Change a truck's model description.
    EditTruck { truck_id: i64, model: String },
    /// Activate or retire a truck.
    SetTruckStatus { truck_id: i64, active: bool },
    /// Delete a truck and all of its checklist items.
    DeleteTruck { truck_id: i64 },
    /// List all trucks.
    ListTrucks,

    /// Add a checklist item to a truck.
    AddItem { truck_id: i64, description: String },
    /// Rewrite an item's description.
    EditItem { item_id: i64, description: String },
    /// Activate or deactivate an item.
    SetItemActive { item_id: i64, active: bool },
    /// List a truck's checklist items.
    ListItems { truck_id: i64 },

    /// Assign a driver to a truck, or unassign with `None`.
    AssignDriver {
        driver_id: String,
        truck_id: Option<i64>,
    },
    /// List all drivers.
    ListDrivers,

    /// Enter the review queue (resets pagination).
    ListPending,
    /// Continue the review queue from where the last page ended.
    ShowMorePending,
    /// Approve or reject a pending check record.
    Decide { check_id: i64, decision: Decision },
    /// Drill into one check record: annotations, media, skip reason.
    Detail { check_id: i64 },

    /// Show the most recent proof media (resets pagination).
    RecentMedia,
    /// Continue the media feed from where the last page ended.
    MoreMedia,

    /// Show recently skipped tasks with their reasons (resets
    /// pagination).
    ListSkipped,
    /// Continue the skipped-task feed from where the last page ended.
    MoreSkipped,
    /// Show simple submission counts.
    Stats,
    /// Echo the caller's chat identity.
    WhoAmI,
}

/// A single decoded user event, paired with the originating identity
/// by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Begin a checklist walk. Carries the sender's display name and
    /// optional handle so the driver row can be upserted on first
    /// contact.
    StartSession {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        handle: Option<String>,
    },

    /// A proof photo or video for the current task.
    ProofMedia { kind: MediaKind, file_ref: String },

    /// Free text: an annotation or a skip reason, depending on state.
    TextInput { text: String },

    /// A voice note: an annotation or a skip reason, depending on state.
    VoiceInput { file_ref: String },

    /// Stop collecting proof media and move on to the annotation step.
    FinishCollecting,

    /// Skip the current task entirely (a reason is collected next).
    SkipTask,

    /// Decline to annotate the current submission or skip.
    SkipAnnotation,

    /// Abort the session, discarding the in-flight draft.
    Cancel,

    /// An administrative command.
    Admin { command: AdminCommand },
}

impl InboundEvent {
    /// Create a start event without a handle.
    pub fn start(name: impl Into<String>) -> Self {
        Self::StartSession {
            name: name.into(),
            handle: None,
        }
    }

    /// Create a photo proof event.
    pub fn photo(file_ref: impl Into<String>) -> Self {
        Self::ProofMedia {
            kind: MediaKind::Photo,
            file_ref: file_ref.into(),
        }
    }

    /// Create a video proof event.
    pub fn video(file_ref: impl Into<String>) -> Self {
        Self::ProofMedia {
            kind: MediaKind::Video,
            file_ref: file_ref.into(),
        }
    }

    /// Create a text input event.
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextInput { text: text.into() }
    }

    /// Create a voice input event.
    pub fn voice(file_ref: impl Into<String>) -> Self {
        Self::VoiceInput {
            file_ref: file_ref.into(),
        }
    }

    /// Wrap an admin command.
    pub fn admin(command: AdminCommand) -> Self {
        Self::Admin { command }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_proof_media() {
        let json = r#"{"type": "proof_media", "kind": "photo", "file_ref": "f1"}"#;
        let event: InboundEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, InboundEvent::photo("f1"));
    }

    #[test]
    fn test_parse_start_without_handle() {
        let json = r#"{"type": "start_session", "name": "Bob"}"#;
        let event: InboundEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, InboundEvent::start("Bob"));
    }

    #[test]
    fn test_parse_admin_decide() {
        let json = r#"{
            "type": "admin",
            "command": {"kind": "decide", "check_id": 7, "decision": "approve"}
        }"#;

        let event: InboundEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            InboundEvent::admin(AdminCommand::Decide {
                check_id: 7,
                decision: Decision::Approve,
            })
        );
    }

    #[test]
    fn test_serialize_round_trip() {
        let event = InboundEvent::admin(AdminCommand::AssignDriver {
            driver_id: "d1".to_string(),
            truck_id: Some(3),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("assign_driver"));

        let back: InboundEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_media_kind_strings() {
        assert_eq!(MediaKind::Photo.as_str(), "photo");
        assert_eq!(MediaKind::from_str("video"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_str("audio"), None);
    }

    #[test]
    fn test_decision_status() {
        assert_eq!(Decision::Approve.as_status(), "approved");
        assert_eq!(Decision::Reject.as_status(), "rejected");
    }
}
