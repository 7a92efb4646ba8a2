//! Per-driver session state.
//!
//! A [`Session`] is the in-memory walk through one resolved task
//! queue. It holds the draft for the current task; nothing here
//! touches the store. The engine owns the transitions, commits drafts
//! through the pipeline, and advances the walk only after a commit
//! succeeds.

use database::{AnnotationBody, ChecklistItem};
use fleet_core::MediaKind;

/// What the session is waiting for from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for proof media (photo/video) for the current task.
    AwaitProof,
    /// Proof collected; waiting for an optional comment.
    AwaitAnnotation,
    /// Task skipped; waiting for an optional reason.
    AwaitSkipReason,
}

/// The in-flight, not-yet-persisted submission for the current task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    /// Checklist item being answered.
    pub item_id: i64,
    /// Accumulated proof media.
    pub media: Vec<(MediaKind, String)>,
    /// Whether the driver chose to skip the task.
    pub skipped: bool,
    /// Pending comment annotation.
    pub comment: Option<AnnotationBody>,
    /// Pending skip reason annotation.
    pub skip_reason: Option<AnnotationBody>,
}

impl Draft {
    fn new(item_id: i64) -> Self {
        Self {
            item_id,
            media: Vec::new(),
            skipped: false,
            comment: None,
            skip_reason: None,
        }
    }
}

/// One driver's walk through their resolved task queue.
#[derive(Debug, Clone)]
pub struct Session {
    /// Owning driver's chat identity.
    pub driver_id: String,
    /// Truck the queue was resolved against.
    pub truck_id: i64,
    /// Current state.
    pub state: SessionState,
    /// Draft for the current task.
    pub draft: Draft,
    queue: Vec<ChecklistItem>,
    position: usize,
}

impl Session {
    /// Start a session over a non-empty resolved queue.
    ///
    /// Returns `None` for an empty queue: there is nothing to walk and
    /// no session should exist.
    pub fn new(driver_id: impl Into<String>, truck_id: i64, queue: Vec<ChecklistItem>) -> Option<Self> {
        let first = queue.first()?;
        let draft = Draft::new(first.id);

        Some(Self {
            driver_id: driver_id.into(),
            truck_id,
            state: SessionState::AwaitProof,
            draft,
            queue,
            position: 0,
        })
    }

    /// The task currently being walked.
    pub fn current_item(&self) -> &ChecklistItem {
        &self.queue[self.position]
    }

    /// 1-based number of the current task, for prompts.
    pub fn task_number(&self) -> usize {
        self.position + 1
    }

    /// Total number of tasks in the walk.
    pub fn total_tasks(&self) -> usize {
        self.queue.len()
    }

    /// Attach one proof item to the draft.
    pub fn add_proof(&mut self, kind: MediaKind, file_ref: impl Into<String>) {
        self.draft.media.push((kind, file_ref.into()));
    }

    /// Move from proof collection to the annotation step.
    pub fn begin_annotation(&mut self) {
        self.state = SessionState::AwaitAnnotation;
    }

    /// Skip the current task: discard any collected proof and wait for
    /// a reason.
    pub fn begin_skip(&mut self) {
        self.draft.media.clear();
        self.draft.skipped = true;
        self.state = SessionState::AwaitSkipReason;
    }

    /// Advance to the next task after a successful commit.
    ///
    /// Resets the draft and returns `true` while tasks remain; `false`
    /// means the queue is exhausted and the session is done.
    pub fn advance(&mut self) -> bool {
        self.position += 1;

        match self.queue.get(self.position) {
            Some(item) => {
                self.draft = Draft::new(item.id);
                self.state = SessionState::AwaitProof;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, description: &str) -> ChecklistItem {
        ChecklistItem {
            id,
            truck_id: 1,
            description: description.to_string(),
            is_active: true,
        }
    }

    #[test]
    fn test_empty_queue_makes_no_session() {
        assert!(Session::new("d1", 1, vec![]).is_none());
    }

    #[test]
    fn test_walk_order_and_draft_reset() {
        let mut session =
            Session::new("d1", 1, vec![item(10, "Tires"), item(11, "Oil")]).unwrap();

        assert_eq!(session.state, SessionState::AwaitProof);
        assert_eq!(session.current_item().id, 10);
        assert_eq!(session.task_number(), 1);
        assert_eq!(session.total_tasks(), 2);

        session.add_proof(MediaKind::Photo, "f1");
        session.begin_annotation();
        assert_eq!(session.state, SessionState::AwaitAnnotation);

        assert!(session.advance());
        assert_eq!(session.current_item().id, 11);
        assert_eq!(session.state, SessionState::AwaitProof);
        assert_eq!(session.draft.item_id, 11);
        assert!(session.draft.media.is_empty());

        assert!(!session.advance());
    }

    #[test]
    fn test_skip_discards_collected_proof() {
        let mut session = Session::new("d1", 1, vec![item(10, "Tires")]).unwrap();

        session.add_proof(MediaKind::Photo, "f1");
        session.begin_skip();

        assert_eq!(session.state, SessionState::AwaitSkipReason);
        assert!(session.draft.skipped);
        assert!(session.draft.media.is_empty());
    }

    #[test]
    fn test_multi_proof_accumulates() {
        let mut session = Session::new("d1", 1, vec![item(10, "Tires")]).unwrap();

        session.add_proof(MediaKind::Photo, "f1");
        session.add_proof(MediaKind::Video, "f2");

        assert_eq!(session.draft.media.len(), 2);
        assert_eq!(session.state, SessionState::AwaitProof);
    }
}
