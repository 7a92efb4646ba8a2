//! The workflow engine.
//!
//! One entry point, [`Engine::process`], takes a decoded inbound event
//! plus the originating chat identity and drives everything else:
//! admin commands through the panel, driver events through the
//! per-identity session. Recoverable errors become user-visible text
//! at this boundary; only delivery failures propagate to the caller.

use tracing::warn;

use database::{driver, Database};
use fleet_core::{
    AdminCommand, CollectMode, EngineConfig, InboundEvent, Notifier,
};

use crate::admin::AdminPanel;
use crate::error::{Result, WorkflowError};
use crate::manager::SessionManager;
use crate::pipeline;
use crate::queue;
use crate::session::{Session, SessionState};

const START_HINT: &str = "No checklist in progress. Send start to begin.";
const NOTHING_TO_CANCEL: &str = "Nothing to cancel.";
const CANCELLED: &str = "Session cancelled. Nothing was recorded for the current task.";
const ALL_DONE: &str = "All tasks are done. Nothing is outstanding for your truck.";
const CHECKLIST_COMPLETE: &str = "Checklist complete. All submissions are in for review.";

const PROOF_PROMPT: &str = "Send a photo or video as proof.";
const PROOF_EXPECTED: &str = "Send a photo or video as proof of this task.";
const FINISH_NEEDS_PROOF: &str = "Attach at least one photo or video before finishing.";
const ANNOTATION_PROMPT: &str = "Add a comment as text or a voice note, or skip.";
const ANNOTATION_EXPECTED: &str = "Send a text or voice comment, or skip.";
const SKIP_REASON_PROMPT: &str =
    "Why are you skipping this task? Send text or a voice note, or skip.";
const SKIP_REASON_EXPECTED: &str = "Send a text or voice reason, or skip.";

const MENU_FINISH: &str = "Done collecting";
const MENU_SKIP_TASK: &str = "Skip task";
const MENU_SKIP: &str = "Skip";
const MENU_CANCEL: &str = "Cancel";

/// The conversational workflow engine.
///
/// Generic over the outbound transport; shells construct it with their
/// own [`Notifier`] implementation.
pub struct Engine<N: Notifier> {
    db: Database,
    notifier: N,
    config: EngineConfig,
    sessions: SessionManager,
    admin: AdminPanel,
}

impl<N: Notifier> Engine<N> {
    /// Create an engine over a migrated database.
    pub fn new(db: Database, notifier: N, config: EngineConfig) -> Self {
        let admin = AdminPanel::new(config.page_size);

        Self {
            db,
            notifier,
            config,
            sessions: SessionManager::new(),
            admin,
        }
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The live session manager.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// The outbound transport.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Process one inbound event from one identity.
    ///
    /// Recoverable failures (validation, authorization, stale IDs,
    /// store errors) are converted to a user-visible message here and
    /// reported as `Ok`; an `Err` means outbound delivery itself
    /// failed.
    pub async fn process(&self, identity: &str, event: InboundEvent) -> Result<()> {
        match self.dispatch(identity, event).await {
            Ok(()) => Ok(()),
            Err(WorkflowError::Notify(e)) => Err(WorkflowError::Notify(e)),
            Err(e) => {
                warn!("Workflow error for {}: {}", identity, e);
                self.notifier.send_text(identity, &e.user_message()).await?;
                Ok(())
            }
        }
    }

    async fn dispatch(&self, identity: &str, event: InboundEvent) -> Result<()> {
        if let InboundEvent::Admin { command } = event {
            // Identity echo is open to everyone; it exists precisely so
            // a not-yet-listed admin can find out their own ID.
            if command == AdminCommand::WhoAmI {
                return self
                    .admin
                    .handle(self.db.pool(), &self.notifier, identity, command)
                    .await;
            }

            if !self.config.is_admin(identity) {
                return Err(WorkflowError::NotAuthorized);
            }

            return self
                .admin
                .handle(self.db.pool(), &self.notifier, identity, command)
                .await;
        }

        // Driver events serialize per identity: the slot lock is held
        // for the whole event, including the teardown below, so a
        // concurrent event can never revive a removed slot.
        let mut guard = self.sessions.acquire(identity).await;
        let result = self.drive(identity, event, &mut guard).await;

        if guard.is_none() {
            self.sessions.remove(identity).await;
        }

        result
    }

    async fn drive(
        &self,
        identity: &str,
        event: InboundEvent,
        session: &mut Option<Session>,
    ) -> Result<()> {
        match event {
            InboundEvent::StartSession { name, handle } => {
                self.start(identity, &name, handle.as_deref(), session).await
            }

            InboundEvent::Cancel => {
                let text = if session.take().is_some() {
                    CANCELLED
                } else {
                    NOTHING_TO_CANCEL
                };
                self.notifier.send_text(identity, text).await?;
                Ok(())
            }

            other => match session {
                None => {
                    self.notifier.send_text(identity, START_HINT).await?;
                    Ok(())
                }
                Some(walk) => match walk.state {
                    SessionState::AwaitProof => {
                        self.on_await_proof(identity, other, session).await
                    }
                    SessionState::AwaitAnnotation => {
                        self.on_await_annotation(identity, other, session).await
                    }
                    SessionState::AwaitSkipReason => {
                        self.on_await_skip_reason(identity, other, session).await
                    }
                },
            },
        }
    }

    /// Begin (or restart) a checklist walk for a driver.
    async fn start(
        &self,
        identity: &str,
        name: &str,
        handle: Option<&str>,
        session: &mut Option<Session>,
    ) -> Result<()> {
        driver::upsert_driver(self.db.pool(), identity, name, handle).await?;

        let Some(truck) = queue::active_assignment(self.db.pool(), identity).await? else {
            *session = None;
            return Err(WorkflowError::Unassigned);
        };

        let items = queue::resolve(self.db.pool(), identity).await?;

        match Session::new(identity, truck.id, items) {
            Some(walk) => {
                self.prompt_task(identity, &walk).await?;
                *session = Some(walk);
            }
            None => {
                *session = None;
                self.notifier.send_text(identity, ALL_DONE).await?;
            }
        }

        Ok(())
    }

    async fn on_await_proof(
        &self,
        identity: &str,
        event: InboundEvent,
        session: &mut Option<Session>,
    ) -> Result<()> {
        let Some(walk) = session.as_mut() else {
            return Ok(());
        };

        match event {
            InboundEvent::ProofMedia { kind, file_ref } => {
                walk.add_proof(kind, file_ref);

                match self.config.collect_mode {
                    CollectMode::Single => {
                        walk.begin_annotation();
                        self.notifier
                            .render_menu(identity, ANNOTATION_PROMPT, &[MENU_SKIP.to_string()])
                            .await?;
                    }
                    CollectMode::UntilFinish => {
                        let text = format!(
                            "Proof added ({} so far). Send more, or choose {}.",
                            walk.draft.media.len(),
                            MENU_FINISH
                        );
                        self.notifier.send_text(identity, &text).await?;
                    }
                }
                Ok(())
            }

            InboundEvent::FinishCollecting => {
                if self.config.collect_mode != CollectMode::UntilFinish {
                    return Err(WorkflowError::Validation(PROOF_EXPECTED.to_string()));
                }
                if walk.draft.media.is_empty() {
                    return Err(WorkflowError::Validation(FINISH_NEEDS_PROOF.to_string()));
                }

                walk.begin_annotation();
                self.notifier
                    .render_menu(identity, ANNOTATION_PROMPT, &[MENU_SKIP.to_string()])
                    .await?;
                Ok(())
            }

            InboundEvent::SkipTask => {
                walk.begin_skip();
                self.notifier
                    .render_menu(identity, SKIP_REASON_PROMPT, &[MENU_SKIP.to_string()])
                    .await?;
                Ok(())
            }

            _ => Err(WorkflowError::Validation(PROOF_EXPECTED.to_string())),
        }
    }

    async fn on_await_annotation(
        &self,
        identity: &str,
        event: InboundEvent,
        session: &mut Option<Session>,
    ) -> Result<()> {
        let Some(walk) = session.as_mut() else {
            return Ok(());
        };

        match event {
            InboundEvent::TextInput { text } => {
                walk.draft.comment = Some(database::AnnotationBody::Text(text));
            }
            InboundEvent::VoiceInput { file_ref } => {
                walk.draft.comment = Some(database::AnnotationBody::Voice(file_ref));
            }
            InboundEvent::SkipAnnotation => {
                walk.draft.comment = None;
            }
            _ => return Err(WorkflowError::Validation(ANNOTATION_EXPECTED.to_string())),
        }

        self.commit_and_advance(identity, session).await
    }

    async fn on_await_skip_reason(
        &self,
        identity: &str,
        event: InboundEvent,
        session: &mut Option<Session>,
    ) -> Result<()> {
        let Some(walk) = session.as_mut() else {
            return Ok(());
        };

        match event {
            InboundEvent::TextInput { text } => {
                walk.draft.skip_reason = Some(database::AnnotationBody::Text(text));
            }
            InboundEvent::VoiceInput { file_ref } => {
                walk.draft.skip_reason = Some(database::AnnotationBody::Voice(file_ref));
            }
            InboundEvent::SkipAnnotation => {
                walk.draft.skip_reason = None;
            }
            _ => return Err(WorkflowError::Validation(SKIP_REASON_EXPECTED.to_string())),
        }

        self.commit_and_advance(identity, session).await
    }

    /// Commit the current draft, then either prompt the next task or
    /// finish the walk.
    ///
    /// A store failure leaves the session in its pre-commit state so
    /// the driver can retry by re-sending the input. An `Unassigned`
    /// failure is terminal and tears the session down.
    async fn commit_and_advance(
        &self,
        identity: &str,
        session: &mut Option<Session>,
    ) -> Result<()> {
        let Some(walk) = session.as_mut() else {
            return Ok(());
        };

        match pipeline::commit(self.db.pool(), walk).await {
            Ok(_) => {
                let text = format!(
                    "Task {} of {} recorded.",
                    walk.task_number(),
                    walk.total_tasks()
                );
                self.notifier.send_text(identity, &text).await?;

                if walk.advance() {
                    self.prompt_task(identity, walk).await?;
                } else {
                    *session = None;
                    self.notifier.send_text(identity, CHECKLIST_COMPLETE).await?;
                }
                Ok(())
            }

            Err(WorkflowError::Unassigned) => {
                *session = None;
                Err(WorkflowError::Unassigned)
            }

            Err(e) => Err(e),
        }
    }

    async fn prompt_task(&self, identity: &str, walk: &Session) -> Result<()> {
        let prompt = format!(
            "Task {} of {}: {}\n{}",
            walk.task_number(),
            walk.total_tasks(),
            walk.current_item().description,
            PROOF_PROMPT
        );

        let mut options = Vec::new();
        if self.config.collect_mode == CollectMode::UntilFinish {
            options.push(MENU_FINISH.to_string());
        }
        options.push(MENU_SKIP_TASK.to_string());
        options.push(MENU_CANCEL.to_string());

        self.notifier.render_menu(identity, &prompt, &options).await?;
        Ok(())
    }
}
