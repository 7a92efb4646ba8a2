//! Conversational workflow engine for Fleetcheck.
//!
//! Drivers walk an ordered queue of checklist tasks for their assigned
//! truck, submitting photo/video proof plus optional annotations; each
//! submission lands in an admin review queue whose approve/reject
//! decision notifies the submitter.
//!
//! The crate is transport-agnostic: shells decode raw chat input into
//! [`fleet_core::InboundEvent`] values and hand them to
//! [`Engine::process`] along with the sender's identity; all output
//! goes back through a [`fleet_core::Notifier`].
//!
//! # Example
//!
//! ```no_run
//! use database::Database;
//! use fleet_core::{EngineConfig, InboundEvent, LoggingNotifier};
//! use workflow::Engine;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:fleetcheck.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let engine = Engine::new(db, LoggingNotifier, EngineConfig::from_env());
//!     engine.process("driver-1", InboundEvent::start("Bob")).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod engine;
pub mod error;
pub mod manager;
pub mod pipeline;
pub mod queue;
pub mod review;
pub mod session;

pub use admin::AdminPanel;
pub use engine::Engine;
pub use error::{Result, WorkflowError};
pub use manager::{SessionManager, SessionSlot};
pub use review::ReviewQueue;
pub use session::{Draft, Session, SessionState};
