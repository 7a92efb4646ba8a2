//! Shared vocabulary for Fleetcheck.
//!
//! This crate defines the closed inbound event alphabet the
//! presentation shell decodes user input into, the outbound
//! [`Notifier`] surface the engine delivers through, and the engine
//! configuration. It carries no persistence or workflow logic.

pub mod config;
pub mod event;
pub mod notify;

pub use config::{CollectMode, EngineConfig};
pub use event::{AdminCommand, Decision, InboundEvent, MediaKind};
pub use notify::{LoggingNotifier, NoOpNotifier, Notifier, NotifyError};
