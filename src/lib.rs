//! Clinic patient-dispatch core.
//!
//! Admits patients into two competing lines and decides who is seen next:
//!
//! ```text
//! register ──► PatientDirectory ◄──────────── severity lookups ─┐
//!                                                               │
//! book_routine ──► Doctor slot ledger ──► RoutineQueue (FIFO) ──┤
//!                                                               ├──► serve_next
//! triage_insert ─────────────────────────► TriageQueue (heap) ──┘   (triage first)
//!
//! every mutation ──► UndoLog ──► undo (drain-and-reinsert)
//! ```
//!
//! # Modules
//!
//! - [`models`]: Patient, Slot, Token
//! - [`calendar`]: Doctor and its slot ledger
//! - [`directory`]: Patient lookup by id
//! - [`queue`]: Bounded routine FIFO
//! - [`triage`]: Severity-ordered emergency heap
//! - [`undo`]: LIFO action log
//! - [`engine`]: The dispatcher tying them together

pub mod calendar;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod models;
pub mod queue;
pub mod triage;
pub mod undo;

pub use calendar::Doctor;
pub use config::EngineConfig;
pub use directory::PatientDirectory;
pub use engine::{DispatchEngine, DispatchSummary, DoctorSummary};
pub use error::{ConfigError, DispatchError, DispatchResult, InvariantViolation};
pub use models::{DoctorId, Patient, PatientId, Slot, SlotId, Token, TokenId, TokenKind};
pub use queue::RoutineQueue;
pub use triage::{SeverityOrder, SeverityThenTokenOrder, TriageOrder, TriageQueue};
pub use undo::{UndoAction, UndoLog, UndoOutcome};
