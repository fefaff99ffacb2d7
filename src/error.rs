//! Error types for the dispatch engine.

use thiserror::Error;

use crate::models::{DoctorId, PatientId, SlotId, TokenId};

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Business failures. None of these leave the engine in a partial state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("patient {0} not found")]
    PatientNotFound(PatientId),

    #[error("doctor {0} not found")]
    DoctorNotFound(DoctorId),

    #[error("doctor {doctor_id} has no free slot")]
    NoFreeSlot { doctor_id: DoctorId },

    #[error("slot {slot_id} of doctor {doctor_id} is missing or already booked")]
    SlotUnavailable { doctor_id: DoctorId, slot_id: SlotId },

    #[error("routine queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },
}

/// Structural faults found by [`crate::DispatchEngine::audit`].
///
/// Unlike [`DispatchError`], these indicate a bug rather than a rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("pending counter is {recorded}, queues hold {actual}")]
    PendingDrift { recorded: usize, actual: usize },

    #[error("served counter is {recorded}, undo log holds {actual} serves")]
    ServedDrift { recorded: usize, actual: usize },

    #[error("token {token_id} of the wrong kind found in the {queue} queue")]
    WrongKind { token_id: TokenId, queue: &'static str },

    #[error("routine token {token_id} has no doctor or slot")]
    MissingSlotReference { token_id: TokenId },

    #[error("token {token_id} references missing slot {slot_id} of doctor {doctor_id}")]
    DanglingSlot {
        token_id: TokenId,
        doctor_id: DoctorId,
        slot_id: SlotId,
    },

    #[error("token {token_id} references slot {slot_id} of doctor {doctor_id}, which is not booked")]
    SlotNotBooked {
        token_id: TokenId,
        doctor_id: DoctorId,
        slot_id: SlotId,
    },

    #[error("slot {slot_id} of doctor {doctor_id} is held by more than one live token")]
    SlotShared { doctor_id: DoctorId, slot_id: SlotId },

    #[error("token id {0} appears more than once")]
    DuplicateToken(TokenId),
}

/// Invalid engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must be positive")]
    ZeroCapacity { name: &'static str },

    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}
