//! Data models for the patient-dispatch engine.
//!
//! This module defines the core data structures used throughout the system:
//! - TokenKind: Whether an admission is routine or an emergency
//! - Patient: Patient information and triage severity
//! - Slot: One bookable appointment interval of a doctor
//! - Token: One admission instance waiting to be served

use std::fmt;

pub type PatientId = u32;
pub type DoctorId = u32;
pub type SlotId = u32;
pub type TokenId = u64;

/// Admission classes.
///
/// Emergency tokens live in the triage queue and are always served
/// before routine ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Routine,
    Emergency,
}

impl TokenKind {
    pub fn name(&self) -> &str {
        match self {
            TokenKind::Routine => "ROUTINE",
            TokenKind::Emergency => "EMERGENCY",
        }
    }
}

/// Represents a patient known to the clinic.
///
/// Lower severity values are more urgent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    pub age: u32,
    pub severity: i32,
}

impl Patient {
    pub fn new(id: PatientId, name: impl Into<String>, age: u32, severity: i32) -> Self {
        Patient {
            id,
            name: name.into(),
            age,
            severity,
        }
    }
}

impl fmt::Display for Patient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Patient[id={},name={},age={},severity={}]",
            self.id, self.name, self.age, self.severity
        )
    }
}

/// Represents one appointment slot in a doctor's ledger.
///
/// Start and end are opaque labels; nothing in the engine parses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub slot_id: SlotId,
    pub start_time: String,
    pub end_time: String,
    pub booked: bool,
}

impl Slot {
    /// Create a new, unbooked slot.
    pub fn new(slot_id: SlotId, start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Slot {
            slot_id,
            start_time: start_time.into(),
            end_time: end_time.into(),
            booked: false,
        }
    }

    pub fn is_free(&self) -> bool {
        !self.booked
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Slot[id={},{}-{},booked={}]",
            self.slot_id, self.start_time, self.end_time, self.booked
        )
    }
}

/// One admission instance linking a patient to a queue entry.
///
/// Tokens are immutable once issued. Emergency tokens carry no doctor or slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_id: TokenId,
    pub patient_id: PatientId,
    pub doctor_id: Option<DoctorId>,
    pub slot_id: Option<SlotId>,
    pub kind: TokenKind,
}

impl Token {
    /// Token for a booked routine visit.
    pub fn routine(token_id: TokenId, patient_id: PatientId, doctor_id: DoctorId, slot_id: SlotId) -> Self {
        Token {
            token_id,
            patient_id,
            doctor_id: Some(doctor_id),
            slot_id: Some(slot_id),
            kind: TokenKind::Routine,
        }
    }

    /// Token for an emergency admission.
    pub fn emergency(token_id: TokenId, patient_id: PatientId) -> Self {
        Token {
            token_id,
            patient_id,
            doctor_id: None,
            slot_id: None,
            kind: TokenKind::Emergency,
        }
    }

    pub fn is_routine(&self) -> bool {
        self.kind == TokenKind::Routine
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let doctor = self.doctor_id.map_or_else(|| "-".to_string(), |d| d.to_string());
        let slot = self.slot_id.map_or_else(|| "-".to_string(), |s| s.to_string());
        write!(
            f,
            "Token[id={},pid={},doc={},slot={},type={}]",
            self.token_id,
            self.patient_id,
            doctor,
            slot,
            self.kind.name()
        )
    }
}
