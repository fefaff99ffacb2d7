//! Patient dispatch across slot ledgers, the routine queue and triage.
//!
//! This module provides the DispatchEngine struct which admits patients,
//! serves them emergency-first, and reverses its own mutations through the
//! undo log while keeping every structure and counter consistent.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calendar::Doctor;
use crate::config::EngineConfig;
use crate::directory::PatientDirectory;
use crate::error::{DispatchError, DispatchResult, InvariantViolation};
use crate::models::{DoctorId, Patient, PatientId, Slot, SlotId, Token, TokenId, TokenKind};
use crate::queue::RoutineQueue;
use crate::triage::{SeverityOrder, TriageOrder, TriageQueue};
use crate::undo::{UndoAction, UndoLog, UndoOutcome};

/// Per-doctor line of the summary report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorSummary {
    pub id: DoctorId,
    pub name: String,
    pub specialization: String,
    pub next_free_slot: Option<Slot>,
    pub free_slots: usize,
}

/// Snapshot of the engine for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    pub served: usize,
    pub pending: usize,
    pub doctors: Vec<DoctorSummary>,
}

impl DispatchSummary {
    /// Free slots across all doctors.
    pub fn total_free_slots(&self) -> usize {
        self.doctors.iter().map(|d| d.free_slots).sum()
    }
}

impl fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== SUMMARY ===")?;
        writeln!(f, "Served: {}", self.served)?;
        writeln!(f, "Pending: {}", self.pending)?;
        writeln!(f, "Doctors:")?;
        for doctor in &self.doctors {
            writeln!(
                f,
                "Doctor[id={},name={},spec={},pendingSlots={}]",
                doctor.id, doctor.name, doctor.specialization, doctor.free_slots
            )?;
            match &doctor.next_free_slot {
                Some(slot) => writeln!(f, "  NextSlot: {}", slot)?,
                None => writeln!(f, "  NextSlot: none")?,
            }
            writeln!(f, "  PendingSlots: {}", doctor.free_slots)?;
        }
        Ok(())
    }
}

/// Emergency-first dispatcher with single-step undo.
///
/// All mutation goes through `&mut self`. Share an engine between threads by
/// wrapping it in `Arc<Mutex<_>>`: undo drains whole queues, so readers must
/// never overlap a writer.
pub struct DispatchEngine<O = SeverityOrder> {
    instance: Uuid,
    doctors: BTreeMap<DoctorId, Doctor>,
    patients: PatientDirectory,
    routine: RoutineQueue,
    triage: TriageQueue<O>,
    undo_log: UndoLog,
    next_token_id: AtomicU64,
    served_count: usize,
    pending_count: usize,
}

impl DispatchEngine<SeverityOrder> {
    /// Initialize an engine from validated configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_order(config, SeverityOrder)
    }

    /// Default configuration with a specific routine queue capacity.
    pub fn with_capacity(routine_capacity: usize) -> Self {
        let config = EngineConfig {
            routine_capacity,
            ..EngineConfig::default()
        };
        Self::new(&config)
    }
}

impl<O: TriageOrder> DispatchEngine<O> {
    /// Initialize an engine whose triage queue uses `order`.
    pub fn with_order(config: &EngineConfig, order: O) -> Self {
        let instance = Uuid::new_v4();
        debug!(
            %instance,
            routine_capacity = config.routine_capacity,
            "dispatch engine created"
        );
        DispatchEngine {
            instance,
            doctors: BTreeMap::new(),
            patients: PatientDirectory::with_capacity(config.directory_capacity),
            routine: RoutineQueue::new(config.routine_capacity),
            triage: TriageQueue::with_order(order),
            undo_log: UndoLog::new(),
            next_token_id: AtomicU64::new(1),
            served_count: 0,
            pending_count: 0,
        }
    }

    pub fn instance(&self) -> Uuid {
        self.instance
    }

    // ---------------------------------------------------------------
    // Setup (not recorded in the undo log)
    // ---------------------------------------------------------------

    /// Add or replace a doctor.
    pub fn add_doctor(&mut self, doctor: Doctor) -> Option<Doctor> {
        debug!(instance = %self.instance, doctor_id = doctor.id, slots = doctor.slots().len(), "doctor added");
        self.doctors.insert(doctor.id, doctor)
    }

    /// Append a slot to a doctor already owned by the engine.
    pub fn add_slot(&mut self, doctor_id: DoctorId, slot: Slot) -> DispatchResult<()> {
        let doctor = self
            .doctors
            .get_mut(&doctor_id)
            .ok_or(DispatchError::DoctorNotFound(doctor_id))?;
        doctor.add_slot(slot);
        Ok(())
    }

    /// Remove a slot, booked or not. Not reversible.
    pub fn cancel_slot(&mut self, doctor_id: DoctorId, slot_id: SlotId) -> bool {
        let cancelled = self
            .doctors
            .get_mut(&doctor_id)
            .map_or(false, |d| d.cancel_slot(slot_id));
        if cancelled {
            debug!(instance = %self.instance, doctor_id, slot_id, "slot cancelled");
        }
        cancelled
    }

    pub fn doctor(&self, doctor_id: DoctorId) -> Option<&Doctor> {
        self.doctors.get(&doctor_id)
    }

    // ---------------------------------------------------------------
    // Mutating operations
    // ---------------------------------------------------------------

    /// Insert or update a patient record.
    pub fn register(&mut self, patient: Patient) {
        let patient_id = patient.id;
        let severity = patient.severity;
        let previous = self.patients.upsert(patient);

        // a new severity invalidates the heap layout for this patient's
        // tokens, including dangling ones that sorted last until now
        let severity_changed = previous.map(|p| p.severity) != Some(severity);
        if severity_changed && self.triage.iter().any(|t| t.patient_id == patient_id) {
            self.triage.reorder(&self.patients);
        }

        self.undo_log.record(UndoAction::Register(patient_id));
        debug!(instance = %self.instance, patient_id, "patient registered");
    }

    /// Book the doctor's first free slot and queue a routine token for it.
    ///
    /// If the routine queue is full the slot booking is rolled back before
    /// the error is returned.
    pub fn book_routine(&mut self, patient_id: PatientId, doctor_id: DoctorId) -> DispatchResult<Token> {
        let doctor = self
            .doctors
            .get_mut(&doctor_id)
            .ok_or(DispatchError::DoctorNotFound(doctor_id))?;
        let slot_id = doctor
            .next_free_slot()
            .map(|s| s.slot_id)
            .ok_or(DispatchError::NoFreeSlot { doctor_id })?;
        if !doctor.book_slot(slot_id) {
            return Err(DispatchError::SlotUnavailable { doctor_id, slot_id });
        }

        let token = Token::routine(self.issue_token_id(), patient_id, doctor_id, slot_id);
        if let Err(rejected) = self.routine.enqueue(token.clone()) {
            if let Some(doctor) = self.doctors.get_mut(&doctor_id) {
                doctor.release_slot(slot_id);
            }
            warn!(
                instance = %self.instance,
                token_id = rejected.token_id,
                patient_id,
                doctor_id,
                slot_id,
                "routine queue full, slot booking rolled back"
            );
            return Err(DispatchError::QueueFull {
                capacity: self.routine.capacity(),
            });
        }

        self.pending_count += 1;
        self.undo_log.record(UndoAction::Book(token.clone()));
        debug!(
            instance = %self.instance,
            token_id = token.token_id,
            patient_id,
            doctor_id,
            slot_id,
            "routine visit booked"
        );
        Ok(token)
    }

    /// Admit a registered patient to emergency triage.
    pub fn triage_insert(&mut self, patient_id: PatientId) -> DispatchResult<Token> {
        if !self.patients.contains(patient_id) {
            warn!(instance = %self.instance, patient_id, "triage requested for unknown patient");
            return Err(DispatchError::PatientNotFound(patient_id));
        }

        let token = Token::emergency(self.issue_token_id(), patient_id);
        self.triage.insert(token.clone(), &self.patients);
        self.pending_count += 1;
        self.undo_log.record(UndoAction::Triage(token.clone()));
        debug!(instance = %self.instance, token_id = token.token_id, patient_id, "emergency triaged");
        Ok(token)
    }

    /// Dispatch the next patient.
    ///
    /// Any emergency token beats every routine token, however long the
    /// routine one has waited.
    pub fn serve_next(&mut self) -> Option<Token> {
        let next = if self.triage.is_empty() {
            self.routine.dequeue()
        } else {
            self.triage.extract_min(&self.patients)
        };
        let next = next?;

        self.served_count += 1;
        self.pending_count = self.pending_count.saturating_sub(1);
        self.undo_log.record(UndoAction::Serve(next.clone()));
        debug!(
            instance = %self.instance,
            token_id = next.token_id,
            patient_id = next.patient_id,
            kind = next.kind.name(),
            "patient served"
        );
        Some(next)
    }

    /// Reverse the most recent recorded action.
    pub fn undo(&mut self) -> UndoOutcome {
        let Some(action) = self.undo_log.pop() else {
            return UndoOutcome::NothingToUndo;
        };

        let outcome = match action {
            UndoAction::Register(patient_id) => {
                if self.patients.delete(patient_id) && !self.triage.is_empty() {
                    // tokens of this patient now sort last
                    self.triage.reorder(&self.patients);
                }
                UndoOutcome::Registered(patient_id)
            }
            UndoAction::Book(token) => {
                if self.routine.remove_token(token.token_id).is_some() {
                    self.pending_count = self.pending_count.saturating_sub(1);
                } else {
                    warn!(instance = %self.instance, token_id = token.token_id, "booked token no longer queued");
                }
                self.release_token_slot(&token);
                UndoOutcome::Booking(token.token_id)
            }
            UndoAction::Triage(token) => {
                if self.triage.remove_token(token.token_id, &self.patients).is_some() {
                    self.pending_count = self.pending_count.saturating_sub(1);
                } else {
                    warn!(instance = %self.instance, token_id = token.token_id, "triaged token no longer queued");
                }
                UndoOutcome::Triage(token.token_id)
            }
            UndoAction::Serve(token) => {
                let token_id = token.token_id;
                let restored = match token.kind {
                    TokenKind::Routine => self.routine.push_front(token).is_ok(),
                    TokenKind::Emergency => {
                        self.triage.insert(token, &self.patients);
                        true
                    }
                };
                if restored {
                    self.pending_count += 1;
                } else {
                    warn!(instance = %self.instance, token_id, "routine queue full, served token dropped");
                }
                self.served_count = self.served_count.saturating_sub(1);
                UndoOutcome::Serve(token_id)
            }
        };

        info!(instance = %self.instance, %outcome, "undo");
        outcome
    }

    fn release_token_slot(&mut self, token: &Token) {
        let released = match (token.doctor_id, token.slot_id) {
            (Some(doctor_id), Some(slot_id)) => self
                .doctors
                .get_mut(&doctor_id)
                .map_or(false, |d| d.release_slot(slot_id)),
            _ => false,
        };
        if !released {
            warn!(
                instance = %self.instance,
                token_id = token.token_id,
                doctor_id = ?token.doctor_id,
                slot_id = ?token.slot_id,
                "slot of undone booking no longer exists"
            );
        }
    }

    /// Next token id. Safe to call through a shared reference.
    pub fn issue_token_id(&self) -> TokenId {
        self.next_token_id.fetch_add(1, Ordering::Relaxed)
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    pub fn get_patient(&self, patient_id: PatientId) -> Option<&Patient> {
        self.patients.get(patient_id)
    }

    pub fn served_count(&self) -> usize {
        self.served_count
    }

    pub fn pending_count(&self) -> usize {
        self.pending_count
    }

    pub fn routine_len(&self) -> usize {
        self.routine.len()
    }

    pub fn triage_len(&self) -> usize {
        self.triage.len()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_log.len()
    }

    /// Routine tokens, oldest first.
    pub fn routine_tokens(&self) -> Vec<&Token> {
        self.routine.iter().collect()
    }

    /// Triage tokens in heap storage order.
    pub fn triage_tokens(&self) -> Vec<&Token> {
        self.triage.iter().collect()
    }

    /// The token `serve_next` would return.
    pub fn peek_next(&self) -> Option<&Token> {
        self.triage.peek_min().or_else(|| self.routine.peek())
    }

    /// Doctors in ascending id order with their free-slot state.
    pub fn summary(&self) -> DispatchSummary {
        let doctors = self
            .doctors
            .values()
            .map(|d| DoctorSummary {
                id: d.id,
                name: d.name.clone(),
                specialization: d.specialization.clone(),
                next_free_slot: d.next_free_slot().cloned(),
                free_slots: d.free_slot_count(),
            })
            .collect();

        DispatchSummary {
            served: self.served_count,
            pending: self.pending_count,
            doctors,
        }
    }

    /// Up to `k` patient ids with the most queued tokens.
    ///
    /// Reads both queues without draining them. Ties go to the lower
    /// patient id.
    pub fn top_k_frequent_patients(&self, k: usize) -> Vec<PatientId> {
        let mut frequency: HashMap<PatientId, usize> = HashMap::new();
        for token in self.routine.iter().chain(self.triage.iter()) {
            *frequency.entry(token.patient_id).or_insert(0) += 1;
        }

        let mut ranked: Vec<(PatientId, usize)> = frequency.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.into_iter().take(k).map(|(pid, _)| pid).collect()
    }

    /// Recompute derived state from scratch and compare.
    pub fn audit(&self) -> Result<(), InvariantViolation> {
        let actual = self.routine.len() + self.triage.len();
        if self.pending_count != actual {
            return Err(InvariantViolation::PendingDrift {
                recorded: self.pending_count,
                actual,
            });
        }

        let logged_serves = self
            .undo_log
            .iter()
            .filter(|a| matches!(a, UndoAction::Serve(_)))
            .count();
        if self.served_count != logged_serves {
            return Err(InvariantViolation::ServedDrift {
                recorded: self.served_count,
                actual: logged_serves,
            });
        }

        let mut seen_tokens = HashSet::new();
        let mut held_slots = HashSet::new();

        for token in self.routine.iter() {
            if token.kind != TokenKind::Routine {
                return Err(InvariantViolation::WrongKind {
                    token_id: token.token_id,
                    queue: "routine",
                });
            }
            if !seen_tokens.insert(token.token_id) {
                return Err(InvariantViolation::DuplicateToken(token.token_id));
            }

            let (Some(doctor_id), Some(slot_id)) = (token.doctor_id, token.slot_id) else {
                return Err(InvariantViolation::MissingSlotReference {
                    token_id: token.token_id,
                });
            };
            let slot = self
                .doctors
                .get(&doctor_id)
                .and_then(|d| d.slot(slot_id))
                .ok_or(InvariantViolation::DanglingSlot {
                    token_id: token.token_id,
                    doctor_id,
                    slot_id,
                })?;
            if !slot.booked {
                return Err(InvariantViolation::SlotNotBooked {
                    token_id: token.token_id,
                    doctor_id,
                    slot_id,
                });
            }
            if !held_slots.insert((doctor_id, slot_id)) {
                return Err(InvariantViolation::SlotShared { doctor_id, slot_id });
            }
        }

        for token in self.triage.iter() {
            if token.kind != TokenKind::Emergency {
                return Err(InvariantViolation::WrongKind {
                    token_id: token.token_id,
                    queue: "triage",
                });
            }
            if !seen_tokens.insert(token.token_id) {
                return Err(InvariantViolation::DuplicateToken(token.token_id));
            }
        }

        Ok(())
    }
}
