//! Patient directory keyed by patient id.

use std::collections::HashMap;

use crate::models::{Patient, PatientId};

#[derive(Debug, Clone, Default)]
pub struct PatientDirectory {
    patients: HashMap<PatientId, Patient>,
}

impl PatientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the table for roughly `capacity` patients.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            patients: HashMap::with_capacity(capacity),
        }
    }

    /// Insert or overwrite by id. Returns the previous record, if any.
    pub fn upsert(&mut self, patient: Patient) -> Option<Patient> {
        self.patients.insert(patient.id, patient)
    }

    pub fn get(&self, id: PatientId) -> Option<&Patient> {
        self.patients.get(&id)
    }

    /// Remove by id. Returns whether the patient was present.
    pub fn delete(&mut self, id: PatientId) -> bool {
        self.patients.remove(&id).is_some()
    }

    /// Current severity, or `None` if the patient is unknown.
    pub fn severity(&self, id: PatientId) -> Option<i32> {
        self.patients.get(&id).map(|p| p.severity)
    }

    pub fn contains(&self, id: PatientId) -> bool {
        self.patients.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }
}
