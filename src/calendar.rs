//! Slot ledger for the dispatch engine.
//!
//! This module provides the Doctor struct which owns an insertion-ordered
//! sequence of appointment slots and allocates them first-free-first.

use crate::models::{DoctorId, Slot, SlotId};
use chrono::{Duration, NaiveTime};
use std::fmt;

#[derive(Debug, Clone)]
pub struct Doctor {
    pub id: DoctorId,
    pub name: String,
    pub specialization: String,
    slots: Vec<Slot>,
}

impl Doctor {
    /// Initialize a doctor with an empty slot ledger.
    pub fn new(id: DoctorId, name: impl Into<String>, specialization: impl Into<String>) -> Self {
        Doctor {
            id,
            name: name.into(),
            specialization: specialization.into(),
            slots: Vec::new(),
        }
    }

    /// All slots in insertion order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, slot_id: SlotId) -> Option<&Slot> {
        self.slots.iter().find(|s| s.slot_id == slot_id)
    }

    /// Append a slot to the end of the ledger.
    pub fn add_slot(&mut self, slot: Slot) {
        self.slots.push(slot);
    }

    /// Remove a slot by id, booked or not.
    pub fn cancel_slot(&mut self, slot_id: SlotId) -> bool {
        match self.slots.iter().position(|s| s.slot_id == slot_id) {
            Some(idx) => {
                self.slots.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Generate `count` back-to-back slots starting at `start`.
    ///
    /// Slot ids run consecutively from `first_slot_id`. Times are stored as
    /// `HH:MM` labels.
    pub fn generate_slots(
        &mut self,
        first_slot_id: SlotId,
        start: NaiveTime,
        slot_duration_minutes: i64,
        count: u32,
    ) -> Vec<Slot> {
        let mut created = Vec::new();
        let mut current = start;

        for offset in 0..count {
            let (slot_end, wrapped) =
                current.overflowing_add_signed(Duration::minutes(slot_duration_minutes));
            // stop at midnight rather than wrap into the next day
            if wrapped != 0 {
                break;
            }

            let slot = Slot::new(
                first_slot_id + offset,
                current.format("%H:%M").to_string(),
                slot_end.format("%H:%M").to_string(),
            );
            self.add_slot(slot.clone());
            created.push(slot);
            current = slot_end;
        }

        created
    }

    /// First unbooked slot in insertion order.
    pub fn next_free_slot(&self) -> Option<&Slot> {
        self.slots.iter().find(|s| s.is_free())
    }

    /// Mark a slot as booked. Fails if it is missing or already booked.
    pub fn book_slot(&mut self, slot_id: SlotId) -> bool {
        match self.slots.iter_mut().find(|s| s.slot_id == slot_id) {
            Some(slot) if slot.is_free() => {
                slot.booked = true;
                true
            }
            _ => false,
        }
    }

    /// Return a booked slot to the free pool. Fails if it is missing.
    pub fn release_slot(&mut self, slot_id: SlotId) -> bool {
        match self.slots.iter_mut().find(|s| s.slot_id == slot_id) {
            Some(slot) => {
                slot.booked = false;
                true
            }
            None => false,
        }
    }

    /// Number of slots still open for booking.
    pub fn free_slot_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_free()).count()
    }
}

impl fmt::Display for Doctor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Doctor[id={},name={},spec={},pendingSlots={}]",
            self.id,
            self.name,
            self.specialization,
            self.free_slot_count()
        )
    }
}
