//! End-to-end dispatch scenarios.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::thread;

use clinic_dispatch::{
    DispatchEngine, DispatchError, Doctor, EngineConfig, Patient, SeverityThenTokenOrder, Slot,
    TokenId, TokenKind, UndoOutcome,
};

fn doctor(id: u32, slot_ids: &[u32]) -> Doctor {
    let mut doctor = Doctor::new(id, format!("Dr. {}", id), "General");
    for &slot_id in slot_ids {
        doctor.add_slot(Slot::new(slot_id, "09:00", "09:15"));
    }
    doctor
}

fn slot_booked(engine: &DispatchEngine, doctor_id: u32, slot_id: u32) -> bool {
    engine
        .doctor(doctor_id)
        .and_then(|d| d.slot(slot_id))
        .map_or(false, |s| s.booked)
}

fn routine_ids(engine: &DispatchEngine) -> Vec<TokenId> {
    engine.routine_tokens().iter().map(|t| t.token_id).collect()
}

fn triage_ids(engine: &DispatchEngine) -> BTreeSet<TokenId> {
    engine.triage_tokens().iter().map(|t| t.token_id).collect()
}

#[test]
fn test_scenario_a_single_free_slot() {
    let mut engine = DispatchEngine::with_capacity(2);
    engine.add_doctor(doctor(1, &[101]));
    engine.register(Patient::new(1, "Alice", 30, 5));

    assert!(engine.book_routine(1, 1).is_ok());
    assert_eq!(
        engine.book_routine(1, 1),
        Err(DispatchError::NoFreeSlot { doctor_id: 1 })
    );
    assert_eq!(engine.routine_len(), 1);
    assert_eq!(engine.pending_count(), 1);
}

#[test]
fn test_scenario_b_lower_severity_first() {
    let mut engine = DispatchEngine::with_capacity(2);
    engine.register(Patient::new(1, "P1", 30, 5));
    engine.register(Patient::new(2, "P2", 40, 2));

    let p1 = engine.triage_insert(1).unwrap();
    let p2 = engine.triage_insert(2).unwrap();

    assert_eq!(engine.serve_next(), Some(p2));
    assert_eq!(engine.serve_next(), Some(p1));
    assert_eq!(engine.serve_next(), None);
}

#[test]
fn test_scenario_c_undo_booking() {
    let mut engine = DispatchEngine::with_capacity(4);
    engine.add_doctor(doctor(1, &[101, 102]));
    engine.register(Patient::new(1, "Alice", 30, 5));

    let token = engine.book_routine(1, 1).unwrap();
    assert!(slot_booked(&engine, 1, 101));
    let pending = engine.pending_count();

    assert_eq!(engine.undo(), UndoOutcome::Booking(token.token_id));
    assert!(!slot_booked(&engine, 1, 101));
    assert_eq!(engine.pending_count(), pending - 1);
    assert!(!routine_ids(&engine).contains(&token.token_id));
    assert!(engine.audit().is_ok());
}

#[test]
fn test_scenario_d_undo_emergency_serve() {
    let mut engine = DispatchEngine::with_capacity(4);
    engine.add_doctor(doctor(1, &[101]));
    engine.register(Patient::new(1, "Alice", 30, 5));
    engine.register(Patient::new(2, "Bob", 45, 2));
    engine.book_routine(1, 1).unwrap();

    let emergency = engine.triage_insert(2).unwrap();
    assert_eq!(engine.serve_next(), Some(emergency.clone()));
    assert_eq!(engine.triage_len(), 0);

    assert_eq!(engine.undo(), UndoOutcome::Serve(emergency.token_id));
    assert!(triage_ids(&engine).contains(&emergency.token_id));
    assert_eq!(engine.served_count(), 0);
    assert_eq!(engine.serve_next(), Some(emergency));
}

#[test]
fn test_scenario_e_undo_register() {
    let mut engine = DispatchEngine::with_capacity(4);
    engine.register(Patient::new(7, "Grace", 70, 3));
    assert!(engine.get_patient(7).is_some());

    assert_eq!(engine.undo(), UndoOutcome::Registered(7));
    assert!(engine.get_patient(7).is_none());
    assert_eq!(engine.undo(), UndoOutcome::NothingToUndo);
}

#[test]
fn test_undo_triage_is_inverse() {
    let mut engine = DispatchEngine::with_capacity(4);
    for (id, severity) in [(1, 4), (2, 1), (3, 7)] {
        engine.register(Patient::new(id, format!("P{}", id), 50, severity));
    }
    engine.triage_insert(1).unwrap();
    engine.triage_insert(3).unwrap();
    let before = triage_ids(&engine);
    let pending = engine.pending_count();

    engine.triage_insert(2).unwrap();
    engine.undo();

    assert_eq!(triage_ids(&engine), before);
    assert_eq!(engine.pending_count(), pending);
    assert!(engine.audit().is_ok());
}

#[test]
fn test_undo_booking_keeps_queue_order() {
    let mut engine = DispatchEngine::with_capacity(4);
    engine.add_doctor(doctor(1, &[101, 102, 103]));

    let first = engine.book_routine(1, 1).unwrap();
    let second = engine.book_routine(2, 1).unwrap();
    let third = engine.book_routine(3, 1).unwrap();

    engine.undo();
    assert_eq!(routine_ids(&engine), vec![first.token_id, second.token_id]);
    assert!(!slot_booked(&engine, 1, 103));

    // the freed slot is handed out again, under a new token id
    let again = engine.book_routine(3, 1).unwrap();
    assert_eq!(again.slot_id, Some(103));
    assert!(again.token_id > third.token_id);
}

#[test]
fn test_rejected_booking_leaves_slot_free() {
    let mut engine = DispatchEngine::with_capacity(1);
    engine.add_doctor(doctor(1, &[101]));
    engine.add_doctor(doctor(2, &[201]));

    engine.book_routine(1, 1).unwrap();
    assert_eq!(
        engine.book_routine(2, 2),
        Err(DispatchError::QueueFull { capacity: 1 })
    );
    assert!(!slot_booked(&engine, 2, 201));
    assert_eq!(engine.undo_depth(), 1);
}

#[test]
fn test_emergency_beats_long_waiting_routine() {
    let mut engine = DispatchEngine::with_capacity(8);
    engine.add_doctor(doctor(1, &[101, 102, 103]));
    engine.register(Patient::new(9, "Late", 20, 100));

    for pid in 1..=3 {
        engine.book_routine(pid, 1).unwrap();
    }
    let emergency = engine.triage_insert(9).unwrap();

    let served = engine.serve_next().unwrap();
    assert_eq!(served.token_id, emergency.token_id);
    assert_eq!(served.kind, TokenKind::Emergency);
}

#[test]
fn test_injected_order_breaks_ties_by_token() {
    let config = EngineConfig::new(4).unwrap();
    let mut engine = DispatchEngine::with_order(&config, SeverityThenTokenOrder);
    for id in 1..=4 {
        engine.register(Patient::new(id, format!("P{}", id), 30, 2));
    }
    let tokens: Vec<TokenId> = (1..=4)
        .rev()
        .map(|pid| engine.triage_insert(pid).unwrap().token_id)
        .collect();

    let served: Vec<TokenId> = std::iter::from_fn(|| engine.serve_next())
        .map(|t| t.token_id)
        .collect();
    assert_eq!(served, tokens);
}

#[test]
fn test_dangling_patient_tokens_do_not_fault() {
    let mut engine = DispatchEngine::with_capacity(4);
    engine.register(Patient::new(1, "Alice", 30, 5));
    engine.register(Patient::new(2, "Bob", 45, 9));
    let alice = engine.triage_insert(1).unwrap();
    let bob = engine.triage_insert(2).unwrap();

    // re-registering Alice puts a Register on top of the log
    engine.register(Patient::new(1, "Alice", 30, 1));
    engine.undo();

    assert!(engine.get_patient(1).is_none());
    assert_eq!(engine.top_k_frequent_patients(5), vec![1, 2]);
    assert_eq!(engine.serve_next(), Some(bob));
    assert_eq!(engine.serve_next(), Some(alice));
}

#[test]
fn test_shared_engine_issues_unique_tokens() {
    let engine = Arc::new(Mutex::new(DispatchEngine::with_capacity(64)));
    {
        let mut guard = engine.lock().unwrap();
        let slots: Vec<u32> = (1..=40).collect();
        guard.add_doctor(doctor(1, &slots));
    }

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                (0..10)
                    .map(|i| {
                        let mut guard = engine.lock().unwrap();
                        guard.book_routine(worker * 100 + i, 1).unwrap().token_id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids = BTreeSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(ids.insert(id));
        }
    }

    let guard = engine.lock().unwrap();
    assert_eq!(ids.len(), 40);
    assert_eq!(guard.pending_count(), 40);
    assert_eq!(guard.doctor(1).map(|d| d.free_slot_count()), Some(0));
    assert!(guard.audit().is_ok());
}
