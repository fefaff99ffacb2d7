//! Undo log of reversible engine actions.
//!
//! Strict LIFO: actions are recorded in the order they are performed and
//! reversed newest first. There is no redo.

use std::fmt;

use crate::models::{PatientId, Token, TokenId};

/// A mutation the engine knows how to reverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoAction {
    Register(PatientId),
    Book(Token),
    Triage(Token),
    Serve(Token),
}

#[derive(Debug, Clone, Default)]
pub struct UndoLog {
    actions: Vec<UndoAction>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, action: UndoAction) {
        self.actions.push(action);
    }

    pub fn pop(&mut self) -> Option<UndoAction> {
        self.actions.pop()
    }

    pub fn peek(&self) -> Option<&UndoAction> {
        self.actions.last()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &UndoAction> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// What an `undo` call reversed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    NothingToUndo,
    Registered(PatientId),
    Booking(TokenId),
    Triage(TokenId),
    Serve(TokenId),
}

impl UndoOutcome {
    pub fn is_nothing(&self) -> bool {
        matches!(self, UndoOutcome::NothingToUndo)
    }
}

impl fmt::Display for UndoOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndoOutcome::NothingToUndo => write!(f, "Nothing to undo"),
            UndoOutcome::Registered(pid) => write!(f, "Undid patient register {}", pid),
            UndoOutcome::Booking(id) => write!(f, "Undid booking {}", id),
            UndoOutcome::Triage(id) => write!(f, "Undid triage {}", id),
            UndoOutcome::Serve(id) => write!(f, "Undid serve {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifo() {
        let mut log = UndoLog::new();
        log.record(UndoAction::Register(1));
        log.record(UndoAction::Triage(Token::emergency(1, 1)));

        assert_eq!(log.len(), 2);
        assert!(matches!(log.pop(), Some(UndoAction::Triage(_))));
        assert_eq!(log.pop(), Some(UndoAction::Register(1)));
        assert!(log.pop().is_none());
        assert!(log.is_empty());
    }

    #[test]
    fn test_outcome_descriptions() {
        assert_eq!(UndoOutcome::NothingToUndo.to_string(), "Nothing to undo");
        assert_eq!(UndoOutcome::Booking(4).to_string(), "Undid booking 4");
        assert_eq!(UndoOutcome::Registered(3).to_string(), "Undid patient register 3");
        assert!(UndoOutcome::NothingToUndo.is_nothing());
        assert!(!UndoOutcome::Serve(1).is_nothing());
    }
}
