//! Severity-ordered emergency queue.
//!
//! A binary min-heap of emergency tokens. Tokens do not carry a severity:
//! every comparison asks the [`TriageOrder`] held by the queue, which in turn
//! reads the live [`PatientDirectory`]. A patient updated after admission is
//! therefore compared with the new severity from the next sift onwards.
//!
//! # Tie-break
//!
//! [`SeverityOrder`] reports equal severities as equal. The heap then keeps
//! whichever token its sift rules leave on top: a child only moves above its
//! parent when strictly smaller, and on the way down the left child wins over
//! an equal right child. This is deterministic for a given sequence of
//! operations, but it is neither arrival order nor patient-id order.

use std::cmp::Ordering;

use crate::directory::PatientDirectory;
use crate::models::{Token, TokenId};

/// Ordering capability injected into [`TriageQueue`].
///
/// `Ordering::Less` means `a` is more urgent than `b`.
pub trait TriageOrder {
    fn compare(&self, a: &Token, b: &Token, patients: &PatientDirectory) -> Ordering;
}

/// Ascending patient severity. Unknown patients sort after everyone else.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeverityOrder;

impl TriageOrder for SeverityOrder {
    fn compare(&self, a: &Token, b: &Token, patients: &PatientDirectory) -> Ordering {
        severity_key(a, patients).cmp(&severity_key(b, patients))
    }
}

/// Severity first, then the older token. Useful where arrival order matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeverityThenTokenOrder;

impl TriageOrder for SeverityThenTokenOrder {
    fn compare(&self, a: &Token, b: &Token, patients: &PatientDirectory) -> Ordering {
        severity_key(a, patients)
            .cmp(&severity_key(b, patients))
            .then(a.token_id.cmp(&b.token_id))
    }
}

// (missing, severity): a missing patient compares greater than any real one
fn severity_key(token: &Token, patients: &PatientDirectory) -> (bool, i32) {
    match patients.severity(token.patient_id) {
        Some(severity) => (false, severity),
        None => (true, i32::MAX),
    }
}

#[derive(Debug, Clone)]
pub struct TriageQueue<O = SeverityOrder> {
    heap: Vec<Token>,
    order: O,
}

impl TriageQueue<SeverityOrder> {
    pub fn new() -> Self {
        Self::with_order(SeverityOrder)
    }
}

impl Default for TriageQueue<SeverityOrder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: TriageOrder> TriageQueue<O> {
    pub fn with_order(order: O) -> Self {
        Self {
            heap: Vec::new(),
            order,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// O(log n).
    pub fn insert(&mut self, token: Token, patients: &PatientDirectory) {
        self.heap.push(token);
        self.sift_up(self.heap.len() - 1, patients);
    }

    /// Remove the most urgent token. O(log n).
    pub fn extract_min(&mut self, patients: &PatientDirectory) -> Option<Token> {
        if self.heap.is_empty() {
            return None;
        }
        let root = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            self.sift_down(0, patients);
        }
        Some(root)
    }

    /// Current root. Reflects severities as of the last sift.
    pub fn peek_min(&self) -> Option<&Token> {
        self.heap.first()
    }

    /// Heap storage order. Not severity order beyond the root.
    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.heap.iter()
    }

    /// Take a token out by id and rebuild the rest.
    ///
    /// The heap has no removal by identity, so this goes through
    /// [`Self::drain_and_reinsert`]. O(n log n).
    pub fn remove_token(&mut self, token_id: TokenId, patients: &PatientDirectory) -> Option<Token> {
        let mut found = false;
        let mut removed = self.drain_and_reinsert(patients, |token| {
            if !found && token.token_id == token_id {
                found = true;
                return false;
            }
            true
        });
        removed.pop()
    }

    /// Restore heap order after severities changed in the directory.
    pub fn reorder(&mut self, patients: &PatientDirectory) {
        self.drain_and_reinsert(patients, |_| true);
    }

    /// Empty the heap through `extract_min`, then `insert` every token `keep`
    /// accepts, one call each. Ordering is recomputed against the current
    /// directory rather than copied from the old layout. Returns the tokens
    /// that were left out.
    fn drain_and_reinsert<F>(&mut self, patients: &PatientDirectory, mut keep: F) -> Vec<Token>
    where
        F: FnMut(&Token) -> bool,
    {
        let mut drained = Vec::with_capacity(self.heap.len());
        while let Some(token) = self.extract_min(patients) {
            drained.push(token);
        }

        let mut dropped = Vec::new();
        for token in drained {
            if keep(&token) {
                self.insert(token, patients);
            } else {
                dropped.push(token);
            }
        }
        dropped
    }

    fn less(&self, i: usize, j: usize, patients: &PatientDirectory) -> bool {
        self.order.compare(&self.heap[i], &self.heap[j], patients) == Ordering::Less
    }

    fn sift_up(&mut self, mut idx: usize, patients: &PatientDirectory) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if !self.less(idx, parent, patients) {
                break;
            }
            self.heap.swap(idx, parent);
            idx = parent;
        }
    }

    fn sift_down(&mut self, mut idx: usize, patients: &PatientDirectory) {
        let n = self.heap.len();
        loop {
            let left = 2 * idx + 1;
            let right = left + 1;
            let mut smallest = idx;

            if left < n && self.less(left, smallest, patients) {
                smallest = left;
            }
            if right < n && self.less(right, smallest, patients) {
                smallest = right;
            }
            if smallest == idx {
                break;
            }
            self.heap.swap(idx, smallest);
            idx = smallest;
        }
    }
}
