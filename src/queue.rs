//! Bounded FIFO of routine admissions.
//!
//! Capacity is fixed at construction and never grows: a full queue rejects
//! new tokens and hands them back to the caller untouched.

use std::collections::VecDeque;

use crate::models::{Token, TokenId};

#[derive(Debug, Clone)]
pub struct RoutineQueue {
    tokens: VecDeque<Token>,
    capacity: usize,
}

impl RoutineQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            tokens: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tokens.len() >= self.capacity
    }

    /// Append at the tail. A full queue returns the token as `Err`.
    pub fn enqueue(&mut self, token: Token) -> Result<(), Token> {
        if self.is_full() {
            return Err(token);
        }
        self.tokens.push_back(token);
        Ok(())
    }

    /// Remove the oldest token.
    pub fn dequeue(&mut self) -> Option<Token> {
        self.tokens.pop_front()
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.front()
    }

    /// Oldest to newest, without disturbing the queue.
    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }

    fn drain_all(&mut self) -> Vec<Token> {
        let mut drained = Vec::with_capacity(self.tokens.len());
        while let Some(token) = self.dequeue() {
            drained.push(token);
        }
        drained
    }

    /// Take a token out by id, keeping the others in their original order.
    ///
    /// The queue exposes no positional removal, so this drains every token
    /// and re-enqueues the survivors. O(n).
    pub fn remove_token(&mut self, token_id: TokenId) -> Option<Token> {
        let mut removed = None;
        for token in self.drain_all() {
            if removed.is_none() && token.token_id == token_id {
                removed = Some(token);
                continue;
            }
            let refilled = self.enqueue(token);
            debug_assert!(refilled.is_ok(), "drained token no longer fits");
        }
        removed
    }

    /// Put a token back at the head, ahead of everything already queued.
    ///
    /// Drains, enqueues `token` first, then the rest in original order. If
    /// the queue is full the token is handed back and nothing changes.
    pub fn push_front(&mut self, token: Token) -> Result<(), Token> {
        if self.is_full() {
            return Err(token);
        }
        let rest = self.drain_all();
        for queued in std::iter::once(token).chain(rest) {
            let refilled = self.enqueue(queued);
            debug_assert!(refilled.is_ok(), "drained token no longer fits");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(id: TokenId) -> Token {
        Token::routine(id, id as u32, 1, 100 + id as u32)
    }

    fn ids(queue: &RoutineQueue) -> Vec<TokenId> {
        queue.iter().map(|t| t.token_id).collect()
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = RoutineQueue::new(3);
        queue.enqueue(token(1)).unwrap();
        queue.enqueue(token(2)).unwrap();

        assert_eq!(queue.peek().map(|t| t.token_id), Some(1));
        assert_eq!(queue.dequeue().map(|t| t.token_id), Some(1));
        assert_eq!(queue.dequeue().map(|t| t.token_id), Some(2));
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn test_full_queue_rejects_without_side_effect() {
        let mut queue = RoutineQueue::new(2);
        queue.enqueue(token(1)).unwrap();
        queue.enqueue(token(2)).unwrap();

        let rejected = queue.enqueue(token(3)).unwrap_err();
        assert_eq!(rejected.token_id, 3);
        assert_eq!(ids(&queue), vec![1, 2]);
        assert!(queue.is_full());
    }

    #[test]
    fn test_remove_token_preserves_order() {
        let mut queue = RoutineQueue::new(4);
        for id in 1..=4 {
            queue.enqueue(token(id)).unwrap();
        }

        let removed = queue.remove_token(2);
        assert_eq!(removed.map(|t| t.token_id), Some(2));
        assert_eq!(ids(&queue), vec![1, 3, 4]);

        assert!(queue.remove_token(99).is_none());
        assert_eq!(ids(&queue), vec![1, 3, 4]);
    }

    #[test]
    fn test_push_front() {
        let mut queue = RoutineQueue::new(3);
        queue.enqueue(token(2)).unwrap();
        queue.enqueue(token(3)).unwrap();

        queue.push_front(token(1)).unwrap();
        assert_eq!(ids(&queue), vec![1, 2, 3]);

        assert!(queue.push_front(token(0)).is_err());
        assert_eq!(ids(&queue), vec![1, 2, 3]);
    }

    #[test]
    fn test_helpers_refill_a_full_queue() {
        let mut queue = RoutineQueue::new(3);
        for id in 1..=3 {
            queue.enqueue(token(id)).unwrap();
        }

        assert_eq!(queue.remove_token(9), None);
        assert_eq!(ids(&queue), vec![1, 2, 3]);

        assert_eq!(queue.remove_token(3).map(|t| t.token_id), Some(3));
        queue.push_front(token(3)).unwrap();
        assert_eq!(ids(&queue), vec![3, 1, 2]);
        assert!(queue.is_full());
    }

    #[test]
    fn test_iter_is_non_destructive() {
        let mut queue = RoutineQueue::new(2);
        queue.enqueue(token(5)).unwrap();
        assert_eq!(queue.iter().count(), 1);
        assert_eq!(queue.len(), 1);
    }
}
