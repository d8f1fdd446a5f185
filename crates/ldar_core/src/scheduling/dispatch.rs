//! Multi-crew dispatch: a max-heap over remaining day budget.
//!
//! When several crews of one method compete for the same candidate pool, the
//! next site always goes to whichever active crew has the most workday time
//! left (greedy longest-processing-time-first). Ties break on the lower crew
//! index so dispatch order is fully deterministic.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Slot {
    remaining_mins: f64,
    crew: usize,
}

impl Eq for Slot {}

impl Ord for Slot {
    fn cmp(&self, other: &Self) -> Ordering {
        self.remaining_mins
            .total_cmp(&other.remaining_mins)
            .then_with(|| other.crew.cmp(&self.crew))
    }
}

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct DispatchQueue {
    heap: BinaryHeap<Slot>,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, crew: usize, remaining_mins: f64) {
        if remaining_mins > 0.0 {
            self.heap.push(Slot {
                remaining_mins,
                crew,
            });
        }
    }

    /// Pop the crew with the most remaining time.
    pub fn pop(&mut self) -> Option<(usize, f64)> {
        self.heap.pop().map(|slot| (slot.crew, slot.remaining_mins))
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_remaining_time_dispatches_first() {
        let mut queue = DispatchQueue::new();
        queue.push(0, 120.0);
        queue.push(1, 480.0);
        queue.push(2, 300.0);

        assert_eq!(queue.pop(), Some((1, 480.0)));
        assert_eq!(queue.pop(), Some((2, 300.0)));
        assert_eq!(queue.pop(), Some((0, 120.0)));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn ties_dispatch_lower_crew_index_first() {
        let mut queue = DispatchQueue::new();
        queue.push(3, 200.0);
        queue.push(1, 200.0);
        assert_eq!(queue.pop(), Some((1, 200.0)));
        assert_eq!(queue.pop(), Some((3, 200.0)));
    }

    #[test]
    fn exhausted_crews_are_not_queued() {
        let mut queue = DispatchQueue::new();
        queue.push(0, 0.0);
        queue.push(1, -5.0);
        assert!(queue.is_empty());
    }
}
