//! # Bounded LIFO stack.
//!
//! [`BoundedStack`] is the storage primitive behind every handler. It keeps at
//! most `capacity` entries; pushing onto a full stack evicts the **oldest**
//! entry, so the stack always holds the most recently registered tasks.
//!
//! ```text
//! capacity = 3
//!   push A   [A]
//!   push B   [A, B]
//!   push C   [A, B, C]
//!   push D   [B, C, D]      (A evicted)
//!   pop      D              (newest first)
//! ```

use std::collections::VecDeque;

use crate::core::runner::{self, DrainSummary};
use crate::events::StackKind;
use crate::subscribers::SubscriberSet;
use crate::tasks::Task;

/// Capacity-limited last-in-first-out container.
#[derive(Debug)]
pub struct BoundedStack<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedStack<T> {
    /// Creates an empty stack; `capacity` is clamped to a minimum of 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Pushes `item` on top.
    ///
    /// Returns the evicted bottom-most entry if the stack was already full.
    pub fn push(&mut self, item: T) -> Option<T> {
        self.entries.push_back(item);
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Removes and returns the newest entry.
    pub fn pop(&mut self) -> Option<T> {
        self.entries.pop_back()
    }

    /// Removes and returns the oldest entry.
    pub fn pop_oldest(&mut self) -> Option<T> {
        self.entries.pop_front()
    }

    /// Current number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no entries are held.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of retained entries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Task + ?Sized> BoundedStack<Box<T>> {
    /// Pops and runs every entry, newest first, until the stack is empty.
    ///
    /// A failing entry is reported to `subs` and the drain moves on.
    pub fn drain_all(&mut self, kind: StackKind, subs: &SubscriberSet) -> DrainSummary {
        let pending = self.len();
        runner::drain(kind, subs, pending, || self.pop())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::subscribers::Collector;
    use crate::tasks::{LocalTask, TaskFn};
    use crate::{EventKind, TaskError};
    use std::sync::Arc;

    fn explode() {
        panic!("kaboom");
    }

    fn quiet() -> SubscriberSet {
        SubscriberSet::new(Vec::new())
    }

    #[test]
    fn test_push_pop_is_lifo() {
        let mut s = BoundedStack::new(4);
        s.push('a');
        s.push('b');
        s.push('c');
        assert_eq!(s.pop(), Some('c'));
        assert_eq!(s.pop(), Some('b'));
        assert_eq!(s.pop(), Some('a'));
        assert_eq!(s.pop(), None);
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut s = BoundedStack::new(3);
        for i in 0..3 {
            assert_eq!(s.push(i), None);
        }
        assert_eq!(s.push(3), Some(0));
        assert_eq!(s.push(4), Some(1));
        assert_eq!(s.len(), 3);
        assert_eq!(s.pop_oldest(), Some(2));
        assert_eq!(s.pop(), Some(4));
    }

    #[test]
    fn test_capacity_is_clamped() {
        let mut s = BoundedStack::new(0);
        assert_eq!(s.capacity(), 1);
        s.push(1);
        assert_eq!(s.push(2), Some(1));
    }

    #[test]
    fn test_drain_runs_in_reverse_push_order() {
        let order = RefCell::new(Vec::new());
        let mut s: BoundedStack<LocalTask<'_>> = BoundedStack::new(10);
        for name in ["A", "B", "C"] {
            let order = &order;
            s.push(TaskFn::boxed(name, move || order.borrow_mut().push(name)));
        }

        let summary = s.drain_all(StackKind::Function, &quiet());

        assert_eq!(*order.borrow(), vec!["C", "B", "A"]);
        assert_eq!(summary.ran, 3);
        assert!(s.is_empty());
    }

    #[test]
    fn test_failures_do_not_stop_drain() {
        let order = RefCell::new(Vec::new());
        let collector = Arc::new(Collector::new());
        let subs = SubscriberSet::new(vec![collector.clone()]);

        let mut s: BoundedStack<LocalTask<'_>> = BoundedStack::new(10);
        s.push(TaskFn::boxed("cleanup1", || order.borrow_mut().push("cleanup1")));
        s.push(TaskFn::boxed("boom", || -> Result<(), TaskError> {
            Err(TaskError::fail("boom"))
        }));
        s.push(TaskFn::boxed("panics", explode));
        s.push(TaskFn::boxed("cleanup3", || order.borrow_mut().push("cleanup3")));

        let summary = s.drain_all(StackKind::Function, &subs);

        assert_eq!(*order.borrow(), vec!["cleanup3", "cleanup1"]);
        assert_eq!(summary.ran, 4);
        assert_eq!(summary.failed, 2);

        let failed = collector.of_kind(EventKind::TaskFailed);
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0].task.as_deref(), Some("panics"));
        assert_eq!(failed[1].task.as_deref(), Some("boom"));
    }

    #[test]
    fn test_drain_empty_is_noop() {
        let collector = Arc::new(Collector::new());
        let subs = SubscriberSet::new(vec![collector.clone()]);
        let mut s: BoundedStack<LocalTask<'_>> = BoundedStack::new(5);

        let summary = s.drain_all(StackKind::Function, &subs);

        assert_eq!(summary, DrainSummary::default());
        assert!(collector.events().is_empty());
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn test_capacity_eviction_keeps_most_recent() {
        let ran = RefCell::new(Vec::new());
        let mut s: BoundedStack<LocalTask<'_>> = BoundedStack::new(100);
        for i in 0..150 {
            let ran = &ran;
            s.push(TaskFn::boxed("n", move || ran.borrow_mut().push(i)));
        }
        assert_eq!(s.len(), 100);

        s.drain_all(StackKind::Global, &quiet());

        let ran = ran.borrow();
        assert_eq!(ran.len(), 100);
        assert_eq!(ran.first(), Some(&149));
        assert_eq!(ran.last(), Some(&50));
    }
}
