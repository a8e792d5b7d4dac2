//! Deterministic virtual-time scheduler.
//!
//! Every wait in the engine is a scheduled continuation. Entries are ordered
//! by due time and then by insertion, so two ticks due at the same instant
//! fire in the order they were scheduled. Time only moves when the host
//! pops due entries, which lets tests single-step the whole game.

use std::collections::{BTreeMap, HashMap};

/// Handle to one scheduled entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
pub struct Scheduler<T> {
    now: u64,
    next_id: u64,
    queue: BTreeMap<(u64, u64), T>,
    due_by_id: HashMap<u64, u64>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_id: 0,
            queue: BTreeMap::new(),
            due_by_id: HashMap::new(),
        }
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Schedule `tick` to fire `delay_ms` from now.
    pub fn schedule(&mut self, delay_ms: u64, tick: T) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        let due = self.now.saturating_add(delay_ms);
        self.queue.insert((due, id), tick);
        self.due_by_id.insert(id, due);
        TimerId(id)
    }

    /// Cancel a pending entry. Returns false if it already fired or was
    /// cancelled before.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.due_by_id.remove(&id.0) {
            Some(due) => self.queue.remove(&(due, id.0)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.due_by_id.contains_key(&id.0)
    }

    /// Due time of the earliest pending entry.
    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|&(due, _)| due)
    }

    /// Pop the earliest entry due at or before `until`, moving the clock to
    /// its due time.
    pub fn pop_due(&mut self, until: u64) -> Option<(TimerId, T)> {
        let (&(due, id), _) = self.queue.iter().next()?;
        if due > until {
            return None;
        }
        let tick = self.queue.remove(&(due, id))?;
        self.due_by_id.remove(&id);
        self.now = self.now.max(due);
        Some((TimerId(id), tick))
    }

    /// Move the clock forward without firing anything.
    pub fn advance_to(&mut self, time: u64) {
        self.now = self.now.max(time);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Cancellation token for one repeating or one-shot timer.
///
/// Arming replaces (and cancels) whatever the slot held before. A fired
/// timer whose id no longer matches the slot is stale and must be ignored.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimerSlot {
    pending: Option<TimerId>,
}

impl TimerSlot {
    pub fn arm<T>(&mut self, scheduler: &mut Scheduler<T>, delay_ms: u64, tick: T) -> TimerId {
        self.cancel(scheduler);
        let id = scheduler.schedule(delay_ms, tick);
        self.pending = Some(id);
        id
    }

    /// Cancel the pending timer, if any. Returns true if one was pending.
    pub fn cancel<T>(&mut self, scheduler: &mut Scheduler<T>) -> bool {
        match self.pending.take() {
            Some(id) => scheduler.cancel(id),
            None => false,
        }
    }

    /// Accept a fired timer. Returns false for stale ids.
    pub fn fire(&mut self, id: TimerId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule(30, "c");
        s.schedule(10, "a");
        s.schedule(20, "b");
        let order: Vec<_> = std::iter::from_fn(|| s.pop_due(100).map(|(_, t)| t)).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(s.now(), 30);
    }

    #[test]
    fn same_due_keeps_insertion_order() {
        let mut s = Scheduler::new();
        s.schedule(5, 1);
        s.schedule(5, 2);
        s.schedule(5, 3);
        let order: Vec<_> = std::iter::from_fn(|| s.pop_due(5).map(|(_, t)| t)).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn nothing_pops_before_due() {
        let mut s = Scheduler::new();
        s.schedule(50, ());
        assert!(s.pop_due(49).is_none());
        assert_eq!(s.now(), 0);
        assert_eq!(s.next_due(), Some(50));
    }

    #[test]
    fn delays_are_relative_to_now() {
        let mut s = Scheduler::new();
        s.advance_to(100);
        s.schedule(10, ());
        assert_eq!(s.next_due(), Some(110));
        s.advance_to(50);
        assert_eq!(s.now(), 100);
    }

    #[test]
    fn cancelled_entry_never_fires() {
        let mut s = Scheduler::new();
        let id = s.schedule(10, "gone");
        s.schedule(20, "kept");
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(!s.is_pending(id));
        assert_eq!(s.pop_due(100).map(|(_, t)| t), Some("kept"));
        assert!(s.is_empty());
    }

    #[test]
    fn slot_rearm_cancels_previous() {
        let mut s = Scheduler::new();
        let mut slot = TimerSlot::default();
        let first = slot.arm(&mut s, 10, 1);
        let second = slot.arm(&mut s, 10, 2);
        assert!(!s.is_pending(first));
        assert_eq!(s.len(), 1);
        let (id, tick) = s.pop_due(10).unwrap();
        assert_eq!(tick, 2);
        assert!(!slot.fire(first));
        assert!(slot.fire(second));
        assert_eq!(id, second);
        assert!(!slot.is_armed());
    }

    #[test]
    fn slot_cancel_reports_pending() {
        let mut s: Scheduler<()> = Scheduler::new();
        let mut slot = TimerSlot::default();
        assert!(!slot.cancel(&mut s));
        slot.arm(&mut s, 5, ());
        assert!(slot.cancel(&mut s));
        assert!(s.is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn pops_are_time_ordered_and_clock_monotone(
                delays in proptest::collection::vec(0u64..500, 1..40),
                cancel_mask in proptest::collection::vec(any::<bool>(), 40),
            ) {
                let mut s = Scheduler::new();
                let ids: Vec<_> = delays
                    .iter()
                    .enumerate()
                    .map(|(i, &d)| s.schedule(d, i))
                    .collect();
                let mut cancelled = 0;
                for (id, &cancel) in ids.iter().zip(cancel_mask.iter()) {
                    if cancel && s.cancel(*id) {
                        cancelled += 1;
                    }
                }
                let mut last = (0u64, 0usize);
                let mut popped = 0;
                let mut first = true;
                while let Some((_, i)) = s.pop_due(u64::MAX) {
                    let key = (delays[i], i);
                    if !first {
                        prop_assert!(key > last);
                    }
                    prop_assert_eq!(s.now(), delays[i]);
                    last = key;
                    first = false;
                    popped += 1;
                }
                prop_assert_eq!(popped + cancelled, delays.len());
            }
        }
    }
}
