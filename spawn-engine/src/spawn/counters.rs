//! Population bookkeeping of a spawn group.
//!
//! `current`, `scheduled`, `maximum`, `respawn_enabled` and the ids of the live npcs share one
//! lock. Every read-modify-write the engine needs is a single method here, so concurrent
//! removals and respawn firings can never push `current + scheduled` over `maximum`.
//!
use crate::indices::ObjectId;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct CounterSnapshot {
    pub current: u32,
    pub scheduled: u32,
    pub maximum: u32,
    pub respawn_enabled: bool,
}

impl CounterSnapshot {
    fn has_room(&self) -> bool {
        self.current + self.scheduled < self.maximum
    }
}

/// Outcome of an npc leaving the world
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(super) enum Removal {
    /// The npc is not live in this group, the removal was not counted
    Ignored,
    /// Counted, no respawn
    Released,
    /// Counted and a respawn slot was reserved; the caller must schedule exactly one task
    Reserved,
}

#[derive(Debug, Default)]
struct CounterState {
    counts: CounterSnapshot,
    /// Npcs put into the world by this group that have not been removed yet
    live: HashSet<ObjectId>,
}

#[derive(Debug, Default)]
pub(super) struct Counters(Mutex<CounterState>);

/// A counted live slot whose npc is not in the world yet.
///
/// Dropping it without [commit](LiveSlot::commit) gives the slot back, during unwinding too.
#[must_use]
pub(super) struct LiveSlot<'a> {
    counters: &'a Counters,
    id: Option<ObjectId>,
    committed: bool,
}

impl<'a> LiveSlot<'a> {
    fn new(counters: &'a Counters) -> Self {
        Self {
            counters,
            id: None,
            committed: false,
        }
    }

    /// Record the id of the npc about to enter the world
    pub fn bind(&mut self, id: ObjectId) {
        self.counters.lock().live.insert(id);
        self.id = Some(id);
    }

    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl<'a> Drop for LiveSlot<'a> {
    fn drop(&mut self) {
        if !self.committed {
            self.counters.release(self.id.take());
        }
    }
}

impl Counters {
    fn lock(&self) -> MutexGuard<CounterState> {
        self.0.lock().unwrap_or_else(|err| err.into_inner())
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        self.lock().counts
    }

    pub fn set_maximum(&self, maximum: u32) {
        self.lock().counts.maximum = maximum;
    }

    pub fn set_respawn_enabled(&self, enabled: bool) {
        self.lock().counts.respawn_enabled = enabled;
    }

    pub fn has_room(&self) -> bool {
        self.lock().counts.has_room()
    }

    pub fn is_live(&self, id: ObjectId) -> bool {
        self.lock().live.contains(&id)
    }

    /// Count a new live npc if there is room for it
    pub fn claim_live(&self) -> Option<LiveSlot<'_>> {
        let mut state = self.lock();
        if state.counts.has_room() {
            state.counts.current += 1;
            Some(LiveSlot::new(self))
        } else {
            None
        }
    }

    fn release(&self, id: Option<ObjectId>) {
        let mut state = self.lock();
        state.counts.current = state.counts.current.saturating_sub(1);
        if let Some(id) = id {
            state.live.remove(&id);
        }
    }

    /// Count the removal of the live npc `id`.
    ///
    /// Ids this group does not know as live are ignored, so reporting the same death twice, or
    /// reporting a stale copy of an npc, never frees a second slot.
    pub fn remove_live(&self, id: ObjectId) -> Removal {
        let mut state = self.lock();
        if !state.live.remove(&id) {
            return Removal::Ignored;
        }
        let c = &mut state.counts;
        c.current = c.current.saturating_sub(1);
        if c.respawn_enabled && c.has_room() {
            c.scheduled += 1;
            Removal::Reserved
        } else {
            Removal::Released
        }
    }

    /// Release a reservation made by [remove_live](Counters::remove_live).
    ///
    /// Returns a live slot if the reservation could be converted into one. The caller must
    /// place the npc and commit the slot, or drop it.
    pub fn fire_reserved(&self) -> Option<LiveSlot<'_>> {
        let mut state = self.lock();
        let c = &mut state.counts;
        c.scheduled = c.scheduled.saturating_sub(1);
        if c.respawn_enabled && c.has_room() {
            c.current += 1;
            Some(LiveSlot::new(self))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;
    use std::panic;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Counters of a full group whose live npcs have the ids `0..maximum`
    fn full(maximum: u32) -> Counters {
        let counters = Counters::default();
        counters.set_maximum(maximum);
        counters.set_respawn_enabled(true);
        let mut id = 0;
        while let Some(mut slot) = counters.claim_live() {
            slot.bind(ObjectId(id));
            slot.commit();
            id += 1;
        }
        counters
    }

    #[test]
    fn claims_stop_at_maximum() {
        let counters = full(4);
        let c = counters.snapshot();
        assert_eq!(c.current, 4);
        assert!(counters.claim_live().is_none());
    }

    #[test]
    fn removal_of_nothing_is_ignored() {
        let counters = Counters::default();
        counters.set_maximum(2);
        assert_eq!(counters.remove_live(ObjectId(1)), Removal::Ignored);
        assert_eq!(counters.snapshot().current, 0);
    }

    #[test]
    fn repeated_removals_are_counted_once() {
        let counters = full(2);
        assert_eq!(counters.remove_live(ObjectId(0)), Removal::Reserved);
        assert_eq!(counters.remove_live(ObjectId(0)), Removal::Ignored);
        assert_eq!(counters.remove_live(ObjectId(7)), Removal::Ignored);
        let c = counters.snapshot();
        assert_eq!((c.current, c.scheduled), (1, 1));
        assert!(counters.is_live(ObjectId(1)));
        assert!(!counters.is_live(ObjectId(0)));
    }

    #[test]
    fn disabled_respawn_only_releases() {
        let counters = full(2);
        counters.set_respawn_enabled(false);
        assert_eq!(counters.remove_live(ObjectId(1)), Removal::Released);
        let c = counters.snapshot();
        assert_eq!((c.current, c.scheduled), (1, 0));
    }

    #[test]
    fn firing_after_disable_releases_the_reservation() {
        let counters = full(2);
        assert_eq!(counters.remove_live(ObjectId(0)), Removal::Reserved);
        counters.set_respawn_enabled(false);
        assert!(counters.fire_reserved().is_none());
        let c = counters.snapshot();
        assert_eq!((c.current, c.scheduled), (1, 0));
    }

    #[test]
    fn lowered_maximum_drops_pending_respawns() {
        let counters = full(3);
        assert_eq!(counters.remove_live(ObjectId(2)), Removal::Reserved);
        counters.set_maximum(2);
        assert!(counters.fire_reserved().is_none());
        let c = counters.snapshot();
        assert_eq!((c.current, c.scheduled), (2, 0));
    }

    #[test]
    fn dropped_slots_are_given_back() {
        let counters = full(1);
        assert_eq!(counters.remove_live(ObjectId(0)), Removal::Reserved);

        let mut slot = counters.fire_reserved().unwrap();
        slot.bind(ObjectId(10));
        assert_eq!(counters.snapshot().current, 1);
        drop(slot);

        let c = counters.snapshot();
        assert_eq!((c.current, c.scheduled), (0, 0));
        assert_eq!(counters.remove_live(ObjectId(10)), Removal::Ignored);
    }

    #[test]
    fn slots_are_given_back_on_unwind() {
        let counters = Counters::default();
        counters.set_maximum(1);

        let res = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            let mut slot = counters.claim_live().unwrap();
            slot.bind(ObjectId(3));
            panic!("placement blew up");
        }));
        assert!(res.is_err());
        assert_eq!(counters.snapshot().current, 0);
        assert!(!counters.is_live(ObjectId(3)));
        assert!(counters.claim_live().is_some());
    }

    #[test]
    fn concurrent_removals_never_overbook() {
        const MAX: u32 = 64;
        let counters = full(MAX);
        let reserved = AtomicU32::new(0);

        // every live id is removed twice, interleaved with claims and firings
        (0..MAX * 4).into_par_iter().for_each(|i| {
            match i % 4 {
                0 | 1 => {
                    if counters.remove_live(ObjectId(i / 4)) == Removal::Reserved {
                        reserved.fetch_add(1, Ordering::SeqCst);
                    }
                }
                2 => {
                    if let Some(mut slot) = counters.claim_live() {
                        slot.bind(ObjectId(1000 + i));
                        slot.commit();
                    }
                }
                _ => {
                    if counters.snapshot().scheduled > 0 {
                        drop(counters.fire_reserved());
                    }
                }
            }
            let c = counters.snapshot();
            assert!(c.current + c.scheduled <= MAX, "{:?}", c);
        });

        let c = counters.snapshot();
        assert!(c.current + c.scheduled <= MAX);
        assert!(reserved.load(Ordering::SeqCst) <= MAX);
    }
}
