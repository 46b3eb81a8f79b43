//! Live object accounting of a single spawn point.
//!
//! `live + reserved <= max` holds at every point where the lock is not held.
//!
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Counts {
    live: u32,
    reserved: u32,
    discarded: bool,
}

#[derive(Debug)]
pub struct LiveCounter {
    max: u32,
    counts: Mutex<Counts>,
}

/// Provisional claim on a spawn point's headroom.
///
/// Dropping a reservation without confirming it returns the headroom.
#[must_use]
#[derive(Debug)]
pub struct Reservation<'a> {
    counter: &'a LiveCounter,
    granted: u32,
}

impl LiveCounter {
    pub fn new(max: u32) -> Self {
        Self {
            max,
            counts: Mutex::new(Counts::default()),
        }
    }

    fn counts(&self) -> MutexGuard<Counts> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of tracked objects currently in the world
    pub fn live(&self) -> u32 {
        self.counts().live
    }

    pub fn headroom(&self) -> u32 {
        let counts = self.counts();
        self.max - counts.live - counts.reserved
    }

    /// Grant `min(requested, headroom)` instances
    pub fn try_reserve(&self, requested: u32) -> Reservation {
        let mut counts = self.counts();
        let granted = if counts.discarded {
            0
        } else {
            requested.min(self.max - counts.live - counts.reserved)
        };
        counts.reserved += granted;
        Reservation {
            counter: self,
            granted,
        }
    }

    /// Tracked objects left the world
    pub fn release(&self, n: u32) {
        let mut counts = self.counts();
        counts.live = counts.live.saturating_sub(n);
    }

    /// The owning spawn point was torn down, late releases and reservations become no-ops
    pub fn discard(&self) {
        let mut counts = self.counts();
        counts.discarded = true;
        counts.live = 0;
        counts.reserved = 0;
    }

    pub fn is_discarded(&self) -> bool {
        self.counts().discarded
    }

    fn settle(&self, granted: u32, spawned: u32) {
        let mut counts = self.counts();
        if counts.discarded {
            return;
        }
        counts.reserved -= granted;
        counts.live += spawned.min(granted);
    }
}

impl<'a> Reservation<'a> {
    pub fn granted(&self) -> u32 {
        self.granted
    }

    /// Reconcile the reservation with the number of instances that were actually created
    pub fn confirm(mut self, spawned: u32) {
        let granted = std::mem::replace(&mut self.granted, 0);
        self.counter.settle(granted, spawned);
    }
}

impl<'a> Drop for Reservation<'a> {
    fn drop(&mut self) {
        if self.granted > 0 {
            self.counter.settle(self.granted, 0);
        }
    }
}
