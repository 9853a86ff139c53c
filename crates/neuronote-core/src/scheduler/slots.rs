//! Calendar discretization into fixed-length slots.
//!
//! Raw availability intervals are decomposed into uniform 30-minute units
//! the allocator can assign individually. The final unit of an interval is
//! truncated at the interval's end rather than dropped, so a 50-minute
//! interval yields a 30-minute slot followed by a 20-minute one.

use chrono::{DateTime, Duration, Utc};

use super::CalendarSlot;

/// One fixed-length unit of calendar time.
#[derive(Debug, Clone)]
pub(crate) struct DiscreteSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub busy: bool,
    pub consumed: bool,
}

/// Index-addressable arena of discretized slots.
///
/// Owned exclusively by one scheduling run. Assignment marks a slot
/// consumed so later notes in the same run cannot reuse it; the arena is
/// discarded when the run returns.
#[derive(Debug)]
pub(crate) struct SlotArena {
    slots: Vec<DiscreteSlot>,
}

impl SlotArena {
    /// Discretize raw calendar intervals, preserving input order.
    ///
    /// Intervals are processed independently and never merged or reordered.
    /// Each is walked from its start in `slot_duration` increments, with the
    /// last increment truncated at the interval's end. The busy flag is
    /// inherited unchanged. A zero-length interval yields no slots.
    pub fn from_calendar(calendar: &[CalendarSlot], slot_duration: Duration) -> Self {
        // A non-positive increment would never reach the interval end.
        if slot_duration <= Duration::zero() {
            return Self { slots: Vec::new() };
        }

        let mut slots = Vec::new();
        for interval in calendar {
            let mut current = interval.start;
            while current < interval.end {
                let end = (current + slot_duration).min(interval.end);
                slots.push(DiscreteSlot {
                    start: current,
                    end,
                    busy: interval.busy,
                    consumed: false,
                });
                current = end;
            }
        }
        Self { slots }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, index: usize) -> &DiscreteSlot {
        &self.slots[index]
    }

    /// Slots still assignable: not busy and not yet consumed.
    pub fn available(&self) -> impl Iterator<Item = (usize, &DiscreteSlot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.busy && !slot.consumed)
    }

    /// Mark a slot as assigned for the rest of the run.
    pub fn consume(&mut self, index: usize) {
        self.slots[index].consumed = true;
    }
}
