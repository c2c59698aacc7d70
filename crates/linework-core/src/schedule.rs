//! Schedules: ordered stop lists with per-stop loading and waiting rules.

use serde::{Deserialize, Serialize};

use crate::fixed::Ticks;
use crate::id::HaltId;

/// One stop of a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub halt: HaltId,
    /// Percentage (0..=100) the convoy must be loaded before leaving.
    pub minimum_loading: u8,
    /// Leave only at the timed departure slot.
    pub wait_for_time: bool,
    /// Offset into the spacing interval for timed departures, in 1/256 of
    /// the interval.
    pub waiting_time_shift: u8,
}

impl ScheduleEntry {
    pub fn new(halt: HaltId) -> Self {
        Self {
            halt,
            minimum_loading: 0,
            wait_for_time: false,
            waiting_time_shift: 0,
        }
    }

    pub fn with_minimum_loading(mut self, percent: u8) -> Self {
        self.minimum_loading = percent.min(100);
        self
    }

    pub fn timed(mut self, shift: u8) -> Self {
        self.wait_for_time = true;
        self.waiting_time_shift = shift;
        self
    }
}

/// An ordered list of stops plus the index of the stop currently headed for.
///
/// Mirrored schedules run to the last stop and back instead of wrapping.
/// Bidirectional schedules may be followed in either direction; a line
/// alternates the starting direction of the convoys it receives.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
    current: usize,
    pub bidirectional: bool,
    pub mirrored: bool,
    /// Timed departures per month at each timed stop; 0 disables timing.
    pub spacing: u16,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schedule visiting the given halts in order.
    pub fn from_halts(halts: impl IntoIterator<Item = HaltId>) -> Self {
        Self {
            entries: halts.into_iter().map(ScheduleEntry::new).collect(),
            ..Self::default()
        }
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_entry(&self) -> Option<&ScheduleEntry> {
        self.entries.get(self.current)
    }

    /// Set the current index, clamped into range.
    pub fn set_current(&mut self, index: usize) {
        self.current = index.min(self.entries.len().saturating_sub(1));
    }

    pub fn append(&mut self, entry: ScheduleEntry) {
        self.entries.push(entry);
    }

    /// Insert before `index` (clamped to the end).
    pub fn insert(&mut self, index: usize, entry: ScheduleEntry) {
        let index = index.min(self.entries.len());
        self.entries.insert(index, entry);
        if index <= self.current && self.entries.len() > 1 {
            self.current += 1;
        }
        self.set_current(self.current);
    }

    /// Remove the entry at `index`, keeping `current` on the same stop when
    /// possible.
    pub fn remove(&mut self, index: usize) -> Option<ScheduleEntry> {
        if index >= self.entries.len() {
            return None;
        }
        let removed = self.entries.remove(index);
        if index < self.current {
            self.current -= 1;
        }
        self.set_current(self.current);
        Some(removed)
    }

    /// The index following `index` in travel direction, turning `reversed`
    /// at the ends of a mirrored schedule.
    pub fn increment_index(&self, index: usize, reversed: bool) -> (usize, bool) {
        let count = self.entries.len();
        if count == 0 {
            return (0, reversed);
        }
        if reversed {
            if index > 0 {
                (index - 1, true)
            } else if self.mirrored {
                (if count > 1 { 1 } else { 0 }, false)
            } else {
                (count - 1, true)
            }
        } else if index + 1 < count {
            (index + 1, false)
        } else if self.mirrored {
            (count.saturating_sub(2), true)
        } else {
            (0, false)
        }
    }

    /// Move `current` to the next stop.
    pub fn advance(&mut self, reversed: &mut bool) {
        let (next, rev) = self.increment_index(self.current, *reversed);
        self.current = next;
        *reversed = rev;
    }

    /// The stop served after `halt`, in forward direction.
    pub fn next_halt_after(&self, halt: HaltId) -> Option<HaltId> {
        let index = self.entries.iter().position(|e| e.halt == halt)?;
        let (next, _) = self.increment_index(index, false);
        self.entries.get(next).map(|e| e.halt)
    }

    /// Each distinct halt once, in first-visit order.
    pub fn halts(&self) -> Vec<HaltId> {
        let mut halts: Vec<HaltId> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !halts.contains(&entry.halt) {
                halts.push(entry.halt);
            }
        }
        halts
    }

    /// Ticks between two timed departures, or `None` if timing is off.
    pub fn departure_interval(&self, ticks_per_month: u64) -> Option<u64> {
        (self.spacing > 0).then(|| (ticks_per_month / self.spacing as u64).max(1))
    }

    /// The first tick at or after `tick` at which a convoy may leave
    /// `entry`. Untimed stops allow leaving at once.
    pub fn next_departure_slot(&self, entry: &ScheduleEntry, tick: Ticks, ticks_per_month: u64) -> Ticks {
        if !entry.wait_for_time {
            return tick;
        }
        let Some(interval) = self.departure_interval(ticks_per_month) else {
            return tick;
        };
        let offset = interval * entry.waiting_time_shift as u64 / 256;
        let slot = tick - tick % interval + offset;
        if slot >= tick { slot } else { slot + interval }
    }

    /// Departures per month the schedule asks for across its timed stops.
    pub fn departures_scheduled(&self) -> i64 {
        if self.spacing == 0 {
            return 0;
        }
        let timed = self.entries.iter().filter(|e| e.wait_for_time).count() as i64;
        timed * self.spacing as i64
    }
}
