//! Departure board for a single halt.
//!
//! Lists convoys about to arrive (labelled with where they come from) and
//! convoys about to leave (labelled with where they go next), soonest
//! first. Recomputing walks every estimate at the halt, so the board caches
//! its lists and only refreshes every few updates unless invalidated.

use tracing::trace;

use crate::id::{ConvoyId, HaltId};
use crate::network::Network;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepartureEntry {
    /// Origin for arrivals, next stop for departures. `None` if unknown.
    pub halt: Option<HaltId>,
    /// Ticks from now; never negative.
    pub delta_ticks: u32,
    pub convoy: ConvoyId,
}

#[derive(Debug, Clone)]
pub struct DepartureBoard {
    halt: Option<HaltId>,
    /// Updates left before the lists are recomputed; -1 forces a refresh.
    next_refresh: i32,
    arrivals: Vec<DepartureEntry>,
    departures: Vec<DepartureEntry>,
}

impl DepartureBoard {
    pub fn new(halt: Option<HaltId>) -> Self {
        Self {
            halt,
            next_refresh: -1,
            arrivals: Vec::new(),
            departures: Vec::new(),
        }
    }

    pub fn halt(&self) -> Option<HaltId> {
        self.halt
    }

    /// Show a different halt. The next update recomputes.
    pub fn set_halt(&mut self, halt: Option<HaltId>) {
        self.halt = halt;
        self.invalidate();
    }

    /// Force a recompute on the next update, e.g. after a schedule change.
    pub fn invalidate(&mut self) {
        self.next_refresh = -1;
    }

    pub fn arrivals(&self) -> &[DepartureEntry] {
        &self.arrivals
    }

    pub fn departures(&self) -> &[DepartureEntry] {
        &self.departures
    }

    /// Refresh the lists if the cache expired. Returns whether they were
    /// recomputed.
    pub fn update(&mut self, net: &Network) -> bool {
        let Some(halt_id) = self.halt else {
            return false;
        };
        let Some(halt) = net.halt(halt_id) else {
            self.arrivals.clear();
            self.departures.clear();
            return false;
        };
        if self.next_refresh > 0 {
            self.next_refresh -= 1;
            return false;
        }

        let now = net.tick();
        let max = net.config().max_departure_listings;

        self.arrivals.clear();
        for (convoy, tick) in halt.estimated_arrivals() {
            let Some(cnv) = net.convoy(convoy) else {
                continue;
            };
            if cnv.schedule.is_empty() {
                continue;
            }
            self.arrivals.push(DepartureEntry {
                halt: cnv.last_stop,
                delta_ticks: tick.saturating_sub(now).min(u32::MAX as u64) as u32,
                convoy,
            });
        }

        self.departures.clear();
        for (convoy, tick) in halt.estimated_departures() {
            let Some(cnv) = net.convoy(convoy) else {
                continue;
            };
            if cnv.schedule.is_empty() {
                continue;
            }
            self.departures.push(DepartureEntry {
                halt: cnv.schedule.next_halt_after(halt_id),
                delta_ticks: tick.saturating_sub(now).min(u32::MAX as u64) as u32,
                convoy,
            });
        }

        for list in [&mut self.arrivals, &mut self.departures] {
            list.sort_by_key(|e| e.delta_ticks);
            list.truncate(max);
        }
        self.next_refresh = net.config().departure_refresh;
        trace!(
            halt = ?halt_id,
            arrivals = self.arrivals.len(),
            departures = self.departures.len(),
            "departure board refreshed"
        );
        true
    }
}
