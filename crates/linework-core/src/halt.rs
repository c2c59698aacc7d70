//! Halts: the stops convoys serve.
//!
//! A halt keeps the latest arrival and departure estimate of every convoy
//! heading for it or loading at it. Which lines serve a halt is tracked by
//! the network's [`StopRelation`](crate::relation::StopRelation), not here.

use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;

use crate::fixed::Ticks;
use crate::geometry::Koord;
use crate::id::{ConvoyId, PlayerId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Halt {
    pub name: String,
    pub pos: Koord,
    pub owner: PlayerId,
    /// Absolute tick at which each approaching convoy is expected.
    arrivals: SecondaryMap<ConvoyId, Ticks>,
    /// Absolute tick at which each loading convoy is expected to leave.
    departures: SecondaryMap<ConvoyId, Ticks>,
}

impl Halt {
    pub fn new(name: impl Into<String>, pos: Koord, owner: PlayerId) -> Self {
        Self {
            name: name.into(),
            pos,
            owner,
            arrivals: SecondaryMap::new(),
            departures: SecondaryMap::new(),
        }
    }

    pub fn set_estimated_arrival(&mut self, convoy: ConvoyId, tick: Ticks) {
        self.arrivals.insert(convoy, tick);
    }

    pub fn set_estimated_departure(&mut self, convoy: ConvoyId, tick: Ticks) {
        self.departures.insert(convoy, tick);
    }

    pub fn clear_estimated_arrival(&mut self, convoy: ConvoyId) {
        self.arrivals.remove(convoy);
    }

    pub fn clear_estimated_departure(&mut self, convoy: ConvoyId) {
        self.departures.remove(convoy);
    }

    /// Forget every estimate involving `convoy`.
    pub fn forget_convoy(&mut self, convoy: ConvoyId) {
        self.arrivals.remove(convoy);
        self.departures.remove(convoy);
    }

    pub fn estimated_arrival(&self, convoy: ConvoyId) -> Option<Ticks> {
        self.arrivals.get(convoy).copied()
    }

    pub fn estimated_departure(&self, convoy: ConvoyId) -> Option<Ticks> {
        self.departures.get(convoy).copied()
    }

    pub fn estimated_arrivals(&self) -> impl Iterator<Item = (ConvoyId, Ticks)> + '_ {
        self.arrivals.iter().map(|(c, &t)| (c, t))
    }

    pub fn estimated_departures(&self) -> impl Iterator<Item = (ConvoyId, Ticks)> + '_ {
        self.departures.iter().map(|(c, &t)| (c, t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn estimates_are_per_convoy() {
        let mut convoys: SlotMap<ConvoyId, ()> = SlotMap::with_key();
        let a = convoys.insert(());
        let b = convoys.insert(());
        let mut halt = Halt::new("Central", Koord::new(0, 0), PlayerId(0));

        halt.set_estimated_arrival(a, 100);
        halt.set_estimated_arrival(a, 120);
        halt.set_estimated_departure(b, 300);
        assert_eq!(halt.estimated_arrival(a), Some(120));
        assert_eq!(halt.estimated_departure(b), Some(300));
        assert_eq!(halt.estimated_arrivals().count(), 1);

        halt.forget_convoy(b);
        assert_eq!(halt.estimated_departure(b), None);
    }
}
