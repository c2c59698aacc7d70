//! Network events in a bounded ring buffer.
//!
//! The network records what happened during a step (convoys arriving,
//! lines changing the goods they carry, months rolling over) and callers
//! drain the log when they want to react. When the log is full the oldest
//! event is dropped.

use crate::fixed::Ticks;
use crate::id::{ConvoyId, HaltId, LineId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    LineCreated { line: LineId, tick: Ticks },
    LineRemoved { line: LineId, tick: Ticks },
    ConvoyAssigned { line: LineId, convoy: ConvoyId, tick: Ticks },
    ConvoyUnassigned { line: LineId, convoy: ConvoyId, tick: Ticks },
    /// The set of goods a line carries changed; routes need recomputing.
    GoodsChanged { line: LineId, tick: Ticks },
    ConvoyArrived { convoy: ConvoyId, halt: HaltId, tick: Ticks },
    ConvoyDeparted { convoy: ConvoyId, halt: HaltId, tick: Ticks },
    MonthEnded { month: u32, tick: Ticks },
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct EventLog {
    events: Vec<Option<NetworkEvent>>,
    /// Next write position.
    head: usize,
    len: usize,
    /// Total events ever written, including dropped ones.
    total_written: u64,
    dropped: u64,
}

impl EventLog {
    /// Create a log holding at most `capacity` events (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: NetworkEvent) {
        let cap = self.capacity();
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % cap;
        if self.len < cap {
            self.len += 1;
        } else {
            self.dropped += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Events lost because the log was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    fn oldest(&self) -> usize {
        if self.len < self.capacity() { 0 } else { self.head }
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &NetworkEvent> + '_ {
        let start = self.oldest();
        let cap = self.capacity();
        (0..self.len).filter_map(move |i| self.events[(start + i) % cap].as_ref())
    }

    /// Remove and return every stored event, oldest first.
    pub fn drain(&mut self) -> Vec<NetworkEvent> {
        let start = self.oldest();
        let cap = self.capacity();
        let mut out = Vec::with_capacity(self.len);
        for i in 0..self.len {
            if let Some(event) = self.events[(start + i) % cap].take() {
                out.push(event);
            }
        }
        self.head = 0;
        self.len = 0;
        out
    }
}
