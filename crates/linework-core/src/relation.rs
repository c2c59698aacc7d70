//! The many-to-many relation between lines and the halts they serve.
//!
//! Both directions live in one struct and are only ever changed together,
//! so a halt can never list a line that does not list the halt, or the
//! reverse. Every operation is idempotent: registering twice or
//! unregistering something that was never registered changes nothing and
//! reports `false`.

use slotmap::SecondaryMap;

use crate::id::{HaltId, LineId};

#[derive(Debug, Clone, Default)]
pub struct StopRelation {
    by_line: SecondaryMap<LineId, Vec<HaltId>>,
    by_halt: SecondaryMap<HaltId, Vec<LineId>>,
}

impl StopRelation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `line` serves `halt`. Returns `true` if this is new.
    pub fn register(&mut self, line: LineId, halt: HaltId) -> bool {
        if self.is_registered(line, halt) {
            return false;
        }
        push_unique(&mut self.by_line, line, halt);
        push_unique(&mut self.by_halt, halt, line);
        true
    }

    /// Drop the pair. Returns `true` if it existed.
    pub fn unregister(&mut self, line: LineId, halt: HaltId) -> bool {
        if !self.is_registered(line, halt) {
            return false;
        }
        remove_value(&mut self.by_line, line, halt);
        remove_value(&mut self.by_halt, halt, line);
        true
    }

    /// Drop every pair involving `line`. Returns the halts it served.
    pub fn unregister_line(&mut self, line: LineId) -> Vec<HaltId> {
        let halts = self.by_line.remove(line).unwrap_or_default();
        for &halt in &halts {
            remove_value(&mut self.by_halt, halt, line);
        }
        halts
    }

    /// Drop every pair involving `halt`. Returns the lines that served it.
    pub fn unregister_halt(&mut self, halt: HaltId) -> Vec<LineId> {
        let lines = self.by_halt.remove(halt).unwrap_or_default();
        for &line in &lines {
            remove_value(&mut self.by_line, line, halt);
        }
        lines
    }

    pub fn is_registered(&self, line: LineId, halt: HaltId) -> bool {
        self.by_line
            .get(line)
            .is_some_and(|halts| halts.contains(&halt))
    }

    /// Lines serving `halt`, in registration order.
    pub fn lines_serving(&self, halt: HaltId) -> &[LineId] {
        self.by_halt.get(halt).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Halts served by `line`, in registration order.
    pub fn halts_served(&self, line: LineId) -> &[HaltId] {
        self.by_line.get(line).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of registered pairs.
    pub fn len(&self) -> usize {
        self.by_line.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.by_line.clear();
        self.by_halt.clear();
    }
}

fn push_unique<K: slotmap::Key, V: PartialEq>(map: &mut SecondaryMap<K, Vec<V>>, key: K, value: V) {
    if let Some(entry) = map.entry(key) {
        let values = entry.or_default();
        if !values.contains(&value) {
            values.push(value);
        }
    }
}

fn remove_value<K: slotmap::Key, V: PartialEq>(map: &mut SecondaryMap<K, Vec<V>>, key: K, value: V) {
    let now_empty = match map.get_mut(key) {
        Some(values) => {
            values.retain(|v| *v != value);
            values.is_empty()
        }
        None => false,
    };
    if now_empty {
        map.remove(key);
    }
}
