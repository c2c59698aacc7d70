//! Save and restore a [`Network`] via `bitcode` with a versioned header.
//!
//! Lines are stored without their convoy lists. A convoy's own `line`
//! field is the single source of truth for membership; after decoding,
//! [`Network::finish_load`] rebuilds every line's convoy list from it and
//! recomputes the derived line state and stop registrations.

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::{debug, info};

use crate::config::{ConfigError, NetworkConfig};
use crate::convoy::Convoy;
use crate::event::EventLog;
use crate::geometry::StepConfig;
use crate::halt::Halt;
use crate::id::{ConvoyId, HaltId, LineId};
use crate::line::Line;
use crate::network::{Network, SimState};
use crate::relation::StopRelation;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a network snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x4C4E_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("snapshot config rejected: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("corrupt snapshot: {0}")]
    Corrupt(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick at which the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The persistent part of a network. The event log and the stop relation
/// are not stored; both are rebuilt on load.
#[derive(Debug, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub header: SnapshotHeader,
    sim_state: SimState,
    month: u32,
    config: NetworkConfig,
    schedule_counter: u32,
    lines: SlotMap<LineId, Line>,
    convoys: SlotMap<ConvoyId, Convoy>,
    halts: SlotMap<HaltId, Halt>,
}

impl Network {
    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            header: SnapshotHeader::new(self.sim_state.tick),
            sim_state: self.sim_state.clone(),
            month: self.month,
            config: self.config.clone(),
            schedule_counter: self.schedule_counter,
            lines: self.lines.clone(),
            convoys: self.convoys.clone(),
            halts: self.halts.clone(),
        }
    }

    /// Serialize the network to a binary blob.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        bitcode::serialize(&self.snapshot()).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Deserialize a network, validating the header and rebuilding every
    /// line's membership and derived state.
    pub fn deserialize(data: &[u8]) -> Result<Self, DeserializeError> {
        let snapshot: NetworkSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        Self::from_snapshot(snapshot)
    }

    /// Rebuild a network from a decoded snapshot. The header, the config
    /// and the shape of every statistics table are checked first.
    pub fn from_snapshot(snapshot: NetworkSnapshot) -> Result<Self, DeserializeError> {
        snapshot.header.validate()?;
        snapshot.config.validate()?;
        if let Some((id, _)) = snapshot.lines.iter().find(|(_, l)| !l.finance.is_well_formed()) {
            return Err(DeserializeError::Corrupt(format!("line {id:?} statistics")));
        }
        if let Some((id, _)) = snapshot.convoys.iter().find(|(_, c)| !c.finance.is_well_formed()) {
            return Err(DeserializeError::Corrupt(format!("convoy {id:?} statistics")));
        }

        let mut net = Network {
            lines: snapshot.lines,
            convoys: snapshot.convoys,
            halts: snapshot.halts,
            stops: StopRelation::new(),
            sim_state: snapshot.sim_state,
            month: snapshot.month,
            steps: StepConfig::new(snapshot.config.diagonal_multiplier),
            events: EventLog::new(snapshot.config.event_capacity),
            config: snapshot.config,
            schedule_counter: snapshot.schedule_counter,
        };
        net.finish_load();
        info!(
            tick = net.sim_state.tick,
            lines = net.lines.len(),
            convoys = net.convoys.len(),
            "network loaded"
        );
        Ok(net)
    }

    /// Rebuild everything that is derived from convoy `line` references.
    ///
    /// Convoys pointing at a line that no longer exists are detached.
    pub fn finish_load(&mut self) {
        for (_, line) in self.lines.iter_mut() {
            line.convoys.clear();
        }
        let mut orphans = 0;
        for (id, cnv) in self.convoys.iter_mut() {
            let Some(line_id) = cnv.line else {
                continue;
            };
            match self.lines.get_mut(line_id) {
                Some(line) => {
                    if !line.convoys.contains(&id) {
                        line.convoys.push(id);
                    }
                }
                None => {
                    cnv.line = None;
                    orphans += 1;
                }
            }
        }
        if orphans > 0 {
            debug!(orphans, "detached convoys of missing lines");
        }

        self.stops.clear();
        let counter = self.schedule_counter;
        let ids: Vec<LineId> = self.lines.keys().collect();
        for id in ids {
            self.recalc_catg_index(id);
            self.calc_classes_carried(id);
            self.recalc_status(id);
            if !self.lines[id].convoys.is_empty() {
                self.register_stops(id);
            }
        }
        // Rebuilding the goods sets is not a routing change.
        self.schedule_counter = counter;
        self.events.drain();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Koord;
    use crate::id::PlayerId;
    use crate::line::LineType;
    use crate::schedule::Schedule;
    use crate::test_utils::*;
    use linework_stats::{ConvoyCost, FinanceHistory, LineCost};

    #[test]
    fn round_trip_rebuilds_membership() {
        let mut net = small_network();
        let (line, halts) = bus_line(&mut net, 3, 4, 2);
        net.book_line(line, 1234, LineCost::Revenue);
        net.advance(50);

        let data = net.serialize().unwrap();
        let loaded = Network::deserialize(&data).unwrap();

        let before = net.line(line).unwrap();
        let after = loaded.line(line).unwrap();
        assert_eq!(after.convoys().len(), 2);
        for cnv in before.convoys() {
            assert!(after.convoys().contains(cnv));
        }
        assert_eq!(after.goods_catg_index(), before.goods_catg_index());
        assert_eq!(after.status(), before.status());
        assert_eq!(after.finance_history(0, LineCost::Revenue), 1234);
        assert_eq!(loaded.lines_serving(halts[1]), &[line]);
        assert_eq!(loaded.tick(), net.tick());
    }

    #[test]
    fn convoy_state_survives() {
        let mut net = small_network();
        let a = add_halt_at(&mut net, "A", Koord::new(0, 0));
        let b = add_halt_at(&mut net, "B", Koord::new(9, 9));
        let cnv = spawn_bus(&mut net, Schedule::from_halts([a, b]), 90);
        net.start_convoy(cnv);
        net.advance(200);
        net.book_convoy(cnv, 77, ConvoyCost::Revenue);

        let loaded = Network::deserialize(&net.serialize().unwrap()).unwrap();
        let before = net.convoy(cnv).unwrap();
        let after = loaded.convoy(cnv).unwrap();
        assert_eq!(after.stepper, before.stepper);
        assert_eq!(after.route_index, before.route_index);
        assert_eq!(after.state, before.state);
        assert_eq!(after.finance.get(0, ConvoyCost::Revenue), 77);
        assert_eq!(
            loaded.halt(b).and_then(|h| h.estimated_arrival(cnv)),
            net.halt(b).and_then(|h| h.estimated_arrival(cnv))
        );
    }

    #[test]
    fn dangling_line_reference_is_detached() {
        let mut net = small_network();
        let line = net.create_line(PlayerId(0), LineType::Truck, "L");
        let cnv = spawn_bus(&mut net, Schedule::new(), 50);
        net.add_convoy(line, cnv);
        let mut snapshot = net.snapshot();
        snapshot.lines.remove(line);
        let loaded = Network::from_snapshot(snapshot).unwrap();
        assert_eq!(loaded.convoy(cnv).and_then(|c| c.line), None);
    }

    #[test]
    fn invalid_config_rejected() {
        let net = small_network();
        let mut snapshot = net.snapshot();
        snapshot.config.ticks_per_month = 0;
        let data = bitcode::serialize(&snapshot).unwrap();
        assert!(matches!(
            Network::deserialize(&data),
            Err(DeserializeError::InvalidConfig(ConfigError::Invalid {
                field: "ticks_per_month",
                ..
            }))
        ));
    }

    #[test]
    fn misshapen_statistics_rejected() {
        let mut net = small_network();
        let line = net.create_line(PlayerId(0), LineType::Truck, "L");
        let mut snapshot = net.snapshot();
        let wrong: FinanceHistory<LineCost> =
            bitcode::deserialize(&bitcode::serialize(&FinanceHistory::<ConvoyCost>::new()).unwrap()).unwrap();
        snapshot.lines[line].finance = wrong;
        assert!(matches!(
            Network::from_snapshot(snapshot),
            Err(DeserializeError::Corrupt(_))
        ));
    }

    #[test]
    fn bad_magic_rejected() {
        let net = small_network();
        let mut snapshot = net.snapshot();
        snapshot.header.magic = 0xDEAD_BEEF;
        let data = bitcode::serialize(&snapshot).unwrap();
        assert!(matches!(
            Network::deserialize(&data),
            Err(DeserializeError::InvalidMagic(0xDEAD_BEEF))
        ));
    }

    #[test]
    fn future_version_rejected() {
        let net = small_network();
        let mut snapshot = net.snapshot();
        snapshot.header.version = FORMAT_VERSION + 1;
        let data = bitcode::serialize(&snapshot).unwrap();
        assert!(matches!(
            Network::deserialize(&data),
            Err(DeserializeError::FutureVersion(_))
        ));
    }

    #[test]
    fn garbage_is_decode_error() {
        assert!(matches!(
            Network::deserialize(&[1, 2, 3]),
            Err(DeserializeError::Decode(_))
        ));
    }
}
