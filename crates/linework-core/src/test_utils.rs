//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::config::NetworkConfig;
use crate::convoy::{Convoy, Vehicle, WayType};
use crate::geometry::Koord;
use crate::halt::Halt;
use crate::id::*;
use crate::line::LineType;
use crate::network::Network;
use crate::schedule::Schedule;

// ===========================================================================
// Vehicles
// ===========================================================================

pub fn bus() -> Vehicle {
    Vehicle::new("bus", WayType::Road, GoodsCategory::PASSENGERS, 40)
}

pub fn mail_van() -> Vehicle {
    Vehicle::new("mail van", WayType::Road, GoodsCategory::MAIL, 12)
}

pub fn coal_wagon() -> Vehicle {
    Vehicle::new("coal wagon", WayType::Track, GoodsCategory(5), 30)
}

// ===========================================================================
// Network builders
// ===========================================================================

/// A network with a short month so rollover tests stay fast.
pub fn small_network() -> Network {
    Network::with_valid_config(NetworkConfig {
        ticks_per_month: 4096,
        loading_ticks: 16,
        ..NetworkConfig::default()
    })
}

pub fn add_halt_at(net: &mut Network, name: &str, pos: Koord) -> HaltId {
    net.add_halt(Halt::new(name, pos, PlayerId(0)))
}

/// Spawn an idle single-bus convoy driving at `kmh`.
pub fn spawn_bus(net: &mut Network, schedule: Schedule, kmh: u32) -> ConvoyId {
    let mut cnv = Convoy::new("bus", PlayerId(0), vec![bus()]);
    cnv.schedule = schedule;
    cnv.speed_kmh = kmh;
    net.spawn_convoy(cnv)
}

/// A road line over halts placed `spacing` tiles apart on a row, served by
/// `convoys` started buses.
pub fn bus_line(net: &mut Network, halts: usize, spacing: i16, convoys: usize) -> (LineId, Vec<HaltId>) {
    let ids: Vec<HaltId> = (0..halts)
        .map(|i| add_halt_at(net, &format!("H{i}"), Koord::new(i as i16 * spacing, 0)))
        .collect();
    let line = net.create_line(PlayerId(0), LineType::Truck, "bus line");
    net.set_schedule(line, Schedule::from_halts(ids.iter().copied()));
    for _ in 0..convoys {
        let cnv = spawn_bus(net, Schedule::new(), 80);
        net.add_convoy(line, cnv);
        net.start_convoy(cnv);
    }
    (line, ids)
}
