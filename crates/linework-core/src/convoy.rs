//! Convoys and the vehicles they are made of.
//!
//! The registry only needs a narrow view of a convoy: its cargo and class
//! capabilities, vehicle condition flags, and enough motion state to feed
//! the arrival estimator. Convoys are owned by the network; lines refer to
//! them by [`ConvoyId`](crate::id::ConvoyId) only.

use serde::{Deserialize, Serialize};

use linework_stats::{ConvoyCost, FinanceHistory, RollingAverage};

use crate::estimate;
use crate::geometry::{Koord, TileStepper};
use crate::id::{GoodsCategory, HaltId, LineId, PlayerId};
use crate::schedule::Schedule;

// ---------------------------------------------------------------------------
// ConvoyState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConvoyState {
    #[default]
    Initial,
    Driving,
    Loading,
    WaitingForClearance,
    CanStart,
    NoRoute,
    InDepot,
}

impl ConvoyState {
    /// Whether the convoy is on the map and moving or about to move.
    pub fn is_running(self) -> bool {
        !matches!(self, ConvoyState::Initial | ConvoyState::InDepot)
    }
}

// ---------------------------------------------------------------------------
// Vehicles
// ---------------------------------------------------------------------------

/// The kind of way a vehicle runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WayType {
    Road,
    Track,
    Water,
    Air,
    Monorail,
    Maglev,
    Tram,
    NarrowGauge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub name: String,
    pub waytype: WayType,
    pub catg: GoodsCategory,
    /// Capacity per travel class. Goods without classes use index 0.
    pub class_capacity: Vec<u16>,
    /// Current load per travel class.
    pub class_load: Vec<u16>,
    pub comfort: u8,
    /// Month after which the vehicle counts as obsolete.
    pub retire_month: Option<u32>,
    /// A newer model is available to replace this one.
    pub has_upgrade: bool,
}

impl Vehicle {
    pub fn new(name: impl Into<String>, waytype: WayType, catg: GoodsCategory, capacity: u16) -> Self {
        Self {
            name: name.into(),
            waytype,
            catg,
            class_capacity: vec![capacity],
            class_load: vec![0],
            comfort: 0,
            retire_month: None,
            has_upgrade: false,
        }
    }

    /// Replace the per-class capacities; loads are reset.
    pub fn with_classes(mut self, capacities: Vec<u16>) -> Self {
        self.class_load = vec![0; capacities.len()];
        self.class_capacity = capacities;
        self
    }

    pub fn capacity(&self) -> u32 {
        self.class_capacity.iter().map(|&c| c as u32).sum()
    }

    pub fn load(&self) -> u32 {
        self.class_load.iter().map(|&c| c as u32).sum()
    }

    /// Some class carries more than its capacity.
    pub fn is_overcrowded(&self) -> bool {
        self.class_load
            .iter()
            .zip(&self.class_capacity)
            .any(|(load, cap)| load > cap)
    }

    pub fn is_obsolete(&self, month: u32) -> bool {
        self.retire_month.is_some_and(|retire| month > retire)
    }
}

// ---------------------------------------------------------------------------
// Convoy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Convoy {
    pub name: String,
    pub owner: PlayerId,
    /// Line this convoy belongs to. Authoritative: line membership lists
    /// are rebuilt from this field after loading.
    pub line: Option<LineId>,
    pub schedule: Schedule,
    /// Swapped only through [`Network::set_vehicles`](crate::network::Network::set_vehicles)
    /// so the line's goods set follows.
    pub(crate) vehicles: Vec<Vehicle>,
    pub route: Vec<Koord>,
    /// Index into `route` of the tile the convoy is heading for.
    pub route_index: usize,
    pub stepper: TileStepper,
    pub state: ConvoyState,
    pub speed_kmh: u32,
    pub average_kmh: RollingAverage,
    pub last_stop: Option<HaltId>,
    pub target_halt: Option<HaltId>,
    pub reverse_schedule: bool,
    pub withdraw: bool,
    pub no_load: bool,
    pub replace: bool,
    pub livery_scheme_index: u16,
    pub finance: FinanceHistory<ConvoyCost>,
    /// Ticks of loading left before departing.
    pub loading_left: u32,
}

impl Convoy {
    pub fn new(name: impl Into<String>, owner: PlayerId, vehicles: Vec<Vehicle>) -> Self {
        Self {
            name: name.into(),
            owner,
            line: None,
            schedule: Schedule::new(),
            vehicles,
            route: Vec::new(),
            route_index: 0,
            stepper: TileStepper::default(),
            state: ConvoyState::Initial,
            speed_kmh: 0,
            average_kmh: RollingAverage::new(),
            last_stop: None,
            target_halt: None,
            reverse_schedule: false,
            withdraw: false,
            no_load: false,
            replace: false,
            livery_scheme_index: 0,
            finance: FinanceHistory::new(),
            loading_left: 0,
        }
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Set the load of one travel class of one vehicle. Loads above the
    /// class capacity are kept and count as overcrowding. Returns `false`
    /// if the vehicle or class does not exist.
    pub fn set_load(&mut self, vehicle: usize, class: usize, load: u16) -> bool {
        match self.vehicles.get_mut(vehicle).and_then(|v| v.class_load.get_mut(class)) {
            Some(slot) => {
                *slot = load;
                true
            }
            None => false,
        }
    }

    /// Tiles left to the end of the current route.
    pub fn remaining_tiles(&self) -> u32 {
        self.route.len().saturating_sub(self.route_index) as u32
    }

    pub fn average_speed_kmh(&self) -> u32 {
        self.average_kmh.mean().max(0) as u32
    }

    /// Ticks until the convoy reaches the end of its route.
    pub fn estimated_ticks_to_arrival(&self) -> u32 {
        estimate::ticks_until_arrival(self.remaining_tiles(), self.average_speed_kmh(), self.state)
    }

    /// Goods categories carried by any vehicle, without duplicates.
    pub fn goods_categories(&self) -> Vec<GoodsCategory> {
        let mut catgs = Vec::new();
        for v in &self.vehicles {
            if !catgs.contains(&v.catg) {
                catgs.push(v.catg);
            }
        }
        catgs
    }

    /// Travel classes with non-zero capacity for `catg`, ascending.
    pub fn classes(&self, catg: GoodsCategory) -> Vec<u8> {
        let mut classes = Vec::new();
        for v in self.vehicles.iter().filter(|v| v.catg == catg) {
            for (class, &cap) in v.class_capacity.iter().enumerate() {
                let Ok(class) = u8::try_from(class) else {
                    break;
                };
                if cap > 0 && !classes.contains(&class) {
                    classes.push(class);
                }
            }
        }
        classes.sort_unstable();
        classes
    }

    pub fn capacity(&self) -> u32 {
        self.vehicles.iter().map(Vehicle::capacity).sum()
    }

    pub fn load(&self) -> u32 {
        self.vehicles.iter().map(Vehicle::load).sum()
    }

    /// Load as a percentage of capacity; 100 for a convoy with no capacity.
    pub fn load_percent(&self) -> u32 {
        match self.capacity() {
            0 => 100,
            cap => self.load() * 100 / cap,
        }
    }

    pub fn has_overcrowded(&self) -> bool {
        self.vehicles.iter().any(Vehicle::is_overcrowded)
    }

    pub fn has_obsolete_vehicles(&self, month: u32) -> bool {
        self.vehicles.iter().any(|v| v.is_obsolete(month))
    }

    pub fn has_upgradeable_vehicles(&self) -> bool {
        self.vehicles.iter().any(|v| v.has_upgrade)
    }

    /// Waytype of the lead vehicle.
    pub fn waytype(&self) -> Option<WayType> {
        self.vehicles.first().map(|v| v.waytype)
    }

    /// Mean comfort over vehicles carrying passengers; 0 if none do.
    pub fn comfort(&self) -> u8 {
        let (sum, n) = self
            .vehicles
            .iter()
            .filter(|v| v.catg == GoodsCategory::PASSENGERS)
            .fold((0u32, 0u32), |(s, n), v| (s + v.comfort as u32, n + 1));
        if n == 0 { 0 } else { (sum / n) as u8 }
    }
}
