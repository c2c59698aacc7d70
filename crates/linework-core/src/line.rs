//! Lines: named groups of convoys sharing one schedule.
//!
//! A [`Line`] is plain data. Everything that touches convoys or halts as
//! well (membership, stop registration, status recalculation) lives on
//! [`Network`](crate::network::Network) in `registry.rs`, since those
//! operations need the convoy and halt arenas too.

use serde::{Deserialize, Serialize};

use linework_stats::{FinanceHistory, LineCost};

use crate::convoy::WayType;
use crate::id::{ConvoyId, GoodsCategory, PlayerId};
use crate::schedule::Schedule;

// ---------------------------------------------------------------------------
// LineType
// ---------------------------------------------------------------------------

/// The transport mode of a line. `Line` is the untyped placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LineType {
    #[default]
    Line,
    Truck,
    Train,
    Ship,
    Air,
    Monorail,
    Tram,
    Maglev,
    NarrowGauge,
}

impl LineType {
    pub fn from_waytype(waytype: WayType) -> LineType {
        match waytype {
            WayType::Road => LineType::Truck,
            WayType::Track => LineType::Train,
            WayType::Water => LineType::Ship,
            WayType::Air => LineType::Air,
            WayType::Monorail => LineType::Monorail,
            WayType::Maglev => LineType::Maglev,
            WayType::Tram => LineType::Tram,
            WayType::NarrowGauge => LineType::NarrowGauge,
        }
    }
}

// ---------------------------------------------------------------------------
// LineStatus
// ---------------------------------------------------------------------------

/// Condition flags shown for a line. An empty set means "normal".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LineStatus(pub u8);

impl LineStatus {
    pub const NORMAL: LineStatus = LineStatus(0);
    pub const NO_CONVOYS: LineStatus = LineStatus(1);
    pub const LOSS_MAKING: LineStatus = LineStatus(2);
    pub const NOTHING_MOVED: LineStatus = LineStatus(4);
    pub const OVERCROWDED: LineStatus = LineStatus(8);
    pub const MISSING_SCHEDULED_SLOTS: LineStatus = LineStatus(16);
    pub const HAS_OBSOLETE_VEHICLES: LineStatus = LineStatus(32);
    pub const HAS_UPGRADEABLE_VEHICLES: LineStatus = LineStatus(64);

    pub fn contains(self, other: LineStatus) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: LineStatus) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: LineStatus) {
        self.0 &= !other.0;
    }

    pub fn is_normal(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for LineStatus {
    type Output = LineStatus;

    fn bitor(self, rhs: LineStatus) -> LineStatus {
        LineStatus(self.0 | rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

/// A line. Only the persistent part is serialized; membership and the
/// values derived from it are rebuilt after loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub name: String,
    pub(crate) owner: PlayerId,
    pub(crate) line_type: LineType,
    pub(crate) schedule: Schedule,
    /// Member convoys in insertion order; never contains duplicates.
    #[serde(skip)]
    pub(crate) convoys: Vec<ConvoyId>,
    /// Sorted ascending.
    #[serde(skip)]
    pub(crate) goods_catg_index: Vec<GoodsCategory>,
    #[serde(skip)]
    pub(crate) passenger_classes_carried: Vec<u8>,
    #[serde(skip)]
    pub(crate) mail_classes_carried: Vec<u8>,
    #[serde(skip)]
    pub(crate) status: LineStatus,
    pub(crate) withdraw: bool,
    /// Reverse flag handed to the next convoy on a bidirectional schedule.
    pub(crate) start_reversed: bool,
    pub(crate) livery_scheme_index: u16,
    pub(crate) finance: FinanceHistory<LineCost>,
}

impl Line {
    pub(crate) fn new(owner: PlayerId, line_type: LineType, name: String) -> Self {
        Self {
            name,
            owner,
            line_type,
            schedule: Schedule::new(),
            convoys: Vec::new(),
            goods_catg_index: Vec::new(),
            passenger_classes_carried: Vec::new(),
            mail_classes_carried: Vec::new(),
            status: LineStatus::NO_CONVOYS,
            withdraw: false,
            start_reversed: false,
            livery_scheme_index: 0,
            finance: FinanceHistory::new(),
        }
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn line_type(&self) -> LineType {
        self.line_type
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn convoys(&self) -> &[ConvoyId] {
        &self.convoys
    }

    pub fn count_convoys(&self) -> usize {
        self.convoys.len()
    }

    /// Goods categories carried by at least one member convoy.
    pub fn goods_catg_index(&self) -> &[GoodsCategory] {
        &self.goods_catg_index
    }

    pub fn passenger_classes_carried(&self) -> &[u8] {
        &self.passenger_classes_carried
    }

    pub fn mail_classes_carried(&self) -> &[u8] {
        &self.mail_classes_carried
    }

    pub fn status(&self) -> LineStatus {
        self.status
    }

    pub fn withdraw(&self) -> bool {
        self.withdraw
    }

    pub fn start_reversed(&self) -> bool {
        self.start_reversed
    }

    pub fn livery_scheme_index(&self) -> u16 {
        self.livery_scheme_index
    }

    pub fn finance(&self) -> &FinanceHistory<LineCost> {
        &self.finance
    }

    /// Raw value of a statistic in the given month (0 = current).
    pub fn finance_history(&self, month: usize, cost: LineCost) -> i64 {
        self.finance.get(month, cost)
    }

    /// Statistic in display units: money columns are divided by 100.
    pub fn stat_converted(&self, month: usize, cost: LineCost) -> i64 {
        self.finance.get_converted(month, cost)
    }

    /// Classes carried for `catg`; empty for goods without classes.
    pub fn classes_carried(&self, catg: GoodsCategory) -> &[u8] {
        match catg {
            GoodsCategory::PASSENGERS => &self.passenger_classes_carried,
            GoodsCategory::MAIL => &self.mail_classes_carried,
            _ => &[],
        }
    }

    /// Whether the line carries `catg` in `class` or any lower class.
    ///
    /// Goods without classes only need the category to be carried.
    pub fn carries_this_or_lower_class(&self, catg: GoodsCategory, class: u8) -> bool {
        if !catg.has_classes() {
            return self.goods_catg_index.contains(&catg);
        }
        self.classes_carried(catg).iter().any(|&c| c <= class)
    }

    /// Timed departures the schedule asks for each month.
    pub fn calc_departures_scheduled(&self) -> i64 {
        self.schedule.departures_scheduled()
    }
}
