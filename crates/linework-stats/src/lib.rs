//! Monthly financial and operational statistics for lines and convoys.
//!
//! Every line (and every convoy) keeps a bounded table of the last
//! [`MAX_MONTHS`] months, one column per cost category. Month 0 is the
//! current, still accumulating bucket; [`FinanceHistory::new_month`] shifts
//! everything one month older and silently drops the oldest month.
//!
//! Two booking semantics exist and are fixed per category:
//!
//! - **Plain** categories (revenue, distance, ...) are accumulated by
//!   addition into month 0.
//! - **Rolling-average** categories (average speed, comfort) feed a
//!   [`RollingAverage`] accumulator; month 0 always shows its current mean.
//!
//! # Usage
//!
//! ```
//! use linework_stats::{FinanceHistory, LineCost};
//!
//! let mut history = FinanceHistory::<LineCost>::new();
//! history.book(1000, LineCost::Revenue);
//! history.book(-200, LineCost::Operations);
//! history.book(80, LineCost::AverageSpeed);
//! history.book(100, LineCost::AverageSpeed);
//!
//! assert_eq!(history.get(0, LineCost::AverageSpeed), 90);
//! assert_eq!(history.derived_profit(0), 800);
//! ```

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// Number of months of history kept per category, including the current one.
pub const MAX_MONTHS: usize = 12;

// ---------------------------------------------------------------------------
// Cost categories
// ---------------------------------------------------------------------------

/// A closed set of statistic columns.
///
/// Implementors are plain `Copy` enums; the trait only fixes the column
/// count and the booking semantics of each column.
pub trait CostCategory: Copy + Eq + std::fmt::Debug {
    /// Number of columns.
    const COUNT: usize;

    /// Column index, `0..COUNT`.
    fn index(self) -> usize;

    /// Whether bookings feed a rolling average instead of a sum.
    fn is_rolling_average(self) -> bool;

    /// Whether the column holds money in 1/100 units.
    fn is_money(self) -> bool;
}

/// Statistic columns kept per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineCost {
    /// Amount of cargo that could have been carried.
    Capacity,
    /// Amount of cargo actually carried.
    TransportedGoods,
    /// Average speed of all member convoys (rolling average).
    AverageSpeed,
    /// Average comfort rating of member vehicles (rolling average).
    Comfort,
    Revenue,
    /// Running costs, booked as negative amounts.
    Operations,
    Profit,
    /// Number of convoys on the line (snapshot, not accumulated).
    Convoys,
    /// Tiles covered by all member convoys.
    Distance,
    /// Refunds paid to passengers kept waiting too long.
    Refunds,
    /// Departures from timed stops.
    Departures,
    /// Departures the schedule asked for (snapshot).
    DeparturesScheduled,
    /// Tolls paid for using other players' ways, booked negative.
    WayToll,
}

impl LineCost {
    /// Every line column, in storage order.
    pub const ALL: [LineCost; 13] = [
        LineCost::Capacity,
        LineCost::TransportedGoods,
        LineCost::AverageSpeed,
        LineCost::Comfort,
        LineCost::Revenue,
        LineCost::Operations,
        LineCost::Profit,
        LineCost::Convoys,
        LineCost::Distance,
        LineCost::Refunds,
        LineCost::Departures,
        LineCost::DeparturesScheduled,
        LineCost::WayToll,
    ];
}

impl CostCategory for LineCost {
    const COUNT: usize = 13;

    fn index(self) -> usize {
        self as usize
    }

    fn is_rolling_average(self) -> bool {
        matches!(self, LineCost::AverageSpeed | LineCost::Comfort)
    }

    fn is_money(self) -> bool {
        matches!(
            self,
            LineCost::Revenue
                | LineCost::Operations
                | LineCost::Profit
                | LineCost::Refunds
                | LineCost::WayToll
        )
    }
}

/// Statistic columns kept per convoy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConvoyCost {
    Capacity,
    Transported,
    AverageSpeed,
    Comfort,
    Revenue,
    Operations,
    Profit,
    Distance,
    Refunds,
    WayToll,
}

impl ConvoyCost {
    /// Every convoy column, in storage order.
    pub const ALL: [ConvoyCost; 10] = [
        ConvoyCost::Capacity,
        ConvoyCost::Transported,
        ConvoyCost::AverageSpeed,
        ConvoyCost::Comfort,
        ConvoyCost::Revenue,
        ConvoyCost::Operations,
        ConvoyCost::Profit,
        ConvoyCost::Distance,
        ConvoyCost::Refunds,
        ConvoyCost::WayToll,
    ];

    /// The line column a convoy booking is mirrored into.
    pub fn to_line_cost(self) -> LineCost {
        match self {
            ConvoyCost::Capacity => LineCost::Capacity,
            ConvoyCost::Transported => LineCost::TransportedGoods,
            ConvoyCost::AverageSpeed => LineCost::AverageSpeed,
            ConvoyCost::Comfort => LineCost::Comfort,
            ConvoyCost::Revenue => LineCost::Revenue,
            ConvoyCost::Operations => LineCost::Operations,
            ConvoyCost::Profit => LineCost::Profit,
            ConvoyCost::Distance => LineCost::Distance,
            ConvoyCost::Refunds => LineCost::Refunds,
            ConvoyCost::WayToll => LineCost::WayToll,
        }
    }
}

impl CostCategory for ConvoyCost {
    const COUNT: usize = 10;

    fn index(self) -> usize {
        self as usize
    }

    fn is_rolling_average(self) -> bool {
        self.to_line_cost().is_rolling_average()
    }

    fn is_money(self) -> bool {
        self.to_line_cost().is_money()
    }
}

/// Convert a money amount from 1/100 units to whole units, rounding half
/// away from zero.
pub fn convert_money(value: i64) -> i64 {
    if value >= 0 {
        (value + 50) / 100
    } else {
        (value - 50) / 100
    }
}

// ---------------------------------------------------------------------------
// RollingAverage
// ---------------------------------------------------------------------------

/// A `(sum, count)` accumulator whose mean survives arbitrarily many samples.
///
/// Both fields are bounded (`u32` sum, `u16` count). Before a sample would
/// overflow either of them, sum and count are halved together, so the mean
/// is preserved up to integer rounding while older samples lose weight.
/// Negative samples are clamped to zero; the averaged quantities (speed,
/// comfort) are never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingAverage {
    sum: u32,
    count: u16,
}

impl RollingAverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample and return the new mean.
    pub fn push(&mut self, amount: i64) -> i64 {
        let amount = amount.clamp(0, u32::MAX as i64) as u32;
        while self.count == u16::MAX || self.sum.checked_add(amount).is_none() {
            if self.count <= 1 {
                // A single sample already fills the sum; start over.
                self.sum = 0;
                self.count = 0;
                break;
            }
            self.sum /= 2;
            self.count /= 2;
        }
        self.sum += amount;
        self.count += 1;
        self.mean()
    }

    /// Current mean, or 0 with no samples.
    pub fn mean(&self) -> i64 {
        if self.count == 0 {
            return 0;
        }
        self.sum as i64 / self.count as i64
    }

    pub fn sum(&self) -> u32 {
        self.sum
    }

    pub fn count(&self) -> u16 {
        self.count
    }

    /// Restore an accumulator from saved fields.
    pub fn from_parts(sum: u32, count: u16) -> Self {
        Self { sum, count }
    }
}

// ---------------------------------------------------------------------------
// FinanceHistory
// ---------------------------------------------------------------------------

/// Bounded monthly history of `C::COUNT` columns.
///
/// Storage is allocated once at construction and never grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct FinanceHistory<C: CostCategory> {
    /// Row-major: `values[month * C::COUNT + column]`.
    values: Vec<i64>,
    averages: Vec<RollingAverage>,
    #[serde(skip)]
    _category: PhantomData<C>,
}

impl<C: CostCategory> FinanceHistory<C> {
    /// Create an all-zero history.
    pub fn new() -> Self {
        Self {
            values: vec![0; MAX_MONTHS * C::COUNT],
            averages: vec![RollingAverage::new(); C::COUNT],
            _category: PhantomData,
        }
    }

    /// Book an amount into the current month.
    pub fn book(&mut self, amount: i64, category: C) {
        let col = category.index();
        if category.is_rolling_average() {
            self.values[col] = self.averages[col].push(amount);
        } else {
            self.values[col] += amount;
        }
    }

    /// Overwrite the current month's value of a column.
    ///
    /// Used for snapshot columns such as the convoy count.
    pub fn set_current(&mut self, category: C, value: i64) {
        self.values[category.index()] = value;
    }

    /// Value of a column in the given month (0 = current). Months beyond the
    /// history depth read as 0.
    pub fn get(&self, month: usize, category: C) -> i64 {
        if month >= MAX_MONTHS {
            return 0;
        }
        self.values[month * C::COUNT + category.index()]
    }

    /// Like [`get`](Self::get), but money columns are converted to whole units.
    pub fn get_converted(&self, month: usize, category: C) -> i64 {
        let value = self.get(month, category);
        if category.is_money() {
            convert_money(value)
        } else {
            value
        }
    }

    /// All columns of one month, in column order.
    pub fn month(&self, month: usize) -> &[i64] {
        let month = month.min(MAX_MONTHS - 1);
        &self.values[month * C::COUNT..(month + 1) * C::COUNT]
    }

    /// One column across all months, newest first.
    pub fn column(&self, category: C) -> Vec<i64> {
        (0..MAX_MONTHS).map(|m| self.get(m, category)).collect()
    }

    /// The rolling accumulator behind a column.
    pub fn rolling_average(&self, category: C) -> &RollingAverage {
        &self.averages[category.index()]
    }

    /// Replace the rolling accumulator of a column (save-game restore).
    pub fn set_rolling_average(&mut self, category: C, average: RollingAverage) {
        self.averages[category.index()] = average;
    }

    /// Shift every column one month older and clear the current month.
    ///
    /// The rolling accumulators keep their samples; only the displayed
    /// month-0 value starts from zero again.
    pub fn new_month(&mut self) {
        let row = C::COUNT;
        self.values.copy_within(0..(MAX_MONTHS - 1) * row, row);
        for v in &mut self.values[0..row] {
            *v = 0;
        }
    }

    /// Whether the table has the shape `C` expects. Always true for
    /// histories built with [`new`](Self::new); decoded data may not be.
    pub fn is_well_formed(&self) -> bool {
        self.values.len() == MAX_MONTHS * C::COUNT && self.averages.len() == C::COUNT
    }

    /// Reset every value and accumulator.
    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0);
        self.averages.iter_mut().for_each(|a| *a = RollingAverage::new());
    }
}

impl FinanceHistory<LineCost> {
    /// Profit computed from its parts: revenue plus (negative) operating
    /// costs and way tolls.
    ///
    /// The booked [`LineCost::Profit`] column is kept separately; whichever
    /// the caller books is what that column shows.
    pub fn derived_profit(&self, month: usize) -> i64 {
        self.get(month, LineCost::Revenue)
            + self.get(month, LineCost::Operations)
            + self.get(month, LineCost::WayToll)
    }
}

impl<C: CostCategory> Default for FinanceHistory<C> {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
