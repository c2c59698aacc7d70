//! Linework Core -- lines, convoys and stops for transport network games.
//!
//! This crate provides the tile-step geometry convoys move by, an arrival
//! estimator, schedules, halts, the line registry with its derived status,
//! a departure board, and versioned save/restore of the whole network.
//! Monthly statistics come from the `linework-stats` crate.
//!
//! # Tick
//!
//! Each call to [`network::Network::step`] advances every convoy by one
//! tick: loading convoys count down and depart, driving convoys move along
//! their route and keep the arrival estimate at their target halt current.
//! Every `ticks_per_month` ticks the statistics of every line and convoy
//! roll over and line status is recomputed.
//!
//! # Handles
//!
//! Lines, convoys and halts live in arenas keyed by generational ids
//! ([`id::LineId`], [`id::ConvoyId`], [`id::HaltId`]). A stale id never
//! reaches a reused slot: lookups return `None`, commands return `false`.
//!
//! ```rust,ignore
//! let mut net = Network::default();
//! let line = net.create_line(PlayerId(0), LineType::Truck, "Route 1");
//! net.set_schedule(line, Schedule::from_halts([a, b]));
//! net.add_convoy(line, bus);
//! assert!(!net.status(line).unwrap().contains(LineStatus::NO_CONVOYS));
//! ```
//!
//! # Key Types
//!
//! - [`network::Network`] -- Owns every entity and runs the tick loop.
//! - [`line::Line`] -- A line's schedule, members, status and statistics.
//! - [`geometry::TileStepper`] -- Sub-tile motion along a route.
//! - [`departure::DepartureBoard`] -- Cached arrival/departure listing.
//! - [`config::NetworkConfig`] -- Tuning, loadable from TOML or RON.
//! - [`serialize`] -- Versioned bitcode snapshots.

pub mod config;
pub mod convoy;
pub mod departure;
pub mod estimate;
pub mod event;
pub mod fixed;
pub mod geometry;
pub mod halt;
pub mod id;
pub mod line;
pub mod network;
pub mod registry;
pub mod relation;
pub mod schedule;
pub mod serialize;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use linework_stats as stats;
