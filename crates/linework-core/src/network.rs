//! The network: owns every line, convoy and halt and advances them in ticks.
//!
//! # Architecture
//!
//! The `Network` owns:
//! - Arenas for [`Line`]s, [`Convoy`]s and [`Halt`]s, keyed by generational
//!   ids so that stale handles resolve to nothing
//! - The [`StopRelation`] between lines and the halts they serve
//! - A [`SimState`] (tick counter) and the month counter
//! - The [`StepConfig`] shared by every convoy's tile stepper
//! - An [`EventLog`] of what happened
//!
//! Line membership and status operations live in `registry.rs`.
//!
//! # Tick
//!
//! Each `step()` visits every convoy once:
//! 1. **Loading** convoys count down their dwell time, then depart toward
//!    the next stop of their schedule
//! 2. **Driving** convoys advance along their route and refresh the arrival
//!    estimate at their target halt; reaching the end of the route starts
//!    loading there
//!
//! Then the tick counter advances. Every `ticks_per_month` ticks the
//! monthly statistics roll over.

use slotmap::SlotMap;
use tracing::{debug, info, trace};

use linework_stats::{ConvoyCost, LineCost};

use crate::config::{ConfigError, NetworkConfig};
use crate::convoy::{Convoy, ConvoyState};
use crate::estimate::kmh_to_speed;
use crate::event::{EventLog, NetworkEvent};
use crate::fixed::Ticks;
use crate::geometry::{
    MAX_DIAGONAL_MULTIPLIER, MIN_DIAGONAL_MULTIPLIER, StepConfig, TileStepper, straight_route,
};
use crate::halt::Halt;
use crate::id::{ConvoyId, HaltId, LineId};
use crate::line::Line;
use crate::relation::StopRelation;

// ---------------------------------------------------------------------------
// SimState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimState {
    /// Incremented by 1 for each step.
    pub tick: Ticks,
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Network {
    pub(crate) lines: SlotMap<LineId, Line>,
    pub(crate) convoys: SlotMap<ConvoyId, Convoy>,
    pub(crate) halts: SlotMap<HaltId, Halt>,
    pub(crate) stops: StopRelation,
    pub sim_state: SimState,
    /// Months elapsed since the network was created.
    pub(crate) month: u32,
    pub(crate) steps: StepConfig,
    pub(crate) config: NetworkConfig,
    pub(crate) events: EventLog,
    /// Bumped whenever routing-relevant line data changes.
    pub(crate) schedule_counter: u32,
}

impl Default for Network {
    fn default() -> Self {
        Self::with_valid_config(NetworkConfig::default())
    }
}

impl Network {
    /// Create an empty network. The config is validated first, since a
    /// zero month length or an out-of-range diagonal would break the tick
    /// loop.
    pub fn new(config: NetworkConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    pub(crate) fn with_valid_config(config: NetworkConfig) -> Self {
        Self {
            lines: SlotMap::with_key(),
            convoys: SlotMap::with_key(),
            halts: SlotMap::with_key(),
            stops: StopRelation::new(),
            sim_state: SimState::default(),
            month: 0,
            steps: StepConfig::new(config.diagonal_multiplier),
            events: EventLog::new(config.event_capacity),
            config,
            schedule_counter: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn step_config(&self) -> &StepConfig {
        &self.steps
    }

    pub fn schedule_counter(&self) -> u32 {
        self.schedule_counter
    }

    pub fn line(&self, line: LineId) -> Option<&Line> {
        self.lines.get(line)
    }

    pub fn convoy(&self, convoy: ConvoyId) -> Option<&Convoy> {
        self.convoys.get(convoy)
    }

    /// Mutable access to motion state, flags and loads. Vehicles are
    /// swapped with [`Network::set_vehicles`].
    pub fn convoy_mut(&mut self, convoy: ConvoyId) -> Option<&mut Convoy> {
        self.convoys.get_mut(convoy)
    }

    pub fn halt(&self, halt: HaltId) -> Option<&Halt> {
        self.halts.get(halt)
    }

    pub fn lines(&self) -> impl Iterator<Item = (LineId, &Line)> + '_ {
        self.lines.iter()
    }

    pub fn convoys(&self) -> impl Iterator<Item = (ConvoyId, &Convoy)> + '_ {
        self.convoys.iter()
    }

    pub fn halts(&self) -> impl Iterator<Item = (HaltId, &Halt)> + '_ {
        self.halts.iter()
    }

    pub fn stops(&self) -> &StopRelation {
        &self.stops
    }

    /// Lines registered at `halt`.
    pub fn lines_serving(&self, halt: HaltId) -> &[LineId] {
        self.stops.lines_serving(halt)
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<NetworkEvent> {
        self.events.drain()
    }

    pub(crate) fn emit(&mut self, event: NetworkEvent) {
        self.events.push(event);
    }

    // -----------------------------------------------------------------------
    // Entities
    // -----------------------------------------------------------------------

    pub fn add_halt(&mut self, halt: Halt) -> HaltId {
        let id = self.halts.insert(halt);
        debug!(?id, "halt added");
        id
    }

    /// Remove a halt and unregister it from every line. Convoys heading
    /// there find no route on their next departure.
    pub fn remove_halt(&mut self, halt: HaltId) -> bool {
        if self.halts.remove(halt).is_none() {
            trace!(?halt, "remove_halt: stale handle");
            return false;
        }
        let lines = self.stops.unregister_halt(halt);
        if !lines.is_empty() {
            self.schedule_counter = self.schedule_counter.wrapping_add(1);
        }
        debug!(?halt, lines = lines.len(), "halt removed");
        true
    }

    /// Put a convoy on the map. It stays idle until [`Network::start_convoy`].
    pub fn spawn_convoy(&mut self, mut convoy: Convoy) -> ConvoyId {
        let line = convoy.line.take();
        let id = self.convoys.insert(convoy);
        if let Some(line) = line {
            self.add_convoy(line, id);
        }
        debug!(?id, "convoy spawned");
        id
    }

    /// Destroy a convoy: detach it from its line and clear its estimates.
    pub fn destroy_convoy(&mut self, convoy: ConvoyId) -> bool {
        let Some(line) = self.convoys.get(convoy).map(|c| c.line) else {
            trace!(?convoy, "destroy_convoy: stale handle");
            return false;
        };
        if let Some(line) = line {
            self.remove_convoy(line, convoy);
        }
        self.forget_estimates(convoy);
        self.convoys.remove(convoy);
        debug!(?convoy, "convoy destroyed");
        true
    }

    /// Begin service: the convoy starts loading at the current stop of its
    /// schedule. Returns `false` if it has no schedule or the stop is gone;
    /// the convoy is then left without a route.
    pub fn start_convoy(&mut self, convoy: ConvoyId) -> bool {
        let tick = self.sim_state.tick;
        let loading_ticks = self.config.loading_ticks;
        let Some(cnv) = self.convoys.get(convoy) else {
            return false;
        };
        let stop = cnv.schedule.current_entry().map(|e| e.halt);
        let Some(halt_id) = stop.filter(|&h| self.halts.contains_key(h)) else {
            self.lose_route(convoy);
            return false;
        };

        self.forget_estimates(convoy);
        let cnv = &mut self.convoys[convoy];
        cnv.state = ConvoyState::Loading;
        cnv.loading_left = loading_ticks;
        cnv.last_stop = Some(halt_id);
        cnv.target_halt = None;
        self.halts[halt_id].set_estimated_departure(convoy, tick + loading_ticks as Ticks);
        true
    }

    /// Stop a convoy that cannot reach its next stop. It disappears from
    /// every departure board.
    fn lose_route(&mut self, convoy: ConvoyId) {
        if let Some(cnv) = self.convoys.get_mut(convoy) {
            cnv.state = ConvoyState::NoRoute;
            cnv.target_halt = None;
        }
        self.forget_estimates(convoy);
        debug!(?convoy, "no route to next stop");
    }

    fn forget_estimates(&mut self, convoy: ConvoyId) {
        for (_, halt) in self.halts.iter_mut() {
            halt.forget_convoy(convoy);
        }
    }

    // -----------------------------------------------------------------------
    // Geometry
    // -----------------------------------------------------------------------

    /// Change the diagonal length, clamped to `512..=1024`. Convoys on
    /// diagonal tiles keep their fractional progress through the tile.
    pub fn set_diagonal_multiplier(&mut self, multiplier: u16) {
        let multiplier = multiplier.clamp(MIN_DIAGONAL_MULTIPLIER, MAX_DIAGONAL_MULTIPLIER);
        self.steps.set_diagonal_multiplier(multiplier);
        self.config.diagonal_multiplier = self.steps.diagonal_multiplier();
        for (_, cnv) in self.convoys.iter_mut() {
            cnv.stepper.rescale(&self.steps);
        }
        info!(
            multiplier = self.steps.diagonal_multiplier(),
            steps = self.steps.diagonal_steps_per_tile(),
            "diagonal multiplier changed"
        );
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the network by one tick.
    pub fn step(&mut self) {
        let ids: Vec<ConvoyId> = self.convoys.keys().collect();
        for id in ids {
            match self.convoys[id].state {
                ConvoyState::Loading => self.step_loading(id),
                ConvoyState::Driving => self.step_driving(id),
                _ => {}
            }
        }

        self.sim_state.tick += 1;
        if self.sim_state.tick % self.config.ticks_per_month == 0 {
            self.new_month();
        }
    }

    /// Run `n` steps.
    pub fn advance(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Count down the dwell time, then leave once the stop's rules allow:
    /// the minimum load is reached (unless the convoy does not load) and,
    /// at a timed stop, the departure slot has come. Withdrawing convoys
    /// go to the depot instead.
    fn step_loading(&mut self, id: ConvoyId) {
        let tick = self.sim_state.tick;
        let ticks_per_month = self.config.ticks_per_month;
        let cnv = &mut self.convoys[id];
        cnv.loading_left = cnv.loading_left.saturating_sub(1);
        if cnv.loading_left > 0 {
            return;
        }
        if cnv.withdraw {
            self.withdraw_to_depot(id);
            return;
        }
        let Some(entry) = cnv.schedule.current_entry() else {
            self.depart(id);
            return;
        };

        let loaded = cnv.no_load || cnv.load_percent() >= entry.minimum_loading as u32;
        let slot = cnv.schedule.next_departure_slot(entry, tick, ticks_per_month);
        if loaded && slot == tick {
            self.depart(id);
            return;
        }
        let (halt, eta) = (entry.halt, slot.max(tick + 1));
        if let Some(h) = self.halts.get_mut(halt) {
            h.set_estimated_departure(id, eta);
        }
    }

    fn withdraw_to_depot(&mut self, id: ConvoyId) {
        let cnv = &mut self.convoys[id];
        cnv.state = ConvoyState::InDepot;
        cnv.target_halt = None;
        self.forget_estimates(id);
        debug!(convoy = ?id, "withdrawn to depot");
    }

    fn depart(&mut self, id: ConvoyId) {
        let tick = self.sim_state.tick;
        let cnv = &mut self.convoys[id];
        let Some(entry) = cnv.schedule.current_entry().cloned() else {
            self.lose_route(id);
            return;
        };
        let mut reversed = cnv.reverse_schedule;
        cnv.schedule.advance(&mut reversed);
        cnv.reverse_schedule = reversed;
        let Some(target) = cnv.schedule.current_entry().map(|e| e.halt) else {
            self.lose_route(id);
            return;
        };
        let ends = self
            .halts
            .get(entry.halt)
            .zip(self.halts.get(target))
            .map(|(from, to)| (from.pos, to.pos));
        let Some((from, to)) = ends else {
            self.lose_route(id);
            return;
        };

        cnv.route = straight_route(from, to);
        let (stepper, index) = TileStepper::start(&cnv.route, 0, &self.steps);
        cnv.stepper = stepper;
        cnv.route_index = index;
        cnv.state = ConvoyState::Driving;
        cnv.target_halt = Some(target);
        let eta = tick + cnv.estimated_ticks_to_arrival() as Ticks;
        let capacity = cnv.capacity() as i64;
        let load = if cnv.no_load { 0 } else { cnv.load() as i64 };

        if let Some(halt) = self.halts.get_mut(entry.halt) {
            halt.clear_estimated_departure(id);
        }
        if let Some(halt) = self.halts.get_mut(target) {
            halt.set_estimated_arrival(id, eta);
        }

        self.book_convoy(id, capacity, ConvoyCost::Capacity);
        self.book_convoy(id, load, ConvoyCost::Transported);
        if entry.wait_for_time {
            if let Some(line) = self.convoys[id].line {
                self.book_line(line, 1, LineCost::Departures);
            }
        }
        self.emit(NetworkEvent::ConvoyDeparted {
            convoy: id,
            halt: entry.halt,
            tick,
        });
        trace!(convoy = ?id, from = ?entry.halt, to = ?target, "departed");
    }

    fn step_driving(&mut self, id: ConvoyId) {
        let tick = self.sim_state.tick;
        let cnv = &mut self.convoys[id];
        cnv.average_kmh.push(cnv.speed_kmh as i64);

        let Convoy {
            stepper,
            route,
            route_index,
            speed_kmh,
            ..
        } = cnv;
        let hops = stepper.drive(kmh_to_speed(*speed_kmh), route.as_slice(), route_index, &self.steps);
        let arrived = cnv.route_index >= cnv.route.len();
        let eta = tick + cnv.estimated_ticks_to_arrival() as Ticks;
        let target = cnv.target_halt;

        if hops > 0 {
            self.book_convoy(id, hops as i64, ConvoyCost::Distance);
        }
        match target {
            Some(halt) if arrived => self.arrive(id, halt),
            Some(halt) => {
                if let Some(h) = self.halts.get_mut(halt) {
                    h.set_estimated_arrival(id, eta);
                }
            }
            None => {}
        }
    }

    fn arrive(&mut self, id: ConvoyId, halt: HaltId) {
        let tick = self.sim_state.tick;
        let loading_ticks = self.config.loading_ticks;
        let cnv = &mut self.convoys[id];
        cnv.state = ConvoyState::Loading;
        // A zero dwell still waits one tick before leaving.
        cnv.loading_left = loading_ticks.max(1);
        cnv.last_stop = Some(halt);
        cnv.target_halt = None;
        let speed = cnv.average_speed_kmh() as i64;
        let comfort = cnv.comfort() as i64;

        if let Some(h) = self.halts.get_mut(halt) {
            h.clear_estimated_arrival(id);
            h.set_estimated_departure(id, tick + loading_ticks as Ticks);
        }
        self.book_convoy(id, speed, ConvoyCost::AverageSpeed);
        if comfort > 0 {
            self.book_convoy(id, comfort, ConvoyCost::Comfort);
        }
        self.emit(NetworkEvent::ConvoyArrived {
            convoy: id,
            halt,
            tick,
        });
        trace!(convoy = ?id, ?halt, "arrived");
    }

    // -----------------------------------------------------------------------
    // Month rollover
    // -----------------------------------------------------------------------

    /// Close the current month: shift every history, snapshot the convoy
    /// count and scheduled departures, and recompute line status.
    pub fn new_month(&mut self) {
        self.month += 1;
        for (_, cnv) in self.convoys.iter_mut() {
            cnv.finance.new_month();
        }
        let ids: Vec<LineId> = self.lines.keys().collect();
        for id in ids {
            let line = &mut self.lines[id];
            line.finance.new_month();
            let count = line.convoys.len() as i64;
            let scheduled = line.calc_departures_scheduled();
            line.finance.set_current(LineCost::Convoys, count);
            line.finance.set_current(LineCost::DeparturesScheduled, scheduled);
            self.recalc_status(id);
        }
        let tick = self.sim_state.tick;
        self.emit(NetworkEvent::MonthEnded {
            month: self.month,
            tick,
        });
        info!(month = self.month, tick, lines = self.lines.len(), "month ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::departure::DepartureBoard;
    use crate::geometry::Koord;
    use crate::schedule::{Schedule, ScheduleEntry};
    use crate::test_utils::*;

    #[test]
    fn convoy_shuttles_between_two_halts() {
        let mut net = small_network();
        let a = add_halt_at(&mut net, "A", Koord::new(0, 0));
        let b = add_halt_at(&mut net, "B", Koord::new(3, 0));
        let cnv = spawn_bus(&mut net, Schedule::from_halts([a, b]), 200);
        assert!(net.start_convoy(cnv));

        // 200 km/h covers a tile in about 410 ticks.
        let mut arrived_at_b = false;
        for _ in 0..3_000 {
            net.step();
            if net.convoy(cnv).and_then(|c| c.last_stop) == Some(b) {
                arrived_at_b = true;
                break;
            }
        }
        assert!(arrived_at_b);
        assert_eq!(net.convoy(cnv).map(|c| c.state), Some(ConvoyState::Loading));
        let distance = net.convoy(cnv).map(|c| c.finance.get(0, ConvoyCost::Distance));
        assert_eq!(distance, Some(3));
    }

    #[test]
    fn driving_convoy_has_arrival_estimate() {
        let mut net = small_network();
        let a = add_halt_at(&mut net, "A", Koord::new(0, 0));
        let b = add_halt_at(&mut net, "B", Koord::new(20, 20));
        let cnv = spawn_bus(&mut net, Schedule::from_halts([a, b]), 60);
        net.start_convoy(cnv);
        net.advance(net.config().loading_ticks as u64 + 1);

        assert_eq!(net.convoy(cnv).map(|c| c.state), Some(ConvoyState::Driving));
        let eta = net.halt(b).and_then(|h| h.estimated_arrival(cnv));
        assert!(eta.is_some_and(|t| t >= net.tick()));
        assert!(net.halt(a).and_then(|h| h.estimated_departure(cnv)).is_none());
    }

    #[test]
    fn start_without_schedule_is_no_route() {
        let mut net = small_network();
        let cnv = spawn_bus(&mut net, Schedule::new(), 50);
        assert!(!net.start_convoy(cnv));
        assert_eq!(net.convoy(cnv).map(|c| c.state), Some(ConvoyState::NoRoute));
    }

    #[test]
    fn month_rolls_over_on_cadence() {
        let mut net = small_network();
        let ticks = net.config().ticks_per_month;
        net.advance(ticks - 1);
        assert_eq!(net.month(), 0);
        net.step();
        assert_eq!(net.month(), 1);
        assert!(net
            .drain_events()
            .iter()
            .any(|e| matches!(e, NetworkEvent::MonthEnded { month: 1, .. })));
    }

    #[test]
    fn destroy_clears_estimates() {
        let mut net = small_network();
        let a = add_halt_at(&mut net, "A", Koord::new(0, 0));
        let b = add_halt_at(&mut net, "B", Koord::new(3, 0));
        let cnv = spawn_bus(&mut net, Schedule::from_halts([a, b]), 50);
        net.start_convoy(cnv);
        assert!(net.halt(a).and_then(|h| h.estimated_departure(cnv)).is_some());
        assert!(net.destroy_convoy(cnv));
        assert!(net.halt(a).and_then(|h| h.estimated_departure(cnv)).is_none());
        assert!(!net.destroy_convoy(cnv));
    }

    #[test]
    fn removed_halt_leaves_convoy_without_route() {
        let mut net = small_network();
        let a = add_halt_at(&mut net, "A", Koord::new(0, 0));
        let b = add_halt_at(&mut net, "B", Koord::new(3, 0));
        let cnv = spawn_bus(&mut net, Schedule::from_halts([a, b]), 50);
        net.start_convoy(cnv);
        assert!(net.remove_halt(b));
        assert!(!net.remove_halt(b));
        net.advance(net.config().loading_ticks as u64);
        assert_eq!(net.convoy(cnv).map(|c| c.state), Some(ConvoyState::NoRoute));
    }

    #[test]
    fn lost_route_leaves_no_departure_behind() {
        let mut net = small_network();
        let a = add_halt_at(&mut net, "A", Koord::new(0, 0));
        let b = add_halt_at(&mut net, "B", Koord::new(3, 0));
        let cnv = spawn_bus(&mut net, Schedule::from_halts([a, b]), 50);
        net.start_convoy(cnv);
        net.remove_halt(b);
        net.advance(net.config().loading_ticks as u64 + 1000);

        assert_eq!(net.convoy(cnv).map(|c| c.state), Some(ConvoyState::NoRoute));
        assert!(net.halt(a).and_then(|h| h.estimated_departure(cnv)).is_none());
        let mut board = DepartureBoard::new(Some(a));
        board.update(&net);
        assert!(board.departures().is_empty());
    }

    #[test]
    fn failed_start_clears_old_estimates() {
        let mut net = small_network();
        let a = add_halt_at(&mut net, "A", Koord::new(0, 0));
        let b = add_halt_at(&mut net, "B", Koord::new(9, 0));
        let cnv = spawn_bus(&mut net, Schedule::from_halts([a, b]), 50);
        net.start_convoy(cnv);
        net.advance(net.config().loading_ticks as u64 + 1);
        assert!(net.halt(b).and_then(|h| h.estimated_arrival(cnv)).is_some());

        net.remove_halt(a);
        if let Some(c) = net.convoy_mut(cnv) {
            c.schedule.set_current(0);
        }
        assert!(!net.start_convoy(cnv));
        assert!(net.halt(b).and_then(|h| h.estimated_arrival(cnv)).is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = NetworkConfig {
            ticks_per_month: 0,
            ..NetworkConfig::default()
        };
        assert!(matches!(
            Network::new(config),
            Err(ConfigError::Invalid { field: "ticks_per_month", .. })
        ));
        assert!(Network::new(NetworkConfig::default()).is_ok());
    }

    #[test]
    fn diagonal_multiplier_is_clamped() {
        let mut net = small_network();
        net.set_diagonal_multiplier(100);
        assert_eq!(net.config().diagonal_multiplier, 512);
        assert!(net.config().validate().is_ok());
    }

    // -----------------------------------------------------------------------
    // Loading rules
    // -----------------------------------------------------------------------

    /// Start an empty bus at `first`, bound for a second halt four tiles on.
    fn two_stop(net: &mut Network, first: ScheduleEntry, spacing: u16) -> ConvoyId {
        let b = add_halt_at(net, "B", Koord::new(4, 0));
        let mut schedule = Schedule::new();
        schedule.append(first);
        schedule.append(ScheduleEntry::new(b));
        schedule.spacing = spacing;
        let cnv = spawn_bus(net, schedule, 80);
        net.start_convoy(cnv);
        cnv
    }

    #[test]
    fn minimum_load_holds_departure() {
        let mut net = small_network();
        let a = add_halt_at(&mut net, "A", Koord::new(0, 0));
        let cnv = two_stop(&mut net, ScheduleEntry::new(a).with_minimum_loading(50), 0);
        net.advance(net.config().loading_ticks as u64 + 50);
        assert_eq!(net.convoy(cnv).map(|c| c.state), Some(ConvoyState::Loading));
        let eta = net.halt(a).and_then(|h| h.estimated_departure(cnv));
        assert!(eta.is_some_and(|t| t >= net.tick()));

        if let Some(c) = net.convoy_mut(cnv) {
            c.set_load(0, 0, 20);
        }
        net.step();
        assert_eq!(net.convoy(cnv).map(|c| c.state), Some(ConvoyState::Driving));
    }

    #[test]
    fn no_load_convoy_ignores_minimum_load() {
        let mut net = small_network();
        let a = add_halt_at(&mut net, "A", Koord::new(0, 0));
        let cnv = two_stop(&mut net, ScheduleEntry::new(a).with_minimum_loading(100), 0);
        if let Some(c) = net.convoy_mut(cnv) {
            c.no_load = true;
        }
        net.advance(net.config().loading_ticks as u64);
        assert_eq!(net.convoy(cnv).map(|c| c.state), Some(ConvoyState::Driving));
    }

    #[test]
    fn timed_stop_waits_for_slot() {
        let mut net = small_network();
        let a = add_halt_at(&mut net, "A", Koord::new(0, 0));
        // 4096 ticks a month, four slots: one every 1024 ticks.
        let cnv = two_stop(&mut net, ScheduleEntry::new(a).timed(0), 4);
        net.advance(1_000);
        assert_eq!(net.convoy(cnv).map(|c| c.state), Some(ConvoyState::Loading));
        assert_eq!(net.halt(a).and_then(|h| h.estimated_departure(cnv)), Some(1024));

        net.advance(25);
        assert_eq!(net.convoy(cnv).map(|c| c.state), Some(ConvoyState::Driving));
    }

    #[test]
    fn withdrawn_convoy_goes_to_depot() {
        let mut net = small_network();
        let (line, halts) = bus_line(&mut net, 2, 4, 1);
        let cnv = net.line_convoys(line)[0];
        net.set_withdraw(line, true);
        net.advance(net.config().loading_ticks as u64);
        assert_eq!(net.convoy(cnv).map(|c| c.state), Some(ConvoyState::InDepot));
        assert!(net.halt(halts[0]).and_then(|h| h.estimated_departure(cnv)).is_none());
    }
}
