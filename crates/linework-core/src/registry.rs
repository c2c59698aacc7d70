//! Line registry: convoy membership, stop registration and derived line
//! state.
//!
//! Every operation takes ids and silently ignores stale ones, returning
//! `false` (or `None`) instead of failing. Membership changes always
//! recompute the derived values (goods set, classes, convoy count, status)
//! before returning, so no reader ever sees a membership list that
//! disagrees with them.

use tracing::{debug, info, trace};

use linework_stats::{ConvoyCost, LineCost};

use crate::convoy::Vehicle;
use crate::event::NetworkEvent;
use crate::id::{ConvoyId, GoodsCategory, LineId, PlayerId};
use crate::line::{Line, LineStatus, LineType};
use crate::network::Network;
use crate::schedule::Schedule;

impl Network {
    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub fn create_line(&mut self, owner: PlayerId, line_type: LineType, name: impl Into<String>) -> LineId {
        let name = name.into();
        let id = self.lines.insert(Line::new(owner, line_type, name));
        let tick = self.sim_state.tick;
        self.emit(NetworkEvent::LineCreated { line: id, tick });
        info!(line = ?id, ?owner, ?line_type, "line created");
        id
    }

    /// Remove a line. Member convoys are unassigned but keep running on
    /// their copy of the schedule.
    pub fn remove_line(&mut self, line: LineId) -> bool {
        let Some(removed) = self.lines.remove(line) else {
            trace!(?line, "remove_line: stale handle");
            return false;
        };
        for cnv in &removed.convoys {
            if let Some(c) = self.convoys.get_mut(*cnv) {
                c.line = None;
            }
        }
        self.stops.unregister_line(line);
        if !removed.goods_catg_index.is_empty() {
            self.bump_schedule_counter();
        }
        let tick = self.sim_state.tick;
        self.emit(NetworkEvent::LineRemoved { line, tick });
        info!(?line, convoys = removed.convoys.len(), "line removed");
        true
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Assign a convoy to a line. A convoy already on another line is taken
    /// off that line first. Returns `false` for stale handles or if the
    /// convoy is already a member.
    pub fn add_convoy(&mut self, line: LineId, cnv: ConvoyId) -> bool {
        let Some(convoy) = self.convoys.get(cnv) else {
            trace!(?cnv, "add_convoy: stale convoy");
            return false;
        };
        let Some(l) = self.lines.get(line) else {
            trace!(?line, "add_convoy: stale line");
            return false;
        };
        if l.convoys.contains(&cnv) {
            return false;
        }
        let previous = convoy.line;
        let waytype = convoy.waytype();
        if let Some(other) = previous {
            self.remove_convoy(other, cnv);
        }

        if self.lines[line].convoys.is_empty() {
            self.register_stops_of(line);
        }

        let l = &mut self.lines[line];
        if l.line_type == LineType::Train {
            if let Some(refined) = waytype.map(LineType::from_waytype) {
                if matches!(
                    refined,
                    LineType::Monorail | LineType::Tram | LineType::Maglev | LineType::NarrowGauge
                ) {
                    l.line_type = refined;
                }
            }
        }
        l.convoys.push(cnv);

        let c = &mut self.convoys[cnv];
        let current = c.schedule.current();
        c.line = Some(line);
        c.schedule = l.schedule.clone();
        c.schedule.set_current(current);
        c.livery_scheme_index = l.livery_scheme_index;
        if l.schedule.bidirectional {
            c.reverse_schedule = l.start_reversed;
            l.start_reversed = !l.start_reversed;
        }

        self.recalc_catg_index(line);
        self.calc_classes_carried(line);
        self.refresh_convoy_count(line);
        self.recalc_status(line);

        let tick = self.sim_state.tick;
        self.emit(NetworkEvent::ConvoyAssigned { line, convoy: cnv, tick });
        debug!(?line, convoy = ?cnv, "convoy assigned");
        true
    }

    /// Take a convoy off a line. Removing the last convoy unregisters the
    /// line's stops. Returns `false` if the convoy was not a member.
    pub fn remove_convoy(&mut self, line: LineId, cnv: ConvoyId) -> bool {
        let Some(l) = self.lines.get_mut(line) else {
            trace!(?line, "remove_convoy: stale line");
            return false;
        };
        let Some(pos) = l.convoys.iter().position(|&c| c == cnv) else {
            return false;
        };
        l.convoys.remove(pos);
        let now_empty = l.convoys.is_empty();
        if let Some(c) = self.convoys.get_mut(cnv) {
            if c.line == Some(line) {
                c.line = None;
            }
        }

        self.recalc_catg_index(line);
        self.calc_classes_carried(line);
        self.refresh_convoy_count(line);
        self.recalc_status(line);
        if now_empty {
            self.unregister_stops(line);
        }

        let tick = self.sim_state.tick;
        self.emit(NetworkEvent::ConvoyUnassigned { line, convoy: cnv, tick });
        debug!(?line, convoy = ?cnv, "convoy unassigned");
        true
    }

    /// Swap the vehicles of a convoy. Its line's goods set, classes and
    /// status follow immediately.
    pub fn set_vehicles(&mut self, cnv: ConvoyId, vehicles: Vec<Vehicle>) -> bool {
        let Some(c) = self.convoys.get_mut(cnv) else {
            trace!(?cnv, "set_vehicles: stale convoy");
            return false;
        };
        c.vehicles = vehicles;
        if let Some(line) = c.line {
            self.recalc_catg_index(line);
            self.calc_classes_carried(line);
            self.recalc_status(line);
        }
        debug!(convoy = ?cnv, "vehicles replaced");
        true
    }

    fn refresh_convoy_count(&mut self, line: LineId) {
        if let Some(l) = self.lines.get_mut(line) {
            let count = l.convoys.len() as i64;
            l.finance.set_current(LineCost::Convoys, count);
        }
    }

    // -----------------------------------------------------------------------
    // Derived state
    // -----------------------------------------------------------------------

    /// Rebuild the set of goods carried from the member convoys. If the set
    /// changed, routing data is invalidated. Returns whether it changed.
    pub fn recalc_catg_index(&mut self, line: LineId) -> bool {
        let Some(l) = self.lines.get(line) else {
            return false;
        };
        let mut catgs: Vec<GoodsCategory> = Vec::new();
        for cnv in l.convoys.iter().filter_map(|&c| self.convoys.get(c)) {
            for catg in cnv.goods_categories() {
                if !catgs.contains(&catg) {
                    catgs.push(catg);
                }
            }
        }
        catgs.sort_unstable();
        if catgs == l.goods_catg_index {
            return false;
        }

        self.lines[line].goods_catg_index = catgs;
        self.bump_schedule_counter();
        let tick = self.sim_state.tick;
        self.emit(NetworkEvent::GoodsChanged { line, tick });
        debug!(?line, "goods carried changed");
        true
    }

    /// Rebuild the passenger and mail classes carried by member convoys.
    pub fn calc_classes_carried(&mut self, line: LineId) {
        let Some(l) = self.lines.get(line) else {
            return;
        };
        let mut passengers: Vec<u8> = Vec::new();
        let mut mail: Vec<u8> = Vec::new();
        for cnv in l.convoys.iter().filter_map(|&c| self.convoys.get(c)) {
            merge_sorted(&mut passengers, cnv.classes(GoodsCategory::PASSENGERS));
            merge_sorted(&mut mail, cnv.classes(GoodsCategory::MAIL));
        }
        let l = &mut self.lines[line];
        l.passenger_classes_carried = passengers;
        l.mail_classes_carried = mail;
    }

    /// Whether `line` carries `catg` in `class` or a lower class.
    pub fn carries_this_or_lower_class(&self, line: LineId, catg: GoodsCategory, class: u8) -> bool {
        self.lines
            .get(line)
            .is_some_and(|l| l.carries_this_or_lower_class(catg, class))
    }

    /// Derive the status flags of a line.
    ///
    /// "No convoys", "loss making" and "nothing moved" exclude each other
    /// and are tested in that order. A line without convoys cannot be
    /// withdrawing.
    pub fn recalc_status(&mut self, line: LineId) {
        let Some(l) = self.lines.get(line) else {
            return;
        };
        let month = self.month;
        let fin = &l.finance;
        let mut status = LineStatus::NORMAL;
        let members: Vec<_> = l.convoys.iter().filter_map(|&c| self.convoys.get(c)).collect();

        if l.convoys.is_empty() {
            status.insert(LineStatus::NO_CONVOYS);
        } else if fin.get(1, LineCost::Profit) < 0 {
            status.insert(LineStatus::LOSS_MAKING);
        } else if (0..2).all(|m| fin.get(m, LineCost::Distance) == 0 && fin.get(m, LineCost::Operations) == 0) {
            status.insert(LineStatus::NOTHING_MOVED);
        }
        if members.iter().any(|c| c.has_overcrowded()) {
            status.insert(LineStatus::OVERCROWDED);
        }
        if fin.get(1, LineCost::Departures) < fin.get(1, LineCost::DeparturesScheduled) {
            status.insert(LineStatus::MISSING_SCHEDULED_SLOTS);
        }
        if members.iter().any(|c| c.has_obsolete_vehicles(month)) {
            status.insert(LineStatus::HAS_OBSOLETE_VEHICLES);
        }
        if members.iter().any(|c| c.has_upgradeable_vehicles()) {
            status.insert(LineStatus::HAS_UPGRADEABLE_VEHICLES);
        }

        let l = &mut self.lines[line];
        if status.contains(LineStatus::NO_CONVOYS) {
            l.withdraw = false;
        }
        if l.status != status {
            trace!(?line, old = l.status.0, new = status.0, "line status changed");
        }
        l.status = status;
    }

    pub fn has_overcrowded(&self, line: LineId) -> bool {
        self.lines.get(line).is_some_and(|l| {
            l.convoys
                .iter()
                .filter_map(|&c| self.convoys.get(c))
                .any(|c| c.has_overcrowded())
        })
    }

    /// Member convoys flagged for replacement.
    pub fn replacing_convoys_count(&self, line: LineId) -> usize {
        self.lines.get(line).map_or(0, |l| {
            l.convoys
                .iter()
                .filter_map(|&c| self.convoys.get(c))
                .filter(|c| c.replace)
                .count()
        })
    }

    // -----------------------------------------------------------------------
    // Stops
    // -----------------------------------------------------------------------

    /// Register the line at every existing halt of its schedule. Lines
    /// without convoys serve no stops, so this is a no-op for them.
    pub fn register_stops(&mut self, line: LineId) -> bool {
        if self.lines.get(line).is_none_or(|l| l.convoys.is_empty()) {
            return false;
        }
        self.register_stops_of(line);
        true
    }

    fn register_stops_of(&mut self, line: LineId) {
        let Some(l) = self.lines.get(line) else {
            return;
        };
        let mut added = 0;
        for halt in l.schedule.halts() {
            if self.halts.contains_key(halt) && self.stops.register(line, halt) {
                added += 1;
            }
        }
        if added > 0 {
            debug!(?line, added, "stops registered");
        }
    }

    /// Unregister the line from every halt.
    pub fn unregister_stops(&mut self, line: LineId) -> bool {
        let halts = self.stops.unregister_line(line);
        if !halts.is_empty() {
            debug!(?line, removed = halts.len(), "stops unregistered");
        }
        !halts.is_empty()
    }

    /// Re-register a line that has convoys, e.g. after halts changed.
    pub fn renew_stops(&mut self, line: LineId) {
        if self.lines.get(line).is_some_and(|l| !l.convoys.is_empty()) {
            self.unregister_stops(line);
            self.register_stops_of(line);
        }
    }

    /// Replace the schedule of a line and of all its convoys.
    ///
    /// The old stops are unregistered before the new ones are registered,
    /// so halts dropped from the schedule no longer list the line.
    pub fn set_schedule(&mut self, line: LineId, schedule: Schedule) -> bool {
        if !self.lines.contains_key(line) {
            trace!(?line, "set_schedule: stale line");
            return false;
        }
        self.unregister_stops(line);

        let l = &mut self.lines[line];
        l.schedule = schedule;
        let scheduled = l.calc_departures_scheduled();
        l.finance.set_current(LineCost::DeparturesScheduled, scheduled);
        let has_convoys = !l.convoys.is_empty();
        for &cnv in &l.convoys {
            if let Some(c) = self.convoys.get_mut(cnv) {
                let current = c.schedule.current();
                c.schedule = l.schedule.clone();
                c.schedule.set_current(current);
            }
        }

        if has_convoys {
            self.register_stops_of(line);
        }
        self.bump_schedule_counter();
        debug!(?line, "schedule replaced");
        true
    }

    // -----------------------------------------------------------------------
    // Fleet commands
    // -----------------------------------------------------------------------

    /// Withdraw (or stop withdrawing) every convoy of the line. Withdrawing
    /// convoys stop loading. An empty line never counts as withdrawing.
    pub fn set_withdraw(&mut self, line: LineId, yes: bool) -> bool {
        let Some(l) = self.lines.get_mut(line) else {
            return false;
        };
        l.withdraw = yes && !l.convoys.is_empty();
        for &cnv in &l.convoys {
            if let Some(c) = self.convoys.get_mut(cnv) {
                c.withdraw = yes;
                c.no_load = yes;
            }
        }
        debug!(?line, withdraw = yes, "withdraw set");
        true
    }

    /// Set the livery scheme and repaint every member convoy.
    pub fn set_livery_scheme(&mut self, line: LineId, index: u16) -> bool {
        let Some(l) = self.lines.get_mut(line) else {
            return false;
        };
        l.livery_scheme_index = index;
        for &cnv in &l.convoys {
            if let Some(c) = self.convoys.get_mut(cnv) {
                c.livery_scheme_index = index;
            }
        }
        true
    }

    pub fn rename_line(&mut self, line: LineId, name: impl Into<String>) -> bool {
        match self.lines.get_mut(line) {
            Some(l) => {
                l.name = name.into();
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------------

    /// Book an amount into a line statistic.
    pub fn book_line(&mut self, line: LineId, amount: i64, cost: LineCost) -> bool {
        match self.lines.get_mut(line) {
            Some(l) => {
                l.finance.book(amount, cost);
                true
            }
            None => false,
        }
    }

    /// Book an amount into a convoy statistic, mirrored into its line.
    pub fn book_convoy(&mut self, cnv: ConvoyId, amount: i64, cost: ConvoyCost) -> bool {
        let Some(c) = self.convoys.get_mut(cnv) else {
            return false;
        };
        c.finance.book(amount, cost);
        if let Some(line) = c.line {
            self.book_line(line, amount, cost.to_line_cost());
        }
        true
    }

    /// Raw statistic of a line; 0 for stale handles or months out of range.
    pub fn finance_history(&self, line: LineId, month: usize, cost: LineCost) -> i64 {
        self.lines.get(line).map_or(0, |l| l.finance_history(month, cost))
    }

    pub fn status(&self, line: LineId) -> Option<LineStatus> {
        self.lines.get(line).map(Line::status)
    }

    pub fn schedule(&self, line: LineId) -> Option<&Schedule> {
        self.lines.get(line).map(Line::schedule)
    }

    pub fn line_convoys(&self, line: LineId) -> &[ConvoyId] {
        self.lines.get(line).map(Line::convoys).unwrap_or(&[])
    }

    pub fn goods_catg_index(&self, line: LineId) -> &[GoodsCategory] {
        self.lines.get(line).map(Line::goods_catg_index).unwrap_or(&[])
    }

    pub(crate) fn bump_schedule_counter(&mut self) {
        self.schedule_counter = self.schedule_counter.wrapping_add(1);
    }
}

fn merge_sorted(into: &mut Vec<u8>, from: Vec<u8>) {
    for class in from {
        if let Err(pos) = into.binary_search(&class) {
            into.insert(pos, class);
        }
    }
}
