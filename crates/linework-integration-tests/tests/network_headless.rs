//! Headless runs of a whole network: convoys driving between halts over
//! several months, departure boards, diagonal rescaling and save/load.

use linework_core::convoy::ConvoyState;
use linework_core::departure::DepartureBoard;
use linework_core::fixed::Fixed64;
use linework_core::geometry::Koord;
use linework_core::line::LineStatus;
use linework_core::network::Network;
use linework_core::schedule::Schedule;
use linework_core::test_utils::*;
use linework_stats::{ConvoyCost, LineCost};

// ============================================================================
// Month rollover
// ============================================================================

#[test]
fn month_rollover_shifts_line_statistics() {
    let mut net = small_network();
    let (line, _) = bus_line(&mut net, 2, 4, 1);
    let month_ticks = net.config().ticks_per_month;
    net.advance(month_ticks);

    assert_eq!(net.month(), 1);
    assert_eq!(net.finance_history(line, 0, LineCost::Convoys), 1);
    assert_eq!(net.finance_history(line, 0, LineCost::Distance), 0);
    assert!(net.finance_history(line, 1, LineCost::Distance) > 0);
    assert!(net.status(line).unwrap().is_normal());

    // A parked fleet is flagged after two quiet months.
    for cnv in net.line_convoys(line).to_vec() {
        net.convoy_mut(cnv).unwrap().state = ConvoyState::InDepot;
    }
    net.advance(month_ticks * 2);
    assert!(net.status(line).unwrap().contains(LineStatus::NOTHING_MOVED));
}

#[test]
fn convoy_distance_mirrors_into_line() {
    let mut net = small_network();
    let (line, _) = bus_line(&mut net, 3, 3, 2);
    net.advance(2_000);
    let convoy_distance: i64 = net
        .line_convoys(line)
        .iter()
        .filter_map(|&c| net.convoy(c))
        .map(|c| c.finance.get(0, ConvoyCost::Distance))
        .sum();
    assert_eq!(net.finance_history(line, 0, LineCost::Distance), convoy_distance);
}

// ============================================================================
// Save / load
// ============================================================================

#[test]
fn save_load_rebuilds_membership_and_stops() {
    let mut net = small_network();
    let (line, halts) = bus_line(&mut net, 3, 4, 3);
    net.advance(1_500);

    let data = net.serialize().unwrap();
    let mut loaded = Network::deserialize(&data).unwrap();

    assert_eq!(loaded.line_convoys(line).len(), 3);
    for &cnv in net.line_convoys(line) {
        assert!(loaded.line_convoys(line).contains(&cnv));
        assert_eq!(loaded.convoy(cnv).and_then(|c| c.line), Some(line));
    }
    for &halt in &halts {
        assert_eq!(loaded.lines_serving(halt), &[line]);
    }
    assert_eq!(loaded.schedule_counter(), net.schedule_counter());
    assert!(loaded.drain_events().is_empty());

    // Both copies keep running identically.
    net.advance(500);
    loaded.advance(500);
    for &cnv in net.line_convoys(line) {
        assert_eq!(
            loaded.convoy(cnv).map(|c| c.stepper.clone()),
            net.convoy(cnv).map(|c| c.stepper.clone())
        );
    }
}

// ============================================================================
// Departure board
// ============================================================================

#[test]
fn departure_board_lists_soonest_first() {
    let mut net = small_network();
    let (_, halts) = bus_line(&mut net, 2, 6, 4);
    let mut board = DepartureBoard::new(Some(halts[1]));
    net.advance(400);

    assert!(board.update(&net));
    let arrivals = board.arrivals();
    assert!(!arrivals.is_empty());
    assert!(arrivals.windows(2).all(|w| w[0].delta_ticks <= w[1].delta_ticks));
    assert!(arrivals.iter().all(|e| e.halt == Some(halts[0])));
    assert!(arrivals.len() <= net.config().max_departure_listings);
}

#[test]
fn departure_board_recomputes_after_ttl() {
    let mut net = small_network();
    let (_, halts) = bus_line(&mut net, 2, 6, 1);
    let mut board = DepartureBoard::new(Some(halts[1]));
    net.advance(100);
    board.update(&net);
    let first = board.arrivals().to_vec();

    // Long enough to enter the next tile, which shortens the estimate.
    net.advance(1_500);
    for _ in 0..net.config().departure_refresh {
        assert!(!board.update(&net));
        assert_eq!(board.arrivals(), first.as_slice());
    }
    assert!(board.update(&net));
    assert!(board.arrivals() != first.as_slice());
}

#[test]
fn removed_halt_empties_board() {
    let mut net = small_network();
    let (_, halts) = bus_line(&mut net, 2, 6, 1);
    let mut board = DepartureBoard::new(Some(halts[0]));
    board.update(&net);
    assert!(!board.departures().is_empty());

    net.remove_halt(halts[0]);
    board.invalidate();
    assert!(!board.update(&net));
    assert!(board.departures().is_empty());
}

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn diagonal_rescale_keeps_progress_of_running_convoy() {
    let mut net = small_network();
    let a = add_halt_at(&mut net, "A", Koord::new(0, 0));
    let b = add_halt_at(&mut net, "B", Koord::new(6, 6));
    let cnv = spawn_bus(&mut net, Schedule::from_halts([a, b]), 200);
    net.start_convoy(cnv);
    net.advance(net.config().loading_ticks as u64 + 100);

    let before = net.convoy(cnv).unwrap().stepper.clone();
    assert_eq!(net.convoy(cnv).map(|c| c.state), Some(ConvoyState::Driving));
    assert!(before.step.is_some_and(|s| s.direction.is_diagonal()));
    assert!(before.steps > 0);

    net.set_diagonal_multiplier(512);
    let after = net.convoy(cnv).unwrap().stepper.clone();
    let per_tile = net.step_config().diagonal_steps_per_tile();
    assert_eq!(per_tile, 256);
    assert_eq!(after.step.map(|s| s.steps_next), Some(per_tile - 1));

    let drift = (after.progress() - before.progress()).abs();
    assert!(drift <= Fixed64::from_num(1) / Fixed64::from_num(per_tile));
    assert_eq!(after.pos, before.pos);

    // The convoy still reaches its destination.
    for _ in 0..10_000 {
        net.step();
        if net.convoy(cnv).and_then(|c| c.last_stop) == Some(b) {
            return;
        }
    }
    panic!("convoy never arrived after rescale");
}
