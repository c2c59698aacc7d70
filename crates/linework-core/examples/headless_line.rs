//! Run a three-stop bus line for a few months and print its statistics.
//!
//! ```text
//! RUST_LOG=linework_core=debug cargo run --example headless_line -- [config.toml]
//! ```

use std::path::Path;

use linework_core::config::NetworkConfig;
use linework_core::convoy::{Convoy, Vehicle, WayType};
use linework_core::departure::DepartureBoard;
use linework_core::geometry::Koord;
use linework_core::halt::Halt;
use linework_core::id::{GoodsCategory, PlayerId};
use linework_core::line::LineType;
use linework_core::network::Network;
use linework_core::schedule::{Schedule, ScheduleEntry};
use linework_core::stats::{ConvoyCost, LineCost};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match std::env::args().nth(1) {
        Some(path) => NetworkConfig::load(Path::new(&path))?,
        None => NetworkConfig {
            ticks_per_month: 4096,
            ..NetworkConfig::default()
        },
    };
    let mut net = Network::new(config)?;
    let owner = PlayerId(0);

    let depot = net.add_halt(Halt::new("Depot Road", Koord::new(0, 0), owner));
    let market = net.add_halt(Halt::new("Market", Koord::new(4, 3), owner));
    let harbour = net.add_halt(Halt::new("Harbour", Koord::new(9, 3), owner));

    let line = net.create_line(owner, LineType::Truck, "Harbour Express");
    let mut schedule = Schedule::new();
    schedule.append(ScheduleEntry::new(depot).timed(0));
    schedule.append(ScheduleEntry::new(market).with_minimum_loading(20));
    schedule.append(ScheduleEntry::new(harbour));
    schedule.mirrored = true;
    schedule.spacing = 2;
    net.set_schedule(line, schedule);

    for i in 0..3 {
        let bus = Vehicle::new("city bus", WayType::Road, GoodsCategory::PASSENGERS, 40);
        let mut cnv = Convoy::new(format!("bus {i}"), owner, vec![bus]);
        cnv.speed_kmh = 70 + 10 * i;
        let id = net.spawn_convoy(cnv);
        // 30% full, enough for the Market's minimum load.
        if let Some(c) = net.convoy_mut(id) {
            c.set_load(0, 0, 12);
        }
        net.add_convoy(line, id);
        net.start_convoy(id);
    }

    let mut board = DepartureBoard::new(Some(market));
    let months = 3;
    let ticks = net.config().ticks_per_month * months;
    for t in 0..ticks {
        net.step();
        if t % 512 == 0 {
            let ids: Vec<_> = net.line_convoys(line).to_vec();
            for cnv in ids {
                net.book_convoy(cnv, 250, ConvoyCost::Revenue);
                net.book_convoy(cnv, -90, ConvoyCost::Operations);
                net.book_convoy(cnv, 160, ConvoyCost::Profit);
            }
        }
        board.update(&net);
    }

    let Some(l) = net.line(line) else {
        return Ok(());
    };
    println!("{} after {} months (status {:#04x})", l.name, net.month(), l.status().0);
    for month in 0..=months as usize {
        println!(
            "  month -{month}: revenue {:>6}  operations {:>6}  profit {:>6}  distance {:>4}  departures {}/{}",
            l.stat_converted(month, LineCost::Revenue),
            l.stat_converted(month, LineCost::Operations),
            l.stat_converted(month, LineCost::Profit),
            l.finance_history(month, LineCost::Distance),
            l.finance_history(month, LineCost::Departures),
            l.finance_history(month, LineCost::DeparturesScheduled),
        );
    }

    println!("Market departures:");
    for entry in board.departures() {
        let to = entry
            .halt
            .and_then(|h| net.halt(h))
            .map_or("?", |h| h.name.as_str());
        println!("  to {to:<12} in {:>5} ticks", entry.delta_ticks);
    }
    Ok(())
}
