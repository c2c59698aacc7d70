//! Arrival time estimation.
//!
//! A heuristic, not a prediction: the convoy is assumed to cruise at its
//! recent average speed, slow down over the last few tiles before the stop,
//! and pay an acceleration penalty if it is currently standing. The result
//! overstates smooth cruising; what callers may rely on is that it never
//! decreases when more tiles remain.

use crate::convoy::ConvoyState;

/// Speed units per km/h are 1024/80.
pub const VEHICLE_SPEED_FACTOR: u32 = 80;

/// One tile in yards, `1 << (8 + 12)`: 256 steps of 4096 yards.
const TILE_YARDS_SHIFT: u32 = 20;

/// Braking zones before the stop, fastest first: a convoy faster than the
/// threshold spends one tile at that ceiling, which costs the given ticks
/// (`(1 << 20) / kmh_to_speed(threshold)`).
const BRAKING_ZONES: [(u32, u32); 3] = [(100, 819), (50, 1638), (25, 3276)];

/// Convert km/h to internal speed units (yards per tick).
pub fn kmh_to_speed(kmh: u32) -> u32 {
    (((kmh as u64) << 10) / VEHICLE_SPEED_FACTOR as u64).min(u32::MAX as u64) as u32
}

/// Convert internal speed units back to km/h, rounding to nearest.
pub fn speed_to_kmh(speed: u32) -> u32 {
    ((speed as u64 * VEHICLE_SPEED_FACTOR as u64 + 511) >> 10) as u32
}

/// Ticks until a convoy `remaining_tiles` away reaches its stop.
///
/// `average_kmh` is the convoy's recent average speed. It is scaled by
/// 900/1024 to account for curves and slopes; a standing convoy (0 km/h)
/// is treated as crawling at 1 km/h so the estimate stays finite.
pub fn ticks_until_arrival(remaining_tiles: u32, average_kmh: u32, state: ConvoyState) -> u32 {
    let kmh = (average_kmh.saturating_mul(900) / 1024).max(1);
    let mut tiles = remaining_tiles as u64;
    let mut delta: u64 = 0;

    for (threshold, cost) in BRAKING_ZONES {
        if tiles > 1 && kmh > threshold {
            tiles -= 1;
            delta += cost as u64;
        }
    }

    if state != ConvoyState::Driving {
        // Acceleration from standstill.
        delta += kmh as u64 * 25;
    }

    let speed = kmh_to_speed(kmh).max(1) as u64;
    delta += (tiles << TILE_YARDS_SHIFT) / speed;
    delta.min(u32::MAX as u64) as u32
}
