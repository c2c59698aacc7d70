//! Tile-step geometry for moving convoys.
//!
//! A vehicle crosses a tile in discrete *steps*: [`VEHICLE_STEPS_PER_TILE`]
//! on straight tiles and a configurable, smaller budget on diagonal tiles
//! (see [`StepConfig`]). Steps in turn are made of yards; one step is
//! `1 << YARDS_PER_VEHICLE_STEP_SHIFT` yards. This module converts between
//! tiles, steps, directions and sub-tile screen offsets. Everything here is
//! integer or fixed-point arithmetic and cannot fail.

use serde::{Deserialize, Serialize};

use crate::fixed::Fixed64;

/// Steps on a straight (orthogonal) tile.
pub const VEHICLE_STEPS_PER_TILE: u16 = 256;

/// log2 of the yards in one vehicle step.
pub const YARDS_PER_VEHICLE_STEP_SHIFT: u32 = 12;

/// Diagonal length in 1/512 tile units (≈ 512·√2).
pub const DEFAULT_DIAGONAL_MULTIPLIER: u16 = 724;

/// Accepted diagonal lengths: from a square's side to twice that.
pub const MIN_DIAGONAL_MULTIPLIER: u16 = 512;
pub const MAX_DIAGONAL_MULTIPLIER: u16 = 1024;

// ---------------------------------------------------------------------------
// Coordinates and directions
// ---------------------------------------------------------------------------

/// A tile coordinate. `y` grows towards the south.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Koord {
    pub x: i16,
    pub y: i16,
}

impl Koord {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// A direction bit set: north, east, south and west, plus the four
/// diagonals formed by two adjacent bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Ribi(pub u8);

impl Ribi {
    pub const NONE: Ribi = Ribi(0);
    pub const NORTH: Ribi = Ribi(1);
    pub const EAST: Ribi = Ribi(2);
    pub const SOUTH: Ribi = Ribi(4);
    pub const WEST: Ribi = Ribi(8);
    pub const NORTHEAST: Ribi = Ribi(1 | 2);
    pub const SOUTHEAST: Ribi = Ribi(2 | 4);
    pub const SOUTHWEST: Ribi = Ribi(4 | 8);
    pub const NORTHWEST: Ribi = Ribi(1 | 8);

    /// The eight compass directions, clockwise from north.
    pub const COMPASS: [Ribi; 8] = [
        Ribi::NORTH,
        Ribi::NORTHEAST,
        Ribi::EAST,
        Ribi::SOUTHEAST,
        Ribi::SOUTH,
        Ribi::SOUTHWEST,
        Ribi::WEST,
        Ribi::NORTHWEST,
    ];

    /// True for the four diagonal directions.
    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Ribi::NORTHEAST | Ribi::SOUTHEAST | Ribi::SOUTHWEST | Ribi::NORTHWEST
        )
    }

    /// True for exactly one of north/east/south/west.
    pub fn is_single(self) -> bool {
        matches!(self, Ribi::NORTH | Ribi::EAST | Ribi::SOUTH | Ribi::WEST)
    }

    /// The opposite direction.
    pub fn reverse(self) -> Ribi {
        let b = self.0 & 0x0F;
        Ribi(((b << 2) | (b >> 2)) & 0x0F)
    }
}

/// Direction of the step from `from` to `to`, diagonals included.
pub fn ribi_type(from: Koord, to: Koord) -> Ribi {
    let dx = to.x as i32 - from.x as i32;
    let dy = to.y as i32 - from.y as i32;
    let mut ribi = 0u8;
    if dx < 0 {
        ribi |= Ribi::WEST.0;
    } else if dx > 0 {
        ribi |= Ribi::EAST.0;
    }
    if dy < 0 {
        ribi |= Ribi::NORTH.0;
    } else if dy > 0 {
        ribi |= Ribi::SOUTH.0;
    }
    Ribi(ribi)
}

// ---------------------------------------------------------------------------
// Step configuration
// ---------------------------------------------------------------------------

/// Per-game step granularity on diagonal tiles.
///
/// The multiplier can change between games. The previous diagonal budget is
/// remembered so that steppers loaded under the old value can be rescaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepConfig {
    diagonal_multiplier: u16,
    diagonal_steps_per_tile: u16,
    old_diagonal_steps_per_tile: u16,
}

impl StepConfig {
    pub fn new(diagonal_multiplier: u16) -> Self {
        let steps = Self::steps_for(diagonal_multiplier);
        Self {
            diagonal_multiplier,
            diagonal_steps_per_tile: steps,
            old_diagonal_steps_per_tile: steps,
        }
    }

    fn steps_for(multiplier: u16) -> u16 {
        (130_560 / multiplier.max(1) as u32 + 1).min(VEHICLE_STEPS_PER_TILE as u32) as u16
    }

    /// Switch to a new multiplier, remembering the previous budget.
    pub fn set_diagonal_multiplier(&mut self, multiplier: u16) {
        self.old_diagonal_steps_per_tile = self.diagonal_steps_per_tile;
        self.diagonal_multiplier = multiplier;
        self.diagonal_steps_per_tile = Self::steps_for(multiplier);
    }

    pub fn diagonal_multiplier(&self) -> u16 {
        self.diagonal_multiplier
    }

    pub fn diagonal_steps_per_tile(&self) -> u16 {
        self.diagonal_steps_per_tile
    }

    pub fn old_diagonal_steps_per_tile(&self) -> u16 {
        self.old_diagonal_steps_per_tile
    }

    /// Step budget for a tile crossed in the given direction.
    pub fn steps_per_tile(&self, direction: Ribi) -> u16 {
        if direction.is_diagonal() {
            self.diagonal_steps_per_tile
        } else {
            VEHICLE_STEPS_PER_TILE
        }
    }
}

impl Default for StepConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DIAGONAL_MULTIPLIER)
    }
}

/// Step budget and direction for the tile from `start` to `end`.
pub fn tile_steps(start: Koord, end: Koord, cfg: &StepConfig) -> (u16, Ribi) {
    let direction = ribi_type(start, end);
    (cfg.steps_per_tile(direction), direction)
}

// ---------------------------------------------------------------------------
// Per-tile step data
// ---------------------------------------------------------------------------

/// Direction, screen deltas and last step index for one tile crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileStep {
    pub direction: Ribi,
    /// Screen delta per tile in x, in 1/4 half-tile units.
    pub dx: i8,
    pub dy: i8,
    /// Index of the last step on this tile (budget - 1).
    pub steps_next: u16,
}

impl TileStep {
    /// Step data for moving from `start` to the adjacent tile `end`.
    ///
    /// Identical tiles yield [`Ribi::NONE`] with zero deltas and the
    /// straight budget.
    pub fn between(start: Koord, end: Koord, cfg: &StepConfig) -> Self {
        let direction = ribi_type(start, end);
        let (dx, dy) = match direction {
            Ribi::NORTH => (2, -1),
            Ribi::SOUTH => (-2, 1),
            Ribi::WEST => (-2, -1),
            Ribi::EAST => (2, 1),
            Ribi::SOUTHEAST => (0, 2),
            Ribi::NORTHWEST => (0, -2),
            Ribi::NORTHEAST => (4, 0),
            Ribi::SOUTHWEST => (-4, 0),
            _ => (0, 0),
        };
        Self {
            direction,
            dx,
            dy,
            steps_next: cfg.steps_per_tile(direction) - 1,
        }
    }
}

/// Sub-tile screen offset of a vehicle `steps` into a tile.
///
/// Straight tiles snap to whole 1024-unit display steps; diagonal tiles
/// are scaled by the diagonal multiplier.
pub fn screen_offset(steps: u16, step: &TileStep, raster_width: i16, cfg: &StepConfig) -> (i32, i32) {
    let mut display_steps = steps as i32 * raster_width as i32;
    if step.dx as i32 * step.dy as i32 != 0 {
        display_steps &= !0x3FF;
    } else {
        display_steps = (display_steps * cfg.diagonal_multiplier() as i32) >> 10;
    }
    (
        (display_steps * step.dx as i32) >> 10,
        (display_steps * step.dy as i32) >> 10,
    )
}

// ---------------------------------------------------------------------------
// Progress conversion
// ---------------------------------------------------------------------------

/// Fraction of a tile covered after `steps` of a `per_tile` budget.
pub fn progress(steps: u16, per_tile: u16) -> Fixed64 {
    Fixed64::from_num(steps) / Fixed64::from_num(per_tile.max(1))
}

/// Convert a step count from one tile budget to another, keeping the
/// covered fraction of the tile. The result is rounded to the nearest step
/// and stays below `new_per_tile`.
pub fn rescale_steps(steps: u16, old_per_tile: u16, new_per_tile: u16) -> u16 {
    if old_per_tile == new_per_tile || old_per_tile == 0 || new_per_tile == 0 {
        return steps;
    }
    let scaled = progress(steps, old_per_tile) * Fixed64::from_num(new_per_tile);
    scaled.round().to_num::<u16>().min(new_per_tile - 1)
}

// ---------------------------------------------------------------------------
// TileStepper
// ---------------------------------------------------------------------------

/// Motion state of a convoy's lead vehicle along a tile route.
///
/// The stepper sits on `pos` heading to `pos_next`; the owning convoy's
/// route index always points at `pos_next`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TileStepper {
    pub pos: Koord,
    pub pos_next: Koord,
    /// Steps taken on the current tile.
    pub steps: u16,
    pub step: Option<TileStep>,
    /// Yards not yet converted into a whole step.
    yards: u32,
}

impl TileStepper {
    /// Place the stepper on `route[index]`, heading to the next tile.
    /// Returns the stepper and the route index of `pos_next`.
    pub fn start(route: &[Koord], index: usize, cfg: &StepConfig) -> (Self, usize) {
        let Some(&pos) = route.get(index) else {
            return (Self::default(), route.len());
        };
        let pos_next = route.get(index + 1).copied().unwrap_or(pos);
        let stepper = Self {
            pos,
            pos_next,
            steps: 0,
            step: Some(TileStep::between(pos, pos_next, cfg)),
            yards: 0,
        };
        (stepper, index + 1)
    }

    /// Drive `yards` along `route`, advancing `route_index` on every tile
    /// change. Stops early once the route is exhausted. Returns the number
    /// of tiles entered.
    pub fn drive(
        &mut self,
        yards: u32,
        route: &[Koord],
        route_index: &mut usize,
        cfg: &StepConfig,
    ) -> u32 {
        self.yards = self.yards.saturating_add(yards);
        let mut steps_to_do = self.yards >> YARDS_PER_VEHICLE_STEP_SHIFT;
        self.yards &= (1 << YARDS_PER_VEHICLE_STEP_SHIFT) - 1;

        let mut hops = 0;
        while steps_to_do > 0 && *route_index < route.len() {
            let steps_next = self.step.map_or(0, |s| s.steps_next);
            let left = steps_next.saturating_sub(self.steps) as u32;
            if steps_to_do <= left {
                self.steps += steps_to_do as u16;
                break;
            }
            steps_to_do -= left + 1;

            self.pos = self.pos_next;
            *route_index += 1;
            hops += 1;
            self.steps = 0;
            match route.get(*route_index) {
                Some(&next) => {
                    self.pos_next = next;
                    self.step = Some(TileStep::between(self.pos, next, cfg));
                }
                None => {
                    self.yards = 0;
                    break;
                }
            }
        }
        hops
    }

    /// Fraction of the current tile already covered.
    pub fn progress(&self) -> Fixed64 {
        match self.step {
            Some(step) => progress(self.steps, step.steps_next.saturating_add(1)),
            None => Fixed64::ZERO,
        }
    }

    /// Re-fit the current tile to a changed diagonal budget.
    pub fn rescale(&mut self, cfg: &StepConfig) {
        let Some(step) = self.step.as_mut() else {
            return;
        };
        if !step.direction.is_diagonal() {
            return;
        }
        let old = step.steps_next.saturating_add(1);
        let new = cfg.diagonal_steps_per_tile();
        self.steps = rescale_steps(self.steps, old, new);
        step.steps_next = new - 1;
    }

    /// Screen offset within the current tile.
    pub fn screen_offset(&self, raster_width: i16, cfg: &StepConfig) -> (i32, i32) {
        match self.step {
            Some(step) => screen_offset(self.steps, &step, raster_width, cfg),
            None => (0, 0),
        }
    }
}

/// A tile path from `from` to `to`: diagonal steps while both axes differ,
/// then straight. Both endpoints are included.
pub fn straight_route(from: Koord, to: Koord) -> Vec<Koord> {
    let mut route = vec![from];
    let mut cur = from;
    while cur != to {
        let sx = (to.x as i32 - cur.x as i32).signum() as i16;
        let sy = (to.y as i32 - cur.y as i32).signum() as i16;
        cur = Koord::new(cur.x + sx, cur.y + sy);
        route.push(cur);
    }
    route
}
