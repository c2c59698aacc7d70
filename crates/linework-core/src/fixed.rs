use fixed::types::I32F32;

/// Q32.32 fixed-point, used wherever a fraction must be deterministic
/// across machines (sub-tile progress).
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert Fixed64 to f64. Use only for display, never in the sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}
