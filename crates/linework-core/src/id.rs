use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a line. Stale after the line is removed; lookups then
    /// return `None` instead of reaching a reused slot.
    pub struct LineId;

    /// Identifies a convoy.
    pub struct ConvoyId;

    /// Identifies a halt (stop or station).
    pub struct HaltId;
}

/// Identifies a player. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

/// Identifies a goods category (passengers, mail, bulk, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GoodsCategory(pub u8);

impl GoodsCategory {
    pub const PASSENGERS: GoodsCategory = GoodsCategory(0);
    pub const MAIL: GoodsCategory = GoodsCategory(1);

    /// Passengers and mail carry accommodation classes; freight does not.
    pub fn has_classes(self) -> bool {
        self == Self::PASSENGERS || self == Self::MAIL
    }
}
