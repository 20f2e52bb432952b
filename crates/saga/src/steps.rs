//! Move saga constants.

/// The saga type identifier for moves into storage.
pub const SAGA_TYPE: &str = "InboundMove";

/// Step name: take the quantity off the inbound batch.
pub const STEP_WITHDRAW_INBOUND: &str = "withdraw_inbound";

/// Step name: add the quantity at the destination placement.
pub const STEP_PLACE_STOCK: &str = "place_stock";

/// Step name: append the move to the inbound record trail.
pub const STEP_RECORD_MOVE: &str = "record_move";
