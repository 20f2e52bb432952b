//! Move saga: drains received stock into a storage placement.
//!
//! A move runs three steps against three separately stored documents:
//! 1. Withdraw the quantity from the inbound batch
//! 2. Place the same quantity at the destination
//! 3. Append the move to the audit trail
//!
//! If placement fails the withdrawal is credited back. A failed audit
//! append does not undo the move; it is logged and counted instead.

pub mod coordinator;
pub mod error;
pub mod request;
pub mod services;
pub mod state;
pub mod steps;

pub use coordinator::MoveCoordinator;
pub use error::MoveError;
pub use request::{MoveOutcome, MoveRequest};
pub use services::{AuditService, LocationService};
pub use state::MoveState;
