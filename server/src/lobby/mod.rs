pub mod coordinator;
pub mod roster;

pub use coordinator::{CoordinatorStatus, PlayerSummary, SessionCoordinator, WordRejection};
