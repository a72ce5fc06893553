//! Локальное зеркало фаз стола.
//!
//! - transitions.rs: правила переходов (что можно отправлять из какой фазы);
//! - state_tracker.rs: трекер одного стола (check → advance, reset, resync);
//! - registry.rs: несколько столов, каждый под своим мьютексом.

pub mod registry;
pub mod state_tracker;
pub mod transitions;

pub use registry::{LockedTracker, SharedTracker, TableRegistry};
pub use state_tracker::GameStateTracker;
pub use transitions::{can_submit, check_transition};
