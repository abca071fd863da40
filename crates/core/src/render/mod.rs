//! Helpers consumed by an external renderer once a tree has been computed.

pub mod delay;
pub mod visibility;

pub use delay::{calculate_delay, DelayScheduler, LEVEL_FRACTION};
pub use visibility::{is_all_relative_displayed, is_all_relative_displayed_for};
