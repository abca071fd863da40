pub mod error;
pub mod render;
pub mod store;
pub mod tree;
pub mod types;

pub use error::{Result, TreeError};
pub use render::{calculate_delay, is_all_relative_displayed, DelayScheduler};
pub use store::{normalize_to_current, validate, Finding, FindingKind, Person, Store};
pub use tree::{
    calculate_tree, sort_children_with_spouses, SoloPlacement, Tree, TreeNode, TreeOptions,
};
pub use types::{Gender, Tid};
