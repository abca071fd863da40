//! Staggering of entry/exit animations by generation.

use crate::tree::{Tree, TreeNode};

/// Share of the transition duration that each generation is offset by.
pub const LEVEL_FRACTION: f64 = 0.4;

/// Animation delay in milliseconds for `node`.
///
/// Ancestry nodes and the anchor wait `depth` levels. Every other node first
/// waits for the whole ancestry side to appear, then one extra level if it
/// is paired as a spouse, then its own depth a second time, so descendants
/// appear after the anchor and their partners.
pub fn calculate_delay(tree: &Tree<'_>, node: &TreeNode<'_>, transition_ms: f64) -> f64 {
    DelayScheduler::new(tree, transition_ms).delay(node)
}

/// Precomputed delay parameters for one tree. Use this when scheduling
/// every node of a tree in a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayScheduler {
    level: f64,
    ancestry_levels: f64,
}

impl DelayScheduler {
    pub fn new(tree: &Tree<'_>, transition_ms: f64) -> Self {
        Self {
            level: transition_ms.max(0.0) * LEVEL_FRACTION,
            ancestry_levels: tree.max_ancestry_depth() as f64,
        }
    }

    pub fn delay(&self, node: &TreeNode<'_>) -> f64 {
        let depth = node.depth() as f64;
        let mut delay = depth * self.level;
        if !node.is_ancestry() && !node.is_main() {
            delay += self.ancestry_levels * self.level;
            if node.spouse().is_some() {
                delay += self.level;
            }
            delay += depth * self.level;
        }
        delay
    }
}
