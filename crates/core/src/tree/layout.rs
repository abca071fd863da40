//! Coordinate assignment for a computed tree.
//!
//! Works in slot units (one slot per node) and scales by the separations in
//! [`TreeOptions`] at the end. Nodes are created in breadth-first order, so
//! every node's children and parents have larger tids than the node itself:
//! widths are computed in one reverse sweep and positions in one forward
//! sweep, without recursion.

use super::{TreeNode, TreeOptions};

pub(crate) fn assign_positions(nodes: &mut [TreeNode<'_>], options: &TreeOptions) {
    let n = nodes.len();
    if n == 0 {
        return;
    }

    let mut slot = vec![0.0_f64; n];
    place_progeny(nodes, &mut slot);
    place_ancestry(nodes, &mut slot);

    let origin = slot[0];
    for (node, s) in nodes.iter_mut().zip(slot) {
        let across = (s - origin) * options.node_separation;
        let level = node.depth as f64 * options.level_separation;
        let down = if node.is_ancestry { -level } else { level };
        if options.horizontal {
            node.x = down;
            node.y = across;
        } else {
            node.x = across;
            node.y = down;
        }
    }
}

/// A progeny unit is a person plus the spouses attached to them; children
/// of any member hang below the unit.
fn is_unit_head(node: &TreeNode<'_>) -> bool {
    !node.is_ancestry && node.spouse.is_none()
}

fn unit_members(nodes: &[TreeNode<'_>], head: usize) -> Vec<usize> {
    std::iter::once(head)
        .chain(
            nodes[head]
                .spouses
                .iter()
                .map(|t| t.index())
                .filter(|&s| !nodes[s].is_ancestry),
        )
        .collect()
}

fn unit_children(nodes: &[TreeNode<'_>], members: &[usize]) -> Vec<usize> {
    members
        .iter()
        .flat_map(|&m| nodes[m].children.iter().map(|t| t.index()))
        .collect()
}

fn place_progeny(nodes: &[TreeNode<'_>], slot: &mut [f64]) {
    let n = nodes.len();
    let mut width = vec![1.0_f64; n];
    for t in (0..n).rev() {
        if !is_unit_head(&nodes[t]) {
            continue;
        }
        let members = unit_members(nodes, t);
        let kids: f64 = unit_children(nodes, &members).iter().map(|&c| width[c]).sum();
        width[t] = (members.len() as f64).max(kids);
    }

    let mut left = vec![0.0_f64; n];
    left[0] = -width[0] / 2.0;

    // Siblings of the anchor line up to its left, nearest first.
    let mut cursor = left[0];
    for (t, node) in nodes.iter().enumerate() {
        if node.sibling {
            cursor -= width[t];
            left[t] = cursor;
        }
    }

    for t in 0..n {
        if !is_unit_head(&nodes[t]) {
            continue;
        }
        let members = unit_members(nodes, t);
        let center = left[t] + width[t] / 2.0;
        let first = center - (members.len() as f64 - 1.0) / 2.0;
        for (k, &m) in members.iter().enumerate() {
            slot[m] = first + k as f64;
        }

        let kids = unit_children(nodes, &members);
        let total: f64 = kids.iter().map(|&c| width[c]).sum();
        let mut cursor = left[t] + (width[t] - total) / 2.0;
        for c in kids {
            left[c] = cursor;
            cursor += width[c];
        }
    }
}

/// Spouses attached to an ancestor after the walk, as opposed to the
/// co-parent paired with it (which was reached from the shared child).
fn is_extra_spouse(node: &TreeNode<'_>) -> bool {
    node.is_ancestry && node.spouse.is_some() && node.spouse == node.reached_from
}

fn ancestry_members(nodes: &[TreeNode<'_>], root: usize) -> Vec<usize> {
    std::iter::once(root)
        .chain(
            nodes[root]
                .spouses
                .iter()
                .map(|t| t.index())
                .filter(|&s| is_extra_spouse(&nodes[s])),
        )
        .collect()
}

fn place_ancestry(nodes: &[TreeNode<'_>], slot: &mut [f64]) {
    let n = nodes.len();
    let is_root = |t: usize| nodes[t].is_ancestry && !is_extra_spouse(&nodes[t]);

    let mut width = vec![1.0_f64; n];
    for t in (0..n).rev() {
        if !is_root(t) && t != 0 {
            continue;
        }
        let members = if t == 0 { 1 } else { ancestry_members(nodes, t).len() };
        let parents: f64 = nodes[t].parents.iter().map(|p| width[p.index()]).sum();
        width[t] = (members as f64).max(parents);
    }

    let mut left = vec![0.0_f64; n];
    let spread = |t: usize, start: f64, left: &mut [f64]| {
        let total: f64 = nodes[t].parents.iter().map(|p| width[p.index()]).sum();
        let mut cursor = start - total / 2.0;
        for p in &nodes[t].parents {
            left[p.index()] = cursor;
            cursor += width[p.index()];
        }
    };

    spread(0, slot[0], &mut left);
    for t in 1..n {
        if !is_root(t) {
            continue;
        }
        let members = ancestry_members(nodes, t);
        let center = left[t] + width[t] / 2.0;
        let first = center - (members.len() as f64 - 1.0) / 2.0;
        for (k, &m) in members.iter().enumerate() {
            slot[m] = first + k as f64;
        }
        spread(t, center, &mut left);
    }
}
