//! Bounded bidirectional walk from the anchor person.
//!
//! Passes, in order:
//! 1. ancestry: breadth-first over parent edges from the anchor;
//! 2. progeny: breadth-first over child edges from the anchor, attaching
//!    each person's spouses at their depth;
//! 3. siblings of the anchor, when requested;
//! 4. other spouses of ancestors, attached beside them without expanding.
//!
//! Every person gets a [`Tid`] the first time it is reached and is never
//! inserted or expanded again, which bounds the walk by the number of
//! reachable persons and makes cyclic data terminate.

use std::collections::{HashMap, VecDeque};

use super::layout;
use super::sort::{other_parent, sort_children_with_placement};
use super::{Tree, TreeNode, TreeOptions};
use crate::error::{Result, TreeError};
use crate::store::{Person, Store, MAX_PARENTS};
use crate::types::Tid;

/// Compute the tree around `options.main_id`.
///
/// Relationship ids that are not in the store are skipped; use
/// [`Store::validate`] to report them.
///
/// # Errors
/// Returns [`TreeError::MissingMainId`] if `main_id` is empty and
/// [`TreeError::NotFound`] if it is not in the store.
///
/// # Examples
/// ```
/// use famtree_core::{calculate_tree, Gender, Person, Store, TreeOptions};
///
/// let store = Store::from_persons(vec![
///     Person::new("mum", Gender::Female).with_children(&["kid"]),
///     Person::new("kid", Gender::Male).with_parents(&["mum"]),
/// ]);
/// let tree = calculate_tree(&store, &TreeOptions::new("kid")).unwrap();
/// assert_eq!(tree.len(), 2);
/// assert!(tree.get("mum").unwrap().is_ancestry());
/// ```
pub fn calculate_tree<'a>(store: &'a Store, options: &TreeOptions) -> Result<Tree<'a>> {
    if options.main_id.is_empty() {
        return Err(TreeError::MissingMainId);
    }
    let main = store
        .get_datum(&options.main_id)
        .ok_or_else(|| TreeError::NotFound(options.main_id.clone()))?;

    let mut walk = Walk::new(store, options);
    let main_tid = walk.visit(main, 0, false, None);
    walk.nodes[main_tid.index()].main = true;

    walk.ancestry(main_tid);
    walk.progeny(main_tid);
    if options.show_siblings_of_main {
        walk.siblings(main_tid);
    }
    walk.ancestor_spouses();

    let mut tree = walk.finish();
    layout::assign_positions(&mut tree.nodes, options);

    log::debug!(
        "Computed tree for '{}': {} nodes, {} ancestry levels",
        options.main_id,
        tree.len(),
        tree.max_ancestry_depth
    );
    Ok(tree)
}

struct Walk<'a, 'o> {
    store: &'a Store,
    options: &'o TreeOptions,
    nodes: Vec<TreeNode<'a>>,
    tids: HashMap<&'a str, Tid>,
}

impl<'a, 'o> Walk<'a, 'o> {
    fn new(store: &'a Store, options: &'o TreeOptions) -> Self {
        Self {
            store,
            options,
            nodes: Vec::new(),
            tids: HashMap::new(),
        }
    }

    /// Insert `person` as a new node. Callers check [`Walk::is_visited`] first.
    fn visit(
        &mut self,
        person: &'a Person,
        depth: usize,
        is_ancestry: bool,
        reached_from: Option<Tid>,
    ) -> Tid {
        let tid = Tid(self.nodes.len());
        self.tids.insert(person.id.as_str(), tid);
        self.nodes
            .push(TreeNode::new(tid, person, depth, is_ancestry, reached_from));
        tid
    }

    fn is_visited(&self, id: &str) -> bool {
        self.tids.contains_key(id)
    }

    /// The unvisited person behind `id`, skipping dangling ids.
    fn fresh(&self, id: &str, from: Tid) -> Option<&'a Person> {
        if self.is_visited(id) {
            return None;
        }
        let person = self.store.get_datum(id);
        if person.is_none() {
            log::debug!(
                "Skipping unknown relative '{}' of '{}'",
                id,
                self.nodes[from.index()].id()
            );
        }
        person
    }

    fn attach_spouse(&mut self, partner: Tid, spouse: &'a Person, is_ancestry: bool) -> Tid {
        let depth = self.nodes[partner.index()].depth;
        let tid = self.visit(spouse, depth, is_ancestry, Some(partner));
        self.nodes[tid.index()].spouse = Some(partner);
        self.nodes[partner.index()].spouses.push(tid);
        tid
    }

    fn ancestry(&mut self, main: Tid) {
        let limit = self.options.ancestry_depth;
        let mut queue = VecDeque::from([main]);

        while let Some(t) = queue.pop_front() {
            let node = &self.nodes[t.index()];
            if limit.is_some_and(|l| node.depth >= l) {
                continue;
            }
            let (person, depth) = (node.person, node.depth);

            let mut placed: Vec<Tid> = Vec::with_capacity(MAX_PARENTS);
            for pid in person.rels.parents().iter().take(MAX_PARENTS) {
                if let Some(parent) = self.fresh(pid, t) {
                    let p = self.visit(parent, depth + 1, true, Some(t));
                    self.nodes[t.index()].parents.push(p);
                    placed.push(p);
                    queue.push_back(p);
                }
            }

            if let [first, second] = placed[..] {
                self.nodes[second.index()].spouse = Some(first);
                self.nodes[first.index()].spouses.push(second);
            }
        }
    }

    fn progeny(&mut self, main: Tid) {
        let limit = self.options.progeny_depth;
        let mut queue = VecDeque::from([main]);

        while let Some(t) = queue.pop_front() {
            let node = &self.nodes[t.index()];
            let (person, depth, is_spouse) = (node.person, node.depth, node.spouse.is_some());

            // A spouse node brings its own children along but not further
            // spouses, so chains of remarriage do not fan out sideways.
            let mut spouse_nodes = Vec::new();
            if !is_spouse {
                for sid in person.rels.spouses() {
                    if let Some(spouse) = self.fresh(sid, t) {
                        spouse_nodes.push(self.attach_spouse(t, spouse, false));
                    }
                }
            }

            if !limit.is_some_and(|l| depth >= l) {
                let children = sort_children_with_placement(
                    person.rels.children(),
                    person,
                    self.store,
                    self.options.solo_children,
                );
                for child in children {
                    if self.is_visited(&child.id) {
                        continue;
                    }
                    let c = self.visit(child, depth + 1, false, Some(t));
                    self.nodes[c.index()].co_parent = other_parent(child, &person.id)
                        .and_then(|other| self.tids.get(other).copied());
                    self.nodes[t.index()].children.push(c);
                    queue.push_back(c);
                }
            }

            queue.extend(spouse_nodes);
        }
    }

    fn siblings(&mut self, main: Tid) {
        let person = self.nodes[main.index()].person;
        for pid in person.rels.parents().iter().take(MAX_PARENTS) {
            let Some(parent) = self.store.get_datum(pid) else {
                continue;
            };
            let children = sort_children_with_placement(
                parent.rels.children(),
                parent,
                self.store,
                self.options.solo_children,
            );
            for child in children {
                if !self.is_visited(&child.id) {
                    let s = self.visit(child, 0, false, Some(main));
                    self.nodes[s.index()].sibling = true;
                }
            }
        }
    }

    /// Attach the remaining spouses of every ancestor. They share the
    /// ancestor's depth and stay on the ancestry side but are not expanded.
    fn ancestor_spouses(&mut self) {
        let ancestors: Vec<Tid> = self
            .nodes
            .iter()
            .filter(|n| n.is_ancestry)
            .map(|n| n.tid)
            .collect();

        for t in ancestors {
            let person = self.nodes[t.index()].person;
            for sid in person.rels.spouses() {
                if let Some(spouse) = self.fresh(sid, t) {
                    self.attach_spouse(t, spouse, true);
                }
            }
        }
    }

    fn finish(self) -> Tree<'a> {
        let max_ancestry_depth = self
            .nodes
            .iter()
            .filter(|n| n.is_ancestry)
            .map(|n| n.depth)
            .max()
            .unwrap_or(0);
        Tree {
            nodes: self.nodes,
            index: self.tids,
            max_ancestry_depth,
        }
    }
}
