//! Tree calculation: walk the person graph from an anchor and produce a
//! flat, depth-tagged list of positioned nodes.
//!
//! The result borrows the [`Store`](crate::store::Store) it was computed
//! from, so the store cannot be mutated while a tree is alive. After any
//! mutation call [`calculate_tree`] again.

pub mod builder;
mod layout;
pub mod sort;

use std::collections::{HashMap, HashSet};

use serde_json::{json, Value};

pub use builder::calculate_tree;
pub use sort::{sort_children_with_placement, sort_children_with_spouses, SoloPlacement};

use crate::store::Person;
use crate::types::Tid;

/// Options for [`calculate_tree`].
///
/// Construct with [`TreeOptions::new`] and adjust with the chained setters:
///
/// ```
/// use famtree_core::TreeOptions;
///
/// let opts = TreeOptions::new("p1").ancestry_depth(2).show_siblings_of_main(true);
/// assert_eq!(opts.main_id, "p1");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TreeOptions {
    /// Id of the anchor person. Required.
    pub main_id: String,
    /// Maximum number of generations above the anchor. `None` means no cap.
    pub ancestry_depth: Option<usize>,
    /// Maximum number of generations below the anchor. `None` means no cap.
    pub progeny_depth: Option<usize>,
    /// Attach the anchor's siblings (not expanded further).
    pub show_siblings_of_main: bool,
    /// Where children with a single known parent go among their siblings.
    pub solo_children: SoloPlacement,
    /// Horizontal distance between neighbouring nodes.
    pub node_separation: f64,
    /// Vertical distance between generations.
    pub level_separation: f64,
    /// Lay generations out left to right instead of top to bottom.
    pub horizontal: bool,
}

impl TreeOptions {
    pub fn new(main_id: impl Into<String>) -> Self {
        Self {
            main_id: main_id.into(),
            ..Self::default()
        }
    }

    pub fn ancestry_depth(mut self, depth: usize) -> Self {
        self.ancestry_depth = Some(depth);
        self
    }

    pub fn progeny_depth(mut self, depth: usize) -> Self {
        self.progeny_depth = Some(depth);
        self
    }

    pub fn show_siblings_of_main(mut self, show: bool) -> Self {
        self.show_siblings_of_main = show;
        self
    }

    pub fn solo_children(mut self, placement: SoloPlacement) -> Self {
        self.solo_children = placement;
        self
    }

    pub fn node_separation(mut self, sep: f64) -> Self {
        self.node_separation = sep;
        self
    }

    pub fn level_separation(mut self, sep: f64) -> Self {
        self.level_separation = sep;
        self
    }

    pub fn horizontal(mut self, horizontal: bool) -> Self {
        self.horizontal = horizontal;
        self
    }
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            main_id: String::new(),
            ancestry_depth: None,
            progeny_depth: None,
            show_siblings_of_main: false,
            solo_children: SoloPlacement::Last,
            node_separation: 250.0,
            level_separation: 150.0,
            horizontal: false,
        }
    }
}

/// One person placed in a computed tree.
///
/// `depth` counts generations away from the anchor; whether that is up or
/// down is given by `is_ancestry`. Nodes reference each other by [`Tid`].
#[derive(Debug, Clone)]
pub struct TreeNode<'a> {
    pub(crate) tid: Tid,
    pub(crate) person: &'a Person,
    pub(crate) depth: usize,
    pub(crate) is_ancestry: bool,
    pub(crate) main: bool,
    pub(crate) sibling: bool,
    /// Node this one is attached to as a spouse.
    pub(crate) spouse: Option<Tid>,
    /// Spouse nodes attached to this one.
    pub(crate) spouses: Vec<Tid>,
    pub(crate) reached_from: Option<Tid>,
    pub(crate) co_parent: Option<Tid>,
    pub(crate) children: Vec<Tid>,
    pub(crate) parents: Vec<Tid>,
    pub(crate) x: f64,
    pub(crate) y: f64,
}

impl<'a> TreeNode<'a> {
    pub(crate) fn new(
        tid: Tid,
        person: &'a Person,
        depth: usize,
        is_ancestry: bool,
        reached_from: Option<Tid>,
    ) -> Self {
        Self {
            tid,
            person,
            depth,
            is_ancestry,
            main: false,
            sibling: false,
            spouse: None,
            spouses: Vec::new(),
            reached_from,
            co_parent: None,
            children: Vec::new(),
            parents: Vec::new(),
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn tid(&self) -> Tid {
        self.tid
    }

    pub fn id(&self) -> &'a str {
        &self.person.id
    }

    pub fn person(&self) -> &'a Person {
        self.person
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// `true` when reached through parent edges above the anchor.
    pub fn is_ancestry(&self) -> bool {
        self.is_ancestry
    }

    /// `true` only for the anchor.
    pub fn is_main(&self) -> bool {
        self.main
    }

    /// `true` for siblings of the anchor added by
    /// [`TreeOptions::show_siblings_of_main`].
    pub fn is_sibling(&self) -> bool {
        self.sibling
    }

    /// The node this one is paired with as a spouse, if it was attached as one.
    pub fn spouse(&self) -> Option<Tid> {
        self.spouse
    }

    /// Spouse nodes paired with this node, in declared order.
    pub fn spouses(&self) -> &[Tid] {
        &self.spouses
    }

    /// The node this one was reached from in the spanning walk. `None` for
    /// the anchor.
    pub fn reached_from(&self) -> Option<Tid> {
        self.reached_from
    }

    /// For a progeny child: the node of its other parent, when that parent
    /// is in the tree.
    pub fn co_parent(&self) -> Option<Tid> {
        self.co_parent
    }

    /// Child nodes hanging below this node.
    pub fn children(&self) -> &[Tid] {
        &self.children
    }

    /// Parent nodes placed above this node on the ancestry side.
    pub fn parents(&self) -> &[Tid] {
        &self.parents
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }
}

/// The result of [`calculate_tree`]. The anchor is always the first node.
#[derive(Debug, Clone)]
pub struct Tree<'a> {
    pub(crate) nodes: Vec<TreeNode<'a>>,
    pub(crate) index: HashMap<&'a str, Tid>,
    pub(crate) max_ancestry_depth: usize,
}

impl<'a> Tree<'a> {
    pub fn main_node(&self) -> &TreeNode<'a> {
        &self.nodes[0]
    }

    /// All nodes in visit order.
    pub fn nodes(&self) -> &[TreeNode<'a>] {
        &self.nodes
    }

    pub fn node(&self, tid: Tid) -> Option<&TreeNode<'a>> {
        self.nodes.get(tid.index())
    }

    /// The node for a person id, if the person is in the tree.
    pub fn get(&self, id: &str) -> Option<&TreeNode<'a>> {
        self.index.get(id).map(|t| &self.nodes[t.index()])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Deepest ancestry level in the tree, computed once when the tree is built.
    pub fn max_ancestry_depth(&self) -> usize {
        self.max_ancestry_depth
    }

    /// Ids of every person in the tree.
    pub fn displayed_ids(&self) -> HashSet<&'a str> {
        self.nodes.iter().map(|n| n.id()).collect()
    }

    /// JSON view of the tree for host applications: one object per node
    /// with references rendered as person ids.
    pub fn to_json(&self) -> Value {
        let id_of = |t: Option<Tid>| t.map(|t| self.nodes[t.index()].id());
        let ids_of = |ts: &[Tid]| ts.iter().map(|t| self.nodes[t.index()].id()).collect::<Vec<_>>();

        let nodes: Vec<Value> = self
            .nodes
            .iter()
            .map(|n| {
                json!({
                    "id": n.id(),
                    "tid": n.tid.index(),
                    "depth": n.depth,
                    "is_ancestry": n.is_ancestry,
                    "main": n.main,
                    "sibling": n.sibling,
                    "spouse": id_of(n.spouse),
                    "spouses": ids_of(&n.spouses),
                    "reached_from": id_of(n.reached_from),
                    "co_parent": id_of(n.co_parent),
                    "children": ids_of(&n.children),
                    "parents": ids_of(&n.parents),
                    "x": n.x,
                    "y": n.y,
                    "data": n.person.data,
                })
            })
            .collect();

        json!({
            "main_id": self.main_node().id(),
            "max_ancestry_depth": self.max_ancestry_depth,
            "nodes": nodes,
        })
    }
}
