//! Child ordering for couples with several marriages.
//!
//! Children are grouped by their "other parent" (the entry in the child's
//! `parents` list that is not the parent being laid out). Groups follow the
//! order of the parent's declared spouses, so children of a first marriage
//! come before those of a second. The other parent of every child is
//! resolved once per call; the sort itself only compares precomputed keys.

use std::collections::HashMap;

use crate::store::{Person, Store, MAX_PARENTS};

/// Where children with only one parent on record are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoloPlacement {
    First,
    #[default]
    Last,
}

/// Order `children` of `parent` by marriage, with single-parent children last.
///
/// Ids that are not in `store` are skipped. The sort is stable: children in
/// the same group keep their input order.
pub fn sort_children_with_spouses<'a, S: AsRef<str>>(
    children: &[S],
    parent: &Person,
    store: &'a Store,
) -> Vec<&'a Person> {
    sort_children_with_placement(children, parent, store, SoloPlacement::Last)
}

/// Like [`sort_children_with_spouses`], with explicit placement of
/// single-parent children.
///
/// Group order:
/// 1. children whose other parent is a declared spouse, by spouse position;
/// 2. children whose other parent is not a declared spouse, by first appearance;
/// 3. children with no other parent (first instead of last with
///    [`SoloPlacement::First`]).
pub fn sort_children_with_placement<'a, S: AsRef<str>>(
    children: &[S],
    parent: &Person,
    store: &'a Store,
    solo: SoloPlacement,
) -> Vec<&'a Person> {
    let spouse_rank: HashMap<&str, usize> = parent
        .rels
        .spouses()
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();
    let mut undeclared: HashMap<&'a str, usize> = HashMap::new();

    let (solo_group, declared_group, undeclared_group) = match solo {
        SoloPlacement::First => (0u8, 1u8, 2u8),
        SoloPlacement::Last => (2, 0, 1),
    };

    let mut keyed: Vec<((u8, usize), &'a Person)> = Vec::with_capacity(children.len());
    for id in children {
        let Some(child) = store.get_datum(id.as_ref()) else {
            continue;
        };
        let key = match other_parent(child, &parent.id) {
            Some(other) => match spouse_rank.get(other) {
                Some(&rank) => (declared_group, rank),
                None => {
                    let next = undeclared.len();
                    (undeclared_group, *undeclared.entry(other).or_insert(next))
                }
            },
            None => (solo_group, 0),
        };
        keyed.push((key, child));
    }

    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, child)| child).collect()
}

/// The first of `child`'s parents (within the supported count) that is not `parent_id`.
pub fn other_parent<'a>(child: &'a Person, parent_id: &str) -> Option<&'a str> {
    child
        .rels
        .parents()
        .iter()
        .take(MAX_PARENTS)
        .map(String::as_str)
        .find(|p| *p != parent_id)
}
