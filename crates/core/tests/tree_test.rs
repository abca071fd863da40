//! Integration test: tree calculation over small hand-built families.
//!
//! Families used:
//!
//!   A = B            (A, B spouses)
//!     |
//!     C = D          (C, D spouses; C is the child of A and B)
//!       |
//!       E            (child of C and D)
//!
//! plus variants with remarriage, cousin marriage, cyclic parents and
//! dangling references.

use std::collections::HashSet;

use approx::assert_relative_eq;
use famtree_core::{
    calculate_delay, calculate_tree, is_all_relative_displayed, sort_children_with_spouses,
    FindingKind, Gender, Person, Store, Tid, TreeError, TreeOptions,
};

fn abcde() -> Store {
    Store::from_persons(vec![
        Person::new("A", Gender::Male).with_spouses(&["B"]).with_children(&["C"]),
        Person::new("B", Gender::Female).with_spouses(&["A"]).with_children(&["C"]),
        Person::new("C", Gender::Male)
            .with_parents(&["A", "B"])
            .with_spouses(&["D"])
            .with_children(&["E"]),
        Person::new("D", Gender::Female).with_spouses(&["C"]).with_children(&["E"]),
        Person::new("E", Gender::Female).with_parents(&["C", "D"]),
    ])
}

/// Walk `reached_from` links up to the anchor; fails if a chain loops or
/// ends anywhere else.
fn assert_reachable(tree: &famtree_core::Tree<'_>) {
    for node in tree.nodes() {
        let mut current = node.tid();
        let mut steps = 0;
        while let Some(prev) = tree.node(current).unwrap().reached_from() {
            current = prev;
            steps += 1;
            assert!(steps <= tree.len(), "walk from {} loops", node.id());
        }
        assert_eq!(current, Tid(0), "{} is not connected to the anchor", node.id());
    }
}

fn assert_unique_ids(tree: &famtree_core::Tree<'_>) {
    let ids: HashSet<&str> = tree.nodes().iter().map(|n| n.id()).collect();
    assert_eq!(ids.len(), tree.len(), "duplicate ids in tree");
}

#[test]
fn test_anchor_in_the_middle() {
    let store = abcde();
    let tree = calculate_tree(&store, &TreeOptions::new("C")).unwrap();

    assert_eq!(tree.len(), 5);
    let main = tree.main_node();
    assert_eq!(main.id(), "C");
    assert!(main.is_main());
    assert_eq!(main.depth(), 0);
    assert!(!main.is_ancestry());

    for id in ["A", "B"] {
        let n = tree.get(id).unwrap();
        assert!(n.is_ancestry(), "{} should be on the ancestry side", id);
        assert_eq!(n.depth(), 1);
    }
    // The two parents are paired with each other.
    let a = tree.get("A").unwrap();
    let b = tree.get("B").unwrap();
    assert_eq!(b.spouse(), Some(a.tid()));
    assert_eq!(main.parents(), &[a.tid(), b.tid()]);

    let d = tree.get("D").unwrap();
    assert_eq!(d.depth(), 0);
    assert!(!d.is_ancestry());
    assert_eq!(d.spouse(), Some(main.tid()));
    assert_eq!(main.spouses(), &[d.tid()]);

    let e = tree.get("E").unwrap();
    assert_eq!(e.depth(), 1);
    assert!(!e.is_ancestry());
    assert_eq!(e.reached_from(), Some(main.tid()));
    assert_eq!(e.co_parent(), Some(d.tid()));

    assert_eq!(tree.max_ancestry_depth(), 1);
    assert_eq!(tree.nodes().iter().filter(|n| n.is_main()).count(), 1);
    assert_reachable(&tree);
}

#[test]
fn test_every_anchor_gives_one_main_and_unique_ids() {
    let store = abcde();
    for id in ["A", "B", "C", "D", "E"] {
        let tree = calculate_tree(&store, &TreeOptions::new(id)).unwrap();
        let mains: Vec<_> = tree.nodes().iter().filter(|n| n.is_main()).collect();
        assert_eq!(mains.len(), 1);
        assert_eq!(mains[0].id(), id);
        assert_unique_ids(&tree);
        assert_reachable(&tree);
    }
}

#[test]
fn test_grandparent_anchor_reaches_grandchild() {
    let store = abcde();
    let tree = calculate_tree(&store, &TreeOptions::new("A")).unwrap();
    assert_eq!(tree.len(), 5);
    assert_eq!(tree.get("E").unwrap().depth(), 2);
    assert_eq!(tree.get("B").unwrap().spouse(), Some(Tid(0)));
    assert_eq!(tree.max_ancestry_depth(), 0);
}

#[test]
fn test_missing_and_unknown_main() {
    let store = abcde();
    assert!(matches!(
        calculate_tree(&store, &TreeOptions::default()),
        Err(TreeError::MissingMainId)
    ));
    match calculate_tree(&store, &TreeOptions::new("Z")) {
        Err(TreeError::NotFound(id)) => assert_eq!(id, "Z"),
        other => panic!("expected NotFound, got {:?}", other.map(|t| t.len())),
    }
}

#[test]
fn test_cyclic_parents_terminate() {
    let store = Store::from_persons(vec![
        Person::new("A", Gender::Male).with_parents(&["B"]).with_children(&["B"]),
        Person::new("B", Gender::Female).with_parents(&["A"]).with_children(&["A"]),
    ]);
    let tree = calculate_tree(&store, &TreeOptions::new("A")).unwrap();
    assert_eq!(tree.len(), 2);
    assert!(tree.get("B").unwrap().is_ancestry());
    assert_unique_ids(&tree);

    let kinds: Vec<_> = store.validate().into_iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![FindingKind::CyclicAncestry]);
}

#[test]
fn test_dangling_references_are_skipped() {
    let store = Store::from_persons(vec![
        Person::new("A", Gender::Male)
            .with_parents(&["ghost-father"])
            .with_spouses(&["ghost-wife"])
            .with_children(&["C", "ghost-child"]),
        Person::new("C", Gender::Female).with_parents(&["A"]),
    ]);
    let tree = calculate_tree(&store, &TreeOptions::new("A")).unwrap();
    assert_eq!(tree.len(), 2);
    assert_eq!(store.validate().len(), 3);
}

#[test]
fn test_cousin_marriage_is_not_duplicated() {
    // G1 = G2 have children P and Q. P's son X marries Q's daughter Y;
    // their child Z is the anchor, so G1 and G2 are reachable twice.
    let store = Store::from_persons(vec![
        Person::new("G1", Gender::Male).with_spouses(&["G2"]).with_children(&["P", "Q"]),
        Person::new("G2", Gender::Female).with_spouses(&["G1"]).with_children(&["P", "Q"]),
        Person::new("P", Gender::Male).with_parents(&["G1", "G2"]).with_children(&["X"]),
        Person::new("Q", Gender::Female).with_parents(&["G1", "G2"]).with_children(&["Y"]),
        Person::new("X", Gender::Male)
            .with_parents(&["P"])
            .with_spouses(&["Y"])
            .with_children(&["Z"]),
        Person::new("Y", Gender::Female)
            .with_parents(&["Q"])
            .with_spouses(&["X"])
            .with_children(&["Z"]),
        Person::new("Z", Gender::Male).with_parents(&["X", "Y"]),
    ]);
    assert!(store.validate().is_empty());

    let tree = calculate_tree(&store, &TreeOptions::new("Z")).unwrap();
    assert_eq!(tree.len(), 7);
    assert_unique_ids(&tree);
    assert_reachable(&tree);
    assert_eq!(tree.get("G1").unwrap().depth(), 3);
    assert_eq!(tree.get("G2").unwrap().depth(), 3);
    assert_eq!(tree.max_ancestry_depth(), 3);

    let tree = calculate_tree(&store, &TreeOptions::new("G1")).unwrap();
    assert_unique_ids(&tree);
    assert_eq!(tree.get("Z").unwrap().depth(), 3);
}

#[test]
fn test_remarriage_orders_half_siblings() {
    // M married W1 then W2; children listed out of marriage order.
    let store = Store::from_persons(vec![
        Person::new("M", Gender::Male)
            .with_spouses(&["W1", "W2"])
            .with_children(&["k2", "k1"]),
        Person::new("W1", Gender::Female).with_spouses(&["M"]).with_children(&["k1"]),
        Person::new("W2", Gender::Female).with_spouses(&["M"]).with_children(&["k2"]),
        Person::new("k1", Gender::Male).with_parents(&["M", "W1"]),
        Person::new("k2", Gender::Female).with_parents(&["M", "W2"]),
    ]);
    let tree = calculate_tree(&store, &TreeOptions::new("M")).unwrap();
    let main = tree.main_node();

    let spouse_ids: Vec<_> = main.spouses().iter().map(|t| tree.node(*t).unwrap().id()).collect();
    assert_eq!(spouse_ids, vec!["W1", "W2"]);

    let child_ids: Vec<_> = main.children().iter().map(|t| tree.node(*t).unwrap().id()).collect();
    assert_eq!(child_ids, vec!["k1", "k2"]);
    assert_eq!(tree.get("k1").unwrap().co_parent(), tree.get("W1").map(|n| n.tid()));
    assert_eq!(tree.get("k2").unwrap().co_parent(), tree.get("W2").map(|n| n.tid()));
}

#[test]
fn test_ancestor_second_spouse_displays_without_expanding() {
    // Grandfather GF has two wives; the anchor descends from GM. GW2's own
    // parents must not be pulled in.
    let store = Store::from_persons(vec![
        Person::new("GF", Gender::Male).with_spouses(&["GM", "GW2"]).with_children(&["P"]),
        Person::new("GM", Gender::Female).with_spouses(&["GF"]).with_children(&["P"]),
        Person::new("GW2", Gender::Female)
            .with_parents(&["GW2-father"])
            .with_spouses(&["GF"]),
        Person::new("GW2-father", Gender::Male).with_children(&["GW2"]),
        Person::new("P", Gender::Male).with_parents(&["GF", "GM"]),
    ]);
    let tree = calculate_tree(&store, &TreeOptions::new("P")).unwrap();

    let gf = tree.get("GF").unwrap();
    let gw2 = tree.get("GW2").unwrap();
    assert!(gw2.is_ancestry());
    assert_eq!(gw2.depth(), gf.depth());
    assert_eq!(gw2.spouse(), Some(gf.tid()));
    assert!(gw2.parents().is_empty());
    assert!(tree.get("GW2-father").is_none());
}

/// `c` is loaded with three parents. `p1` married `p3` before `p2`, and
/// `d` is the child of `p1` and `p3`.
fn three_parent_family() -> Store {
    Store::from_persons(vec![
        Person::new("p1", Gender::Male)
            .with_spouses(&["p3", "p2"])
            .with_children(&["c", "d"]),
        Person::new("p2", Gender::Female).with_spouses(&["p1"]).with_children(&["c"]),
        Person::new("p3", Gender::Female)
            .with_spouses(&["p1"])
            .with_children(&["c", "d"]),
        Person::new("c", Gender::Male).with_parents(&["p1", "p2", "p3"]),
        Person::new("d", Gender::Female).with_parents(&["p1", "p3"]),
    ])
}

#[test]
fn test_third_parent_is_not_an_ancestor() {
    let store = three_parent_family();
    let kinds: Vec<_> = store.validate().into_iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![FindingKind::TooManyParents]);

    let tree = calculate_tree(&store, &TreeOptions::new("c")).unwrap();
    let main = tree.main_node();
    let p1 = tree.get("p1").unwrap();
    let p2 = tree.get("p2").unwrap();
    assert_eq!(main.parents(), &[p1.tid(), p2.tid()]);
    assert_eq!(p2.spouse(), Some(p1.tid()));

    // p3 still shows up, but only as p1's other wife.
    let p3 = tree.get("p3").unwrap();
    assert!(p3.is_ancestry());
    assert_eq!(p3.spouse(), Some(p1.tid()));
    assert_eq!(p3.reached_from(), Some(p1.tid()));
    assert_eq!(tree.max_ancestry_depth(), 1);
}

#[test]
fn test_third_parent_is_ignored_when_ordering_children() {
    let store = three_parent_family();
    let p1 = store.get_datum("p1").unwrap();

    // c groups with p2 (second marriage), so d from the first marriage leads.
    let sorted: Vec<_> = sort_children_with_spouses(p1.rels.children(), p1, &store)
        .into_iter()
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(sorted, vec!["d", "c"]);

    let tree = calculate_tree(&store, &TreeOptions::new("p1")).unwrap();
    let c = tree.get("c").unwrap();
    assert_eq!(c.co_parent(), tree.get("p2").map(|n| n.tid()));
    assert_eq!(tree.get("d").unwrap().co_parent(), tree.get("p3").map(|n| n.tid()));
}

#[test]
fn test_depth_limits() {
    let store = abcde();
    let tree = calculate_tree(&store, &TreeOptions::new("C").ancestry_depth(0)).unwrap();
    assert!(tree.get("A").is_none());
    assert_eq!(tree.max_ancestry_depth(), 0);

    let tree = calculate_tree(&store, &TreeOptions::new("A").progeny_depth(1)).unwrap();
    assert!(tree.get("C").is_some());
    assert!(tree.get("D").is_some(), "spouses of the last level stay");
    assert!(tree.get("E").is_none());
}

#[test]
fn test_siblings_of_main() {
    let store = Store::from_persons(vec![
        Person::new("F", Gender::Male).with_children(&["s1", "me", "s2"]),
        Person::new("s1", Gender::Male).with_parents(&["F"]),
        Person::new("me", Gender::Female).with_parents(&["F"]),
        Person::new("s2", Gender::Female).with_parents(&["F"]),
    ]);
    let tree = calculate_tree(&store, &TreeOptions::new("me")).unwrap();
    assert_eq!(tree.len(), 2);

    let tree = calculate_tree(&store, &TreeOptions::new("me").show_siblings_of_main(true)).unwrap();
    assert_eq!(tree.len(), 4);
    let s1 = tree.get("s1").unwrap();
    assert!(s1.is_sibling());
    assert_eq!(s1.depth(), 0);
    assert!(!s1.is_ancestry());
    assert_eq!(s1.reached_from(), Some(Tid(0)));
}

#[test]
fn test_visibility_over_full_tree() {
    let store = abcde();
    let tree = calculate_tree(&store, &TreeOptions::new("C")).unwrap();
    let displayed = tree.displayed_ids();

    for node in tree.nodes() {
        assert!(is_all_relative_displayed(node, &displayed), "{}", node.id());
    }

    for removed in displayed.iter() {
        let mut partial = displayed.clone();
        partial.remove(removed);
        let any_missing = tree
            .nodes()
            .iter()
            .any(|n| !is_all_relative_displayed(n, &partial));
        assert!(any_missing, "removing {} went unnoticed", removed);
    }
}

#[test]
fn test_delay_monotonic_in_depth() {
    // Four-generation line with spouses on every progeny level.
    let store = Store::from_persons(vec![
        Person::new("g0", Gender::Male).with_spouses(&["w0"]).with_children(&["g1"]),
        Person::new("w0", Gender::Female).with_spouses(&["g0"]).with_children(&["g1"]),
        Person::new("g1", Gender::Male)
            .with_parents(&["g0", "w0"])
            .with_spouses(&["w1"])
            .with_children(&["g2"]),
        Person::new("w1", Gender::Female).with_spouses(&["g1"]).with_children(&["g2"]),
        Person::new("g2", Gender::Male)
            .with_parents(&["g1", "w1"])
            .with_spouses(&["w2"])
            .with_children(&["g3"]),
        Person::new("w2", Gender::Female).with_spouses(&["g2"]).with_children(&["g3"]),
        Person::new("g3", Gender::Male).with_parents(&["g2", "w2"]),
    ]);
    let tree = calculate_tree(&store, &TreeOptions::new("g1")).unwrap();
    let t = 800.0;

    let mut groups: Vec<Vec<(usize, f64)>> = vec![Vec::new(); 4];
    for node in tree.nodes().iter().filter(|n| !n.is_main()) {
        let group = usize::from(node.is_ancestry()) * 2 + usize::from(node.spouse().is_some());
        groups[group].push((node.depth(), calculate_delay(&tree, node, t)));
    }
    for group in &mut groups {
        group.sort_by(|a, b| a.0.cmp(&b.0));
        for pair in group.windows(2) {
            assert!(pair[0].1 <= pair[1].1, "{:?} then {:?}", pair[0], pair[1]);
        }
    }

    // g3: depth 2, one ancestry level above the anchor, depth 2 again.
    assert_relative_eq!(
        calculate_delay(&tree, tree.get("g3").unwrap(), t),
        (2.0 + 1.0 + 2.0) * 0.4 * t
    );
}

#[test]
fn test_tree_json() {
    let store = abcde();
    let tree = calculate_tree(&store, &TreeOptions::new("C")).unwrap();
    let json = tree.to_json();
    assert_eq!(json["main_id"], "C");
    assert_eq!(json["nodes"].as_array().unwrap().len(), 5);
    assert_eq!(json["nodes"][0]["id"], "C");
    assert_eq!(json["nodes"][0]["main"], true);
    assert_eq!(json["nodes"][0]["parents"], serde_json::json!(["A", "B"]));
    assert_eq!(json["nodes"][0]["children"], serde_json::json!(["E"]));
    assert_eq!(json["nodes"][0]["spouses"], serde_json::json!(["D"]));
}
