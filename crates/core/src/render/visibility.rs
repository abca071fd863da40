use std::collections::HashSet;
use std::hash::BuildHasher;

use crate::store::Person;
use crate::tree::TreeNode;

/// `true` if every relative of the node's person (parents, spouses and
/// children, ignoring empty ids) is in `displayed`.
///
/// Runs in O(k) for k relatives.
pub fn is_all_relative_displayed<S: BuildHasher>(
    node: &TreeNode<'_>,
    displayed: &HashSet<&str, S>,
) -> bool {
    is_all_relative_displayed_for(node.person(), displayed)
}

/// Same check for a bare person record.
pub fn is_all_relative_displayed_for<S: BuildHasher>(
    person: &Person,
    displayed: &HashSet<&str, S>,
) -> bool {
    person
        .rels
        .iter()
        .all(|(_, id)| id.is_empty() || displayed.contains(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Relationships;
    use serde_json::Map;

    #[test]
    fn test_empty_ids_are_ignored() {
        let person = Person::from_parts(
            "a",
            Map::new(),
            Relationships::new(vec!["".into(), "p".into()], vec![], vec!["c".into()]),
        );
        let mut shown: HashSet<&str> = ["p", "c"].into_iter().collect();
        assert!(is_all_relative_displayed_for(&person, &shown));

        shown.remove("c");
        assert!(!is_all_relative_displayed_for(&person, &shown));
    }

    #[test]
    fn test_no_relatives_is_trivially_displayed() {
        let person = Person::from_parts("a", Map::new(), Relationships::default());
        assert!(is_all_relative_displayed_for(&person, &HashSet::new()));
    }
}
