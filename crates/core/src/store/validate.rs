use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::person::{Person, RelKind};
use crate::types::GENDER_KEY;

/// Most parents a person may list. Traversal only follows the first
/// `MAX_PARENTS` entries, extra ones are reported as [`FindingKind::TooManyParents`].
pub const MAX_PARENTS: usize = 2;

/// Category of a data-quality problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    DuplicateId,
    DanglingReference,
    AsymmetricRelationship,
    SelfReference,
    InvalidGender,
    TooManyParents,
    CyclicAncestry,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FindingKind::DuplicateId => "duplicate-id",
            FindingKind::DanglingReference => "dangling-reference",
            FindingKind::AsymmetricRelationship => "asymmetric-relationship",
            FindingKind::SelfReference => "self-reference",
            FindingKind::InvalidGender => "invalid-gender",
            FindingKind::TooManyParents => "too-many-parents",
            FindingKind::CyclicAncestry => "cyclic-ancestry",
        };
        f.write_str(s)
    }
}

/// One integrity problem: what kind, which ids are involved, and a
/// human-readable message for the host application's logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub ids: Vec<String>,
    pub message: String,
}

impl Finding {
    pub(crate) fn new(kind: FindingKind, ids: Vec<String>, message: String) -> Self {
        Self { kind, ids, message }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Check a dataset for integrity problems.
///
/// Checks:
/// - Every id is unique.
/// - Every relationship id refers to a record in the dataset.
/// - Every relationship is listed back by the other side.
/// - Nobody lists themselves as a relative.
/// - Gender is `M` or `F`.
/// - At most [`MAX_PARENTS`] parents.
/// - No person is their own ancestor.
///
/// Nothing here fails; an empty list means the dataset is clean.
pub fn validate<'a, I>(persons: I) -> Vec<Finding>
where
    I: IntoIterator<Item = &'a Person>,
{
    let persons: Vec<&Person> = persons.into_iter().collect();
    let mut findings = Vec::new();

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(persons.len());
    for (i, p) in persons.iter().enumerate() {
        if index.contains_key(p.id.as_str()) {
            findings.push(Finding::new(
                FindingKind::DuplicateId,
                vec![p.id.clone()],
                format!("Person id '{}' appears more than once", p.id),
            ));
        } else {
            index.insert(p.id.as_str(), i);
        }
    }

    for p in &persons {
        if p.gender().is_none() {
            let shown = p
                .data
                .get(GENDER_KEY)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "nothing".to_string());
            findings.push(Finding::new(
                FindingKind::InvalidGender,
                vec![p.id.clone()],
                format!("Person '{}' has gender {}, expected \"M\" or \"F\"", p.id, shown),
            ));
        }

        if p.rels.parents().len() > MAX_PARENTS {
            findings.push(Finding::new(
                FindingKind::TooManyParents,
                vec![p.id.clone()],
                format!(
                    "Person '{}' lists {} parents; only the first {} are used",
                    p.id,
                    p.rels.parents().len(),
                    MAX_PARENTS
                ),
            ));
        }

        for (kind, rel) in p.rels.iter() {
            if rel == p.id {
                findings.push(Finding::new(
                    FindingKind::SelfReference,
                    vec![p.id.clone()],
                    format!("Person '{}' is listed as its own {}", p.id, kind.as_str()),
                ));
                continue;
            }
            match index.get(rel) {
                None => findings.push(Finding::new(
                    FindingKind::DanglingReference,
                    vec![p.id.clone(), rel.to_string()],
                    format!(
                        "Person '{}' references {} '{}' which does not exist",
                        p.id,
                        kind.as_str(),
                        rel
                    ),
                )),
                Some(&j) => {
                    if !persons[j].rels.contains(kind.inverse(), &p.id) {
                        findings.push(Finding::new(
                            FindingKind::AsymmetricRelationship,
                            vec![p.id.clone(), rel.to_string()],
                            format!(
                                "Person '{}' lists '{}' as {} but '{}' does not list '{}' as {}",
                                p.id,
                                rel,
                                kind.as_str(),
                                rel,
                                p.id,
                                kind.inverse().as_str()
                            ),
                        ));
                    }
                }
            }
        }
    }

    let cyclic = cyclic_ancestry(&persons, &index);
    if !cyclic.is_empty() {
        let ids: Vec<String> = cyclic.iter().map(|&i| persons[i].id.clone()).collect();
        let message = format!("Ancestry cycle involving {}", ids.join(", "));
        findings.push(Finding::new(FindingKind::CyclicAncestry, ids, message));
    }

    findings
}

/// Indices of persons that sit on a parent cycle, in input order.
///
/// Kahn's algorithm over parent -> child edges strips everything that can
/// be ordered top-down; the same pass run bottom-up on the remainder strips
/// descendants hanging off a cycle, leaving the cycle members.
fn cyclic_ancestry(persons: &[&Person], index: &HashMap<&str, usize>) -> Vec<usize> {
    let n = persons.len();
    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut parents_of: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (i, p) in persons.iter().enumerate() {
        // Only the first occurrence of a duplicated id takes part.
        if index.get(p.id.as_str()) != Some(&i) {
            continue;
        }
        for parent in p.rels.list(RelKind::Parent) {
            if let Some(&pi) = index.get(parent.as_str()) {
                if pi != i {
                    children_of[pi].push(i);
                    parents_of[i].push(pi);
                }
            }
        }
    }

    let mut removed = vec![false; n];
    peel(&children_of, &parents_of, &mut removed);
    peel(&parents_of, &children_of, &mut removed);

    (0..n).filter(|&i| !removed[i]).collect()
}

/// Repeatedly remove nodes with no remaining incoming edges (`incoming`),
/// following `outgoing` to release successors.
fn peel(outgoing: &[Vec<usize>], incoming: &[Vec<usize>], removed: &mut [bool]) {
    let n = outgoing.len();
    let mut in_degree: Vec<usize> = (0..n)
        .map(|i| incoming[i].iter().filter(|&&j| !removed[j]).count())
        .collect();

    let mut queue: Vec<usize> = (0..n)
        .filter(|&i| !removed[i] && in_degree[i] == 0)
        .collect();

    while let Some(node) = queue.pop() {
        removed[node] = true;
        for &next in &outgoing[node] {
            if removed[next] {
                continue;
            }
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push(next);
            }
        }
    }
}
