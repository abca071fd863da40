//! Relational person store.
//!
//! [`Store`] is the single owner of the person collection. Records are kept
//! in an [`IndexMap`] keyed by id, so lookups are O(1) and the original
//! record order survives for export. Relationship lists only change through
//! the link operations on `Store`, which update both endpoints together.

mod io;
pub mod legacy;
pub mod person;
pub mod validate;

use indexmap::IndexMap;
use serde_json::Value;

pub use legacy::{
    dataset_shape, export_person, normalize_to_current, DatasetShape, RecordLayout, RelShape,
};
pub use person::{Person, RelKind, Relationships};
pub use validate::{validate, Finding, FindingKind, MAX_PARENTS};

use crate::error::{Result, TreeError};

/// Id-indexed collection of person records.
#[derive(Debug, Clone, Default)]
pub struct Store {
    persons: IndexMap<String, Person>,
    /// Ids of records dropped at load because an earlier record had the same id.
    duplicates: Vec<String>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            persons: IndexMap::new(),
            duplicates: Vec::new(),
        }
    }

    /// Load records as they are. Relationship lists are not checked or
    /// repaired; run [`Store::validate`] to find problems. When an id occurs
    /// more than once the first record wins and the later ones are reported
    /// by [`Store::validate`] as duplicates.
    pub fn from_persons(persons: Vec<Person>) -> Self {
        let mut store = Self::new();
        store.persons.reserve(persons.len());
        for p in persons {
            if store.persons.contains_key(&p.id) {
                log::warn!("Dropping duplicate record for person '{}'", p.id);
                store.duplicates.push(p.id);
                continue;
            }
            store.persons.insert(p.id.clone(), p);
        }
        store
    }

    /// Normalize raw JSON records (current or legacy shape) and load them.
    pub fn from_records(records: &[Value]) -> Self {
        Self::from_persons(normalize_to_current(records))
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    /// Look up a person by id.
    pub fn get_datum(&self, id: &str) -> Option<&Person> {
        self.persons.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.persons.contains_key(id)
    }

    /// Persons in load/insertion order.
    pub fn persons(&self) -> impl Iterator<Item = &Person> {
        self.persons.values()
    }

    /// Overall relationship shape of the loaded records.
    pub fn shape(&self) -> DatasetShape {
        dataset_shape(self.persons.values())
    }

    /// Integrity findings for the current contents, preceded by one
    /// [`FindingKind::DuplicateId`] per record dropped at load.
    pub fn validate(&self) -> Vec<Finding> {
        let mut findings: Vec<Finding> = self
            .duplicates
            .iter()
            .map(|id| {
                Finding::new(
                    FindingKind::DuplicateId,
                    vec![id.clone()],
                    format!(
                        "Person id '{}' appears more than once; only the first record was loaded",
                        id
                    ),
                )
            })
            .collect();
        findings.extend(validate(self.persons.values()));
        findings
    }

    /// All records as JSON, each in the shape it was loaded in.
    pub fn export(&self) -> Vec<Value> {
        let gender_of = |id: &str| self.get_datum(id).and_then(Person::gender);
        let shape = self.shape();
        self.persons
            .values()
            .map(|p| export_person(p, shape, &gender_of))
            .collect()
    }

    /// Insert a new person and link it to every listed relative.
    ///
    /// Relatives that are not in the store, or that point back at the
    /// person itself, are dropped with a warning.
    ///
    /// # Errors
    /// Returns an error if the id is empty or already taken, or if linking
    /// would give someone more than [`MAX_PARENTS`] parents.
    pub fn add_datum(&mut self, mut person: Person) -> Result<()> {
        if person.id.is_empty() {
            return Err(TreeError::Data("Person id must not be empty".to_string()));
        }
        if self.contains(&person.id) {
            return Err(TreeError::DuplicateId(person.id));
        }

        let rels = std::mem::take(&mut person.rels);
        let edges = self.usable_edges(&person.id, &rels);
        let children: Vec<&str> = edges_of(&edges, RelKind::Child).collect();
        self.check_parent_limits(&person.id, edges_of(&edges, RelKind::Parent).count(), &children)?;

        let id = person.id.clone();
        self.persons.insert(id.clone(), person);
        for (kind, rel) in edges {
            self.link(&id, kind, &rel)?;
        }
        Ok(())
    }

    /// Replace a person's data and relationship lists.
    ///
    /// Relationships missing from the new record are unlinked on both sides,
    /// new ones are linked on both sides, and the person's own lists take the
    /// order given in `person`.
    ///
    /// # Errors
    /// Returns an error if the person does not exist or if the update would
    /// give someone more than [`MAX_PARENTS`] parents.
    pub fn update_datum(&mut self, person: Person) -> Result<()> {
        let old_rels = match self.persons.get(&person.id) {
            Some(old) => old.rels.clone(),
            None => return Err(TreeError::NotFound(person.id)),
        };

        let id = person.id.clone();
        let edges = self.usable_edges(&id, &person.rels);
        let existing: Vec<(RelKind, String)> =
            old_rels.iter().map(|(k, r)| (k, r.to_string())).collect();
        let new_children: Vec<&str> = edges_of(&edges, RelKind::Child)
            .filter(|c| !old_rels.contains(RelKind::Child, c))
            .collect();
        self.check_parent_limits(&id, edges_of(&edges, RelKind::Parent).count(), &new_children)?;

        for (kind, rel) in &existing {
            if !edges.contains(&(*kind, rel.clone())) {
                self.unlink_kind(&id, *kind, rel);
            }
        }
        for (kind, rel) in &edges {
            self.link(&id, *kind, rel)?;
        }

        if let Some(stored) = self.persons.get_mut(&id) {
            stored.data = person.data;
            for kind in [RelKind::Parent, RelKind::Spouse, RelKind::Child] {
                *stored.rels.list_mut(kind) = edges_of(&edges, kind).map(str::to_string).collect();
            }
        }
        Ok(())
    }

    /// Remove a person and erase it from its relatives' lists.
    ///
    /// Removal shifts later records down to keep export order, so it is
    /// O(n) in the store size plus O(k) in the person's relatives.
    ///
    /// # Errors
    /// Returns an error if the person does not exist.
    pub fn remove_datum(&mut self, id: &str) -> Result<Person> {
        let removed = self
            .persons
            .shift_remove(id)
            .ok_or_else(|| TreeError::NotFound(id.to_string()))?;

        for (_, rel) in removed.rels.iter() {
            if let Some(relative) = self.persons.get_mut(rel) {
                relative.rels.remove_all(id);
            }
        }
        Ok(removed)
    }

    /// Record `parent` as a parent of `child` on both records.
    ///
    /// # Errors
    /// Returns an error if either person is missing, if they are the same
    /// person, or if `child` already has [`MAX_PARENTS`] parents.
    pub fn link_parent_child(&mut self, parent: &str, child: &str) -> Result<()> {
        self.require(parent)?;
        let current = match self.get_datum(child) {
            Some(c) if c.rels.contains(RelKind::Parent, parent) => return Ok(()),
            Some(c) => c.rels.parents().len(),
            None => return Err(TreeError::NotFound(child.to_string())),
        };
        self.check_parent_limits(child, current + 1, &[])?;
        self.link(child, RelKind::Parent, parent)
    }

    /// Record `a` and `b` as spouses of each other.
    ///
    /// # Errors
    /// Returns an error if either person is missing or they are the same person.
    pub fn link_spouses(&mut self, a: &str, b: &str) -> Result<()> {
        self.link(a, RelKind::Spouse, b)
    }

    /// Remove every relationship between `a` and `b`, on both records.
    /// Returns whether anything was removed.
    ///
    /// # Errors
    /// Returns an error if either person is missing.
    pub fn unlink(&mut self, a: &str, b: &str) -> Result<bool> {
        self.require(a)?;
        self.require(b)?;
        let mut changed = false;
        if let Some(p) = self.persons.get_mut(a) {
            changed |= p.rels.remove_all(b);
        }
        if let Some(p) = self.persons.get_mut(b) {
            changed |= p.rels.remove_all(a);
        }
        Ok(changed)
    }

    fn require(&self, id: &str) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(TreeError::NotFound(id.to_string()))
        }
    }

    /// Add `to` to `from`'s `kind` list and `from` to `to`'s inverse list.
    fn link(&mut self, from: &str, kind: RelKind, to: &str) -> Result<()> {
        if from == to {
            return Err(TreeError::InvalidLink(format!(
                "'{}' cannot be its own {}",
                from,
                kind.as_str()
            )));
        }
        self.require(from)?;
        self.require(to)?;
        if let Some(p) = self.persons.get_mut(from) {
            p.rels.insert(kind, to);
        }
        if let Some(p) = self.persons.get_mut(to) {
            p.rels.insert(kind.inverse(), from);
        }
        Ok(())
    }

    fn unlink_kind(&mut self, from: &str, kind: RelKind, to: &str) {
        if let Some(p) = self.persons.get_mut(from) {
            p.rels.list_mut(kind).retain(|r| r != to);
        }
        if let Some(p) = self.persons.get_mut(to) {
            p.rels.list_mut(kind.inverse()).retain(|r| r != from);
        }
    }

    /// Relationship entries of `id` that can actually be linked, in order.
    fn usable_edges(&self, id: &str, rels: &Relationships) -> Vec<(RelKind, String)> {
        let mut edges: Vec<(RelKind, String)> = Vec::with_capacity(rels.len());
        for (kind, rel) in rels.iter() {
            if rel == id {
                log::warn!("Person '{}': dropping self reference as {}", id, kind.as_str());
            } else if !self.contains(rel) {
                log::warn!(
                    "Person '{}': dropping {} '{}' which is not in the store",
                    id,
                    kind.as_str(),
                    rel
                );
            } else if !edges.iter().any(|(k, r)| *k == kind && r == rel) {
                edges.push((kind, rel.to_string()));
            }
        }
        edges
    }

    /// Reject a change that would leave `id` with `parent_count` parents
    /// above [`MAX_PARENTS`], or that adds `id` as a parent of a child
    /// already at the limit.
    fn check_parent_limits(&self, id: &str, parent_count: usize, new_children: &[&str]) -> Result<()> {
        if parent_count > MAX_PARENTS {
            return Err(TreeError::InvalidLink(format!(
                "'{}' would have {} parents; at most {} are supported",
                id, parent_count, MAX_PARENTS
            )));
        }
        for &child in new_children {
            let full = self
                .get_datum(child)
                .is_some_and(|c| c.rels.parents().len() >= MAX_PARENTS);
            if full {
                return Err(TreeError::InvalidLink(format!(
                    "'{}' already has {} parents; cannot add '{}'",
                    child, MAX_PARENTS, id
                )));
            }
        }
        Ok(())
    }
}

fn edges_of(edges: &[(RelKind, String)], kind: RelKind) -> impl Iterator<Item = &str> {
    edges
        .iter()
        .filter(move |(k, _)| *k == kind)
        .map(|(_, r)| r.as_str())
}
