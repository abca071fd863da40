use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::legacy::{RecordLayout, RelShape};
use crate::types::{Gender, GENDER_KEY};

/// The three kinds of edge a person record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelKind {
    Parent,
    Spouse,
    Child,
}

impl RelKind {
    /// The kind the other endpoint must list back: a parent's record lists
    /// the child under `children`, spouses list each other as spouses.
    pub fn inverse(self) -> Self {
        match self {
            RelKind::Parent => RelKind::Child,
            RelKind::Child => RelKind::Parent,
            RelKind::Spouse => RelKind::Spouse,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelKind::Parent => "parent",
            RelKind::Spouse => "spouse",
            RelKind::Child => "child",
        }
    }
}

/// Ordered relationship lists of a person.
///
/// The lists can be read freely, but outside this crate they can only be
/// changed through the [`crate::store::Store`] link operations, which keep
/// both endpoints of an edge in step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationships {
    #[serde(default)]
    parents: Vec<String>,
    #[serde(default)]
    spouses: Vec<String>,
    #[serde(default)]
    children: Vec<String>,
}

impl Relationships {
    pub fn new(parents: Vec<String>, spouses: Vec<String>, children: Vec<String>) -> Self {
        Self {
            parents,
            spouses,
            children,
        }
    }

    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    pub fn spouses(&self) -> &[String] {
        &self.spouses
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn list(&self, kind: RelKind) -> &[String] {
        match kind {
            RelKind::Parent => &self.parents,
            RelKind::Spouse => &self.spouses,
            RelKind::Child => &self.children,
        }
    }

    pub(crate) fn list_mut(&mut self, kind: RelKind) -> &mut Vec<String> {
        match kind {
            RelKind::Parent => &mut self.parents,
            RelKind::Spouse => &mut self.spouses,
            RelKind::Child => &mut self.children,
        }
    }

    pub fn contains(&self, kind: RelKind, id: &str) -> bool {
        self.list(kind).iter().any(|r| r == id)
    }

    /// Append `id` to the `kind` list unless it is already present.
    pub(crate) fn insert(&mut self, kind: RelKind, id: &str) -> bool {
        if self.contains(kind, id) {
            return false;
        }
        self.list_mut(kind).push(id.to_string());
        true
    }

    /// Drop `id` from every list. Returns whether anything was removed.
    pub(crate) fn remove_all(&mut self, id: &str) -> bool {
        let before = self.len();
        self.parents.retain(|r| r != id);
        self.spouses.retain(|r| r != id);
        self.children.retain(|r| r != id);
        before != self.len()
    }

    /// Every relative id paired with its edge kind, parents first.
    pub fn iter(&self) -> impl Iterator<Item = (RelKind, &str)> {
        self.parents
            .iter()
            .map(|r| (RelKind::Parent, r.as_str()))
            .chain(self.spouses.iter().map(|r| (RelKind::Spouse, r.as_str())))
            .chain(self.children.iter().map(|r| (RelKind::Child, r.as_str())))
    }

    pub fn len(&self) -> usize {
        self.parents.len() + self.spouses.len() + self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A person record: an id, an open attribute map and relationship lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub rels: Relationships,
    /// Relationship shape the record was loaded in, used on export.
    #[serde(skip)]
    pub(crate) shape: RelShape,
    /// Optional keys and integer ids of the loaded record, used on export.
    #[serde(skip)]
    pub(crate) layout: RecordLayout,
}

impl Person {
    /// Create a person with the given gender and no relatives.
    pub fn new(id: impl Into<String>, gender: Gender) -> Self {
        let mut data = Map::new();
        data.insert(GENDER_KEY.to_string(), Value::String(gender.code().to_string()));
        Self {
            id: id.into(),
            data,
            rels: Relationships::default(),
            shape: RelShape::Unspecified,
            layout: RecordLayout::default(),
        }
    }

    /// Create a person from raw parts without checking anything.
    pub fn from_parts(id: impl Into<String>, data: Map<String, Value>, rels: Relationships) -> Self {
        Self {
            id: id.into(),
            data,
            rels,
            shape: RelShape::Unspecified,
            layout: RecordLayout::default(),
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn with_parents<S: AsRef<str>>(mut self, ids: &[S]) -> Self {
        for id in ids {
            self.rels.insert(RelKind::Parent, id.as_ref());
        }
        self
    }

    pub fn with_spouses<S: AsRef<str>>(mut self, ids: &[S]) -> Self {
        for id in ids {
            self.rels.insert(RelKind::Spouse, id.as_ref());
        }
        self
    }

    pub fn with_children<S: AsRef<str>>(mut self, ids: &[S]) -> Self {
        for id in ids {
            self.rels.insert(RelKind::Child, id.as_ref());
        }
        self
    }

    /// The parsed gender, or `None` if missing or not one of `M`/`F`.
    pub fn gender(&self) -> Option<Gender> {
        self.data
            .get(GENDER_KEY)
            .and_then(Value::as_str)
            .and_then(Gender::from_code)
    }

    pub fn shape(&self) -> &RelShape {
        &self.shape
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self.shape, RelShape::Legacy { .. })
    }
}
