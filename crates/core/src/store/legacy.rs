//! Conversion between the legacy `father`/`mother` record shape and the
//! current `parents` list shape.
//!
//! Normalization never fails: records without a usable id are skipped,
//! relationship fields that cannot be read as ids are treated as absent.
//! Each person remembers the shape it arrived in, which optional keys it
//! carried and which of its ids were JSON integers, so that
//! [`export_person`] can write it back the same way.

use serde_json::{Map, Value};

use super::person::{Person, RelKind, Relationships};
use crate::types::Gender;

/// The relationship shape a record was loaded in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RelShape {
    /// `rels.parents` list.
    Current,
    /// Singular `rels.father` / `rels.mother` ids. The ids that occupied
    /// each slot on load are kept so export puts them back in place.
    Legacy {
        father: Option<String>,
        mother: Option<String>,
    },
    /// No parent key at all (founders look like this in either shape), or
    /// a record built in code. Export follows the dataset's shape.
    #[default]
    Unspecified,
}

/// Keys a loaded record carried besides `id` and its parent fields.
///
/// Records built in code carry every key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    pub(crate) parents: bool,
    pub(crate) data: bool,
    pub(crate) rels: bool,
    pub(crate) spouses: bool,
    pub(crate) children: bool,
    /// Ids (own or relative) that were written as JSON integers.
    pub(crate) numeric_ids: Vec<String>,
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self {
            parents: true,
            data: true,
            rels: true,
            spouses: true,
            children: true,
            numeric_ids: Vec::new(),
        }
    }
}

impl RecordLayout {
    fn id_value(&self, id: &str) -> Value {
        if self.numeric_ids.iter().any(|n| n == id) {
            if let Ok(n) = id.parse::<i64>() {
                return Value::from(n);
            }
            if let Ok(n) = id.parse::<u64>() {
                return Value::from(n);
            }
        }
        Value::String(id.to_string())
    }

    fn id_array(&self, ids: &[String]) -> Value {
        Value::Array(ids.iter().map(|id| self.id_value(id)).collect())
    }
}

/// Overall shape of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetShape {
    Current,
    Legacy,
    Mixed,
}

/// Summarize the shapes of a set of records. Records without parent keys
/// fit either shape and are not counted; a dataset with no shaped record
/// counts as current.
pub fn dataset_shape<'a>(persons: impl IntoIterator<Item = &'a Person>) -> DatasetShape {
    let (mut current, mut legacy) = (false, false);
    for p in persons {
        match p.shape() {
            RelShape::Current => current = true,
            RelShape::Legacy { .. } => legacy = true,
            RelShape::Unspecified => {}
        }
    }
    match (current, legacy) {
        (_, false) => DatasetShape::Current,
        (false, true) => DatasetShape::Legacy,
        (true, true) => DatasetShape::Mixed,
    }
}

/// Convert raw JSON records (current or legacy shape, auto-detected per
/// record) into [`Person`]s with a `parents` list.
pub fn normalize_to_current(records: &[Value]) -> Vec<Person> {
    records
        .iter()
        .enumerate()
        .filter_map(|(i, rec)| {
            let person = normalize_record(rec);
            if person.is_none() {
                log::warn!("Skipping record {} without a usable id", i);
            }
            person
        })
        .collect()
}

fn normalize_record(record: &Value) -> Option<Person> {
    let obj = record.as_object()?;
    let raw_id = obj.get("id")?;
    let id = parse_id(raw_id)?;

    let mut numeric_ids: Vec<String> = Vec::new();
    let mut note_numeric = |value: &Value| {
        if value.is_number() {
            if let Some(n) = parse_id(value) {
                if !numeric_ids.contains(&n) {
                    numeric_ids.push(n);
                }
            }
        }
    };
    note_numeric(raw_id);

    let data = match obj.get("data") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    let empty = Map::new();
    let rels_obj = obj.get("rels").and_then(Value::as_object).unwrap_or(&empty);
    for value in rels_obj.values() {
        match value {
            Value::Array(items) => items.iter().for_each(&mut note_numeric),
            other => note_numeric(other),
        }
    }

    let spouses = parse_id_list(rels_obj.get("spouses"));
    let children = parse_id_list(rels_obj.get("children"));

    let (parents, shape) = if rels_obj.contains_key("parents") {
        (parse_id_list(rels_obj.get("parents")), RelShape::Current)
    } else if rels_obj.contains_key("father") || rels_obj.contains_key("mother") {
        let father = rels_obj.get("father").and_then(parse_id);
        let mother = rels_obj.get("mother").and_then(parse_id);
        let mut parents: Vec<String> = Vec::with_capacity(2);
        for p in father.iter().chain(mother.iter()) {
            if !parents.contains(p) {
                parents.push(p.clone());
            }
        }
        (parents, RelShape::Legacy { father, mother })
    } else {
        (Vec::new(), RelShape::Unspecified)
    };

    let layout = RecordLayout {
        parents: shape != RelShape::Unspecified,
        data: obj.contains_key("data"),
        rels: obj.contains_key("rels"),
        spouses: rels_obj.contains_key("spouses"),
        children: rels_obj.contains_key("children"),
        numeric_ids,
    };

    let mut person = Person::from_parts(id, data, Relationships::new(parents, spouses, children));
    person.shape = shape;
    person.layout = layout;
    Some(person)
}

/// Read an id from a JSON value. Strings are taken as-is (empty means
/// absent), integers are stringified, everything else is absent.
fn parse_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

fn parse_id_list(value: Option<&Value>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    if let Some(Value::Array(items)) = value {
        for id in items.iter().filter_map(parse_id) {
            if !out.contains(&id) {
                out.push(id);
            }
        }
    }
    out
}

/// Write a person back out in the shape it was loaded in.
///
/// For legacy records, parents that still match the original father/mother
/// ids keep their slot. Parents linked after load fill the free slot that
/// matches their gender (looked up through `gender_of`), otherwise the first
/// free slot. Records without a shape of their own follow `dataset`: legacy
/// slots in a legacy dataset, a `parents` list otherwise. A record loaded
/// without parent keys gets them back only once it has parents.
///
/// Optional keys (`data`, `rels`, `spouses`, `children`) the record arrived
/// without are left out again unless they have gained content, and ids that
/// were JSON integers are written as integers.
pub fn export_person(
    person: &Person,
    dataset: DatasetShape,
    gender_of: &dyn Fn(&str) -> Option<Gender>,
) -> Value {
    let layout = &person.layout;
    let mut out = Map::new();
    out.insert("id".to_string(), layout.id_value(&person.id));
    if layout.data || !person.data.is_empty() {
        out.insert("data".to_string(), Value::Object(person.data.clone()));
    }

    let mut rels = Map::new();
    let parents = person.rels.parents();
    match &person.shape {
        RelShape::Current => {
            rels.insert("parents".to_string(), layout.id_array(parents));
        }
        RelShape::Unspecified if dataset == DatasetShape::Legacy => {
            write_legacy_parents(person, &None, &None, gender_of, &mut rels)
        }
        RelShape::Unspecified if layout.parents || !parents.is_empty() => {
            rels.insert("parents".to_string(), layout.id_array(parents));
        }
        RelShape::Unspecified => {}
        RelShape::Legacy { father, mother } => {
            write_legacy_parents(person, father, mother, gender_of, &mut rels)
        }
    }

    let spouses = person.rels.list(RelKind::Spouse);
    if layout.spouses || !spouses.is_empty() {
        rels.insert("spouses".to_string(), layout.id_array(spouses));
    }
    let children = person.rels.list(RelKind::Child);
    if layout.children || !children.is_empty() {
        rels.insert("children".to_string(), layout.id_array(children));
    }
    if layout.rels || !rels.is_empty() {
        out.insert("rels".to_string(), Value::Object(rels));
    }

    Value::Object(out)
}

fn write_legacy_parents(
    person: &Person,
    father: &Option<String>,
    mother: &Option<String>,
    gender_of: &dyn Fn(&str) -> Option<Gender>,
    rels: &mut Map<String, Value>,
) {
    let parents = person.rels.parents();
    let keep = |slot: &Option<String>| slot.clone().filter(|id| parents.contains(id));
    let mut father_slot = keep(father);
    let mut mother_slot = keep(mother);

    for p in parents {
        if father_slot.as_ref() == Some(p) || mother_slot.as_ref() == Some(p) {
            continue;
        }
        let slot = match gender_of(p.as_str()) {
            Some(Gender::Male) if father_slot.is_none() => &mut father_slot,
            Some(Gender::Female) if mother_slot.is_none() => &mut mother_slot,
            _ if father_slot.is_none() => &mut father_slot,
            _ if mother_slot.is_none() => &mut mother_slot,
            _ => {
                log::warn!(
                    "Person '{}': parent '{}' has no free legacy slot and is not exported",
                    person.id,
                    p
                );
                continue;
            }
        };
        *slot = Some(p.clone());
    }

    if let Some(f) = father_slot {
        rels.insert("father".to_string(), person.layout.id_value(&f));
    }
    if let Some(m) = mother_slot {
        rels.insert("mother".to_string(), person.layout.id_value(&m));
    }
}
