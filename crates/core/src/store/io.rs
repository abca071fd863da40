use std::path::Path;

use serde_json::{Map, Value};

use super::person::{Person, Relationships};
use super::Store;
use crate::error::{Result, TreeError};
use crate::types::GENDER_KEY;

impl Store {
    /// Parse a JSON array of person records. Current and legacy record
    /// shapes are both accepted and may be mixed.
    ///
    /// # Errors
    /// Returns an error if the text is not valid JSON or not an array.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        match value {
            Value::Array(records) => Ok(Self::from_records(&records)),
            _ => Err(TreeError::Data(
                "Expected a JSON array of person records".to_string(),
            )),
        }
    }

    /// Read a JSON dataset from a file. See [`Store::from_json_str`].
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Serialize the store back to a pretty-printed JSON array, each record
    /// in the shape it was loaded in.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&Value::Array(self.export()))?)
    }

    /// Read a dataset from a CSV file.
    ///
    /// Expected columns (header required): `id`, and optionally `gender`,
    /// `father`, `mother` and `spouses` (ids separated by `;`). Every other
    /// column is copied into the person's `data` map. Unknown parents are
    /// coded as `"0"`, `""`, or `"NA"`. Parent and spouse links are made on
    /// both records; references to ids not in the file are skipped with a
    /// warning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, the `id` column is
    /// missing, or duplicate ids are found.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.to_lowercase())
            .collect();

        let id_col = headers
            .iter()
            .position(|h| h == "id")
            .ok_or_else(|| TreeError::Data("CSV missing 'id' column".to_string()))?;
        let column = |name: &str| headers.iter().position(|h| h == name);
        let father_col = column("father");
        let mother_col = column("mother");
        let spouses_col = column("spouses");
        let relation_cols = [Some(id_col), father_col, mother_col, spouses_col];

        struct Row {
            id: String,
            father: Option<String>,
            mother: Option<String>,
            spouses: Vec<String>,
        }

        // First pass: register all persons so links can be made regardless
        // of row order.
        let mut store = Store::new();
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let field = |col: Option<usize>| col.and_then(|c| record.get(c)).unwrap_or("");

            let id = field(Some(id_col)).to_string();
            if id.is_empty() {
                return Err(TreeError::Data("Row with empty id".to_string()));
            }
            if store.contains(&id) {
                return Err(TreeError::DuplicateId(id));
            }

            let mut data = Map::new();
            for (c, name) in headers.iter().enumerate() {
                if relation_cols.contains(&Some(c)) {
                    continue;
                }
                let value = record.get(c).unwrap_or("");
                if name == GENDER_KEY || !value.is_empty() {
                    data.insert(name.clone(), Value::String(value.to_string()));
                }
            }

            let spouses = field(spouses_col)
                .split(';')
                .filter_map(parse_relative)
                .collect();
            rows.push(Row {
                id: id.clone(),
                father: parse_relative(field(father_col)),
                mother: parse_relative(field(mother_col)),
                spouses,
            });
            store
                .persons
                .insert(id.clone(), Person::from_parts(id, data, Relationships::default()));
        }

        // Second pass: link relatives.
        for row in &rows {
            for parent in row.father.iter().chain(row.mother.iter()) {
                if let Err(e) = store.link_parent_child(parent, &row.id) {
                    log::warn!("{}: skipping parent link for '{}': {}", path.display(), row.id, e);
                }
            }
            for spouse in &row.spouses {
                if let Err(e) = store.link_spouses(&row.id, spouse) {
                    log::warn!("{}: skipping spouse link for '{}': {}", path.display(), row.id, e);
                }
            }
        }

        Ok(store)
    }
}

/// Parse a relative id, returning `None` for unknown relatives.
///
/// Unknown relatives are coded as `"0"`, `""`, `"NA"`, or `"na"`.
fn parse_relative(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "0" || trimmed.eq_ignore_ascii_case("na") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Gender;
    use std::io::Write;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    /// Helper: write content to a temporary file and return the path.
    fn write_temp(content: &str, ext: &str) -> std::path::PathBuf {
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        let file_name = format!("test_store_{}_{}.{}", std::process::id(), id, ext);
        let path = std::env::temp_dir().join(file_name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_from_csv_links_both_sides() {
        let csv = "id,gender,father,mother,spouses,first name\n\
                   1,M,0,0,2,John\n\
                   2,F,NA,,1,Jane\n\
                   3,F,1,2,,Ann\n";
        let path = write_temp(csv, "csv");
        let store = Store::from_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(store.len(), 3);
        let john = store.get_datum("1").unwrap();
        assert_eq!(john.gender(), Some(Gender::Male));
        assert_eq!(john.data["first name"], "John");
        assert_eq!(john.rels.spouses(), &["2".to_string()]);
        assert_eq!(john.rels.children(), &["3".to_string()]);

        let ann = store.get_datum("3").unwrap();
        assert_eq!(ann.rels.parents(), &["1".to_string(), "2".to_string()]);
        assert!(store.validate().is_empty());
    }

    #[test]
    fn test_from_csv_skips_unknown_relatives() {
        let csv = "id,gender,father,mother\nA,M,,\nB,F,A,ghost\n";
        let path = write_temp(csv, "csv");
        let store = Store::from_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(store.get_datum("B").unwrap().rels.parents(), &["A".to_string()]);
    }

    #[test]
    fn test_from_csv_duplicate_id() {
        let path = write_temp("id,gender\n1,M\n1,F\n", "csv");
        let result = Store::from_csv(&path);
        std::fs::remove_file(&path).ok();
        let msg = format!("{}", result.unwrap_err());
        assert!(msg.contains("Duplicate"), "Error was: {}", msg);
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        let result = Store::from_json_str(r#"{"id": "1"}"#);
        assert!(matches!(result, Err(TreeError::Data(_))));
        assert!(matches!(Store::from_json_str("[1,"), Err(TreeError::Json(_))));
    }

    #[test]
    fn test_json_file_round_trip() {
        let json = r#"[
            {"id": "1", "data": {"gender": "M"}, "rels": {"father": "2", "spouses": [], "children": []}},
            {"id": "2", "data": {"gender": "M"}, "rels": {"parents": [], "spouses": [], "children": ["1"]}}
        ]"#;
        let path = write_temp(json, "json");
        let store = Store::from_json_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let out: Value = serde_json::from_str(&store.to_json_string().unwrap()).unwrap();
        let original: Value = serde_json::from_str(json).unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn test_parse_relative_variants() {
        assert_eq!(parse_relative("0"), None);
        assert_eq!(parse_relative(""), None);
        assert_eq!(parse_relative("  "), None);
        assert_eq!(parse_relative("NA"), None);
        assert_eq!(parse_relative("na"), None);
        assert_eq!(parse_relative("7"), Some("7".to_string()));
        assert_eq!(parse_relative(" Ida "), Some("Ida".to_string()));
    }
}
