//! Label table: class name to numeric class id.
//!
//! The table is read-only once built and is passed to the loader by
//! reference. Lookups of names that are not in the table fail; there is no
//! fallback class.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConvertError;

/// A resolved label for one annotated object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    /// Numeric class id written to `image/object/bbox/label`.
    pub id: i64,
    /// Text written to `image/object/bbox/label_text` (the class name).
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LabelEntry {
    id: i64,
    description: Option<String>,
}

/// Mapping from annotation `<name>` values to class ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelTable {
    entries: BTreeMap<String, LabelEntry>,
}

/// On-disk entry: either a bare id or `[id, "description"]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLabelEntry {
    Id(i64),
    IdWithDescription(i64, String),
}

impl LabelTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The table used by the bib dataset: background plus a single `bib` class.
    pub fn bib() -> Self {
        let mut table = Self::new();
        table.insert("none", 0, Some("Background"));
        table.insert("bib", 1, Some("Bib"));
        table
    }

    /// Adds or replaces a class.
    pub fn insert(&mut self, name: impl Into<String>, id: i64, description: Option<&str>) {
        self.entries.insert(
            name.into(),
            LabelEntry {
                id,
                description: description.map(ToOwned::to_owned),
            },
        );
    }

    /// Resolves a class name. Matching is exact (case-sensitive, no trimming).
    pub fn lookup(&self, name: &str) -> Option<Label> {
        self.entries.get(name).map(|entry| Label {
            id: entry.id,
            text: name.to_string(),
        })
    }

    /// Human-readable description of a class, if the table carries one.
    pub fn description(&self, name: &str) -> Option<&str> {
        self.entries
            .get(name)
            .and_then(|entry| entry.description.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, id)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.id))
    }

    /// Loads a table from a `.json`, `.yaml` or `.yml` file.
    ///
    /// The top level must be a map of class name to either an integer id or
    /// a two-element `[id, "description"]` list.
    pub fn from_path(path: &Path) -> Result<Self, ConvertError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let raw = fs::read_to_string(path).map_err(ConvertError::Io)?;
        let parsed = match extension.as_str() {
            "json" => Self::from_json_str(&raw),
            "yaml" | "yml" => Self::from_yaml_str(&raw),
            other => {
                return Err(ConvertError::UnsupportedFormat(format!(
                    "label table extension '{other}' (supported: json, yaml, yml)"
                )))
            }
        };

        parsed.map_err(|message| ConvertError::LabelTableParse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parses a JSON label table.
    pub fn from_json_str(raw: &str) -> Result<Self, String> {
        let entries: BTreeMap<String, RawLabelEntry> =
            serde_json::from_str(raw).map_err(|source| source.to_string())?;
        Ok(Self::from_raw(entries))
    }

    /// Parses a YAML label table.
    pub fn from_yaml_str(raw: &str) -> Result<Self, String> {
        let entries: BTreeMap<String, RawLabelEntry> =
            serde_yaml::from_str(raw).map_err(|source| source.to_string())?;
        Ok(Self::from_raw(entries))
    }

    fn from_raw(entries: BTreeMap<String, RawLabelEntry>) -> Self {
        let mut table = Self::new();
        for (name, entry) in entries {
            match entry {
                RawLabelEntry::Id(id) => table.insert(name, id, None),
                RawLabelEntry::IdWithDescription(id, description) => {
                    table.insert(name, id, Some(&description))
                }
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bib_table_resolves_known_names() {
        let table = LabelTable::bib();
        assert_eq!(
            table.lookup("bib"),
            Some(Label {
                id: 1,
                text: "bib".to_string()
            })
        );
        assert_eq!(table.lookup("none").map(|label| label.id), Some(0));
        assert_eq!(table.description("none"), Some("Background"));
    }

    #[test]
    fn lookup_is_exact() {
        let table = LabelTable::bib();
        assert_eq!(table.lookup("Bib"), None);
        assert_eq!(table.lookup(" bib"), None);
        assert_eq!(table.lookup("person"), None);
    }

    #[test]
    fn json_accepts_both_entry_shapes() {
        let table =
            LabelTable::from_json_str(r#"{"bib": 1, "person": [2, "Runner"]}"#).expect("parse");
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("person").map(|label| label.id), Some(2));
        assert_eq!(table.description("person"), Some("Runner"));
        assert_eq!(table.description("bib"), None);
    }

    #[test]
    fn yaml_table_parses() {
        let table = LabelTable::from_yaml_str("none: [0, Background]\nbib: 1\n").expect("parse");
        let pairs: Vec<_> = table.iter().collect();
        assert_eq!(pairs, vec![("bib", 1), ("none", 0)]);
    }

    #[test]
    fn malformed_table_is_rejected() {
        assert!(LabelTable::from_json_str(r#"{"bib": "one"}"#).is_err());
        assert!(LabelTable::from_yaml_str("- bib\n- none\n").is_err());
    }

    #[test]
    fn from_path_dispatches_on_extension() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let json = temp.path().join("labels.json");
        fs::write(&json, r#"{"bib": 7}"#).expect("write json");
        let table = LabelTable::from_path(&json).expect("load json");
        assert_eq!(table.lookup("bib").map(|label| label.id), Some(7));

        let txt = temp.path().join("labels.txt");
        fs::write(&txt, "bib 7").expect("write txt");
        assert!(matches!(
            LabelTable::from_path(&txt),
            Err(ConvertError::UnsupportedFormat(_))
        ));
    }
}
