//! Inspect report types and terminal formatting.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// The result of inspecting a TFRecord file.
#[derive(Clone, Debug, Default, Serialize)]
pub struct InspectReport {
    pub path: PathBuf,
    /// Total number of records.
    pub records: usize,
    /// Objects across all consistent records.
    pub objects: usize,
    /// Records with no objects.
    pub empty_records: usize,
    /// Records whose per-object lists have different lengths.
    pub inconsistent_records: usize,
    /// Objects with a non-zero difficult flag.
    pub difficult: usize,
    /// Objects with a non-zero truncated flag.
    pub truncated: usize,
    /// Total encoded image bytes.
    pub image_bytes: u64,
    /// Distinct `[height, width, channels]` triples, in first-seen order.
    pub shapes: Vec<[i64; 3]>,
    /// Objects per label, most frequent first.
    pub labels: Vec<LabelCount>,
}

/// Number of objects carrying one label.
#[derive(Clone, Debug, Serialize)]
pub struct LabelCount {
    pub id: i64,
    pub text: String,
    pub count: usize,
}

impl InspectReport {
    pub(crate) fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..Default::default()
        }
    }
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TFRecord: {}", self.path.display())?;
        writeln!(f)?;
        writeln!(f, "Summary")?;
        writeln!(f, "  Records:          {}", self.records)?;
        writeln!(f, "  Objects:          {}", self.objects)?;
        writeln!(f, "  Empty records:    {}", self.empty_records)?;
        writeln!(f, "  Difficult:        {}", self.difficult)?;
        writeln!(f, "  Truncated:        {}", self.truncated)?;
        writeln!(f, "  Image bytes:      {}", self.image_bytes)?;

        if self.inconsistent_records > 0 {
            writeln!(
                f,
                "  Warning: {} record(s) have per-object lists of different lengths",
                self.inconsistent_records
            )?;
        }

        if !self.shapes.is_empty() {
            let shapes: Vec<String> = self
                .shapes
                .iter()
                .map(|[h, w, c]| format!("{h}x{w}x{c}"))
                .collect();
            writeln!(f, "  Shapes:           {}", shapes.join(", "))?;
        }

        writeln!(f)?;
        writeln!(f, "Labels")?;
        if self.labels.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for entry in &self.labels {
            writeln!(f, "  {:>4}  {:<20} {}", entry.id, entry.text, entry.count)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_labels() {
        let report = InspectReport {
            path: PathBuf::from("bib_training.tfrecord"),
            records: 1,
            objects: 2,
            shapes: vec![[500, 500, 3]],
            labels: vec![LabelCount {
                id: 1,
                text: "bib".to_string(),
                count: 2,
            }],
            ..Default::default()
        };

        let text = report.to_string();
        assert!(text.contains("Records:          1"));
        assert!(text.contains("500x500x3"));
        assert!(text.contains("bib"));
        assert!(!text.contains("(none)"));
        assert!(!text.contains("Warning"));
    }
}
