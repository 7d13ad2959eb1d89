//! Summary of a finished conversion run.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Counts gathered while converting one split.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// Output name (the `bib` in `bib_training.tfrecord`).
    pub name: String,
    /// Dataset split that was converted.
    pub split: String,
    /// Final TFRecord path.
    pub output: PathBuf,
    /// Records written (one per identifier).
    pub records: usize,
    /// Objects written across all records.
    pub objects: usize,
    /// Boxes that extended past the fixed image geometry and were clamped.
    pub oversized_boxes: usize,
    /// Bytes of encoded image data embedded in the records.
    pub image_bytes: u64,
}

impl ConversionReport {
    pub fn new(name: impl Into<String>, split: impl Into<String>, output: PathBuf) -> Self {
        Self {
            name: name.into(),
            split: split.into(),
            output,
            ..Default::default()
        }
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Converted '{}' split '{}':", self.name, self.split)?;
        writeln!(
            f,
            "  {} record(s), {} object(s), {} image byte(s)",
            self.records, self.objects, self.image_bytes
        )?;
        if self.oversized_boxes > 0 {
            writeln!(
                f,
                "  {} box(es) extended past the image and were clamped",
                self.oversized_boxes
            )?;
        }
        write!(f, "  output: {}", self.output.display())
    }
}
