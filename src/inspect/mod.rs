//! TFRecord inspection.
//!
//! Reads a file produced by a conversion back in, checks the framing and
//! the per-record invariants, and summarizes what it contains.

mod report;

pub use report::{InspectReport, LabelCount};

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ConvertError;
use crate::ir::example::{decode_example, ExampleRecord};
use crate::ir::io_tfrecord::open_tfrecord;

/// Inspect a TFRecord file of detection examples.
///
/// # Errors
/// Corrupt framing and records that are not valid `Example` protos abort
/// the inspection. Records whose per-object lists disagree in length are
/// counted in [`InspectReport::inconsistent_records`] instead.
pub fn inspect_tfrecord(path: &Path) -> Result<InspectReport, ConvertError> {
    let mut report = InspectReport::new(path);
    let mut labels: BTreeMap<(i64, String), usize> = BTreeMap::new();

    for (index, bytes) in open_tfrecord(path)?.enumerate() {
        let bytes = bytes?;
        let record = decode_example(&bytes).map_err(|source| ConvertError::RecordDecode {
            path: path.to_path_buf(),
            index,
            source,
        })?;
        accumulate(&mut report, &mut labels, &record);
    }

    let mut entries: Vec<LabelCount> = labels
        .into_iter()
        .map(|((id, text), count)| LabelCount { id, text, count })
        .collect();
    // Count descending, then id ascending for deterministic output
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));
    report.labels = entries;

    Ok(report)
}

fn accumulate(
    report: &mut InspectReport,
    labels: &mut BTreeMap<(i64, String), usize>,
    record: &ExampleRecord,
) {
    report.records += 1;
    report.image_bytes += record.encoded.len() as u64;

    if !record.is_consistent() {
        report.inconsistent_records += 1;
        return;
    }

    let objects = record.object_count();
    report.objects += objects;
    if objects == 0 {
        report.empty_records += 1;
    }

    report.difficult += record.difficult.iter().filter(|&&flag| flag != 0).count();
    report.truncated += record.truncated.iter().filter(|&&flag| flag != 0).count();

    for (id, text) in record.label.iter().zip(&record.label_text) {
        *labels.entry((*id, text.clone())).or_insert(0) += 1;
    }

    let shape = [record.height, record.width, record.channels];
    if !report.shapes.contains(&shape) {
        report.shapes.push(shape);
    }
}
