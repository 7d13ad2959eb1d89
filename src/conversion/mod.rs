//! Conversion driver: one dataset split in, one TFRecord file out.
//!
//! A run enumerates the split's identifiers, loads and encodes each one in
//! order, and appends the records to `<output_dir>/<name>_<split>.tfrecord`.
//!
//! Records are first written to a `.partial` sibling that is renamed into
//! place only after every identifier succeeded. The final file therefore
//! exists only for complete runs, and its presence is what makes a re-run
//! a no-op. A failed run removes the partial file and leaves nothing behind.

pub mod report;

pub use report::ConversionReport;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::ConvertError;
use crate::ir::example::encode_example;
use crate::ir::io_tfrecord::TfRecordWriter;
use crate::ir::io_voc_xml::{list_identifiers, ExampleLoader, VocLayout, TRAINING_SPLIT};
use crate::ir::{ImageShape, LabelTable};

/// Output name used when none is given.
pub const DEFAULT_NAME: &str = "bib";
/// Split converted when none is given.
pub const DEFAULT_SPLIT: &str = TRAINING_SPLIT;

const TFRECORD_EXTENSION: &str = "tfrecord";
const PARTIAL_SUFFIX: &str = "partial";

/// Everything a conversion run needs.
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    /// Dataset root containing `Annotations/` and `JPEGImages/`.
    pub dataset_dir: PathBuf,
    /// Directory the TFRecord file is written to; created if missing.
    pub output_dir: PathBuf,
    pub name: String,
    pub split: String,
    /// Geometry every image is assumed to have.
    pub shape: ImageShape,
    pub labels: LabelTable,
}

impl ConvertOptions {
    /// Options with the default name, split, geometry and bib label table.
    pub fn new(dataset_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            dataset_dir: dataset_dir.into(),
            output_dir: output_dir.into(),
            name: DEFAULT_NAME.to_string(),
            split: DEFAULT_SPLIT.to_string(),
            shape: ImageShape::default(),
            labels: LabelTable::bib(),
        }
    }

    /// `<output_dir>/<name>_<split>.tfrecord`
    pub fn output_path(&self) -> PathBuf {
        output_filename(&self.output_dir, &self.split, &self.name)
    }
}

/// How a run ended.
#[derive(Clone, Debug)]
pub enum ConvertOutcome {
    /// The output file already existed; nothing was read or written.
    Skipped { output: PathBuf },
    Completed(ConversionReport),
}

/// Path of the TFRecord file for a `(name, split)` pair.
pub fn output_filename(output_dir: &Path, split: &str, name: &str) -> PathBuf {
    output_dir.join(format!("{name}_{split}.{TFRECORD_EXTENSION}"))
}

/// Runs a conversion, printing progress to stdout.
pub fn convert_dataset(opts: &ConvertOptions) -> Result<ConvertOutcome, ConvertError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_conversion(opts, &mut out)
}

/// Runs a conversion, writing progress and status lines to `progress`.
///
/// # Errors
/// The first failing identifier aborts the run; no output file is left.
pub fn run_conversion<P: Write>(
    opts: &ConvertOptions,
    progress: &mut P,
) -> Result<ConvertOutcome, ConvertError> {
    fs::create_dir_all(&opts.output_dir).map_err(ConvertError::Io)?;

    let output = opts.output_path();
    if output.exists() {
        tracing::info!(output = %output.display(), "output already exists; skipping");
        writeln!(
            progress,
            "Dataset files already exist. Exiting without re-creating them."
        )?;
        return Ok(ConvertOutcome::Skipped { output });
    }

    let layout = VocLayout::new(&opts.dataset_dir);
    let identifiers = list_identifiers(&layout, &opts.split)?;
    tracing::info!(
        split = %opts.split,
        examples = identifiers.len(),
        output = %output.display(),
        "converting split"
    );

    let (partial, file) = PartialOutput::create(&output)?;
    let mut writer = TfRecordWriter::new(BufWriter::new(file));
    let loader = ExampleLoader::new(&layout, &opts.split, opts.shape, &opts.labels);
    let mut report = ConversionReport::new(&opts.name, &opts.split, output.clone());

    let total = identifiers.len();
    for (i, identifier) in identifiers.iter().enumerate() {
        write!(progress, "\r>> Converting image {}/{}", i + 1, total)?;
        progress.flush()?;

        let loaded = loader.load(identifier)?;
        report.objects += loaded.objects.len();
        report.oversized_boxes += loaded.oversized_boxes;
        report.image_bytes += loaded.image_data.len() as u64;

        let bytes = encode_example(loaded, &opts.shape)?;
        writer.write_record(&bytes)?;
    }
    report.records = writer.records_written() as usize;

    let file = writer
        .into_inner()
        .into_inner()
        .map_err(io::IntoInnerError::into_error)?;
    file.sync_all()?;
    drop(file);
    partial.commit(&output)?;

    writeln!(progress)?;
    writeln!(progress, "Finished converting the {} dataset!", opts.name)?;
    tracing::info!(
        records = report.records,
        objects = report.objects,
        oversized_boxes = report.oversized_boxes,
        "conversion finished"
    );

    Ok(ConvertOutcome::Completed(report))
}

/// A `<target>.partial` file that is deleted on drop unless committed.
#[derive(Debug)]
struct PartialOutput {
    path: PathBuf,
    committed: bool,
}

impl PartialOutput {
    /// Creates (or truncates) the partial file next to `target`.
    fn create(target: &Path) -> Result<(Self, File), ConvertError> {
        let mut name = target.as_os_str().to_owned();
        name.push(".");
        name.push(PARTIAL_SUFFIX);
        let path = PathBuf::from(name);

        let file = File::create(&path).map_err(ConvertError::Io)?;
        let partial = Self {
            path,
            committed: false,
        };
        Ok((partial, file))
    }

    fn commit(mut self, target: &Path) -> Result<(), ConvertError> {
        fs::rename(&self.path, target).map_err(ConvertError::Io)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialOutput {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(err) = fs::remove_file(&self.path) {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to remove partial output");
            }
        }
    }
}
