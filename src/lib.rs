//! bib-tfrecord: Pascal VOC style annotations to TFRecord.
//!
//! Converts one split of an image-annotation dataset (JPEG images plus
//! VOC XML bounding boxes) into a single TFRecord file of
//! `tf.train.Example` records, ready for object-detection training
//! pipelines.
//!
//! # Modules
//!
//! - [`ir`]: Core types, the VOC reader and the record encoder
//! - [`conversion`]: The conversion driver
//! - [`inspect`]: Reading back and summarizing TFRecord output
//! - [`error`]: Error types for bib-tfrecord operations

pub mod conversion;
pub mod error;
pub mod inspect;
pub mod ir;
pub mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::ConvertError;

use conversion::{ConvertOptions, ConvertOutcome, DEFAULT_NAME, DEFAULT_SPLIT};
use ir::{ImageShape, LabelTable, DEFAULT_IMAGE_SIDE};

/// The bib-tfrecord CLI application.
#[derive(Parser)]
#[command(name = "bib-tfrecord")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert one dataset split into a TFRecord file.
    Convert(ConvertArgs),
    /// Summarize the contents of a TFRecord file.
    Inspect(InspectArgs),
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Dataset root containing Annotations/ and JPEGImages/.
    #[arg(long)]
    dataset_dir: PathBuf,

    /// Directory to write <name>_<split>.tfrecord into (created if missing).
    #[arg(long)]
    output_dir: PathBuf,

    /// Output name prefix.
    #[arg(long, default_value = DEFAULT_NAME)]
    name: String,

    /// Dataset split to convert (e.g. 'training', 'validation').
    #[arg(long, default_value = DEFAULT_SPLIT)]
    split: String,

    /// Label table file (.json, .yaml or .yml); defaults to the built-in bib table.
    #[arg(long, env = "BIB_TFRECORD_LABELS")]
    labels: Option<PathBuf>,

    /// Fixed image height, in pixels.
    #[arg(long, default_value_t = DEFAULT_IMAGE_SIDE, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// Fixed image width, in pixels.
    #[arg(long, default_value_t = DEFAULT_IMAGE_SIDE, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// Print a conversion summary when done.
    #[arg(long)]
    report: bool,
}

/// Arguments for the inspect subcommand.
#[derive(clap::Args)]
struct InspectArgs {
    /// TFRecord file to inspect.
    input: PathBuf,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the bib-tfrecord CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), ConvertError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::Inspect(args)) => run_inspect(args),
        None => {
            println!("bib-tfrecord {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Convert VOC style annotations to TFRecord files.");
            println!();
            println!("Run 'bib-tfrecord --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the convert subcommand.
fn run_convert(args: ConvertArgs) -> Result<(), ConvertError> {
    let labels = match &args.labels {
        Some(path) => LabelTable::from_path(path)?,
        None => LabelTable::bib(),
    };

    let opts = ConvertOptions {
        dataset_dir: args.dataset_dir,
        output_dir: args.output_dir,
        name: args.name,
        split: args.split,
        shape: ImageShape::new(args.height, args.width),
        labels,
    };

    match conversion::convert_dataset(&opts)? {
        ConvertOutcome::Completed(report) if args.report => println!("{report}"),
        ConvertOutcome::Completed(_) | ConvertOutcome::Skipped { .. } => {}
    }
    Ok(())
}

/// Execute the inspect subcommand.
fn run_inspect(args: InspectArgs) -> Result<(), ConvertError> {
    let format = args.output.as_str();
    if !matches!(format, "text" | "json") {
        return Err(ConvertError::UnsupportedFormat(format!(
            "'{format}' (supported: text, json)"
        )));
    }

    let report = inspect::inspect_tfrecord(&args.input)?;
    if format == "json" {
        let json = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
        println!("{json}");
    } else {
        print!("{report}");
    }
    Ok(())
}
