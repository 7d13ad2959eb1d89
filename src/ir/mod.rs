//! Core types and readers/writers for the conversion pipeline.
//!
//! Data flows through three stages:
//!
//! 1. [`io_voc_xml::list_identifiers`] names the examples of a split.
//! 2. [`io_voc_xml::ExampleLoader`] turns one identifier into a
//!    [`LoadedExample`] (image bytes plus normalized, labelled boxes).
//! 3. [`example::encode_example`] turns that into a serialized
//!    `tf.train.Example`, which [`io_tfrecord::TfRecordWriter`] appends to
//!    the output file.
//!
//! # Example
//!
//! ```
//! use bib_tfrecord::ir::{BBoxXYXY, ImageShape, Pixel};
//!
//! let shape = ImageShape::new(500, 500);
//! let raw = BBoxXYXY::<Pixel>::from_xyxy(10.0, 10.0, 600.0, 450.0);
//! let norm = raw.clamp_to(&shape).to_normalized(&shape);
//! assert_eq!(norm.xmax(), 1.0);
//! ```

mod bbox;
pub mod example;
pub mod io_tfrecord;
pub mod io_voc_xml;
mod labels;
mod model;
mod shape;

pub use bbox::{BBoxXYXY, Normalized, Pixel};
pub use labels::{Label, LabelTable};
pub use model::{AnnotatedObject, LoadedExample};
pub use shape::{ImageShape, DEFAULT_IMAGE_SIDE, RGB_CHANNELS};
