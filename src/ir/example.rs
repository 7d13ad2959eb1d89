//! `tf.train.Example` records for object detection.
//!
//! The protobuf messages below mirror `tensorflow/core/example/example.proto`
//! and `feature.proto`. The feature map is ordered, so the same example
//! always serializes to the same bytes.
//!
//! # Record schema
//!
//! | key                            | kind        |
//! |--------------------------------|-------------|
//! | `image/height`                 | int64       |
//! | `image/width`                  | int64       |
//! | `image/channels`               | int64       |
//! | `image/shape`                  | int64 × 3   |
//! | `image/object/bbox/xmin`       | float × N   |
//! | `image/object/bbox/xmax`       | float × N   |
//! | `image/object/bbox/ymin`       | float × N   |
//! | `image/object/bbox/ymax`       | float × N   |
//! | `image/object/bbox/label`      | int64 × N   |
//! | `image/object/bbox/label_text` | bytes × N   |
//! | `image/object/bbox/difficult`  | int64 × N   |
//! | `image/object/bbox/truncated`  | int64 × N   |
//! | `image/format`                 | bytes (`JPEG`) |
//! | `image/encoded`                | bytes       |

use std::collections::BTreeMap;

use prost::Message;

use super::{ImageShape, LoadedExample};
use crate::error::ConvertError;

pub const KEY_HEIGHT: &str = "image/height";
pub const KEY_WIDTH: &str = "image/width";
pub const KEY_CHANNELS: &str = "image/channels";
pub const KEY_SHAPE: &str = "image/shape";
pub const KEY_BBOX_XMIN: &str = "image/object/bbox/xmin";
pub const KEY_BBOX_XMAX: &str = "image/object/bbox/xmax";
pub const KEY_BBOX_YMIN: &str = "image/object/bbox/ymin";
pub const KEY_BBOX_YMAX: &str = "image/object/bbox/ymax";
pub const KEY_BBOX_LABEL: &str = "image/object/bbox/label";
pub const KEY_BBOX_LABEL_TEXT: &str = "image/object/bbox/label_text";
pub const KEY_BBOX_DIFFICULT: &str = "image/object/bbox/difficult";
pub const KEY_BBOX_TRUNCATED: &str = "image/object/bbox/truncated";
pub const KEY_FORMAT: &str = "image/format";
pub const KEY_ENCODED: &str = "image/encoded";

/// Value of `image/format` for every record.
pub const IMAGE_FORMAT_JPEG: &str = "JPEG";

// ============================================================================
// Protobuf messages
// ============================================================================

#[derive(Clone, PartialEq, Message)]
pub struct BytesList {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub value: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FloatList {
    #[prost(float, repeated, tag = "1")]
    pub value: Vec<f32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Int64List {
    #[prost(int64, repeated, tag = "1")]
    pub value: Vec<i64>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Feature {
    #[prost(oneof = "feature::Kind", tags = "1, 2, 3")]
    pub kind: Option<feature::Kind>,
}

pub mod feature {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        BytesList(super::BytesList),
        #[prost(message, tag = "2")]
        FloatList(super::FloatList),
        #[prost(message, tag = "3")]
        Int64List(super::Int64List),
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct Features {
    #[prost(btree_map = "string, message", tag = "1")]
    pub feature: BTreeMap<String, Feature>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Example {
    #[prost(message, optional, tag = "1")]
    pub features: Option<Features>,
}

impl Feature {
    pub fn int64s(value: Vec<i64>) -> Self {
        Self {
            kind: Some(feature::Kind::Int64List(Int64List { value })),
        }
    }

    pub fn floats(value: Vec<f32>) -> Self {
        Self {
            kind: Some(feature::Kind::FloatList(FloatList { value })),
        }
    }

    pub fn bytes(value: Vec<Vec<u8>>) -> Self {
        Self {
            kind: Some(feature::Kind::BytesList(BytesList { value })),
        }
    }
}

// ============================================================================
// Detection record
// ============================================================================

/// One image with all its objects, as stored in a record.
///
/// The per-object vectors are parallel: entry `i` of each describes the
/// `i`-th `<object>` of the annotation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExampleRecord {
    pub height: i64,
    pub width: i64,
    pub channels: i64,
    pub shape: Vec<i64>,
    pub xmin: Vec<f32>,
    pub xmax: Vec<f32>,
    pub ymin: Vec<f32>,
    pub ymax: Vec<f32>,
    pub label: Vec<i64>,
    pub label_text: Vec<String>,
    pub difficult: Vec<i64>,
    pub truncated: Vec<i64>,
    pub format: String,
    pub encoded: Vec<u8>,
}

impl ExampleRecord {
    /// Builds the record for a loaded example.
    ///
    /// # Errors
    /// Returns [`ConvertError::BBoxArity`] if a box does not have exactly
    /// four coordinates.
    pub fn from_loaded(loaded: LoadedExample, shape: &ImageShape) -> Result<Self, ConvertError> {
        let [ymin, xmin, ymax, xmax] = transpose_boxes(&loaded.bboxes())?;

        Ok(Self {
            height: i64::from(shape.height),
            width: i64::from(shape.width),
            channels: i64::from(shape.channels),
            shape: shape.to_array().to_vec(),
            xmin,
            xmax,
            ymin,
            ymax,
            label: loaded.labels(),
            label_text: loaded.labels_text(),
            difficult: loaded.difficult(),
            truncated: loaded.truncated(),
            format: IMAGE_FORMAT_JPEG.to_string(),
            encoded: loaded.image_data,
        })
    }

    /// Number of objects in the record.
    pub fn object_count(&self) -> usize {
        self.label.len()
    }

    /// True when every per-object sequence has the same length.
    pub fn is_consistent(&self) -> bool {
        let n = self.object_count();
        [
            self.xmin.len(),
            self.xmax.len(),
            self.ymin.len(),
            self.ymax.len(),
            self.label_text.len(),
            self.difficult.len(),
            self.truncated.len(),
        ]
        .iter()
        .all(|&len| len == n)
    }

    pub fn into_example(self) -> Example {
        let label_text = self
            .label_text
            .into_iter()
            .map(String::into_bytes)
            .collect();

        let feature: BTreeMap<String, Feature> = [
            (KEY_HEIGHT, Feature::int64s(vec![self.height])),
            (KEY_WIDTH, Feature::int64s(vec![self.width])),
            (KEY_CHANNELS, Feature::int64s(vec![self.channels])),
            (KEY_SHAPE, Feature::int64s(self.shape)),
            (KEY_BBOX_XMIN, Feature::floats(self.xmin)),
            (KEY_BBOX_XMAX, Feature::floats(self.xmax)),
            (KEY_BBOX_YMIN, Feature::floats(self.ymin)),
            (KEY_BBOX_YMAX, Feature::floats(self.ymax)),
            (KEY_BBOX_LABEL, Feature::int64s(self.label)),
            (KEY_BBOX_LABEL_TEXT, Feature::bytes(label_text)),
            (KEY_BBOX_DIFFICULT, Feature::int64s(self.difficult)),
            (KEY_BBOX_TRUNCATED, Feature::int64s(self.truncated)),
            (KEY_FORMAT, Feature::bytes(vec![self.format.into_bytes()])),
            (KEY_ENCODED, Feature::bytes(vec![self.encoded])),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();

        Example {
            features: Some(Features { feature }),
        }
    }

    /// Reads a record back out of an `Example`.
    ///
    /// Missing features read as empty (or 0 for scalars); features of the
    /// wrong kind are treated as missing.
    pub fn from_example(example: &Example) -> Self {
        let empty = BTreeMap::new();
        let features = example
            .features
            .as_ref()
            .map_or(&empty, |features| &features.feature);

        let int64s = |key: &str| -> Vec<i64> {
            match features.get(key).and_then(|f| f.kind.as_ref()) {
                Some(feature::Kind::Int64List(list)) => list.value.clone(),
                _ => Vec::new(),
            }
        };
        let floats = |key: &str| -> Vec<f32> {
            match features.get(key).and_then(|f| f.kind.as_ref()) {
                Some(feature::Kind::FloatList(list)) => list.value.clone(),
                _ => Vec::new(),
            }
        };
        let bytes = |key: &str| -> Vec<Vec<u8>> {
            match features.get(key).and_then(|f| f.kind.as_ref()) {
                Some(feature::Kind::BytesList(list)) => list.value.clone(),
                _ => Vec::new(),
            }
        };
        let scalar = |key: &str| int64s(key).first().copied().unwrap_or_default();

        Self {
            height: scalar(KEY_HEIGHT),
            width: scalar(KEY_WIDTH),
            channels: scalar(KEY_CHANNELS),
            shape: int64s(KEY_SHAPE),
            xmin: floats(KEY_BBOX_XMIN),
            xmax: floats(KEY_BBOX_XMAX),
            ymin: floats(KEY_BBOX_YMIN),
            ymax: floats(KEY_BBOX_YMAX),
            label: int64s(KEY_BBOX_LABEL),
            label_text: bytes(KEY_BBOX_LABEL_TEXT)
                .into_iter()
                .map(|raw| String::from_utf8_lossy(&raw).into_owned())
                .collect(),
            difficult: int64s(KEY_BBOX_DIFFICULT),
            truncated: int64s(KEY_BBOX_TRUNCATED),
            format: bytes(KEY_FORMAT)
                .first()
                .map(|raw| String::from_utf8_lossy(raw).into_owned())
                .unwrap_or_default(),
            encoded: bytes(KEY_ENCODED).into_iter().next().unwrap_or_default(),
        }
    }
}

/// Splits per-object `[ymin, xmin, ymax, xmax]` boxes into four parallel
/// sequences, returned in that same order.
pub fn transpose_boxes<B: AsRef<[f32]>>(boxes: &[B]) -> Result<[Vec<f32>; 4], ConvertError> {
    let mut columns: [Vec<f32>; 4] = std::array::from_fn(|_| Vec::with_capacity(boxes.len()));

    for (index, bbox) in boxes.iter().enumerate() {
        let coords = bbox.as_ref();
        if coords.len() != 4 {
            return Err(ConvertError::BBoxArity {
                index,
                len: coords.len(),
            });
        }
        for (column, &value) in columns.iter_mut().zip(coords) {
            column.push(value);
        }
    }

    Ok(columns)
}

/// Serializes a loaded example into the bytes of one `tf.train.Example`.
pub fn encode_example(loaded: LoadedExample, shape: &ImageShape) -> Result<Vec<u8>, ConvertError> {
    let record = ExampleRecord::from_loaded(loaded, shape)?;
    Ok(record.into_example().encode_to_vec())
}

/// Parses the bytes of one `tf.train.Example`.
pub fn decode_example(bytes: &[u8]) -> Result<ExampleRecord, prost::DecodeError> {
    let example = Example::decode(bytes)?;
    Ok(ExampleRecord::from_example(&example))
}
