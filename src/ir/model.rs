//! In-memory form of one loaded example (image bytes plus its objects).

use super::bbox::{BBoxXYXY, Normalized};
use super::labels::Label;

/// One `<object>` of an annotation after label lookup and normalization.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatedObject {
    pub label: Label,
    /// Literal `<difficult>` value, 0 when the element is absent or empty.
    pub difficult: i64,
    /// Literal `<truncated>` value, 0 when the element is absent or empty.
    pub truncated: i64,
    /// Clamped box as fractions of the fixed image geometry.
    pub bbox: BBoxXYXY<Normalized>,
}

/// Everything the loader produces for a single identifier.
///
/// Objects are kept in annotation order, so every per-object sequence
/// derived from them has the same length and ordering.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedExample {
    pub identifier: String,
    /// Raw encoded image bytes, exactly as read from disk.
    pub image_data: Vec<u8>,
    pub objects: Vec<AnnotatedObject>,
    /// Boxes whose raw `xmax`/`ymax` extended past the image before clamping.
    pub oversized_boxes: usize,
}

impl LoadedExample {
    /// Normalized boxes as `[ymin, xmin, ymax, xmax]`.
    pub fn bboxes(&self) -> Vec<[f32; 4]> {
        self.objects
            .iter()
            .map(|object| object.bbox.to_yxyx().map(|value| value as f32))
            .collect()
    }

    pub fn labels(&self) -> Vec<i64> {
        self.objects.iter().map(|object| object.label.id).collect()
    }

    pub fn labels_text(&self) -> Vec<String> {
        self.objects
            .iter()
            .map(|object| object.label.text.clone())
            .collect()
    }

    pub fn difficult(&self) -> Vec<i64> {
        self.objects.iter().map(|object| object.difficult).collect()
    }

    pub fn truncated(&self) -> Vec<i64> {
        self.objects.iter().map(|object| object.truncated).collect()
    }
}
