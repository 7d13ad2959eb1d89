//! Bounding boxes tagged with their coordinate space.

use std::marker::PhantomData;

use super::ImageShape;

/// Marker type for pixel coordinates (absolute values).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker type for coordinates expressed as fractions of the image size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Normalized {}

/// An axis-aligned bounding box in XYXY format (xmin, ymin, xmax, ymax).
///
/// The `TSpace` parameter should be either [`Pixel`] or [`Normalized`],
/// so pixel boxes cannot be written to a record without normalizing first.
///
/// Note: min <= max is NOT enforced. A box with swapped corners in the
/// annotation stays swapped; only range clamping is ever applied.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    /// Creates a new bounding box from explicit coordinates.
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            _space: PhantomData,
        }
    }

    #[inline]
    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    #[inline]
    pub fn ymin(&self) -> f64 {
        self.ymin
    }

    #[inline]
    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    #[inline]
    pub fn ymax(&self) -> f64 {
        self.ymax
    }

    /// Returns true if the box is properly ordered (min <= max for both axes).
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.xmin <= self.xmax && self.ymin <= self.ymax
    }

    /// Coordinates in record order: `[ymin, xmin, ymax, xmax]`.
    #[inline]
    pub fn to_yxyx(&self) -> [f64; 4] {
        [self.ymin, self.xmin, self.ymax, self.xmax]
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.xmin)
            .field("ymin", &self.ymin)
            .field("xmax", &self.xmax)
            .field("ymax", &self.ymax)
            .finish()
    }
}

impl BBoxXYXY<Pixel> {
    /// Returns true if the far edge lies beyond the image.
    ///
    /// Only `xmax`/`ymax` are checked; this is the data-quality signal
    /// reported by the loader before clamping.
    pub fn exceeds(&self, shape: &ImageShape) -> bool {
        self.xmax > f64::from(shape.width) || self.ymax > f64::from(shape.height)
    }

    /// Clamps every coordinate into `[0, width]` (x) or `[0, height]` (y).
    pub fn clamp_to(&self, shape: &ImageShape) -> Self {
        let width = f64::from(shape.width);
        let height = f64::from(shape.height);
        Self::from_xyxy(
            clamp_axis(self.xmin, width),
            clamp_axis(self.ymin, height),
            clamp_axis(self.xmax, width),
            clamp_axis(self.ymax, height),
        )
    }

    /// Converts pixel coordinates to fractions of the image size.
    pub fn to_normalized(&self, shape: &ImageShape) -> BBoxXYXY<Normalized> {
        let width = f64::from(shape.width);
        let height = f64::from(shape.height);
        BBoxXYXY::from_xyxy(
            self.xmin / width,
            self.ymin / height,
            self.xmax / width,
            self.ymax / height,
        )
    }
}

fn clamp_axis(value: f64, limit: f64) -> f64 {
    value.clamp(0.0, limit)
}
