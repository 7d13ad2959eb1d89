//! Fixed image geometry.

use std::fmt;

/// Default height and width, in pixels, that every dataset image is
/// assumed to have been resized to.
pub const DEFAULT_IMAGE_SIDE: u32 = 500;

/// Number of color channels in every encoded image.
pub const RGB_CHANNELS: u32 = 3;

/// The geometry shared by every image of a dataset.
///
/// This is configuration, not something read from the image bytes: box
/// normalization and the record's `image/height`, `image/width` and
/// `image/channels` fields all come from here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageShape {
    pub height: u32,
    pub width: u32,
    pub channels: u32,
}

impl ImageShape {
    /// Creates an RGB shape with the given height and width.
    pub fn new(height: u32, width: u32) -> Self {
        Self {
            height,
            width,
            channels: RGB_CHANNELS,
        }
    }

    /// The shape as `[height, width, channels]`, as stored in `image/shape`.
    pub fn to_array(&self) -> [i64; 3] {
        [
            i64::from(self.height),
            i64::from(self.width),
            i64::from(self.channels),
        ]
    }
}

impl Default for ImageShape {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_SIDE, DEFAULT_IMAGE_SIDE)
    }
}

impl fmt::Display for ImageShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}
