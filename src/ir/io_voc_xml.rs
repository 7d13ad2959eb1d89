//! Pascal VOC style dataset reader.
//!
//! The dataset is split into named partitions, each with its own
//! sub-directory:
//!
//! ```text
//! <root>/Annotations/<split>/<identifier>.xml
//! <root>/JPEGImages/<split>/<identifier>.jpg            (any split but training)
//! <root>/JPEGImages/training/<prefix>/<identifier>.jpg  (prefix = identifier up to the first '-')
//! ```
//!
//! Only the `<object>` elements of an annotation are read; `<size>` and
//! `<filename>` are ignored because box normalization uses the configured
//! [`ImageShape`] rather than per-image dimensions.

use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Node;
use walkdir::WalkDir;

use super::model::{AnnotatedObject, LoadedExample};
use super::{BBoxXYXY, ImageShape, LabelTable, Pixel};
use crate::error::ConvertError;

/// Split whose images are grouped into per-prefix sub-directories.
pub const TRAINING_SPLIT: &str = "training";

const ANNOTATIONS_DIR: &str = "Annotations";
const JPEG_IMAGES_DIR: &str = "JPEGImages";
const VOC_XML_EXTENSION: &str = "xml";
const JPEG_EXTENSION: &str = "jpg";

/// Path conventions of a dataset root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VocLayout {
    root: PathBuf,
}

impl VocLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/Annotations/<split>`
    pub fn annotations_dir(&self, split: &str) -> PathBuf {
        self.root.join(ANNOTATIONS_DIR).join(split)
    }

    /// `<root>/Annotations/<split>/<identifier>.xml`
    pub fn annotation_path(&self, split: &str, identifier: &str) -> PathBuf {
        self.annotations_dir(split)
            .join(format!("{identifier}.{VOC_XML_EXTENSION}"))
    }

    /// Image path for an identifier; training images live one level deeper.
    pub fn image_path(&self, split: &str, identifier: &str) -> PathBuf {
        let mut path = self.root.join(JPEG_IMAGES_DIR).join(split);
        if split == TRAINING_SPLIT {
            path.push(training_prefix(identifier));
        }
        path.join(format!("{identifier}.{JPEG_EXTENSION}"))
    }
}

/// Sub-directory of a training identifier: everything before the first `-`,
/// or the whole identifier when it has none.
pub fn training_prefix(identifier: &str) -> &str {
    identifier
        .split_once('-')
        .map_or(identifier, |(prefix, _)| prefix)
}

/// Lists the identifiers of a split, sorted by file name.
///
/// Every regular `.xml` file directly inside `Annotations/<split>` yields one
/// identifier: its file name without the extension, so that
/// [`VocLayout::annotation_path`] resolves back to the same file. Nested
/// directories and other files are ignored.
pub fn list_identifiers(layout: &VocLayout, split: &str) -> Result<Vec<String>, ConvertError> {
    let dir = layout.annotations_dir(split);
    if !dir.is_dir() {
        return Err(ConvertError::DatasetLayout {
            path: dir,
            message: format!("annotation directory for split '{split}' not found"),
        });
    }

    let mut identifiers = Vec::new();
    for entry in WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ConvertError::DatasetLayout {
            path: dir.clone(),
            message: format!("failed while listing annotations: {source}"),
        })?;

        if !entry.file_type().is_file() || !has_xml_extension(entry.path()) {
            continue;
        }

        let Some(identifier) = entry.path().file_stem().and_then(|stem| stem.to_str()) else {
            tracing::debug!(file = %entry.path().display(), "skipping annotation with non UTF-8 name");
            continue;
        };
        identifiers.push(identifier.to_string());
    }

    Ok(identifiers)
}

/// Loads one example: image bytes plus its resolved, normalized objects.
#[derive(Clone, Copy, Debug)]
pub struct ExampleLoader<'a> {
    layout: &'a VocLayout,
    split: &'a str,
    shape: ImageShape,
    labels: &'a LabelTable,
}

impl<'a> ExampleLoader<'a> {
    pub fn new(
        layout: &'a VocLayout,
        split: &'a str,
        shape: ImageShape,
        labels: &'a LabelTable,
    ) -> Self {
        Self {
            layout,
            split,
            shape,
            labels,
        }
    }

    /// Reads the image and annotation for `identifier`.
    ///
    /// # Errors
    /// Missing image or annotation files, malformed XML and object names
    /// absent from the label table are all fatal.
    pub fn load(&self, identifier: &str) -> Result<LoadedExample, ConvertError> {
        let image_path = self.layout.image_path(self.split, identifier);
        let image_data = fs::read(&image_path).map_err(|source| ConvertError::ImageRead {
            path: image_path,
            source,
        })?;

        let xml_path = self.layout.annotation_path(self.split, identifier);
        let xml = fs::read_to_string(&xml_path).map_err(|source| ConvertError::AnnotationRead {
            path: xml_path.clone(),
            source,
        })?;
        let parsed = parse_voc_xml_str(&xml, &xml_path)?;

        let mut objects = Vec::with_capacity(parsed.len());
        let mut oversized_boxes = 0;
        for object in parsed {
            let label = self
                .labels
                .lookup(&object.name)
                .ok_or_else(|| ConvertError::LabelNotFound {
                    name: object.name.clone(),
                    path: xml_path.clone(),
                })?;

            if object.bbox.exceeds(&self.shape) {
                oversized_boxes += 1;
                tracing::warn!(
                    identifier,
                    xmax = object.bbox.xmax(),
                    ymax = object.bbox.ymax(),
                    shape = %self.shape,
                    "bounding box extends past the image; clamping"
                );
            }

            objects.push(AnnotatedObject {
                label,
                difficult: object.difficult,
                truncated: object.truncated,
                bbox: object.bbox.clamp_to(&self.shape).to_normalized(&self.shape),
            });
        }

        Ok(LoadedExample {
            identifier: identifier.to_string(),
            image_data,
            objects,
            oversized_boxes,
        })
    }
}

/// Parse VOC XML from a UTF-8 string.
///
/// This helper is primarily useful for testing/fuzzing parse behavior in-memory.
pub fn from_voc_xml_str(xml: &str) -> Result<(), ConvertError> {
    parse_voc_xml_str(xml, Path::new("<memory>"))?;
    Ok(())
}

/// Parse VOC XML from bytes.
///
/// The input must be valid UTF-8.
pub fn from_voc_xml_slice(bytes: &[u8]) -> Result<(), ConvertError> {
    let xml = std::str::from_utf8(bytes).map_err(|source| ConvertError::AnnotationParse {
        path: PathBuf::from("<memory>"),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    from_voc_xml_str(xml)
}

/// An `<object>` as written in the file, before label lookup and clamping.
#[derive(Debug)]
struct ParsedVocObject {
    name: String,
    difficult: i64,
    truncated: i64,
    bbox: BBoxXYXY<Pixel>,
}

fn parse_voc_xml_str(xml: &str, path: &Path) -> Result<Vec<ParsedVocObject>, ConvertError> {
    let document =
        roxmltree::Document::parse(xml).map_err(|source| ConvertError::AnnotationParse {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

    let annotation = document.root_element();
    if annotation.tag_name().name() != "annotation" {
        return Err(ConvertError::AnnotationParse {
            path: path.to_path_buf(),
            message: "missing <annotation> root element".to_string(),
        });
    }

    let mut objects = Vec::new();
    for object in annotation
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "object")
    {
        let name = required_child_text(object, "name", path, "<object>")?;
        let difficult = parse_optional_flag(object, "difficult", path)?;
        let truncated = parse_optional_flag(object, "truncated", path)?;

        let bndbox = required_child_element(object, "bndbox", path, "<object>")?;
        let xmin = parse_required_f64(bndbox, "xmin", path, "<bndbox>")?;
        let ymin = parse_required_f64(bndbox, "ymin", path, "<bndbox>")?;
        let xmax = parse_required_f64(bndbox, "xmax", path, "<bndbox>")?;
        let ymax = parse_required_f64(bndbox, "ymax", path, "<bndbox>")?;

        objects.push(ParsedVocObject {
            name,
            difficult,
            truncated,
            bbox: BBoxXYXY::from_xyxy(xmin, ymin, xmax, ymax),
        });
    }

    Ok(objects)
}

/// Reads an optional integer flag such as `<difficult>`.
///
/// An absent element and an element with no text both mean 0. Any integer
/// is passed through unvalidated.
fn parse_optional_flag(object: Node<'_, '_>, tag: &str, path: &Path) -> Result<i64, ConvertError> {
    let Some(element) = child_element(object, tag) else {
        return Ok(0);
    };

    let raw = element.text().map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(0);
    }

    raw.parse::<i64>()
        .map_err(|_| ConvertError::AnnotationParse {
            path: path.to_path_buf(),
            message: format!("invalid <{tag}> value '{raw}' in <object>; expected integer"),
        })
}

fn required_child_element<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<Node<'a, 'input>, ConvertError> {
    child_element(node, tag).ok_or_else(|| ConvertError::AnnotationParse {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })
}

fn required_child_text(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<String, ConvertError> {
    child_element(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| ConvertError::AnnotationParse {
            path: path.to_path_buf(),
            message: format!("missing <{tag}> in {context}"),
        })
}

fn parse_required_f64(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<f64, ConvertError> {
    let raw = required_child_text(node, tag, path, context)?;
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ConvertError::AnnotationParse {
            path: path.to_path_buf(),
            message: format!(
                "invalid <{tag}> value '{raw}' in {context}; expected finite number"
            ),
        })
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

fn has_xml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == VOC_XML_EXTENSION)
        .unwrap_or(false)
}
