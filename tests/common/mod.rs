#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Bytes standing in for a JPEG; the converter never decodes them.
pub fn fake_jpeg(seed: u8) -> Vec<u8> {
    let mut bytes = vec![0xff, 0xd8, 0xff, 0xe0];
    bytes.extend(std::iter::repeat(seed).take(16));
    bytes.extend_from_slice(&[0xff, 0xd9]);
    bytes
}

/// One `<object>` of a fixture annotation.
pub struct ObjectSpec<'a> {
    pub name: &'a str,
    pub difficult: Option<&'a str>,
    pub truncated: Option<&'a str>,
    pub bndbox: [&'a str; 4],
}

impl<'a> ObjectSpec<'a> {
    pub fn new(name: &'a str, xmin: &'a str, ymin: &'a str, xmax: &'a str, ymax: &'a str) -> Self {
        Self {
            name,
            difficult: None,
            truncated: None,
            bndbox: [xmin, ymin, xmax, ymax],
        }
    }

    pub fn difficult(mut self, value: &'a str) -> Self {
        self.difficult = Some(value);
        self
    }

    pub fn truncated(mut self, value: &'a str) -> Self {
        self.truncated = Some(value);
        self
    }
}

pub fn annotation_xml(objects: &[ObjectSpec<'_>]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<annotation>\n");
    xml.push_str("  <size><width>500</width><height>500</height><depth>3</depth></size>\n");
    for object in objects {
        xml.push_str("  <object>\n");
        xml.push_str(&format!("    <name>{}</name>\n", object.name));
        if let Some(value) = object.difficult {
            xml.push_str(&format!("    <difficult>{value}</difficult>\n"));
        }
        if let Some(value) = object.truncated {
            xml.push_str(&format!("    <truncated>{value}</truncated>\n"));
        }
        let [xmin, ymin, xmax, ymax] = object.bndbox;
        xml.push_str(&format!(
            "    <bndbox><xmin>{xmin}</xmin><ymin>{ymin}</ymin><xmax>{xmax}</xmax><ymax>{ymax}</ymax></bndbox>\n"
        ));
        xml.push_str("  </object>\n");
    }
    xml.push_str("</annotation>\n");
    xml
}

/// Writes an image and its annotation using the dataset's path conventions.
pub fn add_example(root: &Path, split: &str, identifier: &str, image: &[u8], xml: &str) {
    let image_dir = if split == "training" {
        let prefix = identifier.split('-').next().unwrap_or(identifier);
        root.join("JPEGImages").join(split).join(prefix)
    } else {
        root.join("JPEGImages").join(split)
    };
    fs::create_dir_all(&image_dir).expect("create image dir");
    fs::write(image_dir.join(format!("{identifier}.jpg")), image).expect("write image");

    let ann_dir = root.join("Annotations").join(split);
    fs::create_dir_all(&ann_dir).expect("create annotation dir");
    fs::write(ann_dir.join(format!("{identifier}.xml")), xml).expect("write annotation");
}

pub fn annotations_dir(root: &Path, split: &str) -> PathBuf {
    let dir = root.join("Annotations").join(split);
    fs::create_dir_all(&dir).expect("create annotation dir");
    dir
}
