//! End-to-end tests for the conversion driver.

use std::fs;

use bib_tfrecord::conversion::{run_conversion, ConvertOptions, ConvertOutcome};
use bib_tfrecord::ir::example::decode_example;
use bib_tfrecord::ir::io_tfrecord::read_tfrecord_file;
use bib_tfrecord::ir::ImageShape;
use bib_tfrecord::ConvertError;

mod common;
use common::{add_example, annotation_xml, annotations_dir, fake_jpeg, ObjectSpec};

fn run(opts: &ConvertOptions) -> (Result<ConvertOutcome, ConvertError>, String) {
    let mut progress = Vec::new();
    let result = run_conversion(opts, &mut progress);
    (result, String::from_utf8(progress).expect("utf8 progress"))
}

#[test]
fn two_object_example_clamps_and_defaults_flags() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let data = temp.path().join("data");
    let out = temp.path().join("out");

    let xml = annotation_xml(&[
        ObjectSpec::new("bib", "50", "100", "150", "200").difficult("1"),
        ObjectSpec::new("bib", "10", "10", "600", "450"),
    ]);
    add_example(&data, "training", "race7-0001", &fake_jpeg(1), &xml);

    let opts = ConvertOptions::new(&data, &out);
    let (result, progress) = run(&opts);
    let report = match result.expect("conversion succeeds") {
        ConvertOutcome::Completed(report) => report,
        other => panic!("unexpected outcome {other:?}"),
    };

    assert_eq!(report.records, 1);
    assert_eq!(report.objects, 2);
    assert_eq!(report.oversized_boxes, 1);
    assert!(progress.contains(">> Converting image 1/1"));
    assert!(progress.contains("Finished converting the bib dataset!"));

    let output = out.join("bib_training.tfrecord");
    assert_eq!(report.output, output);
    let records = read_tfrecord_file(&output).expect("read output");
    assert_eq!(records.len(), 1);

    let record = decode_example(&records[0]).expect("decode example");
    assert!(record.is_consistent());
    assert_eq!(record.object_count(), 2);
    assert_eq!(record.xmax, vec![0.3, 1.0]);
    assert_eq!(record.ymax, vec![0.4, 0.9]);
    assert_eq!(record.xmin, vec![0.1, 0.02]);
    assert_eq!(record.ymin, vec![0.2, 0.02]);
    assert_eq!(record.difficult, vec![1, 0]);
    assert_eq!(record.truncated, vec![0, 0]);
    assert_eq!(record.label, vec![1, 1]);
    assert_eq!(record.label_text, vec!["bib", "bib"]);
    assert_eq!(record.shape, vec![500, 500, 3]);
    assert_eq!(record.format, "JPEG");
    assert_eq!(record.encoded, fake_jpeg(1));
}

#[test]
fn records_follow_sorted_identifier_order() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let data = temp.path().join("data");
    let out = temp.path().join("out");

    for (identifier, seed) in [("c-3", 3u8), ("a-1", 1), ("b-2", 2)] {
        let xml = annotation_xml(&[ObjectSpec::new("bib", "0", "0", "10", "10")]);
        add_example(&data, "validation", identifier, &fake_jpeg(seed), &xml);
    }

    let mut opts = ConvertOptions::new(&data, &out);
    opts.split = "validation".to_string();
    let (result, progress) = run(&opts);
    result.expect("conversion succeeds");
    assert!(progress.contains("3/3"));

    let records = read_tfrecord_file(&out.join("bib_validation.tfrecord")).expect("read output");
    let images: Vec<Vec<u8>> = records
        .iter()
        .map(|bytes| decode_example(bytes).expect("decode").encoded)
        .collect();
    assert_eq!(images, vec![fake_jpeg(1), fake_jpeg(2), fake_jpeg(3)]);
}

#[test]
fn rerun_is_a_byte_identical_no_op() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let data = temp.path().join("data");
    let out = temp.path().join("out");

    let xml = annotation_xml(&[ObjectSpec::new("bib", "1", "2", "3", "4")]);
    add_example(&data, "training", "x-1", &fake_jpeg(9), &xml);

    let opts = ConvertOptions::new(&data, &out);
    run(&opts).0.expect("first run");
    let output = opts.output_path();
    let before = fs::read(&output).expect("read first output");

    // A new example would change the output if the second run wrote anything.
    add_example(&data, "training", "x-2", &fake_jpeg(10), &xml);
    let (result, progress) = run(&opts);
    assert!(matches!(result, Ok(ConvertOutcome::Skipped { .. })));
    assert!(progress.contains("Dataset files already exist"));
    assert_eq!(fs::read(&output).expect("read second output"), before);
}

#[test]
fn unknown_label_aborts_and_leaves_no_output() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let data = temp.path().join("data");
    let out = temp.path().join("out");

    let good = annotation_xml(&[ObjectSpec::new("bib", "1", "2", "3", "4")]);
    let bad = annotation_xml(&[ObjectSpec::new("runner", "1", "2", "3", "4")]);
    add_example(&data, "training", "a-1", &fake_jpeg(1), &good);
    add_example(&data, "training", "b-1", &fake_jpeg(2), &bad);

    let opts = ConvertOptions::new(&data, &out);
    let (result, _) = run(&opts);
    match result {
        Err(ConvertError::LabelNotFound { name, .. }) => assert_eq!(name, "runner"),
        other => panic!("expected LabelNotFound, got {other:?}"),
    }

    let leftovers: Vec<_> = fs::read_dir(&out).expect("read out dir").collect();
    assert!(leftovers.is_empty(), "output dir should be empty: {leftovers:?}");

    // The failed run must not block a later, fixed run.
    fs::write(data.join("Annotations/training/b-1.xml"), &good).expect("fix annotation");
    let (result, _) = run(&opts);
    match result.expect("second run") {
        ConvertOutcome::Completed(report) => assert_eq!(report.records, 2),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn missing_image_is_fatal() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let data = temp.path().join("data");
    let out = temp.path().join("out");

    let dir = annotations_dir(&data, "validation");
    fs::write(
        dir.join("lonely.xml"),
        annotation_xml(&[ObjectSpec::new("bib", "1", "2", "3", "4")]),
    )
    .expect("write annotation");

    let mut opts = ConvertOptions::new(&data, &out);
    opts.split = "validation".to_string();
    let (result, _) = run(&opts);
    assert!(matches!(result, Err(ConvertError::ImageRead { .. })));
    assert!(!opts.output_path().exists());
}

#[test]
fn malformed_xml_is_fatal() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let data = temp.path().join("data");
    let out = temp.path().join("out");

    add_example(&data, "training", "m-1", &fake_jpeg(0), "<annotation><object>");

    let (result, _) = run(&ConvertOptions::new(&data, &out));
    assert!(matches!(result, Err(ConvertError::AnnotationParse { .. })));
}

#[test]
fn empty_split_writes_empty_file() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let data = temp.path().join("data");
    let out = temp.path().join("out");
    annotations_dir(&data, "training");

    let opts = ConvertOptions::new(&data, &out);
    let (result, progress) = run(&opts);
    match result.expect("conversion succeeds") {
        ConvertOutcome::Completed(report) => assert_eq!(report.records, 0),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(progress.contains("Finished converting"));
    assert_eq!(fs::read(opts.output_path()).expect("read output").len(), 0);
}

#[test]
fn missing_split_directory_is_fatal() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (result, _) = run(&ConvertOptions::new(temp.path(), temp.path().join("out")));
    assert!(matches!(result, Err(ConvertError::DatasetLayout { .. })));
}

#[test]
fn geometry_is_configurable() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let data = temp.path().join("data");
    let out = temp.path().join("out");

    let xml = annotation_xml(&[ObjectSpec::new("none", "100", "50", "300", "150").truncated("1")]);
    add_example(&data, "training", "g-1", &fake_jpeg(4), &xml);

    let mut opts = ConvertOptions::new(&data, &out);
    opts.shape = ImageShape::new(100, 200);
    opts.name = "small".to_string();
    run(&opts).0.expect("conversion succeeds");

    let records = read_tfrecord_file(&out.join("small_training.tfrecord")).expect("read output");
    let record = decode_example(&records[0]).expect("decode");
    assert_eq!((record.height, record.width, record.channels), (100, 200, 3));
    assert_eq!(record.xmin, vec![0.5]);
    assert_eq!(record.xmax, vec![1.0]);
    assert_eq!(record.ymin, vec![0.5]);
    assert_eq!(record.ymax, vec![1.0]);
    assert_eq!(record.label, vec![0]);
    assert_eq!(record.truncated, vec![1]);
}

#[test]
fn every_listed_annotation_resolves_during_conversion() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let data = temp.path().join("data");
    let out = temp.path().join("out");

    let xml = annotation_xml(&[ObjectSpec::new("bib", "0", "0", "10", "10")]);
    add_example(&data, "validation", "c.tar", &fake_jpeg(3), &xml);
    add_example(&data, "validation", "b-2", &fake_jpeg(2), &xml);
    // Upper-case extensions are not annotations.
    let dir = annotations_dir(&data, "validation");
    fs::write(dir.join("A-1.XML"), &xml).expect("write annotation");
    fs::write(data.join("JPEGImages/validation/A-1.jpg"), fake_jpeg(1)).expect("write image");

    let mut opts = ConvertOptions::new(&data, &out);
    opts.split = "validation".to_string();
    let (result, _) = run(&opts);
    match result.expect("conversion succeeds") {
        ConvertOutcome::Completed(report) => assert_eq!(report.records, 2),
        other => panic!("unexpected outcome {other:?}"),
    }

    let records = read_tfrecord_file(&opts.output_path()).expect("read output");
    let images: Vec<Vec<u8>> = records
        .iter()
        .map(|bytes| decode_example(bytes).expect("decode").encoded)
        .collect();
    assert_eq!(images, vec![fake_jpeg(2), fake_jpeg(3)]);
}

#[test]
fn non_finite_coordinate_aborts_conversion() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let data = temp.path().join("data");
    let out = temp.path().join("out");

    let xml = annotation_xml(&[ObjectSpec::new("bib", "NaN", "0", "10", "10")]);
    add_example(&data, "training", "n-1", &fake_jpeg(1), &xml);

    let opts = ConvertOptions::new(&data, &out);
    let (result, _) = run(&opts);
    assert!(matches!(result, Err(ConvertError::AnnotationParse { .. })));
    assert!(!opts.output_path().exists());
}
