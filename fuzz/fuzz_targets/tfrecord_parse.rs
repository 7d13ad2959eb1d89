//! Fuzz target for TFRecord framing and Example decoding.

#![no_main]

use bib_tfrecord::ir::example::decode_example;
use bib_tfrecord::ir::io_tfrecord::{from_tfrecord_slice, TfRecordReader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_tfrecord_slice(data);
    for record in TfRecordReader::new(data, "<fuzz>").flatten() {
        let _ = decode_example(&record);
    }
});
