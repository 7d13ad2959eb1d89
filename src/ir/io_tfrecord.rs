//! TFRecord container reader and writer.
//!
//! A TFRecord file is a plain concatenation of framed records:
//!
//! ```text
//! u64 length            (little-endian)
//! u32 masked_crc32c(length bytes)
//! [u8; length] data
//! u32 masked_crc32c(data)
//! ```
//!
//! The checksum is CRC-32C, rotated and offset as TensorFlow does so that
//! a CRC of a CRC does not collapse to a fixed value.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::ConvertError;

const LENGTH_BYTES: usize = 8;
const CRC_BYTES: usize = 4;
const MASK_DELTA: u32 = 0xa282_ead8;

/// CRC-32C of `bytes`, masked the way TFRecord framing stores it.
pub fn masked_crc32c(bytes: &[u8]) -> u32 {
    let crc = crc32c::crc32c(bytes);
    crc.rotate_right(15).wrapping_add(MASK_DELTA)
}

/// Appends framed records to any byte sink.
///
/// The writer does no buffering of its own; wrap files in a
/// [`BufWriter`](std::io::BufWriter).
#[derive(Debug)]
pub struct TfRecordWriter<W: Write> {
    inner: W,
    records_written: u64,
}

impl<W: Write> TfRecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            records_written: 0,
        }
    }

    /// Writes one record with its length header and both checksums.
    pub fn write_record(&mut self, data: &[u8]) -> io::Result<()> {
        let length = (data.len() as u64).to_le_bytes();
        self.inner.write_all(&length)?;
        self.inner.write_all(&masked_crc32c(&length).to_le_bytes())?;
        self.inner.write_all(data)?;
        self.inner.write_all(&masked_crc32c(data).to_le_bytes())?;
        self.records_written += 1;
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Returns the underlying sink without flushing it.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Iterates the records of a TFRecord stream, verifying every checksum.
///
/// Iteration stops after the first error.
#[derive(Debug)]
pub struct TfRecordReader<R: Read> {
    inner: R,
    source: PathBuf,
    offset: u64,
    finished: bool,
}

impl<R: Read> TfRecordReader<R> {
    /// `source` is only used to label errors.
    pub fn new(inner: R, source: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            source: source.into(),
            offset: 0,
            finished: false,
        }
    }

    fn corrupt(&self, offset: u64, message: impl Into<String>) -> ConvertError {
        ConvertError::RecordCorrupt {
            path: self.source.clone(),
            offset,
            message: message.into(),
        }
    }

    fn read_record(&mut self) -> Result<Option<Vec<u8>>, ConvertError> {
        let start = self.offset;

        let mut header = [0u8; LENGTH_BYTES + CRC_BYTES];
        let got = read_full(&mut self.inner, &mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < header.len() {
            return Err(self.corrupt(start, "truncated record header"));
        }

        let (length_bytes, length_crc) = header.split_at(LENGTH_BYTES);
        if masked_crc32c(length_bytes) != le_u32(length_crc) {
            return Err(self.corrupt(start, "length checksum mismatch"));
        }

        let mut raw_length = [0u8; LENGTH_BYTES];
        raw_length.copy_from_slice(length_bytes);
        let length = usize::try_from(u64::from_le_bytes(raw_length))
            .map_err(|_| self.corrupt(start, "record length does not fit in memory"))?;

        let mut data = Vec::new();
        let got = (&mut self.inner)
            .take(length as u64)
            .read_to_end(&mut data)?;
        if got < length {
            return Err(self.corrupt(start, "truncated record data"));
        }

        let mut data_crc = [0u8; CRC_BYTES];
        if read_full(&mut self.inner, &mut data_crc)? < CRC_BYTES {
            return Err(self.corrupt(start, "truncated record checksum"));
        }
        if masked_crc32c(&data) != u32::from_le_bytes(data_crc) {
            return Err(self.corrupt(start, "data checksum mismatch"));
        }

        self.offset += (LENGTH_BYTES + CRC_BYTES + length + CRC_BYTES) as u64;
        Ok(Some(data))
    }
}

impl<R: Read> Iterator for TfRecordReader<R> {
    type Item = Result<Vec<u8>, ConvertError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = self.read_record().transpose();
        if !matches!(result, Some(Ok(_))) {
            self.finished = true;
        }
        result
    }
}

/// Opens a TFRecord file for iteration.
pub fn open_tfrecord(path: &Path) -> Result<TfRecordReader<BufReader<File>>, ConvertError> {
    let file = File::open(path).map_err(ConvertError::Io)?;
    Ok(TfRecordReader::new(BufReader::new(file), path))
}

/// Reads every record of a TFRecord file into memory.
pub fn read_tfrecord_file(path: &Path) -> Result<Vec<Vec<u8>>, ConvertError> {
    open_tfrecord(path)?.collect()
}

/// Counts the records in an in-memory TFRecord stream.
///
/// This helper is primarily useful for testing/fuzzing the framing checks.
pub fn from_tfrecord_slice(bytes: &[u8]) -> Result<usize, ConvertError> {
    let mut count = 0;
    for record in TfRecordReader::new(bytes, "<memory>") {
        record?;
        count += 1;
    }
    Ok(count)
}

fn le_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; CRC_BYTES];
    raw.copy_from_slice(bytes);
    u32::from_le_bytes(raw)
}

/// Like `read_exact`, but reports how much was read instead of failing at EOF.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
