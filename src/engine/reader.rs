//! Delimiter-framed incremental file reader.
//!
//! Reads complete delimiter-terminated records starting at a byte
//! offset, tracking the position of the first unread byte.

use std::io::SeekFrom;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

/// Incremental reader over one file's records.
///
/// The offset only advances past *complete* records: a trailing partial
/// record without a closing delimiter is left unconsumed, so the next
/// pass retries it from the same offset once the writer finishes it.
#[derive(Debug)]
pub struct RecordReader {
    reader: BufReader<File>,
    offset: u64,
    delimiter: u8,
}

impl RecordReader {
    /// Open a file and seek to the given byte offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or seeked.
    pub async fn open(path: &Path, offset: u64, delimiter: u8) -> std::io::Result<Self> {
        let mut file = File::open(path).await?;
        file.seek(SeekFrom::Start(offset)).await?;
        Ok(Self {
            reader: BufReader::new(file),
            offset,
            delimiter,
        })
    }

    /// Read the next complete record, delimiter stripped.
    ///
    /// Returns `None` at end of file or when only a partial record
    /// remains. Invalid UTF-8 is replaced lossily; offsets stay
    /// byte-exact either way.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub async fn next_record(&mut self) -> std::io::Result<Option<String>> {
        let mut buf = Vec::new();
        let bytes_read = self.reader.read_until(self.delimiter, &mut buf).await?;

        if bytes_read == 0 {
            return Ok(None);
        }

        if buf.last() != Some(&self.delimiter) {
            // Partial record at EOF: do not consume, retry next pass.
            return Ok(None);
        }

        self.offset += bytes_read as u64;
        buf.pop();
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    /// Byte position of the first unread byte.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }
}
