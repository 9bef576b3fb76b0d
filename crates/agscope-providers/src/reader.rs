//! Line-record reading with a per-record size cap.
//!
//! Records are read straight from the `BufRead` buffer. Bytes past the cap
//! are consumed but never copied, so a single multi-megabyte line costs
//! constant memory.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// One newline-delimited record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRecord {
    /// Record bytes without the line terminator
    Line(Vec<u8>),
    /// Record exceeded the cap; only its length is known
    Oversized { len: u64 },
}

pub struct RecordReader<R> {
    inner: R,
    max_bytes: u64,
    done: bool,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(inner: R, max_bytes: u64) -> Self {
        Self {
            inner,
            max_bytes,
            done: false,
        }
    }
}

impl RecordReader<BufReader<File>> {
    pub fn open(path: &Path, max_bytes: u64) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::with_capacity(64 * 1024, file), max_bytes))
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = io::Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut line = Vec::new();
        let mut len: u64 = 0;
        let mut oversized = false;

        loop {
            let available = match self.inner.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };

            if available.is_empty() {
                self.done = true;
                if len == 0 {
                    return None;
                }
                break;
            }

            let newline = available.iter().position(|&b| b == b'\n');
            let chunk = newline.unwrap_or(available.len());
            len += chunk as u64;

            if !oversized {
                if len > self.max_bytes {
                    oversized = true;
                    line = Vec::new();
                } else {
                    line.extend_from_slice(&available[..chunk]);
                }
            }

            let consumed = if newline.is_some() { chunk + 1 } else { chunk };
            self.inner.consume(consumed);

            if newline.is_some() {
                break;
            }
        }

        if oversized {
            return Some(Ok(RawRecord::Oversized { len }));
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(Ok(RawRecord::Line(line)))
    }
}

/// Complete lines within the last `max_bytes` of a file, in file order.
///
/// When the read starts mid-file the first (partial) line is dropped.
pub fn read_tail_lines(path: &Path, max_bytes: u64) -> io::Result<Vec<Vec<u8>>> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    let start = size.saturating_sub(max_bytes);
    file.seek(SeekFrom::Start(start))?;

    let mut buf = Vec::with_capacity((size - start) as usize);
    file.read_to_end(&mut buf)?;

    let mut pieces: Vec<&[u8]> = buf.split(|&b| b == b'\n').collect();
    if start > 0 && !pieces.is_empty() {
        pieces.remove(0);
    }

    Ok(pieces
        .into_iter()
        .map(|p| p.strip_suffix(b"\r").unwrap_or(p))
        .filter(|p| !p.iter().all(u8::is_ascii_whitespace))
        .map(<[u8]>::to_vec)
        .collect())
}

/// Number of line records in a file, counting a final unterminated line
pub fn count_lines(path: &Path) -> io::Result<usize> {
    let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
    let mut count = 0;
    let mut last = b'\n';

    loop {
        let available = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            break;
        }
        count += available.iter().filter(|&&b| b == b'\n').count();
        last = available[available.len() - 1];
        let n = available.len();
        reader.consume(n);
    }

    if last != b'\n' {
        count += 1;
    }
    Ok(count)
}

/// Estimate the line count of a large file from the average length of its
/// trailing lines
pub fn estimate_lines(size_bytes: u64, sample: &[Vec<u8>]) -> usize {
    if sample.is_empty() {
        return 0;
    }
    let total: u64 = sample.iter().map(|l| l.len() as u64 + 1).sum();
    let avg = (total / sample.len() as u64).max(1);
    (size_bytes / avg).max(1) as usize
}
