//! A thin, bounded-read wrapper over a seekable byte source.
//!
//! Every higher layer reads through a [`ByteStream`] rather than a raw
//! [`Read`] so that skip distances reported by a (possibly corrupt)
//! length field never translate into an unbounded allocation: forward
//! skips are performed in bounded chunks rather than by allocating a
//! buffer the size of the skip.

use crate::error::{Result, TruncatedSnafu};
use snafu::ensure;
use std::io::{Read, Seek, SeekFrom};

/// Skips are performed by repeatedly discarding a scratch buffer of at
/// most this size, so a corrupt length field cannot force a
/// multi-gigabyte allocation (Open Question decision: opt-in mmap
/// only, bounded scratch buffer otherwise).
const SKIP_CHUNK: usize = 1024 * 1024;

/// A bounded-read cursor over a seekable source, tracking its own
/// position and (when known) total length.
#[derive(Debug)]
pub struct ByteStream<R> {
    inner: R,
    position: u64,
    total_len: Option<u64>,
}

impl<R: Read + Seek> ByteStream<R> {
    /// Wrap a source, determining its total length via a seek to the
    /// end (and back to the start).
    pub fn new(mut inner: R) -> Result<Self> {
        let total_len = inner.seek(SeekFrom::End(0)).ok();
        inner.seek(SeekFrom::Start(0))?;
        Ok(ByteStream {
            inner,
            position: 0,
            total_len,
        })
    }

    /// The current byte offset from the start of the source.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// The source's total length, if it could be determined.
    pub fn total_len(&self) -> Option<u64> {
        self.total_len
    }

    /// The number of bytes left to read, if the total length is known.
    pub fn remaining(&self) -> Option<u64> {
        self.total_len.map(|len| len.saturating_sub(self.position))
    }

    /// Read exactly `buf.len()` bytes, failing with
    /// [`crate::error::Error::Truncated`] if the source runs out first.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        if let Some(remaining) = self.remaining() {
            ensure!(
                remaining >= buf.len() as u64,
                TruncatedSnafu {
                    needed: buf.len() as u64,
                    available: remaining,
                }
            );
        }
        self.inner.read_exact(buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    /// Read exactly `len` bytes and return them as an owned buffer.
    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Advance the cursor by `len` bytes without retaining the data,
    /// in bounded chunks of at most [`SKIP_CHUNK`] bytes.
    pub fn forward(&mut self, len: u64) -> Result<()> {
        if let Some(remaining) = self.remaining() {
            ensure!(
                remaining >= len,
                TruncatedSnafu {
                    needed: len,
                    available: remaining,
                }
            );
        }
        let mut scratch = [0u8; SKIP_CHUNK];
        let mut left = len;
        while left > 0 {
            let chunk = left.min(scratch.len() as u64) as usize;
            self.inner.read_exact(&mut scratch[..chunk])?;
            left -= chunk as u64;
        }
        self.position += len;
        Ok(())
    }

    /// Jump to an absolute offset from the start of the source.
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        self.position = offset;
        Ok(())
    }
}

/// Opt in to a memory-mapped, zero-copy [`ByteStream`] over a file on
/// disk, rather than buffering reads through the OS page cache one
/// syscall at a time. Left to the caller to request (Open Question
/// decision: mapping very large files can surprise the host with a
/// large anonymous mapping, so this toolkit never maps implicitly).
#[cfg(feature = "mmap")]
pub fn open_mmap(path: &std::path::Path) -> Result<ByteStream<std::io::Cursor<memmap2::Mmap>>> {
    let file = std::fs::File::open(path)?;
    // Safe as far as this crate can guarantee: the file is not
    // expected to be truncated or modified by another process while
    // mapped. The caller accepts this tradeoff by opting into `mmap`.
    let mmap = unsafe { memmap2::Mmap::map(&file)? };
    ByteStream::new(std::io::Cursor::new(mmap))
}

/// The result of checking a file's opening bytes for the 128-byte
/// preamble and "DICM" magic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreambleCheck {
    /// Whether a preamble and magic code were found.
    pub has_preamble: bool,
}

/// Inspect the first 132 bytes of a seekable source for the preamble
/// and magic code, leaving the cursor positioned just past whichever
/// header was found (or at the very start, if neither was present and
/// the caller should attempt a headerless implicit-VR parse).
pub fn detect_preamble<R: Read + Seek>(stream: &mut ByteStream<R>) -> Result<PreambleCheck> {
    if stream.remaining().is_some_and(|r| r < 132) {
        stream.seek_to(0)?;
        return Ok(PreambleCheck { has_preamble: false });
    }
    let mut header = [0u8; 132];
    stream.read_exact(&mut header)?;
    if &header[128..132] == b"DICM" {
        Ok(PreambleCheck { has_preamble: true })
    } else {
        stream.seek_to(0)?;
        Ok(PreambleCheck { has_preamble: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn detects_preamble_and_magic() {
        let mut bytes = vec![0u8; 128];
        bytes.extend_from_slice(b"DICM");
        bytes.extend_from_slice(b"rest");
        let mut s = ByteStream::new(Cursor::new(bytes)).unwrap();
        let check = detect_preamble(&mut s).unwrap();
        assert!(check.has_preamble);
        assert_eq!(s.position(), 132);
    }

    #[test]
    fn falls_back_to_headerless_without_magic() {
        let bytes = vec![0u8; 64];
        let mut s = ByteStream::new(Cursor::new(bytes)).unwrap();
        let check = detect_preamble(&mut s).unwrap();
        assert!(!check.has_preamble);
        assert_eq!(s.position(), 0);
    }

    #[test]
    fn forward_rejects_skip_past_end() {
        let mut s = ByteStream::new(Cursor::new(vec![1, 2, 3])).unwrap();
        assert!(s.forward(10).is_err());
    }
}
