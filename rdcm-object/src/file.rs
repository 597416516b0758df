//! Opening and writing whole DICOM Part 10 files: the optional
//! 128-byte preamble, `DICM` magic code, File Meta Information group,
//! and the main data set, with the ACR-NEMA compatibility fallback for
//! streams that carry a File Meta group but no preamble at all
//! (spec §4.3, scenario S1).

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use rdcm_core::{Codec, Tag};
use rdcm_parser::dataset::ReadOptions;
use rdcm_parser::stream::{detect_preamble, ByteStream};

use crate::error::{Error, Result};
use crate::mem::InMemDicomObject;
use crate::meta::FileMetaTable;

const GROUP_LENGTH: Tag = Tag(0x0002, 0x0000);

/// Options controlling how much of a file gets parsed, and how.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOptions {
    /// Stop after the file meta group; the returned object's data set
    /// is empty.
    pub header_only: bool,
    /// Parse the data set but stop before Pixel Data and anything
    /// that follows it in the stream.
    pub without_pixel_data: bool,
    /// Hint that pixel data fragments should be consumed without being
    /// retained in full; currently has no effect, since
    /// [`InMemDicomObject`] always materializes whatever it decides to
    /// read at all.
    pub stream_pixel_data: bool,
    /// Map the file into memory rather than buffering reads through
    /// it, when the `mmap` Cargo feature is enabled. Ignored (falls
    /// back to a buffered read) when the feature is disabled.
    pub memory_map_if_safe: bool,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header_only(mut self, value: bool) -> Self {
        self.header_only = value;
        self
    }

    pub fn without_pixel_data(mut self, value: bool) -> Self {
        self.without_pixel_data = value;
        self
    }

    pub fn stream_pixel_data(mut self, value: bool) -> Self {
        self.stream_pixel_data = value;
        self
    }

    pub fn memory_map_if_safe(mut self, value: bool) -> Self {
        self.memory_map_if_safe = value;
        self
    }

    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<DicomFile> {
        DicomFile::open_with_options(path, self)
    }
}

/// A DICOM Part 10 file: a [`FileMetaTable`] plus the main data set it
/// describes.
#[derive(Debug, Clone, PartialEq)]
pub struct DicomFile {
    meta: FileMetaTable,
    dataset: InMemDicomObject,
    has_preamble: bool,
}

impl DicomFile {
    /// Pair an already-built meta table and data set into a file ready
    /// to be written with a fresh 128-byte preamble.
    pub fn new(meta: FileMetaTable, dataset: InMemDicomObject) -> Self {
        DicomFile {
            meta,
            dataset,
            has_preamble: true,
        }
    }

    pub fn meta(&self) -> &FileMetaTable {
        &self.meta
    }

    pub fn dataset(&self) -> &InMemDicomObject {
        &self.dataset
    }

    pub fn into_dataset(self) -> InMemDicomObject {
        self.dataset
    }

    /// Whether the source this file was read from carried the 128-byte
    /// preamble, as opposed to a headerless ACR-NEMA-compatible stream
    /// that went straight into the File Meta group.
    pub fn has_preamble(&self) -> bool {
        self.has_preamble
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, OpenOptions::default())
    }

    pub fn open_with_options<P: AsRef<Path>>(path: P, options: OpenOptions) -> Result<Self> {
        #[cfg(feature = "mmap")]
        if options.memory_map_if_safe {
            let mut stream = rdcm_parser::stream::open_mmap(path.as_ref())?;
            return Self::from_stream(&mut stream, options);
        }
        let file = File::open(path.as_ref())?;
        let mut stream = ByteStream::new(BufReader::new(file))?;
        Self::from_stream(&mut stream, options)
    }

    /// Read a file (or any seekable source laid out like one) that has
    /// already been positioned at its very start.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut stream = ByteStream::new(reader)?;
        Self::from_stream(&mut stream, OpenOptions::default())
    }

    fn from_stream<R: Read + Seek>(stream: &mut ByteStream<R>, options: OpenOptions) -> Result<Self> {
        let check = detect_preamble(stream)?;
        if !check.has_preamble {
            tracing::debug!("no preamble/magic found, falling back to a headerless ACR-NEMA read");
        }

        let meta = FileMetaTable::read_from(stream).map_err(|e| match e {
            Error::MissingMetaElement { tag } if tag == GROUP_LENGTH => Error::NotDicom,
            other => other,
        })?;

        let ts = meta.resolve_transfer_syntax()?;
        tracing::debug!(transfer_syntax = ts.uid, "resolved transfer syntax from file meta");

        let read_options = ReadOptions {
            header_only: options.header_only,
            without_pixel_data: options.without_pixel_data,
        };

        // The deflate scope starts right after the file meta group,
        // never from byte zero: inflating too eagerly would corrupt
        // the meta group itself, which is never compressed.
        let dataset = if ts.codec == Codec::Deflated {
            let inflated = inflate_rest(stream)?;
            let mut inner = ByteStream::new(std::io::Cursor::new(inflated))?;
            InMemDicomObject::build_object(&mut inner, ts, read_options)?
        } else {
            InMemDicomObject::build_object(stream, ts, read_options)?
        };
        if dataset.is_corrupted() {
            tracing::warn!("data set parsing stopped early: a length would have overrun the stream");
        }

        Ok(DicomFile {
            meta,
            dataset,
            has_preamble: check.has_preamble,
        })
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_all(BufWriter::new(file))
    }

    /// Write the preamble, magic code, file meta group and data set,
    /// in that order, to `out`.
    pub fn write_all<W: Write>(&self, mut out: W) -> Result<()> {
        out.write_all(&[0u8; 128])?;
        self.meta.write_to(&mut out)?;

        let ts = self.meta.resolve_transfer_syntax()?;
        if ts.codec == Codec::Deflated {
            let mut raw = Vec::new();
            self.dataset.write_dataset(&mut raw)?;
            deflate_into(&raw, &mut out)?;
        } else {
            self.dataset.write_dataset(&mut out)?;
        }
        Ok(())
    }
}

#[cfg(feature = "deflate")]
fn inflate_rest<R: Read + Seek>(stream: &mut ByteStream<R>) -> Result<Vec<u8>> {
    use flate2::read::DeflateDecoder;

    let len = stream.remaining().unwrap_or(0) as usize;
    let compressed = stream.read_vec(len)?;
    let mut inflated = Vec::new();
    DeflateDecoder::new(&compressed[..])
        .read_to_end(&mut inflated)
        .map_err(|source| Error::Deflate { source })?;
    Ok(inflated)
}

#[cfg(not(feature = "deflate"))]
fn inflate_rest<R: Read + Seek>(_stream: &mut ByteStream<R>) -> Result<Vec<u8>> {
    Err(Error::Deflate {
        source: std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "Deflated Explicit VR Little Endian needs the `deflate` feature",
        ),
    })
}

#[cfg(feature = "deflate")]
fn deflate_into<W: Write>(raw: &[u8], out: &mut W) -> Result<()> {
    use flate2::write::DeflateEncoder;
    use flate2::Compression;

    let mut encoder = DeflateEncoder::new(out, Compression::default());
    encoder
        .write_all(raw)
        .map_err(|source| Error::Deflate { source })?;
    encoder
        .finish()
        .map_err(|source| Error::Deflate { source })?;
    Ok(())
}

#[cfg(not(feature = "deflate"))]
fn deflate_into<W: Write>(_raw: &[u8], _out: &mut W) -> Result<()> {
    Err(Error::Deflate {
        source: std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "Deflated Explicit VR Little Endian needs the `deflate` feature",
        ),
    })
}
