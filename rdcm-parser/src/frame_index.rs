//! Builds a per-frame offset/length table from an already-parsed
//! dataset's pixel data, for O(1) frame access (spec §4.5).
//!
//! This module takes plain numeric parameters rather than a dataset
//! reference, since `rdcm-parser` sits below `rdcm-object` in the
//! dependency order: the caller (`rdcm-object::mem`) is the one
//! holding the element tree and the byte offsets recorded for each
//! item at parse time, and extracts what this algorithm needs.

use crate::error::{FrameSizeMismatchSnafu, MissingRequiredTagsSnafu, Result};

/// One frame's location, either inside a native Pixel Data element or
/// inside an encapsulated pixel sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// Absolute byte offset from the start of the file.
    pub offset: u64,
    /// Length of this frame's bytes.
    pub length: u64,
    /// Whether this frame's bytes are a compressed codestream fragment
    /// (`true`) or raw native pixel samples (`false`).
    pub encapsulated: bool,
}

/// The attributes needed to compute native pixel data frame
/// boundaries (spec §4.5).
#[derive(Debug, Clone, Copy)]
pub struct NativePixelParams {
    pub rows: Option<u16>,
    pub columns: Option<u16>,
    pub samples_per_pixel: Option<u16>,
    pub bits_allocated: Option<u16>,
    /// Defaults to 1 when the element is absent, per spec §4.5.
    pub number_of_frames: Option<u32>,
    /// Absolute offset of the first byte of (7FE0,0010)'s value.
    pub pixel_data_offset: u64,
    /// The value's total length, as recorded on the wire.
    pub pixel_data_length: u64,
}

/// Build a frame index for a native (uncompressed) Pixel Data element.
pub fn build_native(params: NativePixelParams) -> Result<Vec<FrameInfo>> {
    let mut missing = Vec::new();
    if params.rows.is_none() {
        missing.push("Rows");
    }
    if params.columns.is_none() {
        missing.push("Columns");
    }
    if params.samples_per_pixel.is_none() {
        missing.push("SamplesPerPixel");
    }
    if params.bits_allocated.is_none() {
        missing.push("BitsAllocated");
    }
    if !missing.is_empty() {
        return MissingRequiredTagsSnafu { tags: missing }.fail();
    }

    let rows = params.rows.unwrap() as u64;
    let columns = params.columns.unwrap() as u64;
    let samples = params.samples_per_pixel.unwrap() as u64;
    let bits_allocated = params.bits_allocated.unwrap() as u64;
    let bytes_per_sample = (bits_allocated + 7) / 8;
    let number_of_frames = params.number_of_frames.unwrap_or(1) as u64;

    let frame_size = rows * columns * samples * bytes_per_sample;
    let expected_total = frame_size * number_of_frames;
    if expected_total != params.pixel_data_length {
        return FrameSizeMismatchSnafu {
            expected: expected_total,
            actual: params.pixel_data_length,
        }
        .fail();
    }

    Ok((0..number_of_frames)
        .map(|i| FrameInfo {
            offset: params.pixel_data_offset + i * frame_size,
            length: frame_size,
            encapsulated: false,
        })
        .collect())
}

/// Build a frame index for an encapsulated pixel sequence, given the
/// Basic Offset Table (possibly empty) and each fragment's absolute
/// `(offset, length)` as recorded by the dataset reader.
///
/// When the BOT is non-empty, frame `i`'s bytes span
/// `[base_offset + BOT[i], base_offset + BOT[i + 1])` — a codestream
/// that may itself be split across multiple fragment items, which
/// this function re-joins into the single logical span the caller
/// reports as one [`FrameInfo`] (the caller is responsible for
/// concatenating the underlying fragment bytes when the span crosses
/// a fragment boundary; this index only records where the concatenated
/// codestream begins and ends).
///
/// When the BOT is empty, each fragment is assumed to be exactly one
/// frame (spec §4.3's reassembly rule).
pub fn build_encapsulated(offset_table: &[u32], fragments: &[(u64, u64)]) -> Result<Vec<FrameInfo>> {
    if fragments.is_empty() {
        return crate::error::NoFramesFoundSnafu.fail();
    }

    if offset_table.is_empty() {
        return Ok(fragments
            .iter()
            .map(|&(offset, length)| FrameInfo {
                offset,
                length,
                encapsulated: true,
            })
            .collect());
    }

    // `base_offset` is the first byte of the concatenated fragment
    // stream, i.e. where fragment 0 begins.
    let base_offset = fragments[0].0;
    let total_len: u64 = fragments.iter().map(|&(_, len)| len).sum();

    let mut infos = Vec::with_capacity(offset_table.len());
    for (i, &start) in offset_table.iter().enumerate() {
        let end = offset_table.get(i + 1).copied().map(u64::from).unwrap_or(total_len);
        let start = start as u64;
        infos.push(FrameInfo {
            offset: base_offset + start,
            length: end.saturating_sub(start),
            encapsulated: true,
        });
    }
    Ok(infos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_frame_index_splits_evenly() {
        let params = NativePixelParams {
            rows: Some(2),
            columns: Some(2),
            samples_per_pixel: Some(1),
            bits_allocated: Some(8),
            number_of_frames: Some(3),
            pixel_data_offset: 1000,
            pixel_data_length: 4 * 3,
        };
        let frames = build_native(params).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], FrameInfo { offset: 1000, length: 4, encapsulated: false });
        assert_eq!(frames[2], FrameInfo { offset: 1008, length: 4, encapsulated: false });
    }

    #[test]
    fn native_mismatch_is_reported() {
        let params = NativePixelParams {
            rows: Some(2),
            columns: Some(2),
            samples_per_pixel: Some(1),
            bits_allocated: Some(8),
            number_of_frames: Some(2),
            pixel_data_offset: 0,
            pixel_data_length: 5,
        };
        assert!(build_native(params).is_err());
    }

    #[test]
    fn missing_tags_are_named() {
        let params = NativePixelParams {
            rows: None,
            columns: Some(2),
            samples_per_pixel: Some(1),
            bits_allocated: Some(8),
            number_of_frames: None,
            pixel_data_offset: 0,
            pixel_data_length: 0,
        };
        let err = build_native(params).unwrap_err();
        assert!(matches!(err, crate::error::Error::MissingRequiredTags { .. }));
    }

    #[test]
    fn encapsulated_with_bot_splits_by_offsets() {
        let fragments = vec![(100u64, 30u64)];
        let offset_table = vec![0, 10, 20];
        let frames = build_encapsulated(&offset_table, &fragments).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], FrameInfo { offset: 100, length: 10, encapsulated: true });
        assert_eq!(frames[2], FrameInfo { offset: 120, length: 10, encapsulated: true });
    }

    #[test]
    fn encapsulated_with_empty_bot_is_one_fragment_per_frame() {
        let fragments = vec![(100u64, 10u64), (110u64, 20u64)];
        let frames = build_encapsulated(&[], &fragments).unwrap();
        assert_eq!(frames, vec![
            FrameInfo { offset: 100, length: 10, encapsulated: true },
            FrameInfo { offset: 110, length: 20, encapsulated: true },
        ]);
    }
}
