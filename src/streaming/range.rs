//! Byte-range to chunk-read planning.
//!
//! HTTP ranges are byte-exact while upstream reads come in whole fixed-size
//! chunks. A [`RangePlan`] reconciles the two: it names the first aligned
//! chunk to fetch, how many chunks to fetch, and how much to cut from the
//! first and last of them.
//!
//! Only the single-range `bytes=<start>-[<end>]` form is accepted.

use mediarelay_common::{Error, Result};

/// Inclusive byte interval within an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes in the range (never zero).
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Chunk-aligned read plan for one byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePlan {
    pub start_byte: u64,
    pub end_byte_inclusive: u64,
    pub chunk_size: u64,
    /// Offset of the first chunk to fetch (a multiple of `chunk_size`).
    pub aligned_offset: u64,
    /// Bytes to discard from the front of the first chunk.
    pub first_chunk_trim: u64,
    /// Bytes to keep from the front of the last chunk.
    pub last_chunk_length: u64,
    pub chunk_count: u64,
}

impl RangePlan {
    /// Plan the reads for `range`. `chunk_size` must be non-zero.
    pub fn new(range: ByteRange, chunk_size: u64) -> Self {
        let ByteRange { start, end } = range;
        let aligned_offset = start - (start % chunk_size);
        Self {
            start_byte: start,
            end_byte_inclusive: end,
            chunk_size,
            aligned_offset,
            first_chunk_trim: start - aligned_offset,
            last_chunk_length: (end % chunk_size) + 1,
            // ceil((end + 1) / chunk) - floor(aligned / chunk)
            chunk_count: (end / chunk_size + 1) - aligned_offset / chunk_size,
        }
    }

    /// Number of bytes the plan delivers.
    pub fn content_length(&self) -> u64 {
        self.end_byte_inclusive - self.start_byte + 1
    }

    /// Object offset of the `index`-th chunk of the plan.
    pub fn chunk_offset(&self, index: u64) -> u64 {
        self.aligned_offset + index * self.chunk_size
    }

    /// The `start..end` slice to keep from the `index`-th fetched chunk.
    pub fn keep_range(&self, index: u64) -> (u64, u64) {
        let start = if index == 0 { self.first_chunk_trim } else { 0 };
        let end = if index + 1 == self.chunk_count {
            self.last_chunk_length
        } else {
            self.chunk_size
        };
        (start, end)
    }

    /// Value of the `Content-Range` header for this plan.
    pub fn content_range(&self, size: u64) -> String {
        format!(
            "bytes {}-{}/{}",
            self.start_byte, self.end_byte_inclusive, size
        )
    }
}

/// Syntactically valid `bytes=<start>-[<end>]` request, not yet checked
/// against an object size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: u64,
    pub end: Option<u64>,
}

impl RangeSpec {
    /// Check the request against an object of `size` bytes. A missing end
    /// position defaults to the last byte.
    pub fn resolve(self, size: u64) -> Result<ByteRange> {
        if size == 0 {
            return Err(Error::UnsatisfiableRange { size });
        }
        let end = self.end.unwrap_or(size - 1);
        if end >= size || self.start > end {
            return Err(Error::UnsatisfiableRange { size });
        }
        Ok(ByteRange {
            start: self.start,
            end,
        })
    }
}

/// Digits beyond `u64` saturate; such a position lies past every object.
fn parse_position(s: &str, header: &str) -> Result<u64> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::malformed_range(header));
    }
    Ok(s.parse().unwrap_or(u64::MAX))
}

/// Parse the syntax of an optional `Range` header.
///
/// An absent or blank header selects the whole object and yields `None`.
pub fn parse_range_spec(header: Option<&str>) -> Result<Option<RangeSpec>> {
    let Some(raw) = header.filter(|h| !h.trim().is_empty()) else {
        return Ok(None);
    };
    let value = raw.trim();
    let spec = value
        .get(..6)
        .filter(|unit| unit.eq_ignore_ascii_case("bytes="))
        .map(|_| &value[6..])
        .ok_or_else(|| Error::malformed_range(raw))?;
    let (start, end) = spec
        .split_once('-')
        .ok_or_else(|| Error::malformed_range(raw))?;
    let start = parse_position(start, raw)?;
    let end = if end.trim().is_empty() {
        None
    } else {
        Some(parse_position(end, raw)?)
    };
    Ok(Some(RangeSpec { start, end }))
}

/// Resolve an optional `Range` header against an object of `size` bytes.
///
/// Without a header the whole object is selected.
pub fn parse_range_header(header: Option<&str>, size: u64) -> Result<ByteRange> {
    resolve_range(parse_range_spec(header)?, size)
}

fn resolve_range(spec: Option<RangeSpec>, size: u64) -> Result<ByteRange> {
    spec.unwrap_or(RangeSpec {
        start: 0,
        end: None,
    })
    .resolve(size)
}

/// Plan the chunk reads for an already parsed request.
pub fn plan_range_spec(spec: Option<RangeSpec>, size: u64, chunk_size: u64) -> Result<RangePlan> {
    if chunk_size == 0 {
        return Err(Error::internal("chunk size must be non-zero"));
    }
    Ok(RangePlan::new(resolve_range(spec, size)?, chunk_size))
}

/// Parse the header and plan the chunk reads in one step.
pub fn plan_range(header: Option<&str>, size: u64, chunk_size: u64) -> Result<RangePlan> {
    plan_range_spec(parse_range_spec(header)?, size, chunk_size)
}
