//! The segment framer (spec.md §4.1).
//!
//! Walks a byte stream looking for `0xFF`-prefixed markers, strips `0xFF00`
//! stuffing, and slices out each segment's payload bytes. This is the first
//! thing that runs over a JPEG file; everything else in this crate consumes
//! its output rather than touching the raw byte stream directly.
use crate::errors::{CodecError, Context, FormatInvalidReason, TruncatedReason};
use crate::marker::Marker;

/// One `(marker, payload)` pair produced by [`SegmentFramer`].
///
/// `payload` excludes the 2-byte length field itself; for markers with no
/// payload (SOI, EOI, RSTn) it is empty.
pub struct Segment<'a> {
    pub marker: Marker,
    pub payload: &'a [u8],
    /// Offset of `marker` byte (the one following 0xFF) in the source buffer.
    pub offset: usize,
}

/// Scans a buffer for markers and slices out their payloads on demand.
///
/// Mirrors `zune-jpeg`'s marker loop in `decoder.rs`, pulled out into its own
/// type so header parsing and entropy decoding don't need to know about
/// marker search at all.
pub struct SegmentFramer<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> SegmentFramer<'a> {
    pub fn new(buf: &'a [u8]) -> SegmentFramer<'a> {
        SegmentFramer { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes consumed so far, made available to callers that need to hand
    /// off to the entropy decoder at an exact offset (e.g. right after SOS).
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        let b = *self.buf.get(self.pos).ok_or_else(|| {
            CodecError::truncated(TruncatedReason::UnexpectedEndOfStream)
                .with_context(Context::none().at_offset(self.pos))
        })?;
        self.pos += 1;
        Ok(b)
    }

    fn read_u16_be(&mut self) -> Result<u16, CodecError> {
        let hi = self.read_u8()?;
        let lo = self.read_u8()?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    /// Read the SOI marker and confirm it's the first thing in the buffer.
    pub fn expect_soi(&mut self) -> Result<(), CodecError> {
        if self.buf.len() < 2 || self.buf[0] != 0xFF || self.buf[1] != 0xD8 {
            return Err(CodecError::format_invalid(FormatInvalidReason::MissingSoi));
        }
        self.pos = 2;
        Ok(())
    }

    /// Read the next marker and its payload, in the order they appear in the
    /// stream. Returns `Ok(None)` once the buffer is exhausted.
    ///
    /// For `SOS`, the payload returned is just the scan header (up to, not
    /// including, the entropy-coded data that follows) — callers read the
    /// entropy data themselves via [`remaining`](Self::remaining) afterward,
    /// since its length isn't known up front.
    pub fn next_segment(&mut self) -> Result<Option<Segment<'a>>, CodecError> {
        // Skip any fill bytes (0xFF with no following marker byte yet) and
        // find the next 0xFF marker prefix.
        loop {
            if self.pos >= self.buf.len() {
                return Ok(None);
            }
            let b = self.read_u8()?;
            if b != 0xFF {
                continue;
            }
            // Consume a run of 0xFF padding bytes (legal padding before a marker).
            let mut next = self.read_u8()?;
            while next == 0xFF {
                next = self.read_u8()?;
            }
            if next == 0x00 {
                // Stuffed byte outside entropy data shouldn't happen, but
                // treat it as padding rather than erroring.
                continue;
            }
            let marker_offset = self.pos - 1;
            let marker = Marker::from_u8(next).ok_or_else(|| {
                CodecError::format_invalid(FormatInvalidReason::InvalidMarker(next))
                    .with_context(Context::none().at_offset(marker_offset))
            })?;

            if marker.has_no_payload() {
                return Ok(Some(Segment { marker, payload: &[], offset: marker_offset }));
            }

            let len = self.read_u16_be().map_err(|_| {
                CodecError::truncated(TruncatedReason::UnexpectedEndOfStream)
                    .with_context(Context::none().at_offset(marker_offset))
            })?;
            if len < 2 {
                return Err(CodecError::truncated(TruncatedReason::LengthMismatch)
                    .with_context(Context::none().at_offset(marker_offset)));
            }
            let payload_len = (len - 2) as usize;
            let start = self.pos;
            let end = start.checked_add(payload_len).ok_or_else(|| {
                CodecError::truncated(TruncatedReason::LengthMismatch)
                    .with_context(Context::none().at_offset(marker_offset))
            })?;
            if end > self.buf.len() {
                return Err(CodecError::truncated(TruncatedReason::LengthMismatch)
                    .with_context(Context::none().at_offset(marker_offset)));
            }
            self.pos = end;
            return Ok(Some(Segment { marker, payload: &self.buf[start..end], offset: marker_offset }));
        }
    }
}
