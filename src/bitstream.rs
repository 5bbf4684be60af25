//! Entropy-coded data bit reader (spec.md §4.7).
//!
//! JPEG's Huffman-coded scan data is a byte-stuffed MSB-first bitstream:
//! any literal `0xFF` byte is followed by a `0x00` stuffing byte, and any
//! other byte following `0xFF` is a marker (restart or otherwise) that ends
//! the current scan's data. This reader hides that from callers; once it
//! surfaces a marker, callers stop pulling bits and hand the marker back to
//! the segment framer.
use crate::errors::{CodecError, Context, TruncatedReason};
use crate::huffman::{HuffmanTable, FAST_BITS};
use crate::marker::Marker;

pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    buffer: u64,
    bits_left: u32,
    /// Set once a marker is found mid-stream (restart or end-of-scan); the
    /// caller is responsible for consuming it from the segment framer.
    pub marker: Option<Marker>,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> BitReader<'a> {
        BitReader { data, pos: 0, buffer: 0, bits_left: 0, marker: None }
    }

    /// Byte offset just past the last byte consumed into the bit buffer;
    /// used to resume segment framing after a restart marker.
    pub fn byte_position(&self) -> usize {
        self.pos
    }

    fn next_raw_byte(&mut self) -> u8 {
        let b = self.data.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        b
    }

    /// Top up the bit buffer to at least 25 bits (enough for any single
    /// Huffman code plus a 16-bit `receive_extend`), stopping early if a
    /// marker is hit.
    fn refill(&mut self) {
        while self.bits_left <= 56 && self.marker.is_none() {
            if self.pos >= self.data.len() {
                // Stream ran out without EOI; pad with zero bits so the
                // caller's decode attempt fails cleanly instead of looping.
                self.buffer <<= 8;
                self.bits_left += 8;
                continue;
            }
            let byte = self.next_raw_byte();
            if byte == 0xFF {
                let mut stuffed = self.next_raw_byte();
                while stuffed == 0xFF {
                    stuffed = self.next_raw_byte();
                }
                if stuffed != 0x00 {
                    self.marker = Marker::from_u8(stuffed);
                    // Rewind so a caller reading raw segments afterward
                    // sees the marker's 0xFF prefix byte.
                    self.pos -= 2;
                    return;
                }
            }
            self.buffer = (self.buffer << 8) | u64::from(byte);
            self.bits_left += 8;
        }
    }

    fn peek_bits(&self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        ((self.buffer >> (self.bits_left - n)) & ((1 << n) - 1)) as u32
    }

    fn drop_bits(&mut self, n: u32) {
        self.bits_left -= n;
    }

    /// Read and discard `n` bits, returning them as an unsigned value.
    pub fn get_bits(&mut self, n: u8) -> Result<i32, CodecError> {
        if n == 0 {
            return Ok(0);
        }
        self.refill();
        if self.marker.is_some() && self.bits_left < u32::from(n) {
            return Err(CodecError::truncated(TruncatedReason::BitStreamTruncated)
                .with_context(Context::none().at_offset(self.pos)));
        }
        let value = self.peek_bits(u32::from(n));
        self.drop_bits(u32::from(n));
        Ok(value as i32)
    }

    /// Read a single bit (used by progressive successive-approximation
    /// refinement, spec.md §4.8).
    pub fn get_bit(&mut self) -> Result<u8, CodecError> {
        Ok(self.get_bits(1)? as u8)
    }

    /// Decode one Huffman symbol (a byte index into `table`'s value list)
    /// using the fast direct-mapped table, falling back to the canonical
    /// `maxcode`/`delta` walk for long codes.
    fn decode_symbol(&mut self, table: &HuffmanTable) -> Result<u8, CodecError> {
        self.refill();
        let look = self.peek_bits(FAST_BITS as u32) as usize;
        let fast = table.fast_byte(look);
        if fast != 255 {
            let len = table.code_len(fast as usize);
            self.drop_bits(u32::from(len));
            return Ok(fast);
        }

        // Slow path: walk canonical code lengths from FAST_BITS+1 upward.
        let code = self.peek_bits(16) as i64;
        let mut len = FAST_BITS as usize;
        loop {
            len += 1;
            if len > 16 {
                return Err(CodecError::Internal("huffman code exceeded 16 bits"));
            }
            let candidate = (code >> (16 - len)) as u32;
            if candidate <= table.maxcode(len) {
                self.drop_bits(len as u32);
                let index = (candidate as i32 + table.delta(len)) as usize;
                return Ok(index as u8);
            }
        }
    }

    /// ITU-T T.81 `HUFF_EXTEND`: sign-extend a `magnitude`-bit value read
    /// right after a Huffman symbol into the signed coefficient it encodes.
    fn receive_extend(&mut self, magnitude: u8) -> Result<i32, CodecError> {
        if magnitude == 0 {
            return Ok(0);
        }
        let bits = self.get_bits(magnitude)?;
        let half = 1 << (magnitude - 1);
        Ok(if bits < half { bits - (1 << magnitude) + 1 } else { bits })
    }

    /// Decode one DC coefficient delta and fold it into the running
    /// predictor, spec.md §4.7(b).
    pub fn decode_dc(&mut self, dc_table: &HuffmanTable, dc_pred: &mut i32) -> Result<i32, CodecError> {
        let symbol_index = self.decode_symbol(dc_table)?;
        let magnitude = dc_table.value(symbol_index as usize);
        let diff = self.receive_extend(magnitude)?;
        *dc_pred += diff;
        Ok(*dc_pred)
    }

    /// Decode the 63 AC coefficients of a baseline block into `block`
    /// (zig-zag order, index 0 left for the caller's DC value).
    pub fn decode_ac_block(
        &mut self,
        ac_table: &HuffmanTable,
        block: &mut [i32; 64],
    ) -> Result<(), CodecError> {
        let mut k = 1usize;
        while k < 64 {
            self.refill();
            let look = self.peek_bits(FAST_BITS as u32) as usize;
            if let Some(entry) = ac_table.fast_ac_entry(look) {
                if entry != 0 {
                    let run = ((entry >> 4) & 0x3F) as usize;
                    let value = entry >> 10;
                    let len = (entry & 0x0F) as u32;
                    k += run;
                    if k >= 64 {
                        break;
                    }
                    self.drop_bits(len);
                    block[k] = i32::from(value);
                    k += 1;
                    continue;
                }
            }
            let symbol_index = self.decode_symbol(ac_table)?;
            let rs = ac_table.value(symbol_index as usize);
            let run = usize::from(rs >> 4);
            let magnitude = rs & 0x0F;
            if magnitude == 0 {
                if run != 15 {
                    break; // EOB
                }
                k += 16; // ZRL: skip 16 zeros
                continue;
            }
            k += run;
            if k >= 64 {
                break;
            }
            let value = self.receive_extend(magnitude)?;
            block[k] = value;
            k += 1;
        }
        Ok(())
    }

    /// Drop everything buffered, step past the 2-byte marker `refill` left
    /// unread, and resume byte-aligned reading (spec.md §4.7(c)). Only
    /// valid to call while `self.marker` is `Some`.
    pub fn reset_after_marker(&mut self) {
        self.pos += 2;
        self.buffer = 0;
        self.bits_left = 0;
        self.marker = None;
    }

    /// Decode a DC coefficient for a progressive first scan (`Ah == 0`),
    /// left-shifted by `al` per spec.md §4.8.
    pub fn decode_dc_first(
        &mut self,
        dc_table: &HuffmanTable,
        dc_pred: &mut i32,
        al: u8,
    ) -> Result<i32, CodecError> {
        Ok(self.decode_dc(dc_table, dc_pred)? << al)
    }

    /// Read one correction bit for a progressive DC refinement scan
    /// (`Ah > 0`), spec.md §4.8.
    pub fn decode_dc_refine(&mut self, al: u8) -> Result<i32, CodecError> {
        Ok(i32::from(self.get_bit()?) << al)
    }

    /// Decode one progressive AC "first" scan band (`Ah == 0`) into
    /// `block[spectral_start..=spectral_end]`, zig-zag order, spec.md
    /// §4.8. `eobrun` carries an end-of-band run count across calls within
    /// the same scan.
    pub fn decode_ac_first(
        &mut self,
        ac_table: &HuffmanTable,
        block: &mut [i32; 64],
        spectral_start: u8,
        spectral_end: u8,
        al: u8,
        eobrun: &mut u32,
    ) -> Result<(), CodecError> {
        if *eobrun > 0 {
            *eobrun -= 1;
            return Ok(());
        }
        let mut k = usize::from(spectral_start);
        let end = usize::from(spectral_end);
        while k <= end {
            let symbol_index = self.decode_symbol(ac_table)?;
            let rs = ac_table.value(symbol_index as usize);
            let run = usize::from(rs >> 4);
            let magnitude = rs & 0x0F;
            if magnitude == 0 {
                if run < 15 {
                    *eobrun = (1u32 << run) - 1;
                    if run > 0 {
                        *eobrun += self.get_bits(run as u8)? as u32;
                    }
                    break;
                }
                k += 16; // ZRL
                continue;
            }
            k += run;
            if k > end {
                break;
            }
            let value = self.receive_extend(magnitude)?;
            block[k] = value << al;
            k += 1;
        }
        Ok(())
    }

    /// Decode one progressive AC refinement scan band (`Ah > 0`), applying
    /// correction bits to coefficients established by earlier scans and
    /// placing newly-revealed nonzero coefficients, spec.md §4.8.
    pub fn decode_ac_refine(
        &mut self,
        ac_table: &HuffmanTable,
        block: &mut [i32; 64],
        spectral_start: u8,
        spectral_end: u8,
        al: u8,
        eobrun: &mut u32,
    ) -> Result<(), CodecError> {
        let p1 = 1i32 << al;
        let m1 = -1i32 << al;
        let mut k = usize::from(spectral_start);
        let end = usize::from(spectral_end);

        if *eobrun == 0 {
            while k <= end {
                let symbol_index = self.decode_symbol(ac_table)?;
                let rs = ac_table.value(symbol_index as usize);
                let mut run = i32::from(rs >> 4);
                let magnitude = rs & 0x0F;
                let mut new_value = 0i32;

                if magnitude == 0 {
                    if run != 15 {
                        *eobrun = 1u32 << run;
                        if run > 0 {
                            *eobrun += self.get_bits(run as u8)? as u32;
                        }
                        break;
                    }
                    // run == 15: ZRL, skip 16 zero-history coefficients
                    // below while still correcting any nonzero ones found.
                } else {
                    new_value = if self.get_bit()? != 0 { p1 } else { m1 };
                }

                while k <= end {
                    if block[k] != 0 {
                        if self.get_bit()? != 0 && (block[k] & p1) == 0 {
                            block[k] += if block[k] >= 0 { p1 } else { m1 };
                        }
                    } else {
                        if run == 0 {
                            break;
                        }
                        run -= 1;
                    }
                    k += 1;
                }

                if new_value != 0 && k <= end {
                    block[k] = new_value;
                }
                k += 1;
            }
        }

        if *eobrun > 0 {
            while k <= end {
                if block[k] != 0 && self.get_bit()? != 0 && (block[k] & p1) == 0 {
                    block[k] += if block[k] >= 0 { p1 } else { m1 };
                }
                k += 1;
            }
            *eobrun -= 1;
        }
        Ok(())
    }
}
