//! A minimal baseline (non-progressive) JPEG encoder (spec.md §6's "for
//! encode: the reverse" direction), reusing [`crate::quant`]'s quantization
//! and [`crate::huffman`]'s canonical Huffman machinery.
use crate::errors::{CodecError, InputInvalidReason};
use crate::image::RgbaImage;
use crate::options::QuantizationOptions;
use crate::quant::{Precision, QuantTable, RoundingMode, STD_CHROMINANCE, STD_LUMINANCE};
use crate::zigzag::NATURAL_TO_ZIGZAG;

/// Forward-DCT collaborator, the encode-direction counterpart of
/// [`crate::idct::InverseDct`]. Takes one level-shifted 8x8 sample block and
/// returns natural-order DCT coefficients.
pub trait ForwardDct {
    fn forward_transform(&self, samples: &[u8; 64]) -> [i32; 64];
}

/// Separable 2D DCT-II, computed directly from its definition rather than a
/// fast algorithm; encode speed isn't this crate's focus (spec.md §1).
#[derive(Copy, Clone, Debug, Default)]
pub struct DirectFdct;

impl ForwardDct for DirectFdct {
    fn forward_transform(&self, samples: &[u8; 64]) -> [i32; 64] {
        let mut shifted = [0f32; 64];
        for (dst, &src) in shifted.iter_mut().zip(samples.iter()) {
            *dst = f32::from(src) - 128.0;
        }

        let mut rows = [0f32; 64];
        for r in 0..8 {
            for u in 0..8 {
                rows[r * 8 + u] = dct_1d(&shifted[r * 8..r * 8 + 8], u);
            }
        }

        let mut out = [0i32; 64];
        for c in 0..8 {
            let column: [f32; 8] = std::array::from_fn(|r| rows[r * 8 + c]);
            for v in 0..8 {
                out[v * 8 + c] = dct_1d(&column, v).round() as i32;
            }
        }
        out
    }
}

fn dct_1d(input: &[f32], u: usize) -> f32 {
    let cu = if u == 0 { std::f32::consts::FRAC_1_SQRT_2 } else { 1.0 };
    let sum: f32 = input
        .iter()
        .enumerate()
        .map(|(x, &s)| s * (std::f32::consts::PI / 8.0 * (x as f32 + 0.5) * u as f32).cos())
        .sum();
    0.5 * cu * sum
}

/// MSB-first bit writer with JPEG byte stuffing, the mirror image of
/// [`crate::bitstream::BitReader`].
struct BitWriter {
    out: Vec<u8>,
    buffer: u32,
    bits_used: u32,
}

impl BitWriter {
    fn new() -> BitWriter {
        BitWriter { out: Vec::new(), buffer: 0, bits_used: 0 }
    }

    fn put_bits(&mut self, value: u32, len: u8) {
        if len == 0 {
            return;
        }
        self.buffer = (self.buffer << len) | (value & ((1u32 << len) - 1));
        self.bits_used += u32::from(len);
        while self.bits_used >= 8 {
            self.bits_used -= 8;
            let byte = ((self.buffer >> self.bits_used) & 0xFF) as u8;
            self.out.push(byte);
            if byte == 0xFF {
                self.out.push(0x00);
            }
        }
    }

    /// Pad the final partial byte with 1 bits (the JPEG convention) and
    /// return the written bytes.
    fn finish(mut self) -> Vec<u8> {
        if self.bits_used > 0 {
            let pad = 8 - self.bits_used;
            self.put_bits((1 << pad) - 1, pad as u8);
        }
        self.out
    }
}

/// Category (bit length) and value of a signed coefficient, ITU-T T.81
/// Table K's `HUFF_EXTEND` inverse.
fn magnitude_category(value: i32) -> (u8, u32) {
    if value == 0 {
        return (0, 0);
    }
    let abs = value.unsigned_abs();
    let category = (32 - abs.leading_zeros()) as u8;
    let bits = if value >= 0 { value } else { value + (1i32 << category) - 1 };
    (category, bits as u32)
}

/// A canonical Huffman encode table: `code[symbol] -> (bits, length)`.
struct EncodeTable {
    codes: [(u16, u8); 256],
}

impl EncodeTable {
    fn build(bits: &[u8; 16], values: &[u8]) -> EncodeTable {
        let mut codes = [(0u16, 0u8); 256];
        let mut code = 0u16;
        let mut k = 0usize;
        for (i, &count) in bits.iter().enumerate() {
            let len = (i + 1) as u8;
            for _ in 0..count {
                codes[values[k] as usize] = (code, len);
                code += 1;
                k += 1;
            }
            code <<= 1;
        }
        EncodeTable { codes }
    }

    fn encode(&self, writer: &mut BitWriter, symbol: u8) {
        let (code, len) = self.codes[symbol as usize];
        writer.put_bits(u32::from(code), len);
    }
}

/// Standard DC luminance table, ITU-T T.81 Annex K.3, Table K.3.
const STD_DC_LUMINANCE_BITS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
const STD_DC_LUMINANCE_VALUES: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// Standard AC luminance table, ITU-T T.81 Annex K.3, Table K.5.
#[rustfmt::skip]
const STD_AC_LUMINANCE_BITS: [u8; 16] = [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7d];
#[rustfmt::skip]
const STD_AC_LUMINANCE_VALUES: [u8; 162] = [
    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61, 0x07,
    0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08, 0x23, 0x42, 0xb1, 0xc1, 0x15, 0x52, 0xd1, 0xf0,
    0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x25, 0x26, 0x27, 0x28,
    0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49,
    0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69,
    0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
    0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7,
    0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5,
    0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe1, 0xe2,
    0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

/// Standard DC chrominance table, Table K.4.
const STD_DC_CHROMINANCE_BITS: [u8; 16] = [0, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0];
const STD_DC_CHROMINANCE_VALUES: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// Standard AC chrominance table, Table K.6.
#[rustfmt::skip]
const STD_AC_CHROMINANCE_BITS: [u8; 16] = [0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 0x77];
#[rustfmt::skip]
const STD_AC_CHROMINANCE_VALUES: [u8; 162] = [
    0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21, 0x31, 0x06, 0x12, 0x41, 0x51, 0x07, 0x61, 0x71,
    0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91, 0xa1, 0xb1, 0xc1, 0x09, 0x23, 0x33, 0x52, 0xf0,
    0x15, 0x62, 0x72, 0xd1, 0x0a, 0x16, 0x24, 0x34, 0xe1, 0x25, 0xf1, 0x17, 0x18, 0x19, 0x1a, 0x26,
    0x27, 0x28, 0x29, 0x2a, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48,
    0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68,
    0x69, 0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87,
    0x88, 0x89, 0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5,
    0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3,
    0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda,
    0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

/// Encodes RGBA images to baseline (4:4:4, non-interleaved-subsampling)
/// JPEG. Always uses the standard Annex K Huffman tables rather than
/// deriving optimal ones per image; spec.md scopes this encoder down from
/// a full optimizing encoder (§3.3).
pub struct Encoder<D: ForwardDct = DirectFdct> {
    fdct: D,
}

impl Default for Encoder<DirectFdct> {
    fn default() -> Encoder<DirectFdct> {
        Encoder { fdct: DirectFdct }
    }
}

impl<D: ForwardDct> Encoder<D> {
    pub fn with_fdct(fdct: D) -> Encoder<D> {
        Encoder { fdct }
    }

    /// Encode `image` to a complete JPEG byte stream.
    pub fn encode(&self, image: &RgbaImage, options: &QuantizationOptions) -> Result<Vec<u8>, CodecError> {
        if image.width == 0 || image.height == 0 {
            return Err(CodecError::input_invalid(InputInvalidReason::ZeroTargetDimension));
        }

        let luma_q =
            QuantTable::from_quality(0, &STD_LUMINANCE, options.quality, options.scaling, options.precision)?;
        let chroma_q =
            QuantTable::from_quality(1, &STD_CHROMINANCE, options.quality, options.scaling, options.precision)?;

        let dc_luma = EncodeTable::build(&STD_DC_LUMINANCE_BITS, &STD_DC_LUMINANCE_VALUES);
        let ac_luma = EncodeTable::build(&STD_AC_LUMINANCE_BITS, &STD_AC_LUMINANCE_VALUES);
        let dc_chroma = EncodeTable::build(&STD_DC_CHROMINANCE_BITS, &STD_DC_CHROMINANCE_VALUES);
        let ac_chroma = EncodeTable::build(&STD_AC_CHROMINANCE_BITS, &STD_AC_CHROMINANCE_VALUES);

        let (y_plane, cb_plane, cr_plane) = rgb_to_ycbcr_planes(image);

        let blocks_per_line = (image.width as usize + 7) / 8;
        let blocks_per_column = (image.height as usize + 7) / 8;

        let mut writer = BitWriter::new();
        let mut dc_pred = [0i32; 3];
        for block_row in 0..blocks_per_column {
            for block_col in 0..blocks_per_line {
                for (plane_idx, plane) in [&y_plane, &cb_plane, &cr_plane].into_iter().enumerate() {
                    let samples = extract_block(plane, image.width as usize, image.height as usize, block_row, block_col);
                    let coefficients = self.fdct.forward_transform(&samples);
                    let quant = if plane_idx == 0 { &luma_q } else { &chroma_q };
                    let mut natural = coefficients;
                    quant.quantize(&mut natural, options.rounding);

                    let mut zigzag = [0i32; 64];
                    for (natural_index, &value) in natural.iter().enumerate() {
                        zigzag[NATURAL_TO_ZIGZAG[natural_index]] = value;
                    }

                    let (dc_table, ac_table) =
                        if plane_idx == 0 { (&dc_luma, &ac_luma) } else { (&dc_chroma, &ac_chroma) };
                    encode_block(&mut writer, &zigzag, &mut dc_pred[plane_idx], dc_table, ac_table);
                }
            }
        }
        let entropy_data = writer.finish();

        Ok(build_stream(image, &luma_q, &chroma_q, &entropy_data, options.precision))
    }
}

fn encode_block(
    writer: &mut BitWriter,
    zigzag: &[i32; 64],
    dc_pred: &mut i32,
    dc_table: &EncodeTable,
    ac_table: &EncodeTable,
) {
    let diff = zigzag[0] - *dc_pred;
    *dc_pred = zigzag[0];
    let (category, bits) = magnitude_category(diff);
    dc_table.encode(writer, category);
    writer.put_bits(bits, category);

    let mut run = 0u8;
    for k in 1..64 {
        if zigzag[k] == 0 {
            run += 1;
            continue;
        }
        while run >= 16 {
            ac_table.encode(writer, 0xF0); // ZRL
            run -= 16;
        }
        let (category, bits) = magnitude_category(zigzag[k]);
        ac_table.encode(writer, (run << 4) | category);
        writer.put_bits(bits, category);
        run = 0;
    }
    if run > 0 {
        ac_table.encode(writer, 0x00); // EOB
    }
}

fn rgb_to_ycbcr_planes(image: &RgbaImage) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let n = image.width as usize * image.height as usize;
    let mut y = vec![0u8; n];
    let mut cb = vec![0u8; n];
    let mut cr = vec![0u8; n];
    for (i, px) in image.data.chunks_exact(4).enumerate() {
        let (r, g, b) = (f32::from(px[0]), f32::from(px[1]), f32::from(px[2]));
        y[i] = (0.299 * r + 0.587 * g + 0.114 * b).round().clamp(0.0, 255.0) as u8;
        cb[i] = (128.0 - 0.168736 * r - 0.331264 * g + 0.5 * b).round().clamp(0.0, 255.0) as u8;
        cr[i] = (128.0 + 0.5 * r - 0.418688 * g - 0.081312 * b).round().clamp(0.0, 255.0) as u8;
    }
    (y, cb, cr)
}

/// Read one 8x8 block from `plane`, clamping at the bottom/right edges
/// when the image dimensions aren't multiples of 8 (spec.md §4.7(e), the
/// encode-direction mirror of the decoder's MCU padding).
fn extract_block(plane: &[u8], width: usize, height: usize, block_row: usize, block_col: usize) -> [u8; 64] {
    let mut block = [0u8; 64];
    for y in 0..8 {
        let sy = (block_row * 8 + y).min(height - 1);
        for x in 0..8 {
            let sx = (block_col * 8 + x).min(width - 1);
            block[y * 8 + x] = plane[sy * width + sx];
        }
    }
    block
}

fn build_stream(
    image: &RgbaImage,
    luma_q: &QuantTable,
    chroma_q: &QuantTable,
    entropy_data: &[u8],
    precision: Precision,
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&[0xFF, 0xD8]); // SOI

    write_dqt(&mut out, luma_q, precision);
    write_dqt(&mut out, chroma_q, precision);

    // SOF0: 4:4:4, 3 components.
    out.extend_from_slice(&[0xFF, 0xC0]);
    let mut sof = vec![8u8];
    sof.extend_from_slice(&(image.height as u16).to_be_bytes());
    sof.extend_from_slice(&(image.width as u16).to_be_bytes());
    sof.push(3);
    sof.extend_from_slice(&[1, 0x11, 0]);
    sof.extend_from_slice(&[2, 0x11, 1]);
    sof.extend_from_slice(&[3, 0x11, 1]);
    write_segment(&mut out, 0xC0, &sof);

    write_dht(&mut out, 0x00, &STD_DC_LUMINANCE_BITS, &STD_DC_LUMINANCE_VALUES);
    write_dht(&mut out, 0x10, &STD_AC_LUMINANCE_BITS, &STD_AC_LUMINANCE_VALUES);
    write_dht(&mut out, 0x01, &STD_DC_CHROMINANCE_BITS, &STD_DC_CHROMINANCE_VALUES);
    write_dht(&mut out, 0x11, &STD_AC_CHROMINANCE_BITS, &STD_AC_CHROMINANCE_VALUES);

    // SOS
    out.extend_from_slice(&[0xFF, 0xDA]);
    let sos = vec![3, 1, 0x00, 2, 0x11, 3, 0x11, 0, 63, 0];
    write_segment(&mut out, 0xDA, &sos);

    out.extend_from_slice(entropy_data);
    out.extend_from_slice(&[0xFF, 0xD9]); // EOI
    out
}

fn write_segment(out: &mut Vec<u8>, _marker: u8, payload: &[u8]) {
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(payload);
}

fn write_dqt(out: &mut Vec<u8>, table: &QuantTable, precision: Precision) {
    out.extend_from_slice(&[0xFF, 0xDB]);
    let pq = match precision {
        Precision::Eight => 0u8,
        Precision::Sixteen => 1u8,
    };
    let mut payload = vec![(pq << 4) | table.id];
    for zz in 0..64 {
        let natural = crate::zigzag::ZIGZAG_TO_NATURAL[zz];
        let value = table.values[natural];
        match precision {
            Precision::Eight => payload.push(value as u8),
            Precision::Sixteen => payload.extend_from_slice(&value.to_be_bytes()),
        }
    }
    write_segment(out, 0xDB, &payload);
}

fn write_dht(out: &mut Vec<u8>, class_and_id: u8, bits: &[u8; 16], values: &[u8]) {
    out.extend_from_slice(&[0xFF, 0xC4]);
    let mut payload = vec![class_and_id];
    payload.extend_from_slice(bits);
    payload.extend_from_slice(values);
    write_segment(out, 0xC4, &payload);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_category_zero_is_special_cased() {
        assert_eq!(magnitude_category(0), (0, 0));
    }

    #[test]
    fn magnitude_category_matches_known_values() {
        assert_eq!(magnitude_category(1), (1, 1));
        assert_eq!(magnitude_category(-1), (1, 0));
        assert_eq!(magnitude_category(-3), (2, 0));
        assert_eq!(magnitude_category(4), (3, 4));
    }

    #[test]
    fn encodes_solid_color_image() {
        let image = RgbaImage::new(8, 8, vec![128u8, 64, 200, 255].repeat(64)).unwrap();
        let encoder = Encoder::default();
        let options = QuantizationOptions::default();
        let jpeg = encoder.encode(&image, &options).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn rejects_zero_dimension_image() {
        let image = RgbaImage::blank(0, 0);
        let encoder = Encoder::default();
        let options = QuantizationOptions::default();
        assert!(encoder.encode(&image, &options).is_err());
    }

    #[test]
    fn direct_fdct_of_flat_block_has_only_dc_component() {
        let samples = [128u8; 64];
        let coefficients = DirectFdct.forward_transform(&samples);
        assert_eq!(coefficients[0], 0); // level-shifted flat block: DC is 0
        assert!(coefficients[1..].iter().all(|&v| v.abs() <= 1));
    }
}
