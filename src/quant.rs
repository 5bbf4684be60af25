//! Quantization tables: DQT parsing (spec.md §4.3) and block (de)quantization
//! with quality scaling (spec.md §4.6).
use crate::errors::{CodecError, Context, FormatInvalidReason, QuantError, TruncatedReason};
use crate::zigzag::ZIGZAG_TO_NATURAL;

/// Annex K, Table K.1: baseline luminance quantization table, natural order.
#[rustfmt::skip]
pub const STD_LUMINANCE: [u16; 64] = [
    16, 11, 10, 16,  24,  40,  51,  61,
    12, 12, 14, 19,  26,  58,  60,  55,
    14, 13, 16, 24,  40,  57,  69,  56,
    14, 17, 22, 29,  51,  87,  80,  62,
    18, 22, 37, 56,  68, 109, 103,  77,
    24, 35, 55, 64,  81, 104, 113,  92,
    49, 64, 78, 87, 103, 121, 120, 101,
    72, 92, 95, 98, 112, 100, 103,  99,
];

/// Annex K, Table K.2: baseline chrominance quantization table, natural order.
#[rustfmt::skip]
pub const STD_CHROMINANCE: [u16; 64] = [
    17, 18, 24, 47, 99, 99, 99, 99,
    18, 21, 26, 66, 99, 99, 99, 99,
    24, 26, 56, 99, 99, 99, 99, 99,
    47, 66, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
];

/// Quality-scaling curve used to derive a table from a 1..=100 quality
/// value, spec.md §4.6: each curve converts `quality` to a scale factor `S`
/// that every base-table entry is multiplied by, rounded, then clamped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QualityScaling {
    /// `S = (100-q)/50` for `q >= 50`, else `S = 50/q`.
    Standard,
    /// `S = (100-q)/100`.
    Linear,
    /// `S = (1 - q/100)^1.5`.
    Perceptual,
}

/// Sample precision a quantization table's entries are clamped to, spec.md
/// §4.6(c): "max is 255 (8-bit) or 65535 (16-bit)". Mirrors the precision a
/// `DQT` segment itself carries (`parse_dqt`'s `Pq` nibble).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Precision {
    Eight,
    Sixteen,
}

impl Precision {
    fn max_value(self) -> i64 {
        match self {
            Precision::Eight => i64::from(u8::MAX),
            Precision::Sixteen => i64::from(u16::MAX),
        }
    }
}

/// Rounding applied when quantizing a DCT coefficient, spec.md §4.6(b).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RoundingMode {
    /// Round to nearest, ties away from zero (what libjpeg does).
    NearestAwayFromZero,
    /// Truncate toward zero.
    Truncate,
}

/// One decoded (or synthesized) quantization table, stored in natural
/// (row-major) order so block math never has to un-zig-zag it per use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuantTable {
    pub id: u8,
    pub values: [u16; 64],
}

impl QuantTable {
    /// Scale a base table (already in natural order) to a 1..=100 quality
    /// value using the requested curve.
    pub fn from_quality(
        id: u8,
        base: &[u16; 64],
        quality: i32,
        scaling: QualityScaling,
        precision: Precision,
    ) -> Result<QuantTable, CodecError> {
        use crate::errors::InputInvalidReason;
        if !(1..=100).contains(&quality) {
            return Err(CodecError::input_invalid(InputInvalidReason::QualityOutOfRange(quality)));
        }
        let q = f64::from(quality);
        let scale_factor = match scaling {
            QualityScaling::Standard => {
                if q >= 50.0 {
                    (100.0 - q) / 50.0
                } else {
                    50.0 / q
                }
            }
            QualityScaling::Linear => (100.0 - q) / 100.0,
            QualityScaling::Perceptual => (1.0 - q / 100.0).powf(1.5),
        };

        let max = precision.max_value();
        let mut values = [0u16; 64];
        for (dst, &src) in values.iter_mut().zip(base.iter()) {
            let scaled = (f64::from(src) * scale_factor).round() as i64;
            *dst = scaled.clamp(1, max) as u16;
        }
        Ok(QuantTable { id, values })
    }

    /// Quantize one natural-order DCT coefficient block in place.
    pub fn quantize(&self, block: &mut [i32; 64], rounding: RoundingMode) {
        for i in 0..64 {
            let q = i32::from(self.values[i]);
            block[i] = match rounding {
                RoundingMode::NearestAwayFromZero => {
                    let half = q / 2;
                    if block[i] >= 0 { (block[i] + half) / q } else { -((-block[i] + half) / q) }
                }
                RoundingMode::Truncate => block[i] / q,
            };
        }
    }

    /// Dequantize one natural-order coefficient block in place, spec.md
    /// §4.6(a): `coefficient * quant_value`.
    pub fn dequantize(&self, block: &mut [i32; 64]) {
        for i in 0..64 {
            block[i] *= i32::from(self.values[i]);
        }
    }
}

/// One or more quantization tables parsed from a single DQT segment payload
/// (spec.md §4.3). A segment may pack several tables back to back.
pub fn parse_dqt(payload: &[u8]) -> Result<Vec<QuantTable>, CodecError> {
    let mut tables = Vec::new();
    let mut cursor = 0usize;
    while cursor < payload.len() {
        let pq_tq = *payload.get(cursor).ok_or_else(|| {
            CodecError::truncated(TruncatedReason::UnexpectedEndOfStream)
                .with_context(Context::none().at_offset(cursor))
        })?;
        cursor += 1;
        let precision = pq_tq >> 4;
        let id = pq_tq & 0x0F;
        if id >= 4 {
            return Err(CodecError::format_invalid(FormatInvalidReason::Quant(
                QuantError::InvalidSlotId,
            ))
            .with_context(Context::none().with_table_id(id)));
        }
        let entry_bytes = match precision {
            0 => 1,
            1 => 2,
            _ => {
                return Err(CodecError::format_invalid(FormatInvalidReason::Quant(
                    QuantError::InvalidPrecision,
                ))
                .with_context(Context::none().with_table_id(id)))
            }
        };
        let needed = entry_bytes * 64;
        if cursor + needed > payload.len() {
            return Err(CodecError::format_invalid(FormatInvalidReason::Quant(
                QuantError::TruncatedValues,
            ))
            .with_context(Context::none().with_table_id(id)));
        }

        let mut values_zigzag = [0u16; 64];
        for (i, slot) in values_zigzag.iter_mut().enumerate() {
            *slot = if precision == 0 {
                u16::from(payload[cursor + i])
            } else {
                let off = cursor + i * 2;
                u16::from_be_bytes([payload[off], payload[off + 1]])
            };
        }
        cursor += needed;

        if values_zigzag.iter().any(|&v| v == 0) {
            return Err(CodecError::format_invalid(FormatInvalidReason::Quant(
                QuantError::ZeroValue,
            ))
            .with_context(Context::none().with_table_id(id)));
        }

        let mut values = [0u16; 64];
        for (zigzag_index, &v) in values_zigzag.iter().enumerate() {
            values[ZIGZAG_TO_NATURAL[zigzag_index]] = v;
        }
        tables.push(QuantTable { id, values });
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dqt_payload_8bit(id: u8, value: u8) -> Vec<u8> {
        let mut v = vec![id];
        v.extend(std::iter::repeat(value).take(64));
        v
    }

    #[test]
    fn parses_single_8bit_table() {
        let payload = dqt_payload_8bit(0, 7);
        let tables = parse_dqt(&payload).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].id, 0);
        assert!(tables[0].values.iter().all(|&v| v == 7));
    }

    #[test]
    fn rejects_zero_entry() {
        let payload = dqt_payload_8bit(0, 0);
        assert!(parse_dqt(&payload).is_err());
    }

    #[test]
    fn rejects_bad_slot_id() {
        let payload = dqt_payload_8bit(4, 5);
        assert!(parse_dqt(&payload).is_err());
    }

    #[test]
    fn rejects_truncated_payload() {
        let payload = vec![0u8, 1, 2, 3];
        assert!(parse_dqt(&payload).is_err());
    }

    #[test]
    fn quality_100_linear_is_near_identity() {
        let table =
            QuantTable::from_quality(0, &STD_LUMINANCE, 100, QualityScaling::Linear, Precision::Eight).unwrap();
        // S = (100-q)/100 is 0 at q=100, so every entry clamps to its floor of 1.
        assert!(table.values.iter().all(|&v| v == 1));
    }

    #[test]
    fn standard_scaling_matches_documented_formula() {
        let q75 = QuantTable::from_quality(0, &STD_LUMINANCE, 75, QualityScaling::Standard, Precision::Eight)
            .unwrap();
        // S = (100-75)/50 = 0.5
        for (base, scaled) in STD_LUMINANCE.iter().zip(q75.values.iter()) {
            let expected = ((f64::from(*base) * 0.5).round() as i64).clamp(1, 255) as u16;
            assert_eq!(*scaled, expected);
        }
    }

    #[test]
    fn perceptual_scaling_matches_documented_formula() {
        let q80 = QuantTable::from_quality(0, &STD_LUMINANCE, 80, QualityScaling::Perceptual, Precision::Eight)
            .unwrap();
        // S = (1 - 80/100)^1.5
        let s = (1.0f64 - 0.8).powf(1.5);
        for (base, scaled) in STD_LUMINANCE.iter().zip(q80.values.iter()) {
            let expected = ((f64::from(*base) * s).round() as i64).clamp(1, 255) as u16;
            assert_eq!(*scaled, expected);
        }
    }

    #[test]
    fn sixteen_bit_precision_clamps_to_a_wider_ceiling() {
        let huge_base = [u16::MAX; 64];
        let table =
            QuantTable::from_quality(0, &huge_base, 1, QualityScaling::Standard, Precision::Sixteen).unwrap();
        // S = 50/1 = 50, so the scaled value saturates at the 16-bit ceiling.
        assert!(table.values.iter().all(|&v| v == u16::MAX));
    }

    #[test]
    fn rejects_out_of_range_quality() {
        assert!(QuantTable::from_quality(0, &STD_LUMINANCE, 0, QualityScaling::Linear, Precision::Eight).is_err());
        assert!(
            QuantTable::from_quality(0, &STD_LUMINANCE, 101, QualityScaling::Linear, Precision::Eight).is_err()
        );
    }

    #[test]
    fn quantize_dequantize_round_trip_is_lossy_but_bounded() {
        let table = QuantTable { id: 0, values: [8; 64] };
        let mut block = [100i32; 64];
        table.quantize(&mut block, RoundingMode::NearestAwayFromZero);
        table.dequantize(&mut block);
        for &v in block.iter() {
            assert!((v - 100).abs() <= 8);
        }
    }
}
