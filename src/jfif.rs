//! JFIF (APP0) metadata parsing (spec.md §4.2).
use crate::errors::{CodecError, FormatInvalidReason};

/// Density units carried in a JFIF `APP0` segment.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DensityUnits {
    /// No units; `x_density`/`y_density` give the pixel aspect ratio only.
    None,
    /// Dots (pixels) per inch.
    Dpi,
    /// Dots (pixels) per centimeter.
    Ppcm,
}

impl DensityUnits {
    fn from_u8(b: u8) -> DensityUnits {
        match b {
            1 => DensityUnits::Dpi,
            2 => DensityUnits::Ppcm,
            _ => DensityUnits::None,
        }
    }
}

/// An embedded RGB thumbnail, `width*height*3` bytes, row-major, no alpha.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u8,
    pub height: u8,
    pub rgb: Vec<u8>,
}

/// Parsed `APP0` JFIF/JFXX record (spec.md §3, §6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JfifMetadata {
    pub version_major: u8,
    pub version_minor: u8,
    pub units: DensityUnits,
    pub x_density: u16,
    pub y_density: u16,
    pub thumbnail: Option<Thumbnail>,
    /// Was this an extension (`JFXX\0`) identifier rather than `JFIF\0`.
    pub is_extension: bool,
}

const JFIF_IDENT: &[u8; 5] = b"JFIF\0";
const JFXX_IDENT: &[u8; 5] = b"JFXX\0";

impl JfifMetadata {
    /// Parse a JFIF `APP0` payload (the bytes following the 2-byte length
    /// field).
    pub fn parse(payload: &[u8]) -> Result<JfifMetadata, CodecError> {
        if payload.len() < 5 {
            return Err(CodecError::format_invalid(FormatInvalidReason::Jfif(
                "APP0 payload shorter than the 5-byte identifier".to_string(),
            )));
        }
        let ident: &[u8; 5] = payload[0..5].try_into().unwrap();
        let is_extension = if ident == JFIF_IDENT {
            false
        } else if ident == JFXX_IDENT {
            true
        } else {
            // The tolerance for unknown *versions* doesn't extend to the
            // identifier string itself: only `JFIF\0`/`JFXX\0` are valid
            // APP0 markers, so anything else is rejected outright.
            return Err(CodecError::format_invalid(FormatInvalidReason::Jfif(format!(
                "unrecognized APP0 identifier {:?}",
                String::from_utf8_lossy(&payload[0..5])
            ))));
        };

        if is_extension || payload.len() < 14 {
            return Ok(JfifMetadata {
                version_major: 0,
                version_minor: 0,
                units: DensityUnits::None,
                x_density: 0,
                y_density: 0,
                thumbnail: None,
                is_extension: true,
            });
        }

        let version_major = payload[5];
        let version_minor = payload[6];
        let units = DensityUnits::from_u8(payload[7]);
        let x_density = u16::from_be_bytes([payload[8], payload[9]]);
        let y_density = u16::from_be_bytes([payload[10], payload[11]]);
        let thumb_w = payload[12];
        let thumb_h = payload[13];

        let thumbnail = if thumb_w == 0 || thumb_h == 0 {
            None
        } else {
            let expected = usize::from(thumb_w) * usize::from(thumb_h) * 3;
            let available = &payload[14..];
            if available.len() < expected {
                return Err(CodecError::format_invalid(FormatInvalidReason::Jfif(format!(
                    "thumbnail expects {expected} bytes, found {}",
                    available.len()
                ))));
            }
            Some(Thumbnail { width: thumb_w, height: thumb_h, rgb: available[..expected].to_vec() })
        };

        Ok(JfifMetadata {
            version_major,
            version_minor,
            units,
            x_density,
            y_density,
            thumbnail,
            is_extension: false,
        })
    }

    /// Convert the stored density to dots-per-inch, per spec.md §4.2(a).
    /// `None` units have no physical meaning, so this returns the raw
    /// density unchanged (matching the "aspect ratio only" reading of
    /// `DensityUnits::None`).
    pub fn to_dpi(&self) -> (f64, f64) {
        const CM_PER_INCH: f64 = 2.54;
        match self.units {
            DensityUnits::Dpi => (f64::from(self.x_density), f64::from(self.y_density)),
            DensityUnits::Ppcm => (
                f64::from(self.x_density) * CM_PER_INCH,
                f64::from(self.y_density) * CM_PER_INCH,
            ),
            DensityUnits::None => (f64::from(self.x_density), f64::from(self.y_density)),
        }
    }

    /// Pixel aspect ratio `x_density / y_density`, spec.md §4.2(b).
    pub fn pixel_aspect_ratio(&self) -> f64 {
        if self.y_density == 0 {
            1.0
        } else {
            f64::from(self.x_density) / f64::from(self.y_density)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// S1: Minimal JFIF round-trip from spec.md §8.
    #[test]
    fn s1_minimal_jfif_round_trip() {
        let payload = [
            0x4A, 0x46, 0x49, 0x46, 0x00, // "JFIF\0"
            0x01, 0x02, // version 1.02
            0x01, // units = dpi
            0x00, 0x48, // x density 72
            0x00, 0x48, // y density 72
            0x00, 0x00, // no thumbnail
        ];
        let meta = JfifMetadata::parse(&payload).unwrap();
        assert_eq!((meta.version_major, meta.version_minor), (1, 2));
        assert_eq!(meta.units, DensityUnits::Dpi);
        assert_eq!(meta.x_density, 72);
        assert_eq!(meta.y_density, 72);
        assert!(meta.thumbnail.is_none());
        assert_eq!(meta.pixel_aspect_ratio(), 1.0);
        assert_eq!(meta.to_dpi(), (72.0, 72.0));
    }

    #[test]
    fn rejects_bad_identifier() {
        let payload = [0x41, 0x42, 0x43, 0x44, 0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(JfifMetadata::parse(&payload).is_err());
    }

    #[test]
    fn thumbnail_byte_shortage_is_an_error() {
        let mut payload = vec![
            0x4A, 0x46, 0x49, 0x46, 0x00, 1, 2, 1, 0, 72, 0, 72, 2, 2, // 2x2 thumbnail = 12 bytes
        ];
        payload.extend_from_slice(&[0; 4]); // too few bytes
        assert!(JfifMetadata::parse(&payload).is_err());
    }

    #[test]
    fn ppcm_converts_to_dpi() {
        let payload = [0x4A, 0x46, 0x49, 0x46, 0x00, 1, 2, 2, 0, 100, 0, 100, 0, 0];
        let meta = JfifMetadata::parse(&payload).unwrap();
        let (dpi_x, dpi_y) = meta.to_dpi();
        assert!((dpi_x - 254.0).abs() < 1e-9);
        assert!((dpi_y - 254.0).abs() < 1e-9);
    }
}
