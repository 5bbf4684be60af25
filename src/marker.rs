//! JPEG marker codes (ITU-T T.81 Table B.1, spec.md §6).
#[derive(Eq, PartialEq, Copy, Clone, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum Marker {
    /// Start of image, 0xFFD8
    SOI,
    /// End of image, 0xFFD9
    EOI,
    /// Start of frame, n identifies which SOF variant (0 = baseline, 2 = progressive, ...)
    SOF(u8),
    /// Define Huffman table(s), 0xFFC4
    DHT,
    /// Define quantization table(s), 0xFFDB
    DQT,
    /// Start of scan, 0xFFDA
    SOS,
    /// Define restart interval, 0xFFDD
    DRI,
    /// Restart marker n, 0..8, 0xFFD0-0xFFD7
    RST(u8),
    /// Application segment n, 0xFFE0-0xFFEF
    APP(u8),
    /// Comment, 0xFFFE
    COM,
    /// Define arithmetic conditioning table(s), 0xFFCC
    DAC,
    /// Define number of lines, 0xFFDC
    DNL,
    /// Any other marker not otherwise named here.
    Other(u8),
}

impl Marker {
    /// Build a `Marker` from the byte that follows a 0xFF prefix.
    ///
    /// Returns `None` for 0xFF and 0x00, which are not markers (stuffing and
    /// the placeholder fill byte respectively) and for 0x01 (TEM, private use).
    pub fn from_u8(byte: u8) -> Option<Marker> {
        let marker = match byte {
            0xD8 => Marker::SOI,
            0xD9 => Marker::EOI,
            0xC0..=0xCF if byte != 0xC4 && byte != 0xC8 && byte != 0xCC => {
                Marker::SOF(byte - 0xC0)
            }
            0xC4 => Marker::DHT,
            0xCC => Marker::DAC,
            0xDA => Marker::SOS,
            0xDB => Marker::DQT,
            0xDC => Marker::DNL,
            0xDD => Marker::DRI,
            0xD0..=0xD7 => Marker::RST(byte - 0xD0),
            0xE0..=0xEF => Marker::APP(byte - 0xE0),
            0xF0..=0xFD => Marker::Other(byte),
            0xFE => Marker::COM,
            // 0x00 is the byte-stuffing sentinel, 0xFF is padding, 0xC8 is
            // the reserved JPG-extension code, and everything below 0xC0 is
            // TEM/reserved — none of these are markers this codec expects.
            _ => return None,
        };
        Some(marker)
    }

    /// Whether this marker carries no payload (SOI, EOI, RSTn have no
    /// length field per spec.md §4.1).
    pub const fn has_no_payload(self) -> bool {
        matches!(self, Marker::SOI | Marker::EOI | Marker::RST(_))
    }
}

impl std::fmt::Debug for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Marker::SOI => write!(f, "SOI"),
            Marker::EOI => write!(f, "EOI"),
            Marker::SOF(n) => write!(f, "SOF{n}"),
            Marker::DHT => write!(f, "DHT"),
            Marker::DQT => write!(f, "DQT"),
            Marker::SOS => write!(f, "SOS"),
            Marker::DRI => write!(f, "DRI"),
            Marker::RST(n) => write!(f, "RST{n}"),
            Marker::APP(n) => write!(f, "APP{n}"),
            Marker::COM => write!(f, "COM"),
            Marker::DAC => write!(f, "DAC"),
            Marker::DNL => write!(f, "DNL"),
            Marker::Other(b) => write!(f, "0xFF{b:02X}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_core_markers() {
        assert_eq!(Marker::from_u8(0xD8), Some(Marker::SOI));
        assert_eq!(Marker::from_u8(0xD9), Some(Marker::EOI));
        assert_eq!(Marker::from_u8(0xC0), Some(Marker::SOF(0)));
        assert_eq!(Marker::from_u8(0xC2), Some(Marker::SOF(2)));
        assert_eq!(Marker::from_u8(0xDB), Some(Marker::DQT));
        assert_eq!(Marker::from_u8(0xC4), Some(Marker::DHT));
        assert_eq!(Marker::from_u8(0xDA), Some(Marker::SOS));
        assert_eq!(Marker::from_u8(0xDD), Some(Marker::DRI));
        assert_eq!(Marker::from_u8(0xD0), Some(Marker::RST(0)));
        assert_eq!(Marker::from_u8(0xD7), Some(Marker::RST(7)));
        assert_eq!(Marker::from_u8(0xE0), Some(Marker::APP(0)));
    }

    #[test]
    fn stuffing_and_fill_are_not_markers() {
        assert_eq!(Marker::from_u8(0x00), None);
        assert_eq!(Marker::from_u8(0xFF), None);
    }

    #[test]
    fn no_payload_markers() {
        assert!(Marker::SOI.has_no_payload());
        assert!(Marker::EOI.has_no_payload());
        assert!(Marker::RST(3).has_no_payload());
        assert!(!Marker::DQT.has_no_payload());
    }
}
