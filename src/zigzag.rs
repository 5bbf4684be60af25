//! The zig-zag permutation (ITU-T T.81 Figure A.6).
//!
//! JPEG stores DCT coefficients in zig-zag order so that runs of zero
//! high-frequency coefficients cluster at the tail of the block, which the
//! AC Huffman coding (run-length + category) exploits. Everything downstream
//! of the entropy decoder works in zig-zag order; the IDCT collaborator is
//! the one place that needs natural (row-major) order, so it un-zig-zags on
//! the way in.

/// `NATURAL_TO_ZIGZAG[i]` gives the zig-zag index that natural-order index
/// `i` maps to.
#[rustfmt::skip]
pub const NATURAL_TO_ZIGZAG: [usize; 64] = [
     0,  1,  5,  6, 14, 15, 27, 28,
     2,  4,  7, 13, 16, 26, 29, 42,
     3,  8, 12, 17, 25, 30, 41, 43,
     9, 11, 18, 24, 31, 40, 44, 53,
    10, 19, 23, 32, 39, 45, 52, 54,
    20, 22, 33, 38, 46, 51, 55, 60,
    21, 34, 37, 47, 50, 56, 59, 61,
    35, 36, 48, 49, 57, 58, 62, 63,
];

/// `ZIGZAG_TO_NATURAL[i]` gives the natural-order index that zig-zag index
/// `i` maps to. This is the same table `zune-jpeg` calls `UN_ZIGZAG`.
#[rustfmt::skip]
pub const ZIGZAG_TO_NATURAL: [usize; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];
