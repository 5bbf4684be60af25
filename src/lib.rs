//! A platform-native JPEG (ITU-T T.81) decoder/encoder plus a general
//! purpose RGBA resampling and rotation engine.
#![allow(clippy::needless_return, clippy::similar_names, clippy::inline_always)]
#![warn(clippy::correctness, clippy::perf, clippy::pedantic)]
#[macro_use]
extern crate log;

pub mod bitstream;
pub mod colorspace;
pub mod components;
pub mod decoder;
pub mod encoder;
pub mod errors;
pub mod frame;
pub mod huffman;
pub mod idct;
pub mod image;
pub mod jfif;
pub mod marker;
pub mod options;
pub mod progressive;
pub mod quant;
pub mod resize;
pub mod rotate;
pub mod scan;
pub mod segment;
mod util;
pub mod zigzag;

pub use crate::decoder::{ColorSpace, Decoder, ImageInfo};
pub use crate::encoder::Encoder;
pub use crate::errors::CodecError;
pub use crate::image::RgbaImage;
pub use crate::options::{DecoderOptions, QuantizationOptions, ResizeOptions, RotateOptions};
