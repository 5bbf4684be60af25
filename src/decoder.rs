//! Top-level JPEG decode orchestration (spec.md §4): wires the segment
//! framer through header parsing, entropy decode (baseline or
//! progressive), dequantization, IDCT, upsampling and color conversion,
//! producing an [`RgbaImage`].
use log::{debug, info, warn};

use crate::bitstream::BitReader;
use crate::colorspace::{ColorConverter, GrayscaleConverter, TriangleUpsampler, Upsampler, YCbCrConverter};
use crate::components::{ComponentID, FrameComponent};
use crate::errors::{CodecError, FormatInvalidReason};
use crate::frame::Frame;
use crate::huffman::{self, HuffmanTable};
use crate::idct::{FloatIdct, InverseDct};
use crate::image::RgbaImage;
use crate::jfif::JfifMetadata;
use crate::marker::Marker;
use crate::options::DecoderOptions;
use crate::progressive::ProgressiveCoordinator;
use crate::quant::{self, QuantTable};
use crate::scan::{self, ScanHeader};
use crate::segment::SegmentFramer;
use crate::zigzag::ZIGZAG_TO_NATURAL;

/// The colorspace a frame's components were sampled in, spec.md §4.7(a).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    /// Single component: `Y` only.
    Grayscale,
    /// Three components: `Y`, `Cb`, `Cr`.
    YCbCr,
    /// Anything else this decoder still produces pixels for but doesn't
    /// know how to color-convert meaningfully (passed through as-is).
    Unknown,
}

/// Everything a caller needs about a decoded (or header-only-probed) image
/// besides the pixels themselves.
#[derive(Clone, Debug)]
pub struct ImageInfo {
    pub width: u16,
    pub height: u16,
    pub colorspace: ColorSpace,
    pub is_progressive: bool,
    pub component_count: u8,
    pub jfif: Option<JfifMetadata>,
}

/// Parsed headers plus the entropy-coded byte range, returned by
/// [`Decoder::decode_headers`] and consumed by [`Decoder::decode`].
struct ParsedHeaders {
    frame: Frame,
    info: ImageInfo,
    quant_tables: [Option<QuantTable>; 4],
    dc_tables: [Option<HuffmanTable>; 4],
    ac_tables: [Option<HuffmanTable>; 4],
    restart_interval: u16,
    /// Byte offset of the first scan's entropy-coded data, relative to the
    /// start of the whole buffer.
    first_scan_offset: usize,
    first_scan: ScanHeader,
}

/// A JPEG decoder instance. Holds only the options; all per-image state
/// lives in the call to [`Decoder::decode`] so one `Decoder` can be reused
/// across many images.
#[derive(Clone, Debug)]
pub struct Decoder {
    options: DecoderOptions,
}

impl Default for Decoder {
    fn default() -> Decoder {
        Decoder::new()
    }
}

impl Decoder {
    #[must_use]
    pub fn new() -> Decoder {
        Decoder { options: DecoderOptions::default() }
    }

    #[must_use]
    pub fn with_options(options: DecoderOptions) -> Decoder {
        Decoder { options }
    }

    /// Parse headers only, stopping right before entropy decode. Useful
    /// for callers that only want dimensions/colorspace (spec.md §4.8(d)
    /// probing use case).
    pub fn decode_headers(&self, buf: &[u8]) -> Result<ImageInfo, CodecError> {
        let parsed = self.parse_headers(buf)?;
        Ok(parsed.info)
    }

    /// Decode a whole JPEG buffer into an RGBA image.
    pub fn decode(&self, buf: &[u8]) -> Result<RgbaImage, CodecError> {
        let parsed = self.parse_headers(buf)?;
        if self.options.headers_only {
            return Ok(RgbaImage::blank(u32::from(parsed.info.width), u32::from(parsed.info.height)));
        }

        let mut frame = parsed.frame;
        let component_blocks = if frame.mode == crate::frame::FrameMode::Progressive {
            self.decode_progressive(&mut frame, &parsed, buf)?
        } else {
            self.decode_baseline(&mut frame, &parsed, buf)?
        };

        self.assemble_image(&frame, &parsed.quant_tables, component_blocks)
    }

    fn parse_headers(&self, buf: &[u8]) -> Result<ParsedHeaders, CodecError> {
        if buf.is_empty() {
            return Err(CodecError::input_invalid(crate::errors::InputInvalidReason::EmptyBuffer));
        }

        let mut framer = SegmentFramer::new(buf);
        framer.expect_soi()?;

        let mut frame: Option<Frame> = None;
        let mut jfif: Option<JfifMetadata> = None;
        let mut quant_tables: [Option<QuantTable>; 4] = [None, None, None, None];
        let mut dc_tables: [Option<HuffmanTable>; 4] = [None, None, None, None];
        let mut ac_tables: [Option<HuffmanTable>; 4] = [None, None, None, None];
        let mut restart_interval: u16 = 0;

        loop {
            let segment = framer.next_segment()?.ok_or_else(|| {
                CodecError::format_invalid(FormatInvalidReason::MissingEoi)
            })?;

            match segment.marker {
                Marker::SOF(_) => {
                    frame = Some(Frame::parse(segment.marker, segment.payload)?);
                }
                Marker::APP(0) => match JfifMetadata::parse(segment.payload) {
                    Ok(meta) => jfif = Some(meta),
                    Err(e) => debug!("ignoring malformed APP0 segment: {e}"),
                },
                Marker::DQT => {
                    for table in quant::parse_dqt(segment.payload)? {
                        quant_tables[table.id as usize] = Some(table);
                    }
                }
                Marker::DHT => {
                    for parsed in huffman::parse_dht(segment.payload)? {
                        let slot = if parsed.class_is_ac { &mut ac_tables } else { &mut dc_tables };
                        slot[parsed.id as usize] = Some(parsed.table);
                    }
                }
                Marker::DRI => {
                    if segment.payload.len() != 2 {
                        return Err(CodecError::format_invalid(FormatInvalidReason::Sof(
                            "DRI payload must be exactly 2 bytes".to_string(),
                        )));
                    }
                    restart_interval = u16::from_be_bytes([segment.payload[0], segment.payload[1]]);
                }
                Marker::SOS => {
                    let frame_ref = frame.as_ref().ok_or_else(|| {
                        CodecError::format_invalid(FormatInvalidReason::Sos(
                            "SOS encountered before any SOF".to_string(),
                        ))
                    })?;
                    let scan = scan::parse_sos(segment.payload, frame_ref)?;
                    let frame = frame.expect("checked above");
                    let info = ImageInfo {
                        width: frame.width,
                        height: frame.height,
                        colorspace: colorspace_of(&frame),
                        is_progressive: frame.mode == crate::frame::FrameMode::Progressive,
                        component_count: frame.components.len() as u8,
                        jfif,
                    };
                    let pixels = usize::from(info.width) * usize::from(info.height);
                    if pixels > self.options.max_pixels {
                        return Err(CodecError::unsupported(
                            crate::errors::UnsupportedReason::TargetDimensionTooLarge,
                        ));
                    }
                    return Ok(ParsedHeaders {
                        frame,
                        info,
                        quant_tables,
                        dc_tables,
                        ac_tables,
                        restart_interval,
                        first_scan_offset: framer.position(),
                        first_scan: scan,
                    });
                }
                Marker::EOI => {
                    return Err(CodecError::format_invalid(FormatInvalidReason::Sos(
                        "reached EOI before any SOS".to_string(),
                    )));
                }
                _ => {
                    // APPn (other than 0), COM, and unrecognized-but-valid
                    // markers carry no information this decoder needs.
                }
            }
        }
    }

    fn decode_baseline(
        &self,
        frame: &mut Frame,
        parsed: &ParsedHeaders,
        buf: &[u8],
    ) -> Result<Vec<Vec<[i32; 64]>>, CodecError> {
        let mut per_component: Vec<Vec<[i32; 64]>> = frame
            .components
            .iter()
            .map(|c| vec![[0i32; 64]; frame.component_block_grid(c).0 * frame.component_block_grid(c).1])
            .collect();

        let mut scan = parsed.first_scan.clone();
        let mut offset = parsed.first_scan_offset;

        loop {
            let (outputs, consumed) = scan::decode_baseline_scan(
                frame,
                &scan,
                &parsed.dc_tables,
                &parsed.ac_tables,
                parsed.restart_interval,
                &buf[offset..],
            )?;
            for output in outputs {
                let grid = frame.component_block_grid(&frame.components[output.component_index]);
                let total = grid.0 * grid.1;
                let mut blocks = output.blocks;
                blocks.resize(total, [0i32; 64]);
                per_component[output.component_index] = blocks;
            }
            offset += consumed;

            let mut framer = SegmentFramer::new(buf);
            framer.seek(offset);
            match framer.next_segment()? {
                Some(segment) if segment.marker == Marker::SOS => {
                    scan = scan::parse_sos(segment.payload, frame)?;
                    offset = framer.position();
                }
                Some(segment) if segment.marker == Marker::EOI => break,
                Some(segment) => {
                    warn!("unexpected marker {:?} after baseline scan, treating as end", segment.marker);
                    break;
                }
                None => break,
            }
        }

        Ok(per_component)
    }

    fn decode_progressive(
        &self,
        frame: &mut Frame,
        parsed: &ParsedHeaders,
        buf: &[u8],
    ) -> Result<Vec<Vec<[i32; 64]>>, CodecError> {
        let mut coordinator = ProgressiveCoordinator::new(frame);
        let mut scan = parsed.first_scan.clone();
        let mut offset = parsed.first_scan_offset;
        let mut dc_tables = parsed.dc_tables.clone();
        let mut ac_tables = parsed.ac_tables.clone();

        loop {
            let consumed =
                coordinator.decode_scan(frame, &scan, &dc_tables, &ac_tables, parsed.restart_interval, &buf[offset..])?;
            if self.options.log_progressive_scans {
                info!(
                    "progressive scan complete: Ss={} Se={} Ah={} Al={}, {:.0}% done",
                    scan.spectral_start,
                    scan.spectral_end,
                    scan.approx_high,
                    scan.approx_low,
                    coordinator.progress_percent()
                );
            }
            offset += consumed;

            // A `Completed` state doesn't end the loop here: the encoder
            // may still include further refinement scans, so keep reading
            // until the marker stream runs out or hits EOI.
            let mut framer = SegmentFramer::new(buf);
            framer.seek(offset);
            loop {
                match framer.next_segment()? {
                    Some(segment) if segment.marker == Marker::SOS => {
                        scan = scan::parse_sos(segment.payload, frame)?;
                        offset = framer.position();
                        break;
                    }
                    Some(segment) if segment.marker == Marker::EOI => {
                        return Ok((0..frame.components.len())
                            .map(|i| coordinator.coefficients(i).to_vec())
                            .collect());
                    }
                    Some(segment) if segment.marker == Marker::DHT => {
                        for parsed_table in huffman::parse_dht(segment.payload)? {
                            let slot = if parsed_table.class_is_ac { &mut ac_tables } else { &mut dc_tables };
                            slot[parsed_table.id as usize] = Some(parsed_table.table);
                        }
                        offset = framer.position();
                    }
                    Some(_) => {
                        offset = framer.position();
                    }
                    None => {
                        return Ok((0..frame.components.len())
                            .map(|i| coordinator.coefficients(i).to_vec())
                            .collect());
                    }
                }
            }
        }
    }

    fn assemble_image(
        &self,
        frame: &Frame,
        quant_tables: &[Option<QuantTable>; 4],
        component_blocks: Vec<Vec<[i32; 64]>>,
    ) -> Result<RgbaImage, CodecError> {
        let idct = FloatIdct;
        let (max_h, max_v) = frame.max_sampling();

        // Decode each component to a full-resolution (MCU-padded) sample
        // plane, upsampling subsampled chroma as we go.
        let mut planes: Vec<Vec<u8>> = Vec::with_capacity(frame.components.len());
        let mut plane_dims: Vec<(usize, usize)> = Vec::with_capacity(frame.components.len());

        let (mcus_per_row, mcus_per_column) = frame.mcu_grid();
        let full_width = mcus_per_row * 8 * usize::from(max_h);
        let full_height = mcus_per_column * 8 * usize::from(max_v);

        for (idx, component) in frame.components.iter().enumerate() {
            let quant = quant_tables[component.quantization_table_id as usize].as_ref().ok_or_else(|| {
                CodecError::format_invalid(FormatInvalidReason::Sos(format!(
                    "component references unset quantization table {}",
                    component.quantization_table_id
                )))
            })?;

            let (blocks_per_line, blocks_per_column) = frame.component_block_grid(component);
            let comp_width = blocks_per_line * 8;
            let comp_height = blocks_per_column * 8;
            let mut plane = vec![0u8; comp_width * comp_height];

            let blocks = &component_blocks[idx];
            for block_row in 0..blocks_per_column {
                for block_col in 0..blocks_per_line {
                    let block_index = block_row * blocks_per_line + block_col;
                    let mut natural = [0i32; 64];
                    let zigzag_block = blocks.get(block_index).copied().unwrap_or([0i32; 64]);
                    for (zz_index, &value) in zigzag_block.iter().enumerate() {
                        natural[ZIGZAG_TO_NATURAL[zz_index]] = value;
                    }
                    let mut dequantized = natural;
                    quant.dequantize(&mut dequantized);
                    let samples = idct.inverse_transform(&dequantized);

                    for y in 0..8 {
                        for x in 0..8 {
                            plane[(block_row * 8 + y) * comp_width + block_col * 8 + x] = samples[y * 8 + x];
                        }
                    }
                }
            }

            // Upsample to the frame's full MCU-grid resolution if this
            // component is subsampled.
            let plane = if comp_width == full_width && comp_height == full_height {
                plane
            } else {
                upsample_plane(&plane, comp_width, comp_height, full_width, full_height)
            };

            planes.push(plane);
            plane_dims.push((full_width, full_height));
        }

        let mut rgba = vec![0u8; frame.width as usize * frame.height as usize * 4];
        let width = frame.width as usize;
        let height = frame.height as usize;

        match colorspace_of(frame) {
            ColorSpace::Grayscale => {
                let converter = GrayscaleConverter;
                for y in 0..height {
                    let row = &planes[0][y * full_width..y * full_width + width];
                    let mut out_row = vec![0u8; width * 4];
                    converter.convert_row(row, &[], &[], &mut out_row);
                    rgba[y * width * 4..(y + 1) * width * 4].copy_from_slice(&out_row);
                }
            }
            _ => {
                let converter = YCbCrConverter;
                let y_idx = component_index_for(frame, ComponentID::Y).unwrap_or(0);
                let cb_idx = component_index_for(frame, ComponentID::Cb).unwrap_or(y_idx.min(planes.len() - 1));
                let cr_idx = component_index_for(frame, ComponentID::Cr).unwrap_or(cb_idx);
                for y in 0..height {
                    let y_row = &planes[y_idx][y * full_width..y * full_width + width];
                    let cb_row = &planes[cb_idx][y * full_width..y * full_width + width];
                    let cr_row = &planes[cr_idx][y * full_width..y * full_width + width];
                    let mut out_row = vec![0u8; width * 4];
                    converter.convert_row(y_row, cb_row, cr_row, &mut out_row);
                    rgba[y * width * 4..(y + 1) * width * 4].copy_from_slice(&out_row);
                }
            }
        }

        RgbaImage::new(frame.width.into(), frame.height.into(), rgba)
    }
}

fn component_index_for(frame: &Frame, id: ComponentID) -> Option<usize> {
    frame.components.iter().position(|c| c.component_id == id)
}

fn colorspace_of(frame: &Frame) -> ColorSpace {
    match frame.components.len() {
        1 => ColorSpace::Grayscale,
        3 => ColorSpace::YCbCr,
        _ => ColorSpace::Unknown,
    }
}

/// Nearest-neighbor block-replicate a subsampled plane up to the full MCU
/// grid resolution, then triangle-filter each axis (spec.md §4.7(b)).
/// Block replication first (exact factor from sampling ratios) keeps the
/// upsampler's 1D interface simple: it always sees a plane that's already
/// at a 2x-ish ratio of the target in the worst case.
fn upsample_plane(plane: &[u8], src_w: usize, src_h: usize, dst_w: usize, dst_h: usize) -> Vec<u8> {
    if src_w == 0 || src_h == 0 {
        return vec![0u8; dst_w * dst_h];
    }
    let upsampler = TriangleUpsampler;
    let mut horiz = vec![0u8; dst_w * src_h];
    if src_w == dst_w {
        horiz.copy_from_slice(plane);
    } else {
        for row in 0..src_h {
            let src_row = &plane[row * src_w..(row + 1) * src_w];
            let out_row = upsampler.upsample(src_row, dst_w);
            horiz[row * dst_w..(row + 1) * dst_w].copy_from_slice(&out_row);
        }
    }

    if src_h == dst_h {
        return horiz;
    }
    let mut out = vec![0u8; dst_w * dst_h];
    let mut column = vec![0u8; src_h];
    for col in 0..dst_w {
        for row in 0..src_h {
            column[row] = horiz[row * dst_w + col];
        }
        let resampled = upsampler.upsample(&column, dst_h);
        for row in 0..dst_h {
            out[row * dst_w + col] = resampled[row];
        }
    }
    out
}
