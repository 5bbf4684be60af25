//! `SOS` scan header parsing and baseline entropy-coded scan decode
//! (spec.md §4.7).
use log::debug;

use crate::bitstream::BitReader;
use crate::errors::{CodecError, FormatInvalidReason};
use crate::frame::Frame;
use crate::huffman::HuffmanTable;
use crate::marker::Marker;

/// One component's table assignment within a scan, spec.md §4.7(a).
#[derive(Copy, Clone, Debug)]
pub struct ScanComponentSelector {
    /// Index into `Frame::components`.
    pub component_index: usize,
    pub dc_table_id: usize,
    pub ac_table_id: usize,
}

/// A parsed `SOS` header: which components this scan covers, which Huffman
/// tables they use, and the spectral/successive-approximation parameters
/// (meaningful only for progressive scans; baseline always carries
/// `0, 63, 0, 0`).
#[derive(Clone, Debug)]
pub struct ScanHeader {
    pub selectors: Vec<ScanComponentSelector>,
    pub spectral_start: u8,
    pub spectral_end: u8,
    pub approx_high: u8,
    pub approx_low: u8,
}

pub fn parse_sos(payload: &[u8], frame: &Frame) -> Result<ScanHeader, CodecError> {
    if payload.is_empty() {
        return Err(CodecError::format_invalid(FormatInvalidReason::Sos(
            "SOS payload is empty".to_string(),
        )));
    }
    let ns = payload[0] as usize;
    if ns == 0 || ns > 4 {
        return Err(CodecError::format_invalid(FormatInvalidReason::Sos(format!(
            "scan component count must be 1..=4, found {ns}"
        ))));
    }
    let expected_len = 1 + 2 * ns + 3;
    if payload.len() != expected_len {
        return Err(CodecError::format_invalid(FormatInvalidReason::Sos(format!(
            "SOS length implies {ns} components but payload is {} bytes",
            payload.len()
        ))));
    }

    let mut selectors = Vec::with_capacity(ns);
    for i in 0..ns {
        let cs = payload[1 + i * 2];
        let td_ta = payload[2 + i * 2];
        let component_index = frame
            .components
            .iter()
            .position(|c| c.id == cs)
            .ok_or_else(|| {
                CodecError::format_invalid(FormatInvalidReason::Sos(format!(
                    "scan references component id {cs} not present in the frame"
                )))
            })?;
        selectors.push(ScanComponentSelector {
            component_index,
            dc_table_id: usize::from(td_ta >> 4),
            ac_table_id: usize::from(td_ta & 0x0F),
        });
    }

    let tail = &payload[1 + 2 * ns..];
    let spectral_start = tail[0];
    let spectral_end = tail[1];
    let approx_high = tail[2] >> 4;
    let approx_low = tail[2] & 0x0F;

    if spectral_start > spectral_end {
        return Err(CodecError::format_invalid(FormatInvalidReason::Sos(
            "spectral selection start is greater than end".to_string(),
        )));
    }

    if frame.mode != crate::frame::FrameMode::Progressive
        && (spectral_start, spectral_end, approx_high, approx_low) != (0, 63, 0, 0)
    {
        return Err(CodecError::format_invalid(FormatInvalidReason::Sos(format!(
            "baseline scan must carry (Ss,Se,Ah,Al) = (0,63,0,0), found ({spectral_start},{spectral_end},{approx_high},{approx_low})"
        ))));
    }

    Ok(ScanHeader { selectors, spectral_start, spectral_end, approx_high, approx_low })
}

/// One component's decoded coefficient blocks for the scan, in zig-zag
/// order, indexed in MCU-raster order.
pub struct DecodedComponent {
    pub component_index: usize,
    pub blocks: Vec<[i32; 64]>,
}

/// Decode an entire baseline (non-progressive) entropy-coded scan,
/// producing one block buffer per scanned component. `restart_interval` is
/// the MCU count from the last `DRI` segment (`0` disables restarts).
pub fn decode_baseline_scan(
    frame: &mut Frame,
    scan: &ScanHeader,
    dc_tables: &[Option<HuffmanTable>; 4],
    ac_tables: &[Option<HuffmanTable>; 4],
    restart_interval: u16,
    data: &[u8],
) -> Result<(Vec<DecodedComponent>, usize), CodecError> {
    let (mcus_per_row, mcus_per_column) = frame.mcu_grid();
    let total_mcus = mcus_per_row * mcus_per_column;

    for selector in &scan.selectors {
        frame.components[selector.component_index].dc_pred = 0;
    }

    let mut outputs: Vec<DecodedComponent> = scan
        .selectors
        .iter()
        .map(|s| DecodedComponent {
            component_index: s.component_index,
            blocks: Vec::with_capacity(total_mcus * frame.blocks_per_mcu(&frame.components[s.component_index])),
        })
        .collect();

    let mut reader = BitReader::new(data);
    let mut mcus_until_restart = if restart_interval == 0 { u32::MAX } else { u32::from(restart_interval) };

    for mcu_index in 0..total_mcus {
        for (out_idx, selector) in scan.selectors.iter().enumerate() {
            let blocks_per_mcu = frame.blocks_per_mcu(&frame.components[selector.component_index]);
            let dc_table = dc_tables[selector.dc_table_id].as_ref().ok_or_else(|| {
                CodecError::format_invalid(FormatInvalidReason::Sos(format!(
                    "scan references unset DC table {}",
                    selector.dc_table_id
                )))
            })?;
            let ac_table = ac_tables[selector.ac_table_id].as_ref().ok_or_else(|| {
                CodecError::format_invalid(FormatInvalidReason::Sos(format!(
                    "scan references unset AC table {}",
                    selector.ac_table_id
                )))
            })?;

            for _ in 0..blocks_per_mcu {
                let mut block = [0i32; 64];
                let dc_pred = &mut frame.components[selector.component_index].dc_pred;
                block[0] = reader.decode_dc(dc_table, dc_pred)?;
                reader.decode_ac_block(ac_table, &mut block)?;
                outputs[out_idx].blocks.push(block);
            }
        }

        if mcu_index + 1 == total_mcus {
            break;
        }

        mcus_until_restart -= 1;
        if mcus_until_restart == 0 {
            if let Some(Marker::RST(_)) = reader.marker {
                debug!("restart marker at MCU {mcu_index}");
                reader.reset_after_marker();
                for selector in &scan.selectors {
                    frame.components[selector.component_index].dc_pred = 0;
                }
                mcus_until_restart = u32::from(restart_interval);
            } else {
                // A restart interval elapsed but the encoder didn't place
                // a marker; keep decoding rather than treat it as fatal.
                mcus_until_restart = u32::from(restart_interval.max(1));
            }
        }
    }

    Ok((outputs, reader.byte_position()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::FrameComponent;
    use crate::frame::FrameMode;

    fn grayscale_frame() -> Frame {
        Frame {
            mode: FrameMode::BaselineSequential,
            precision: 8,
            width: 8,
            height: 8,
            components: vec![FrameComponent::parse([1, 0x11, 0]).unwrap()],
        }
    }

    fn sos_payload_grayscale() -> Vec<u8> {
        vec![1, 1, 0x00, 0, 63, 0]
    }

    #[test]
    fn parses_grayscale_sos() {
        let frame = grayscale_frame();
        let scan = parse_sos(&sos_payload_grayscale(), &frame).unwrap();
        assert_eq!(scan.selectors.len(), 1);
        assert_eq!(scan.selectors[0].component_index, 0);
        assert_eq!(scan.spectral_end, 63);
    }

    #[test]
    fn rejects_non_default_successive_approximation_on_baseline_scan() {
        let frame = grayscale_frame();
        // Ah=0,Al=1 instead of the required 0,0 for a baseline scan.
        let payload = vec![1, 1, 0x00, 0, 63, 1];
        assert!(parse_sos(&payload, &frame).is_err());
    }

    #[test]
    fn rejects_restricted_spectral_range_on_baseline_scan() {
        let frame = grayscale_frame();
        let payload = vec![1, 1, 0x00, 0, 10, 0];
        assert!(parse_sos(&payload, &frame).is_err());
    }

    #[test]
    fn rejects_unknown_component_id() {
        let frame = grayscale_frame();
        let payload = vec![1, 9, 0x00, 0, 63, 0];
        assert!(parse_sos(&payload, &frame).is_err());
    }

    #[test]
    fn decodes_single_mcu_all_zero_scan() {
        let mut frame = grayscale_frame();
        let scan = parse_sos(&sos_payload_grayscale(), &frame).unwrap();
        let mut bits = [0u8; 16];
        bits[0] = 1;
        let dc_table = HuffmanTable::build(false, 0, &bits, vec![0]).unwrap();
        let ac_table = HuffmanTable::build(true, 0, &bits, vec![0x00]).unwrap();
        let mut dc_tables: [Option<HuffmanTable>; 4] = [None, None, None, None];
        let mut ac_tables: [Option<HuffmanTable>; 4] = [None, None, None, None];
        dc_tables[0] = Some(dc_table);
        ac_tables[0] = Some(ac_table);

        let data = [0x00, 0x00];
        let (outputs, _) = decode_baseline_scan(&mut frame, &scan, &dc_tables, &ac_tables, 0, &data).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].blocks.len(), 1);
        assert!(outputs[0].blocks[0].iter().all(|&v| v == 0));
    }
}
