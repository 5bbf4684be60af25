//! Progressive scan coordinator (spec.md §4.8).
//!
//! A progressive frame splits each component's coefficients across many
//! scans: a DC pass, then successive AC spectral bands, each optionally
//! followed by refinement scans that add one more bit of precision. This
//! module owns the coefficient storage across that whole sequence and
//! enforces the ordering rules a single scan decoder can't see on its own.
use std::collections::HashSet;

use log::debug;

use crate::bitstream::BitReader;
use crate::errors::{CodecError, FormatInvalidReason, ProgressiveError};
use crate::frame::Frame;
use crate::huffman::HuffmanTable;
use crate::marker::Marker;
use crate::scan::ScanHeader;

/// Coordinator state, spec.md §4.8's state machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProgressiveState {
    Initial,
    DcProcessing,
    AcProcessing,
    Refinement,
    Completed,
    Error,
}

/// Uniquely identifies a scan for duplicate detection: which components it
/// covers plus its spectral/successive-approximation parameters.
type ScanKey = (Vec<usize>, u8, u8, u8, u8);

/// Full per-block coefficient storage plus sequencing state for one
/// progressive frame's decode.
pub struct ProgressiveCoordinator {
    state: ProgressiveState,
    /// One coefficient buffer per component, one `[i32; 64]` per block in
    /// that component's own (MCU-padded) raster order.
    coefficients: Vec<Vec<[i32; 64]>>,
    seen_scans: HashSet<ScanKey>,
    /// Last `Al` a DC scan refined to, so the next DC refinement's `Ah`
    /// can be checked against it (spec.md invariant: `Ah == previous Al`).
    last_dc_al: Option<u8>,
    /// Same, per `(component_index, spectral_start, spectral_end)` band
    /// for AC scans, which are never interleaved.
    last_ac_al: std::collections::HashMap<(usize, u8, u8), u8>,
    scans_processed: usize,
}

const MAX_SCANS: usize = 64;

impl ProgressiveCoordinator {
    pub fn new(frame: &Frame) -> ProgressiveCoordinator {
        let coefficients = frame
            .components
            .iter()
            .map(|c| {
                let (blocks_per_line, blocks_per_column) = frame.component_block_grid(c);
                vec![[0i32; 64]; blocks_per_line * blocks_per_column]
            })
            .collect();
        ProgressiveCoordinator {
            state: ProgressiveState::Initial,
            coefficients,
            seen_scans: HashSet::new(),
            last_dc_al: None,
            last_ac_al: std::collections::HashMap::new(),
            scans_processed: 0,
        }
    }

    pub fn state(&self) -> ProgressiveState {
        self.state
    }

    /// Coefficient buffer for `component_index`, in that component's own
    /// raster block order, natural zig-zag-unmapped on read by the IDCT
    /// collaborator.
    pub fn coefficients(&self, component_index: usize) -> &[[i32; 64]] {
        &self.coefficients[component_index]
    }

    /// Rough completion estimate: DC passes count for 40%, AC for 60%,
    /// spec.md §4.8(d).
    pub fn progress_percent(&self) -> f32 {
        match self.state {
            ProgressiveState::Initial => 0.0,
            ProgressiveState::DcProcessing => 20.0,
            ProgressiveState::AcProcessing | ProgressiveState::Refinement => {
                40.0 + 60.0 * (self.scans_processed.min(MAX_SCANS) as f32 / MAX_SCANS as f32)
            }
            ProgressiveState::Completed => 100.0,
            ProgressiveState::Error => 0.0,
        }
    }

    fn is_dc_band(scan: &ScanHeader) -> bool {
        scan.spectral_start == 0
    }

    fn validate_and_register(&mut self, frame: &Frame, scan: &ScanHeader) -> Result<(), CodecError> {
        for selector in &scan.selectors {
            if selector.component_index >= frame.components.len() {
                self.state = ProgressiveState::Error;
                return Err(CodecError::Internal("scan selector references an out-of-range component"));
            }
        }
        self.scans_processed += 1;
        if self.scans_processed > MAX_SCANS {
            self.state = ProgressiveState::Error;
            return Err(CodecError::format_invalid(FormatInvalidReason::Progressive(
                ProgressiveError::TooManyScans,
            )));
        }
        if scan.spectral_start > scan.spectral_end {
            self.state = ProgressiveState::Error;
            return Err(CodecError::format_invalid(FormatInvalidReason::Progressive(
                ProgressiveError::SpectralRangeInverted,
            )));
        }

        let component_indices: Vec<usize> =
            scan.selectors.iter().map(|s| s.component_index).collect();
        let key: ScanKey =
            (component_indices.clone(), scan.spectral_start, scan.spectral_end, scan.approx_high, scan.approx_low);
        if !self.seen_scans.insert(key) {
            self.state = ProgressiveState::Error;
            return Err(CodecError::format_invalid(FormatInvalidReason::Progressive(
                ProgressiveError::DuplicateScan,
            )));
        }

        if Self::is_dc_band(scan) {
            if scan.approx_high != 0 {
                let expected = self.last_dc_al.unwrap_or(0);
                if scan.approx_high != expected || scan.approx_low + 1 != scan.approx_high {
                    self.state = ProgressiveState::Error;
                    return Err(CodecError::format_invalid(FormatInvalidReason::Progressive(
                        ProgressiveError::BadSuccessiveApproximation,
                    )));
                }
            }
            self.last_dc_al = Some(scan.approx_low);
            self.state =
                if scan.approx_high == 0 { ProgressiveState::DcProcessing } else { ProgressiveState::Refinement };
        } else {
            if component_indices.len() != 1 {
                self.state = ProgressiveState::Error;
                return Err(CodecError::format_invalid(FormatInvalidReason::Progressive(
                    ProgressiveError::ComponentCountMismatch,
                )));
            }
            let band_key = (component_indices[0], scan.spectral_start, scan.spectral_end);
            if scan.approx_high != 0 {
                let expected = *self.last_ac_al.get(&band_key).unwrap_or(&0);
                if scan.approx_high != expected || scan.approx_low + 1 != scan.approx_high {
                    self.state = ProgressiveState::Error;
                    return Err(CodecError::format_invalid(FormatInvalidReason::Progressive(
                        ProgressiveError::BadSuccessiveApproximation,
                    )));
                }
            }
            self.last_ac_al.insert(band_key, scan.approx_low);
            self.state =
                if scan.approx_high == 0 { ProgressiveState::AcProcessing } else { ProgressiveState::Refinement };
        }

        Ok(())
    }

    /// Decode one progressive scan's entropy-coded data, folding its
    /// coefficients into the coordinator's running storage.
    pub fn decode_scan(
        &mut self,
        frame: &mut Frame,
        scan: &ScanHeader,
        dc_tables: &[Option<HuffmanTable>; 4],
        ac_tables: &[Option<HuffmanTable>; 4],
        restart_interval: u16,
        data: &[u8],
    ) -> Result<usize, CodecError> {
        self.validate_and_register(frame, scan)?;

        let mut reader = BitReader::new(data);
        let mut eobrun = 0u32;

        if Self::is_dc_band(scan) {
            self.decode_dc_scan(frame, scan, dc_tables, restart_interval, &mut reader)?;
        } else {
            let selector = &scan.selectors[0];
            let component = frame.components[selector.component_index].clone();
            let ac_table = ac_tables[selector.ac_table_id].as_ref().ok_or_else(|| {
                CodecError::format_invalid(FormatInvalidReason::Sos(format!(
                    "scan references unset AC table {}",
                    selector.ac_table_id
                )))
            })?;
            let (blocks_per_line, blocks_per_column) = frame.component_block_grid(&component);
            let total_blocks = blocks_per_line * blocks_per_column;
            let mut blocks_since_restart = 0u32;
            let restart_limit = if restart_interval == 0 { u32::MAX } else { u32::from(restart_interval) };

            for block_index in 0..total_blocks {
                let block = &mut self.coefficients[selector.component_index][block_index];
                if scan.approx_high == 0 {
                    reader.decode_ac_first(
                        ac_table,
                        block,
                        scan.spectral_start,
                        scan.spectral_end,
                        scan.approx_low,
                        &mut eobrun,
                    )?;
                } else {
                    reader.decode_ac_refine(
                        ac_table,
                        block,
                        scan.spectral_start,
                        scan.spectral_end,
                        scan.approx_low,
                        &mut eobrun,
                    )?;
                }

                blocks_since_restart += 1;
                if blocks_since_restart == restart_limit && block_index + 1 < total_blocks {
                    if let Some(Marker::RST(_)) = reader.marker {
                        debug!("progressive restart marker at block {block_index}");
                        reader.reset_after_marker();
                        eobrun = 0;
                        blocks_since_restart = 0;
                    }
                }
            }
        }

        if self.seen_scans.len() >= 1 && self.all_bands_initially_seen(frame) {
            self.state = ProgressiveState::Completed;
        }

        Ok(reader.byte_position())
    }

    fn decode_dc_scan(
        &mut self,
        frame: &mut Frame,
        scan: &ScanHeader,
        dc_tables: &[Option<HuffmanTable>; 4],
        restart_interval: u16,
        reader: &mut BitReader,
    ) -> Result<(), CodecError> {
        let (mcus_per_row, mcus_per_column) = frame.mcu_grid();
        let total_mcus = mcus_per_row * mcus_per_column;
        for selector in &scan.selectors {
            frame.components[selector.component_index].dc_pred = 0;
        }

        let restart_limit = if restart_interval == 0 { u32::MAX } else { u32::from(restart_interval) };
        let mut mcus_since_restart = 0u32;

        // Track each scanned component's running block cursor separately,
        // since components interleave at different densities per MCU.
        let mut cursors = vec![0usize; scan.selectors.len()];

        for mcu_index in 0..total_mcus {
            for (sel_idx, selector) in scan.selectors.iter().enumerate() {
                let blocks_per_mcu = frame.blocks_per_mcu(&frame.components[selector.component_index]);
                let dc_table = dc_tables[selector.dc_table_id].as_ref().ok_or_else(|| {
                    CodecError::format_invalid(FormatInvalidReason::Sos(format!(
                        "scan references unset DC table {}",
                        selector.dc_table_id
                    )))
                })?;
                for _ in 0..blocks_per_mcu {
                    let dc_pred = &mut frame.components[selector.component_index].dc_pred;
                    let value = if scan.approx_high == 0 {
                        reader.decode_dc_first(dc_table, dc_pred, scan.approx_low)?
                    } else {
                        reader.decode_dc_refine(scan.approx_low)?
                    };
                    let block_index = cursors[sel_idx];
                    let storage = &mut self.coefficients[selector.component_index][block_index];
                    if scan.approx_high == 0 {
                        storage[0] = value;
                    } else {
                        storage[0] += value;
                    }
                    cursors[sel_idx] += 1;
                }
            }

            mcus_since_restart += 1;
            if mcus_since_restart == restart_limit && mcu_index + 1 < total_mcus {
                if let Some(Marker::RST(_)) = reader.marker {
                    debug!("progressive DC restart marker at MCU {mcu_index}");
                    reader.reset_after_marker();
                    for selector in &scan.selectors {
                        frame.components[selector.component_index].dc_pred = 0;
                    }
                    mcus_since_restart = 0;
                }
            }
        }
        Ok(())
    }

    fn all_bands_initially_seen(&self, frame: &Frame) -> bool {
        // A conservative completeness check: every component has an
        // initial DC scan and at least one initial AC scan recorded (not
        // every possible refinement, which a caller decides when to stop
        // requesting).
        let has_dc = self.last_dc_al.is_some();
        let has_ac = frame
            .components
            .iter()
            .enumerate()
            .all(|(idx, _)| self.last_ac_al.keys().any(|(c, _, _)| *c == idx));
        has_dc && has_ac
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::FrameComponent;
    use crate::frame::FrameMode;
    use crate::scan::ScanComponentSelector;

    fn single_component_frame() -> Frame {
        Frame {
            mode: FrameMode::Progressive,
            precision: 8,
            width: 8,
            height: 8,
            components: vec![FrameComponent::parse([1, 0x11, 0]).unwrap()],
        }
    }

    fn dc_scan() -> ScanHeader {
        ScanHeader {
            selectors: vec![ScanComponentSelector { component_index: 0, dc_table_id: 0, ac_table_id: 0 }],
            spectral_start: 0,
            spectral_end: 0,
            approx_high: 0,
            approx_low: 1,
        }
    }

    #[test]
    fn rejects_duplicate_scan() {
        let frame = single_component_frame();
        let mut coordinator = ProgressiveCoordinator::new(&frame);
        let scan = dc_scan();
        coordinator.validate_and_register(&frame, &scan).unwrap();
        assert!(coordinator.validate_and_register(&frame, &scan).is_err());
    }

    #[test]
    fn rejects_mismatched_successive_approximation() {
        let frame = single_component_frame();
        let mut coordinator = ProgressiveCoordinator::new(&frame);
        let scan = dc_scan();
        coordinator.validate_and_register(&frame, &scan).unwrap();

        let mut refine = dc_scan();
        refine.approx_high = 2; // should have been 1 (the previous Al)
        refine.approx_low = 0;
        assert!(coordinator.validate_and_register(&frame, &refine).is_err());
    }

    #[test]
    fn rejects_multi_bit_successive_approximation() {
        let frame = single_component_frame();
        let mut coordinator = ProgressiveCoordinator::new(&frame);

        let mut initial = dc_scan();
        initial.approx_high = 0;
        initial.approx_low = 5;
        coordinator.validate_and_register(&frame, &initial).unwrap();

        // Ah matches the previous Al (5), but Al jumps straight to 0
        // instead of refining by exactly one bit to 4.
        let mut bad_refine = dc_scan();
        bad_refine.approx_high = 5;
        bad_refine.approx_low = 0;
        assert!(coordinator.validate_and_register(&frame, &bad_refine).is_err());
    }

    #[test]
    fn accepts_correct_successive_approximation_chain() {
        let frame = single_component_frame();
        let mut coordinator = ProgressiveCoordinator::new(&frame);
        let scan = dc_scan();
        coordinator.validate_and_register(&frame, &scan).unwrap();

        let mut refine = dc_scan();
        refine.approx_high = 1;
        refine.approx_low = 0;
        coordinator.validate_and_register(&frame, &refine).unwrap();
        assert_eq!(coordinator.state(), ProgressiveState::Refinement);
    }

    #[test]
    fn rejects_interleaved_ac_scan() {
        let frame = Frame {
            mode: FrameMode::Progressive,
            precision: 8,
            width: 8,
            height: 8,
            components: vec![
                FrameComponent::parse([1, 0x11, 0]).unwrap(),
                FrameComponent::parse([2, 0x11, 1]).unwrap(),
            ],
        };
        let mut coordinator = ProgressiveCoordinator::new(&frame);
        let scan = ScanHeader {
            selectors: vec![
                ScanComponentSelector { component_index: 0, dc_table_id: 0, ac_table_id: 0 },
                ScanComponentSelector { component_index: 1, dc_table_id: 0, ac_table_id: 0 },
            ],
            spectral_start: 1,
            spectral_end: 5,
            approx_high: 0,
            approx_low: 0,
        };
        assert!(coordinator.validate_and_register(&frame, &scan).is_err());
    }
}
