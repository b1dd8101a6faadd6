//! YM3812 (OPL2) register front-end
//!
//! Nine 2-operator channels, mono output. Wave select must be armed
//! through register 0x01 before the 0xE0 bank does anything, matching
//! the hardware gate. Timer and rhythm-mode writes are accepted and
//! dropped.

use crate::backend::FmChip;
use crate::config::FamilyConfig;
use crate::engine::FmEngine;
use crate::tables::OPL_SLOT_ORDER;

/// The OPL2 chip: FM core plus the bus latch and mono mixdown.
pub struct Ym3812 {
    engine: FmEngine,
    master_clock: u32,
    address: u8,
    output: [i16; 1],
    ws_enable: bool,
}

impl Ym3812 {
    /// Resolves an operator register offset to (channel, slot).
    fn slot_target(reg: u8) -> Option<(usize, usize)> {
        let slot = OPL_SLOT_ORDER[(reg & 0x1F) as usize];
        if slot < 0 {
            return None;
        }
        Some((slot as usize / 2, slot as usize % 2))
    }
}

impl FmChip for Ym3812 {
    fn new(master_clock: u32) -> Self {
        Ym3812 {
            engine: FmEngine::new(FamilyConfig::opl()),
            master_clock,
            address: 0,
            output: [0],
            ws_enable: false,
        }
    }

    fn reset(&mut self) {
        self.engine.reset();
        self.address = 0;
        self.output = [0];
        self.ws_enable = false;
    }

    fn latch_address(&mut self, address: u8) {
        self.address = address;
    }

    fn latched_address(&self) -> u8 {
        self.address
    }

    fn write_register(&mut self, reg: u8, data: u8) {
        match reg {
            0x01 => self.ws_enable = data & 0x20 != 0,
            // 0x02-0x04 timer latches and control
            0x02..=0x04 => {}
            0x08 => self.engine.set_note_select(data & 0x40 != 0),
            0xBD => {
                // Rhythm-mode bits are dropped, the depth flags are not
                self.engine
                    .set_lfo_depth(data & 0x80 != 0, data & 0x40 != 0);
            }
            _ => match reg & 0xF0 {
                0x20 | 0x30 => {
                    if let Some((ch, slot)) = Self::slot_target(reg) {
                        self.engine.set_multiply_flags(
                            ch,
                            slot,
                            data & 0x80 != 0,
                            data & 0x40 != 0,
                            data & 0x20 != 0,
                            data & 0x10 != 0,
                            data & 0xF,
                        );
                    }
                }
                0x40 | 0x50 => {
                    if let Some((ch, slot)) = Self::slot_target(reg) {
                        self.engine
                            .set_level_scaling(ch, slot, (data >> 6) & 3, data & 0x3F);
                    }
                }
                0x60 | 0x70 => {
                    if let Some((ch, slot)) = Self::slot_target(reg) {
                        self.engine.set_attack_decay(ch, slot, data >> 4, data & 0xF);
                    }
                }
                0x80 | 0x90 => {
                    if let Some((ch, slot)) = Self::slot_target(reg) {
                        self.engine
                            .set_sustain_release(ch, slot, (data >> 4) & 0xF, data & 0xF);
                    }
                }
                0xA0 => {
                    let ch = (reg & 0xF) as usize;
                    if ch <= 8 {
                        self.engine.set_channel_frequency_low(ch, data);
                    }
                }
                0xB0 => {
                    let ch = (reg & 0xF) as usize;
                    if ch <= 8 {
                        // Key bit acts before the pitch lands
                        self.engine.key_channel(ch, data & 0x20 != 0);
                        self.engine.set_channel_frequency_high(
                            ch,
                            (data & 3) as u32,
                            ((data >> 2) & 7) as u32,
                        );
                    }
                }
                0xC0 => {
                    let ch = (reg & 0xF) as usize;
                    if ch <= 8 {
                        self.engine
                            .set_feedback_parallel(ch, (data >> 1) & 7, data & 1 != 0);
                    }
                }
                0xE0 | 0xF0 => {
                    if self.ws_enable {
                        if let Some((ch, slot)) = Self::slot_target(reg) {
                            self.engine.set_waveform(ch, slot, data & 3);
                        }
                    }
                }
                _ => {}
            },
        }
    }

    fn clock(&mut self) {
        self.engine.clock();
        let mut sample = 0i32;
        for ch in 0..9 {
            sample += self.engine.channel_output(ch);
        }
        self.output[0] = sample.clamp(-32768, 32767) as i16;
    }

    fn get_samples(&self) -> &[i16] {
        &self.output
    }

    fn sample_divisor(&self) -> u32 {
        72
    }

    fn master_clock(&self) -> u32 {
        self.master_clock
    }
}
