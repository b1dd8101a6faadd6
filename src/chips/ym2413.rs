//! YM2413 (OPLL) register front-end
//!
//! Nine 2-operator channels driven by fifteen built-in instruments
//! plus one rewritable user patch. Each channel stores an instrument
//! number and a 4-bit carrier volume instead of raw operator
//! registers; the patch bytes are expanded into operator settings
//! whenever either changes. Rhythm mode writes are accepted and
//! dropped.

use crate::backend::FmChip;
use crate::config::FamilyConfig;
use crate::engine::FmEngine;

/// Built-in instrument set in the OPLL patch byte format. Row 0 is
/// the user patch, rewritten through registers 0x00-0x07.
pub const DEFAULT_INSTRUMENTS: [[u8; 8]; 16] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    [0x03, 0x21, 0x05, 0x06, 0xE8, 0x81, 0x42, 0x27],
    [0x13, 0x41, 0x14, 0x0D, 0xD8, 0xF6, 0x23, 0x12],
    [0x11, 0x11, 0x08, 0x08, 0xFA, 0xB2, 0x20, 0x12],
    [0x31, 0x61, 0x0C, 0x07, 0xA8, 0x64, 0x61, 0x27],
    [0x32, 0x21, 0x1E, 0x06, 0xE1, 0x76, 0x01, 0x28],
    [0x02, 0x01, 0x06, 0x00, 0xA3, 0xE2, 0xF4, 0xF4],
    [0x21, 0x61, 0x1D, 0x07, 0x82, 0x81, 0x11, 0x07],
    [0x23, 0x21, 0x22, 0x17, 0xA2, 0x72, 0x01, 0x17],
    [0x35, 0x11, 0x25, 0x00, 0x40, 0x73, 0x72, 0x01],
    [0xB5, 0x01, 0x0F, 0x0F, 0xA8, 0xA5, 0x51, 0x02],
    [0x17, 0xC1, 0x24, 0x07, 0xF8, 0xF8, 0x22, 0x12],
    [0x71, 0x23, 0x11, 0x06, 0x65, 0x74, 0x18, 0x16],
    [0x01, 0x02, 0xD3, 0x05, 0xC9, 0x95, 0x03, 0x02],
    [0x61, 0x63, 0x0C, 0x00, 0x94, 0xC0, 0x33, 0xF6],
    [0x21, 0x72, 0x0D, 0x00, 0xC1, 0xD5, 0x56, 0x06],
];

/// Release rate used while the sustain pedal holds a released key.
const SUSTAIN_RELEASE: u8 = 5;

/// The OPLL chip: FM core, instrument store and mono mixdown.
pub struct Ym2413 {
    engine: FmEngine,
    master_clock: u32,
    address: u8,
    output: [i16; 1],
    instruments: [[u8; 8]; 16],
    channel_inst: [usize; 9],
    sustain: [bool; 9],
}

impl Ym2413 {
    /// Creates the chip with a caller-supplied instrument set, for
    /// derivatives that ship different patch ROMs.
    pub fn with_instruments(master_clock: u32, instruments: [[u8; 8]; 16]) -> Self {
        let mut chip = Ym2413 {
            engine: FmEngine::new(FamilyConfig::opll()),
            master_clock,
            address: 0,
            output: [0],
            instruments,
            channel_inst: [0; 9],
            sustain: [false; 9],
        };
        for ch in 0..9 {
            chip.apply_instrument(ch);
        }
        chip
    }

    /// Channel index for a register, with the 9-channel mirror above
    /// offset 8.
    fn channel_of(reg: u8) -> usize {
        let ch = (reg & 0xF) as usize;
        if ch >= 9 {
            ch - 9
        } else {
            ch
        }
    }

    /// Expands the channel's patch bytes into operator settings.
    fn apply_instrument(&mut self, ch: usize) {
        let patch = self.instruments[self.channel_inst[ch]];
        for slot in 0..2 {
            let flags = patch[slot];
            self.engine.set_multiply_flags(
                ch,
                slot,
                flags & 0x80 != 0,
                flags & 0x40 != 0,
                flags & 0x20 != 0,
                flags & 0x10 != 0,
                flags & 0xF,
            );
        }
        self.engine
            .set_level_scaling(ch, 0, (patch[2] >> 6) & 3, patch[2] & 0x3F);
        // The carrier level comes from the volume nibble, only its
        // key scaling lives in the patch
        self.engine.set_level_scaling(ch, 1, (patch[3] >> 6) & 3, 0);
        self.engine
            .set_waveform(ch, 0, u8::from(patch[3] & 0x08 != 0));
        self.engine
            .set_waveform(ch, 1, u8::from(patch[3] & 0x10 != 0));
        self.engine.set_feedback_parallel(ch, patch[3] & 7, false);
        self.engine.set_attack_decay(ch, 0, patch[4] >> 4, patch[4] & 0xF);
        self.engine.set_attack_decay(ch, 1, patch[5] >> 4, patch[5] & 0xF);
        self.engine
            .set_sustain_release(ch, 0, (patch[6] >> 4) & 0xF, patch[6] & 0xF);
        self.engine
            .set_sustain_release(ch, 1, (patch[7] >> 4) & 0xF, patch[7] & 0xF);
    }

    /// Key edges rewrite the carrier release first so a pedalled
    /// note fades at the sustain rate instead of the patch rate.
    fn write_key(&mut self, ch: usize, on: bool) {
        let keyed = self.engine.channels[ch].opers[1].is_keyon;
        let patch_release = self.instruments[self.channel_inst[ch]][7] & 0xF;
        if on && !keyed {
            self.engine.set_release_rate(ch, 1, patch_release);
            self.engine.key_channel(ch, true);
        } else if !on && keyed {
            let rate = if self.sustain[ch] {
                SUSTAIN_RELEASE
            } else {
                patch_release
            };
            self.engine.set_release_rate(ch, 1, rate);
            self.engine.key_channel(ch, false);
        }
    }
}

impl FmChip for Ym2413 {
    fn new(master_clock: u32) -> Self {
        Self::with_instruments(master_clock, DEFAULT_INSTRUMENTS)
    }

    fn reset(&mut self) {
        self.engine.reset();
        self.address = 0;
        self.output = [0];
        self.instruments[0] = [0; 8];
        self.channel_inst = [0; 9];
        self.sustain = [false; 9];
        for ch in 0..9 {
            self.apply_instrument(ch);
        }
    }

    fn latch_address(&mut self, address: u8) {
        self.address = address;
    }

    fn latched_address(&self) -> u8 {
        self.address
    }

    fn write_register(&mut self, reg: u8, data: u8) {
        match reg {
            0x00..=0x07 => {
                self.instruments[0][reg as usize] = data;
                for ch in 0..9 {
                    if self.channel_inst[ch] == 0 {
                        self.apply_instrument(ch);
                    }
                }
            }
            // 0x0E rhythm control, 0x0F test
            0x0E | 0x0F => {}
            0x10..=0x1F => {
                let ch = Self::channel_of(reg);
                self.engine.set_channel_frequency_low(ch, data);
            }
            0x20..=0x2F => {
                let ch = Self::channel_of(reg);
                self.sustain[ch] = data & 0x20 != 0;
                self.write_key(ch, data & 0x10 != 0);
                self.engine.set_channel_frequency_high(
                    ch,
                    (data & 1) as u32,
                    ((data >> 1) & 7) as u32,
                );
            }
            0x30..=0x3F => {
                let ch = Self::channel_of(reg);
                self.channel_inst[ch] = (data >> 4) as usize;
                self.apply_instrument(ch);
                self.engine.set_carrier_volume(ch, data & 0xF);
            }
            _ => {}
        }
    }

    fn clock(&mut self) {
        self.engine.clock();
        let mut sample = 0i32;
        for ch in 0..9 {
            sample += self.engine.channel_output(ch);
        }
        // Carriers only reach +/-255 here, scale back up to line level
        self.output[0] = ((sample << 7) / 9).clamp(-32768, 32767) as i16;
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
