//! YM2203 (OPN) register front-end
//!
//! Three 4-operator channels, mono output. The real part pairs the FM
//! core with an SSG and two timers on one die; writes to those ranges
//! are accepted and dropped so register dumps play back unchanged.

use crate::backend::FmChip;
use crate::config::FamilyConfig;
use crate::engine::FmEngine;

/// Operator banks appear in register order 1, 3, 2, 4.
const OPER_ORDER: [usize; 4] = [0, 2, 1, 3];

/// The OPN chip: FM core plus the bus latch and mono mixdown.
pub struct Ym2203 {
    engine: FmEngine,
    master_clock: u32,
    address: u8,
    output: [i16; 1],
}

impl Ym2203 {
    fn write_mode(&mut self, reg: u8, data: u8) {
        match reg {
            0x27 => self.engine.set_channel3_mode((data >> 6) & 3),
            0x28 => {
                let ch = (data & 3) as usize;
                if ch == 3 {
                    return;
                }
                for slot in 0..4 {
                    if data & (0x10 << slot) != 0 {
                        self.engine.key_on(ch, slot);
                    } else {
                        self.engine.key_off(ch, slot);
                    }
                }
            }
            // 0x24-0x26 timer latches, 0x2D-0x2F prescaler selects
            _ => {}
        }
    }

    fn write_fm(&mut self, reg: u8, data: u8) {
        let addr = (reg & 0xF) as usize;
        let ch = addr & 3;
        if ch == 3 {
            return;
        }
        let slot = OPER_ORDER[(addr >> 2) & 3];
        match reg & 0xF0 {
            0x30 => self
                .engine
                .set_detune_multiply(ch, slot, (data >> 4) & 7, data & 0xF),
            0x40 => self.engine.set_total_level(ch, slot, data & 0x7F),
            0x50 => self
                .engine
                .set_attack_scaling(ch, slot, (data >> 6) & 3, data & 0x1F),
            0x60 => self.engine.set_decay_am(ch, slot, data & 0x1F, false),
            0x70 => self.engine.set_sustain_rate(ch, slot, data & 0x1F),
            0x80 => self
                .engine
                .set_sustain_release(ch, slot, (data >> 4) & 0xF, data & 0xF),
            0x90 => self.engine.set_ssg_flags(
                ch,
                slot,
                data & 0x08 != 0,
                data & 0x04 != 0,
                data & 0x02 != 0,
                data & 0x01 != 0,
            ),
            0xA0 => match (addr >> 2) & 3 {
                0 => self.engine.set_channel_frequency_low(ch, data),
                1 => self.engine.stage_channel_frequency_high(
                    ch,
                    (data & 7) as u32,
                    ((data >> 3) & 7) as u32,
                ),
                2 => self.engine.set_channel3_frequency_low(ch, data),
                _ => self.engine.stage_channel3_frequency_high(
                    ch,
                    (data & 7) as u32,
                    ((data >> 3) & 7) as u32,
                ),
            },
            0xB0 => {
                if (addr >> 2) & 3 == 0 {
                    self.engine
                        .set_feedback_algorithm(ch, (data >> 3) & 7, data & 7);
                }
            }
            _ => {}
        }
    }
}

impl FmChip for Ym2203 {
    fn new(master_clock: u32) -> Self {
        Ym2203 {
            engine: FmEngine::new(FamilyConfig::opn()),
            master_clock,
            address: 0,
            output: [0],
        }
    }

    fn reset(&mut self) {
        self.engine.reset();
        self.address = 0;
        self.output = [0];
    }

    fn latch_address(&mut self, address: u8) {
        self.address = address;
    }

    fn latched_address(&self) -> u8 {
        self.address
    }

    fn write_register(&mut self, reg: u8, data: u8) {
        match reg & 0xF0 {
            // SSG registers live below 0x10 on the combined die
            0x00 | 0x10 => {}
            0x20 => self.write_mode(reg, data),
            _ => self.write_fm(reg, data),
        }
    }

    fn clock(&mut self) {
        self.engine.clock();
        let mut sample = 0i32;
        for ch in 0..3 {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EnvelopeState;

    const CLOCK: u32 = 3_579_545;

    fn voice(chip: &mut Ym2203, ch: u8) {
        for bank in 0..4u8 {
            let op = bank * 4 + ch;
            chip.write_register(0x30 + op, 0x01); // MUL 1
            chip.write_register(0x40 + op, 0x00); // TL 0
            chip.write_register(0x50 + op, 0x1F); // AR 31
            chip.write_register(0x60 + op, 0x00);
            chip.write_register(0x70 + op, 0x00);
            chip.write_register(0x80 + op, 0x0F); // SL 0, RR 15
        }
        chip.write_register(0xB0 + ch, 0x07); // algorithm 7, no feedback
        chip.write_register(0xA4 + ch, 0x22); // block 4
        chip.write_register(0xA0 + ch, 0x6A);
    }

    #[test]
    fn test_sample_rate_from_master_clock() {
        let chip = Ym2203::new(CLOCK);
        assert_eq!(chip.sample_divisor(), 72);
        assert_eq!(chip.sample_rate(), 49_715);
        assert_eq!(chip.output_channels(), 1);
    }

    #[test]
    fn test_io_latch_routes_data_writes() {
        let mut chip = Ym2203::new(CLOCK);
        chip.write_io(0, 0xB0);
        chip.write_io(1, 0x3A);
        assert_eq!(chip.engine.channels[0].feedback, 7);
        assert_eq!(chip.engine.channels[0].algorithm, 2);
    }

    #[test]
    fn test_keyed_voice_produces_audio() {
        let mut chip = Ym2203::new(CLOCK);
        voice(&mut chip, 0);
        chip.write_register(0x28, 0xF0); // all four operators on
        let mut peak = 0i32;
        for _ in 0..300 {
            chip.clock();
            peak = peak.max(i32::from(chip.get_samples()[0]).abs());
        }
        assert!(peak > 0, "keyed channel stayed silent");
    }

    #[test]
    fn test_key_off_releases_voice() {
        let mut chip = Ym2203::new(CLOCK);
        voice(&mut chip, 0);
        chip.write_register(0x28, 0xF0);
        for _ in 0..300 {
            chip.clock();
        }
        chip.write_register(0x28, 0x00);
        for _ in 0..20_000 {
            chip.clock();
        }
        for oper in &chip.engine.channels[0].opers {
            assert_eq!(oper.env_state, EnvelopeState::Off);
        }
        assert_eq!(chip.get_samples()[0], 0);
    }

    #[test]
    fn test_fourth_channel_slot_ignored() {
        let mut chip = Ym2203::new(CLOCK);
        chip.write_register(0x33, 0x71);
        chip.write_register(0xA3, 0xFF);
        chip.write_register(0x28, 0xF3);
        for ch in &chip.engine.channels {
            for oper in &ch.opers {
                assert!(!oper.is_keyon);
            }
        }
    }

    #[test]
    fn test_ssg_and_timer_ranges_discarded() {
        let mut chip = Ym2203::new(CLOCK);
        for reg in 0x00..0x10u8 {
            chip.write_register(reg, 0xFF);
        }
        chip.write_register(0x24, 0xFF);
        chip.write_register(0x25, 0x03);
        chip.write_register(0x26, 0xFF);
        chip.clock();
        assert_eq!(chip.get_samples()[0], 0);
    }

    #[test]
    fn test_csm_mode_bits_select_pitch_without_auto_key() {
        // CSM timer retriggering is not modeled; both upper settings of
        // register 0x27 behave as the plain multi-frequency mode
        let mut chip = Ym2203::new(CLOCK);
        voice(&mut chip, 2);
        chip.write_register(0x27, 0xC0);
        assert_eq!(chip.engine.channels[2].mode, 3);
        chip.write_register(0xAC, 0x3A); // first supplementary operator
        chip.write_register(0xA8, 0x90);
        assert_eq!(chip.engine.channels[2].opers[0].fnum, 0x290);
        assert_eq!(chip.engine.channels[2].opers[0].block, 7);

        for _ in 0..500 {
            chip.clock();
        }
        for oper in &chip.engine.channels[2].opers {
            assert!(!oper.is_keyon, "mode write must not key any operator");
        }
        assert_eq!(chip.get_samples()[0], 0);
    }

    #[test]
    fn test_reset_clears_latch_and_output() {
        let mut chip = Ym2203::new(CLOCK);
        voice(&mut chip, 1);
        chip.write_register(0x28, 0xF1);
        for _ in 0..200 {
            chip.clock();
        }
        chip.reset();
        assert_eq!(chip.latched_address(), 0);
        assert_eq!(chip.get_samples()[0], 0);
        chip.clock();
        assert_eq!(chip.get_samples()[0], 0);
    }
}
