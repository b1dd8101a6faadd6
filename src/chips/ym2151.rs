//! YM2151 (OPM) register front-end
//!
//! Eight 4-operator channels with stereo pan gates, coarse detune, a
//! four-wave LFO and a noise mode on the last carrier. Timer and test
//! registers are accepted and dropped.

use crate::backend::FmChip;
use crate::config::FamilyConfig;
use crate::engine::FmEngine;

/// Operator banks appear in register order 1, 3, 2, 4.
const OPER_ORDER: [usize; 4] = [0, 2, 1, 3];

/// The OPM chip: FM core plus the bus latch and stereo mixdown.
pub struct Ym2151 {
    engine: FmEngine,
    master_clock: u32,
    address: u8,
    output: [i16; 2],
}

impl Ym2151 {
    fn write_global(&mut self, reg: u8, data: u8) {
        match reg {
            0x01 => self.engine.set_lfo_reset(data & 0x02 != 0),
            0x08 => {
                let ch = (data & 7) as usize;
                for slot in 0..4 {
                    if data & (0x08 << slot) != 0 {
                        self.engine.key_on(ch, slot);
                    } else {
                        self.engine.key_off(ch, slot);
                    }
                }
            }
            0x0F => self.engine.set_noise(data & 0x80 != 0, data & 0x1F),
            0x18 => self.engine.set_lfo_rate(data),
            0x19 => {
                if data & 0x80 != 0 {
                    self.engine.set_lfo_pm_depth(data & 0x7F);
                } else {
                    self.engine.set_lfo_am_depth(data & 0x7F);
                }
            }
            0x1B => self.engine.set_lfo_waveform(data & 3),
            // 0x10-0x14 timers, 0x1A test
            _ => {}
        }
    }
}

impl FmChip for Ym2151 {
    fn new(master_clock: u32) -> Self {
        Ym2151 {
            engine: FmEngine::new(FamilyConfig::opm()),
            master_clock,
            address: 0,
            output: [0; 2],
        }
    }

    fn reset(&mut self) {
        self.engine.reset();
        self.address = 0;
        self.output = [0; 2];
    }

    fn latch_address(&mut self, address: u8) {
        self.address = address;
    }

    fn latched_address(&self) -> u8 {
        self.address
    }

    fn write_register(&mut self, reg: u8, data: u8) {
        if reg < 0x20 {
            self.write_global(reg, data);
            return;
        }
        let addr = (reg & 0x1F) as usize;
        let ch = addr & 7;
        let slot = OPER_ORDER[(addr >> 3) & 3];
        match reg & 0xE0 {
            0x20 => match reg & 0x18 {
                0x00 => {
                    self.engine.set_pan(ch, data & 0x40 != 0, data & 0x80 != 0);
                    self.engine
                        .set_feedback_algorithm(ch, (data >> 4) & 7, data & 7);
                }
                0x08 => self
                    .engine
                    .set_channel_note(ch, ((data >> 4) & 7) as u32, (data & 0xF) as u32),
                0x10 => self
                    .engine
                    .set_channel_fraction(ch, ((data >> 2) & 0x3F) as u32),
                _ => self
                    .engine
                    .set_channel_sensitivity(ch, (data >> 4) & 7, data & 3),
            },
            0x40 => self
                .engine
                .set_detune_multiply(ch, slot, (data >> 4) & 7, data & 0xF),
            0x60 => self.engine.set_total_level(ch, slot, data & 0x7F),
            0x80 => self
                .engine
                .set_attack_scaling(ch, slot, (data >> 6) & 3, data & 0x1F),
            0xA0 => self
                .engine
                .set_decay_am(ch, slot, data & 0x1F, data & 0x80 != 0),
            0xC0 => self
                .engine
                .set_sustain_detune2(ch, slot, data & 0x1F, (data >> 6) & 3),
            _ => self
                .engine
                .set_sustain_release(ch, slot, (data >> 4) & 0xF, data & 0xF),
        }
    }

    fn clock(&mut self) {
        self.engine.clock();
        let mut left = 0i32;
        let mut right = 0i32;
        for channel in &self.engine.channels {
            if channel.pan_left {
                left += channel.output;
            }
            if channel.pan_right {
                right += channel.output;
            }
        }
        self.output[0] = left.clamp(-32768, 32767) as i16;
        self.output[1] = right.clamp(-32768, 32767) as i16;
    }

    fn get_samples(&self) -> &[i16] {
        &self.output
    }

    fn sample_divisor(&self) -> u32 {
        64
    }

    fn master_clock(&self) -> u32 {
        self.master_clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOCK: u32 = 3_579_545;

    fn voice(chip: &mut Ym2151, ch: u8, pan: u8) {
        chip.write_register(0x20 + ch, pan | 0x07); // algorithm 7
        chip.write_register(0x28 + ch, 0x4A); // octave 4, note 10
        chip.write_register(0x30 + ch, 0x00);
        for bank in 0..4u8 {
            let op = bank * 8 + ch;
            chip.write_register(0x40 + op, 0x01); // DT 0, MUL 1
            chip.write_register(0x60 + op, 0x00); // TL 0
            chip.write_register(0x80 + op, 0x1F); // AR 31
            chip.write_register(0xA0 + op, 0x00);
            chip.write_register(0xC0 + op, 0x00);
            chip.write_register(0xE0 + op, 0x0F); // SL 0, RR 15
        }
    }

    #[test]
    fn test_sample_rate_from_master_clock() {
        let chip = Ym2151::new(CLOCK);
        assert_eq!(chip.sample_divisor(), 64);
        assert_eq!(chip.sample_rate(), 55_930);
        assert_eq!(chip.output_channels(), 2);
    }

    #[test]
    fn test_pan_gates_each_side() {
        let mut chip = Ym2151::new(CLOCK);
        voice(&mut chip, 0, 0x80); // right only
        chip.write_register(0x08, 0x78);
        let mut right = 0i32;
        for _ in 0..300 {
            chip.clock();
            assert_eq!(chip.get_samples()[0], 0);
            right = right.max(i32::from(chip.get_samples()[1]).abs());
        }
        assert!(right > 0, "right side stayed silent");

        chip.write_register(0x20, 0x47); // left only
        let mut left = 0i32;
        for _ in 0..300 {
            chip.clock();
            assert_eq!(chip.get_samples()[1], 0);
            left = left.max(i32::from(chip.get_samples()[0]).abs());
        }
        assert!(left > 0, "left side stayed silent");
    }

    #[test]
    fn test_io_latch_routes_data_writes() {
        let mut chip = Ym2151::new(CLOCK);
        chip.write_io(0, 0x38); // sensitivity, channel 0
        chip.write_io(1, 0x72);
        assert_eq!(chip.engine.channels[0].pm_sens, 7);
        assert_eq!(chip.engine.channels[0].am_sens, 2);
    }

    #[test]
    fn test_lfo_registers_route_to_engine() {
        let mut chip = Ym2151::new(CLOCK);
        chip.write_register(0x18, 0xC4);
        chip.write_register(0x19, 0x55); // AM depth
        chip.write_register(0x19, 0xD5); // PM depth
        chip.write_register(0x1B, 0x02);
        match &chip.engine.lfo {
            crate::engine::lfo::LfoUnit::Opm(lfo) => {
                assert_eq!(lfo.rate, 0xC4);
                assert_eq!(lfo.am_depth, 0x55);
                assert_eq!(lfo.pm_depth, 0x55);
                assert_eq!(lfo.waveform, 2);
            }
            _ => panic!("OPM chip should carry the OPM LFO"),
        }
    }

    #[test]
    fn test_noise_mode_square_levels() {
        let mut chip = Ym2151::new(CLOCK);
        voice(&mut chip, 7, 0xC0);
        chip.write_register(0x0F, 0x9F); // noise on, slowest
        chip.write_register(0x08, 0x47); // key carrier of channel 7
        for _ in 0..50 {
            chip.clock();
            let sample = chip.get_samples()[0];
            assert_eq!(sample.abs(), 2046);
            assert_eq!(chip.get_samples()[1], sample);
        }
    }

    #[test]
    fn test_coarse_detune_register_shifts_pitch() {
        let mut chip = Ym2151::new(CLOCK);
        voice(&mut chip, 0, 0xC0);
        let base = chip.engine.channels[0].opers[0].phase_freq;
        chip.write_register(0xC0, 0x40); // DT2 = 1 on operator 1
        let detuned = chip.engine.channels[0].opers[0].phase_freq;
        assert!(detuned > base, "coarse detune should raise the increment");
    }
}
