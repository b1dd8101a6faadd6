//! Channel state and operator routing
//!
//! A channel owns its operators plus the registers that apply to the
//! voice as a whole. The routing walk is where the algorithm
//! descriptors from [`crate::tables`] get cashed in: each operator is
//! computed once per sample, modulator outputs feed forward through a
//! scratch table and carrier outputs sum into the channel total with
//! saturation at each step.

use crate::config::{Family, FamilyConfig};
use crate::engine::operator::Operator;
use crate::tables::ALGORITHM_COMBINATIONS;

/// One FM voice.
#[derive(Debug, Clone)]
pub struct Channel {
    /// Channel index on the chip
    pub number: usize,
    /// Operators, modulator first
    pub opers: Vec<Operator>,
    /// Frequency number (OPN/OPL lineages)
    pub fnum: u32,
    /// Octave/block
    pub block: u32,
    /// OPM note code
    pub kc: u32,
    /// OPM key fraction
    pub kf: u32,
    /// Per-operator frequency numbers for OPN channel 3 mode
    pub op_fnums: [u32; 4],
    /// Per-operator blocks for OPN channel 3 mode
    pub op_blocks: [u32; 4],
    /// OPN channel 3 frequency mode
    pub mode: u8,
    /// Algorithm select
    pub algorithm: u8,
    /// Operator 1 feedback amount
    pub feedback: u8,
    /// OPL additive connection flag
    pub parallel: bool,
    /// Left output enable
    pub pan_left: bool,
    /// Right output enable
    pub pan_right: bool,
    /// OPM tremolo sensitivity
    pub am_sens: u8,
    /// OPM vibrato sensitivity
    pub pm_sens: u8,
    /// Tremolo attenuation for this sample
    pub lfo_am: u32,
    /// Mixed channel output for this sample
    pub output: i32,
}

impl Channel {
    /// Creates a silent channel with the given operator count.
    pub fn new(number: usize, operators: usize) -> Self {
        Channel {
            number,
            opers: (0..operators).map(Operator::new).collect(),
            fnum: 0,
            block: 0,
            kc: 0,
            kf: 0,
            op_fnums: [0; 4],
            op_blocks: [0; 4],
            mode: 0,
            algorithm: 0,
            feedback: 0,
            parallel: false,
            pan_left: false,
            pan_right: false,
            am_sens: 0,
            pm_sens: 0,
            lfo_am: 0,
            output: 0,
        }
    }

    /// Returns the channel and its operators to the power-on state.
    pub fn reset(&mut self, config: &FamilyConfig) {
        let number = self.number;
        let operators = self.opers.len();
        *self = Channel::new(number, operators);
        for oper in &mut self.opers {
            oper.reset(config);
        }
    }

    /// Channel tremolo with the OPM sensitivity shift applied.
    pub fn scaled_am(&self, lfo_am: u32) -> u32 {
        if self.am_sens == 0 {
            0
        } else {
            lfo_am << (self.am_sens - 1)
        }
    }

    /// Runs the SSG-EG handler on every operator.
    pub fn clock_ssg(&mut self, config: &FamilyConfig) {
        for oper in &mut self.opers {
            oper.clock_ssg(config);
        }
    }

    /// Advances every operator envelope by one envelope tick.
    pub fn clock_envelopes(&mut self, config: &FamilyConfig, env_clock: u32) {
        for oper in &mut self.opers {
            oper.clock_envelope(config, env_clock);
        }
    }

    /// Steps every phase accumulator without refreshing increments.
    pub fn advance_phases(&mut self, config: &FamilyConfig) {
        for oper in &mut self.opers {
            oper.advance_phase(config);
        }
    }

    /// OPM per-sample pitch refresh and phase step, vibrato included.
    pub fn clock_phases_opm(&mut self, config: &FamilyConfig, lfo_raw_pm: i32) {
        for oper in &mut self.opers {
            oper.update_frequency_opm(config, lfo_raw_pm);
            oper.advance_phase(config);
        }
    }

    /// OPL-lineage per-sample pitch refresh and phase step.
    pub fn clock_phases_opl(&mut self, config: &FamilyConfig, pm_clock: u32, deep_pm: bool) {
        for oper in &mut self.opers {
            match config.family {
                Family::Opll => oper.refresh_phase_opll(pm_clock),
                _ => oper.refresh_phase_opl(pm_clock, deep_pm),
            }
            oper.advance_phase(config);
        }
    }

    fn oper_am(&self, slot: usize) -> u32 {
        if self.opers[slot].am_enable {
            self.lfo_am
        } else {
            0
        }
    }

    /// Four-operator routing walk.
    ///
    /// `noise_override` replaces the slot 4 output with the OPM noise
    /// generator when that channel/slot owns it.
    pub fn four_op_output(&mut self, config: &FamilyConfig, noise_override: Option<bool>) {
        let combo = ALGORITHM_COMBINATIONS[(self.algorithm & 7) as usize] as u32;
        let mut opout = [0i32; 8];

        let feedback = if self.feedback != 0 {
            (self.opers[0].outputs[0] + self.opers[0].outputs[1]) >> (10 - self.feedback)
        } else {
            0
        };
        let atten1 = self.opers[0].attenuation_base(config) + self.oper_am(0);
        self.opers[0].outputs[1] = self.opers[0].outputs[0];
        self.opers[0].outputs[0] = self.opers[0].compute(feedback, atten1, config);
        opout[1] = self.opers[0].outputs[0];

        let atten2 = self.opers[1].attenuation_base(config) + self.oper_am(1);
        let mod2 = (opout[(combo & 1) as usize] >> 1) & 0x3FF;
        opout[2] = self.opers[1].compute(mod2, atten2, config);
        opout[5] = opout[1] + opout[2];

        let atten3 = self.opers[2].attenuation_base(config) + self.oper_am(2);
        let mod3 = (opout[((combo >> 1) & 7) as usize] >> 1) & 0x3FF;
        opout[3] = self.opers[2].compute(mod3, atten3, config);
        opout[6] = opout[1] + opout[3];
        opout[7] = opout[2] + opout[3];

        let atten4 = self.opers[3].attenuation_base(config);
        let mut output = if let Some(noise_high) = noise_override {
            // Noise amplitude tracks the slot 4 envelope, inverted
            // back to a linear level
            let level = ((atten4 ^ 0x3FF) << 1) as i32;
            if noise_high {
                -level
            } else {
                level
            }
        } else {
            let atten4 = atten4 + self.oper_am(3);
            let mod4 = (opout[((combo >> 4) & 7) as usize] >> 1) & 0x3FF;
            self.opers[3].compute(mod4, atten4, config)
        };

        if combo & 0x80 != 0 {
            output = (output + opout[1]).clamp(-32768, 32767);
        }
        if combo & 0x100 != 0 {
            output = (output + opout[2]).clamp(-32768, 32767);
        }
        if combo & 0x200 != 0 {
            output = (output + opout[3]).clamp(-32768, 32767);
        }
        self.output = output;
    }

    /// Two-operator routing: serial modulation or the additive pair.
    pub fn two_op_output(&mut self, config: &FamilyConfig) {
        let feedback = if self.feedback != 0 {
            (self.opers[0].outputs[0] + self.opers[0].outputs[1]) >> (10 - self.feedback)
        } else {
            0
        };
        let mod_atten = self.opers[0].attenuation_base(config) + self.oper_am(0);
        self.opers[0].outputs[1] = self.opers[0].outputs[0];
        self.opers[0].outputs[0] = self.opers[0].compute(feedback, mod_atten, config);

        let car_atten = self.opers[1].attenuation_base(config) + self.oper_am(1);
        self.output = if self.parallel {
            let carrier = self.opers[1].compute(0, car_atten, config);
            ((self.opers[0].outputs[0] >> 1) + (carrier >> 1)).clamp(-32768, 32767)
        } else {
            let phase_mod = (self.opers[0].outputs[0] >> 1) & 0x3FF;
            let carrier = self.opers[1].compute(phase_mod, car_atten, config);
            carrier >> config.carrier_shift
        };
    }
}
