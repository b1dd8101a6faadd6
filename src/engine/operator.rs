//! Operator state and the per-operator output path
//!
//! An operator owns everything one FM slot carries on the die: pitch
//! registers, envelope rates and state, key-scaling values, waveform
//! selection and the two-sample output history the feedback loop reads.
//! The envelope state machine lives in [`crate::engine::envelope`] and
//! the pitch math in [`crate::engine::phase`]; both extend this type.

use crate::config::{ChipCaps, Family, FamilyConfig};
use crate::engine::envelope::EnvelopeState;
use crate::engine::waveform::{self, Waveform};
use crate::tables::OPL_KSL;

/// One FM slot: oscillator, envelope and feedback history.
#[derive(Debug, Clone)]
pub struct Operator {
    /// Slot index within the owning channel (0-3)
    pub slot: usize,

    // Pitch registers. `fnum` holds the channel frequency number for
    // the OPN and OPL lineages and the table-derived frequency number
    // for OPM.
    pub fnum: u32,
    /// Octave/block shift
    pub block: u32,
    /// OPM note code, copied from the channel
    pub kc: u32,
    /// OPM key fraction, copied from the channel
    pub kf: u32,
    /// Rate/detune keycode derived from pitch
    pub keycode: u32,
    /// Fine detune (sign bit 2, magnitude bits 0-1)
    pub detune: u8,
    /// OPM coarse detune
    pub detune2: u8,
    /// Frequency multiplier register value
    pub multiply: u32,
    /// OPM vibrato sensitivity, copied from the channel
    pub pm_sens: u8,

    /// Attenuation from the level registers, already on the envelope
    /// scale (includes KSL for the OPL lineage)
    pub total_level: u32,
    /// Raw 6-bit total level, kept for KSL recomputation
    pub raw_level: u8,
    /// Raw 4-bit carrier volume (OPLL)
    pub raw_volume: u8,
    /// Key-scale-level selector
    pub ksl: u8,
    /// OPN/OPM rate key-scale shift (keycode >> this)
    pub key_scaling: u8,
    /// OPL rate key-scale flag
    pub is_ksr: bool,
    /// Computed key-scale value added into envelope rates
    pub ksr_val: u32,

    /// Attack rate register
    pub attack_rate: u8,
    /// Decay rate register
    pub decay_rate: u8,
    /// Sustain (second decay) rate register
    pub sustain_rate: u8,
    /// Release rate register
    pub release_rate: u8,
    /// Sustain level on the envelope scale
    pub sustain_level: i32,

    /// Current envelope state
    pub env_state: EnvelopeState,
    /// Current envelope attenuation
    pub env_output: i32,
    /// Effective envelope rate (0-63)
    pub env_rate: u8,

    /// SSG-EG enable
    pub ssg_enable: bool,
    /// SSG-EG attack (initial inversion) flag
    pub ssg_attack: bool,
    /// SSG-EG alternate flag
    pub ssg_alternate: bool,
    /// SSG-EG hold flag
    pub ssg_hold: bool,
    /// SSG-EG runtime inversion state
    pub ssg_inverted: bool,

    /// Tremolo enable
    pub am_enable: bool,
    /// Vibrato enable
    pub vibrato: bool,
    /// OPL sustained-tone flag (EG-TYP)
    pub is_sustained: bool,
    /// Carrier slot marker for 2-operator channels
    pub is_carrier: bool,
    /// Key state
    pub is_keyon: bool,
    /// Selected wave shape
    pub waveform: Waveform,

    /// Phase accumulator
    pub phase_counter: u32,
    /// Phase increment
    pub phase_freq: u32,
    /// 10-bit phase fed to the output stage
    pub phase_output: u32,

    /// Two most recent linear outputs, newest first (feedback source)
    pub outputs: [i32; 2],
}

impl Operator {
    /// Creates a silent operator for the given slot.
    pub fn new(slot: usize) -> Self {
        Operator {
            slot,
            fnum: 0,
            block: 0,
            kc: 0,
            kf: 0,
            keycode: 0,
            detune: 0,
            detune2: 0,
            multiply: 0,
            pm_sens: 0,
            total_level: 0,
            raw_level: 0,
            raw_volume: 0,
            ksl: 0,
            key_scaling: 0,
            is_ksr: false,
            ksr_val: 0,
            attack_rate: 0,
            decay_rate: 0,
            sustain_rate: 0,
            release_rate: 0,
            sustain_level: 0,
            env_state: EnvelopeState::Off,
            env_output: 0,
            env_rate: 0,
            ssg_enable: false,
            ssg_attack: false,
            ssg_alternate: false,
            ssg_hold: false,
            ssg_inverted: false,
            am_enable: false,
            vibrato: false,
            is_sustained: false,
            is_carrier: false,
            is_keyon: false,
            waveform: Waveform::Sine,
            phase_counter: 0,
            phase_freq: 0,
            phase_output: 0,
            outputs: [0; 2],
        }
    }

    /// Returns the operator to its power-on state.
    pub fn reset(&mut self, config: &FamilyConfig) {
        let slot = self.slot;
        *self = Operator::new(slot);
        self.env_output = config.env_max as i32;
        self.is_carrier = config.operators == 2 && slot == 1;
    }

    /// Recomputes the level attenuation from TL (or volume) and KSL.
    ///
    /// Only meaningful for the OPL lineage; the 4-operator families
    /// scale their total level once at register-write time.
    pub fn update_total_level(&mut self, config: &FamilyConfig) {
        if !config.caps.contains(ChipCaps::KEY_SCALE_LEVEL) {
            return;
        }

        let ksl_val = match config.family {
            Family::Opll => {
                let index = (self.fnum >> 5) as usize & 0xF;
                let temp = 16 * self.block as i32 - OPL_KSL[index] as i32;
                if self.ksl == 0 {
                    0
                } else {
                    temp.max(0) >> (3 - self.ksl)
                }
            }
            _ => {
                let index = (self.fnum >> 6) as usize & 0xF;
                let temp = (16 * self.block as i32 - OPL_KSL[index] as i32) << 1;
                // Shift per KSL setting: 0 dB, 3 dB, 1.5 dB, 6 dB per octave
                const KSL_SHIFT: [u8; 4] = [3, 1, 2, 0];
                if self.ksl == 0 {
                    0
                } else {
                    temp.max(0) >> KSL_SHIFT[(self.ksl & 3) as usize]
                }
            }
        };

        self.total_level = match config.family {
            Family::Opll if self.is_carrier => ((self.raw_volume as u32) << 3) + ksl_val as u32,
            Family::Opll => ((self.raw_level as u32) << 1) + ksl_val as u32,
            _ => ((self.raw_level as u32) << 2) + ksl_val as u32,
        };
    }

    /// Level plus envelope attenuation, before any tremolo contribution.
    pub fn attenuation_base(&self, config: &FamilyConfig) -> u32 {
        let env = if config.caps.contains(ChipCaps::SSG_EG) {
            self.effective_envelope()
        } else {
            self.env_output
        };
        let env = match config.family {
            // The OPLL envelope runs at OPL precision but its output
            // stage only takes 7 bits
            Family::Opll => env >> 2,
            _ => env,
        };
        self.total_level + env as u32
    }

    /// Runs the output stage for this operator.
    #[inline]
    pub fn compute(&self, modulation: i32, attenuation: u32, config: &FamilyConfig) -> i32 {
        waveform::compute_sample(
            self.phase_output,
            modulation,
            attenuation.min(config.atten_clamp as u32),
            config.atten_shift,
            self.waveform,
        )
    }
}
