//! Envelope generator state machine
//!
//! Every operator runs a multi-state attenuation envelope clocked from
//! the global envelope counter. The two chip lineages share the state
//! machine but differ in rate tables, rate scaling and the attack
//! shift, all of which come from the [`FamilyConfig`].
//!
//! Attenuation is stored log-scale: 0 is loudest, `env_max` silent.

use crate::config::{ChipCaps, EgTables, Family, FamilyConfig};
use crate::engine::operator::Operator;
use crate::tables::{OPL_EG_INCREMENT, OPL_EG_SHIFT, OPN_EG_INCREMENT, OPN_EG_SHIFT};

/// Fixed rate used while a damped operator fades out before retrigger.
const DAMP_RATE: u8 = 48;

/// Attenuation the damp state drives toward before the retrigger fires.
const DAMP_THRESHOLD: i32 = 0x1F0;

/// Envelope generator states.
///
/// Ordering matters: key-off moves any state before `Release` into
/// `Release`, and the damp retrigger path relies on `Damp` sorting
/// ahead of the keyed states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnvelopeState {
    /// Forced fade-out before a retrigger (OPLL key-on)
    Damp,
    /// Attenuation falling toward 0 after key-on
    Attack,
    /// Attenuation rising toward the sustain level
    Decay,
    /// Holding at (or creeping past) the sustain level
    Sustain,
    /// Attenuation rising toward silence after key-off
    Release,
    /// Silent, nothing left to do
    Off,
}

impl Operator {
    /// Envelope attenuation as the output stage sees it, with the
    /// SSG-EG inversion window applied.
    #[inline]
    pub fn effective_envelope(&self) -> i32 {
        if self.ssg_enable
            && self.env_state != EnvelopeState::Release
            && (self.ssg_inverted ^ self.ssg_attack)
        {
            (0x200 - self.env_output) & 0x3FF
        } else {
            self.env_output
        }
    }

    /// Recomputes the effective envelope rate for the current state.
    pub fn recompute_rate(&mut self, config: &FamilyConfig) {
        if self.env_state == EnvelopeState::Damp {
            self.env_rate = DAMP_RATE;
            return;
        }
        let p_rate = match self.env_state {
            EnvelopeState::Attack => self.attack_rate,
            EnvelopeState::Decay => self.decay_rate,
            EnvelopeState::Sustain => match config.eg_tables {
                EgTables::Opn => self.sustain_rate,
                // Sustained tones hold; percussive ones bleed out at
                // the release rate while the key is still down
                EgTables::Opl => {
                    if self.is_sustained {
                        0
                    } else {
                        self.release_rate
                    }
                }
            },
            EnvelopeState::Release => match config.eg_tables {
                EgTables::Opn => (self.release_rate << 1) | 1,
                EgTables::Opl => self.release_rate,
            },
            _ => 0,
        };
        self.env_rate = if p_rate == 0 {
            0
        } else {
            (p_rate as u32 * config.rate_multiplier as u32 + self.ksr_val).min(63) as u8
        };
    }

    /// Recomputes the OPN/OPM key-scaling value from the keycode.
    pub fn update_ksr(&mut self, config: &FamilyConfig) {
        self.ksr_val = self.keycode >> self.key_scaling;
        self.recompute_rate(config);
    }

    /// Recomputes the OPL-lineage key-scaling value from block and the
    /// top of the frequency number.
    pub fn update_rks(&mut self, note_select: bool, config: &FamilyConfig) {
        let high_bit = match config.family {
            Family::Opll => (self.fnum >> 8) & 1,
            _ => {
                if note_select {
                    (self.fnum >> 8) & 1
                } else {
                    (self.fnum >> 9) & 1
                }
            }
        };
        let block_fnum = (self.block << 1) | high_bit;
        self.ksr_val = if self.is_ksr {
            block_fnum
        } else {
            block_fnum >> 2
        };
        self.recompute_rate(config);
    }

    /// Begins a fresh envelope at key-on (or after a damp completes).
    pub fn start_envelope(&mut self, config: &FamilyConfig) {
        let rate = if self.attack_rate == 0 {
            0
        } else {
            (self.attack_rate as u32 * config.rate_multiplier as u32 + self.ksr_val).min(63) as u8
        };
        match config.eg_tables {
            EgTables::Opn => {
                if rate >= config.instant_attack_rate {
                    self.env_output = 0;
                    self.env_state = if self.sustain_level == 0 {
                        EnvelopeState::Sustain
                    } else {
                        EnvelopeState::Decay
                    };
                } else if self.env_output > 0 {
                    self.env_state = EnvelopeState::Attack;
                } else {
                    self.env_state = if self.sustain_level == 0 {
                        EnvelopeState::Sustain
                    } else {
                        EnvelopeState::Decay
                    };
                }
            }
            EgTables::Opl => {
                if rate >= config.instant_attack_rate {
                    self.env_state = EnvelopeState::Decay;
                    self.env_output = 0;
                } else {
                    self.env_state = EnvelopeState::Attack;
                }
            }
        }
        self.recompute_rate(config);
    }

    /// Handles a key-on edge for this operator.
    pub fn key_on(&mut self, config: &FamilyConfig) {
        if self.is_keyon && config.family != Family::Opm {
            return;
        }
        self.is_keyon = true;
        if config.caps.contains(ChipCaps::DAMP_STATE) && self.env_output < DAMP_THRESHOLD {
            // Still audible: fade the old note first, the retrigger
            // happens when the damp crosses its threshold
            self.env_state = EnvelopeState::Damp;
            self.recompute_rate(config);
            return;
        }
        self.start_envelope(config);
        self.phase_counter = 0;
        self.ssg_inverted = false;
    }

    /// Handles a key-off edge for this operator.
    pub fn key_off(&mut self, config: &FamilyConfig) {
        if !self.is_keyon {
            return;
        }
        if self.env_state < EnvelopeState::Release {
            if self.ssg_enable && (self.ssg_inverted ^ self.ssg_attack) {
                self.env_output = (0x200 - self.env_output) & 0x3FF;
            }
            self.env_state = EnvelopeState::Release;
            self.recompute_rate(config);
        }
        self.is_keyon = false;
    }

    /// Advances the envelope by one tick of the envelope clock.
    pub fn clock_envelope(&mut self, config: &FamilyConfig, env_clock: u32) {
        let rate = self.env_rate as usize;
        let (shift, increments) = match config.eg_tables {
            EgTables::Opn => (OPN_EG_SHIFT[rate], &OPN_EG_INCREMENT[rate]),
            EgTables::Opl => (OPL_EG_SHIFT[rate], &OPL_EG_INCREMENT[rate]),
        };
        if env_clock % (1u32 << shift) != 0 {
            return;
        }
        let cycle = ((env_clock >> shift) & 7) as usize;
        let increment = increments[cycle] as i32;
        let env_max = config.env_max as i32;

        match self.env_state {
            EnvelopeState::Damp => {
                self.env_output += increment;
                if self.env_output >= DAMP_THRESHOLD {
                    self.phase_counter = 0;
                    self.start_envelope(config);
                }
            }
            EnvelopeState::Attack => {
                self.env_output += (!self.env_output * increment) >> config.attack_shift;
                if self.env_output <= 0 {
                    self.env_output = 0;
                    self.env_state = if config.eg_tables == EgTables::Opn
                        && self.sustain_level == 0
                    {
                        EnvelopeState::Sustain
                    } else {
                        EnvelopeState::Decay
                    };
                    self.recompute_rate(config);
                }
            }
            EnvelopeState::Decay => {
                if self.ssg_enable {
                    // SSG-EG runs the decay four times as fast and
                    // stalls in the inverted half of the range
                    if self.env_output < 0x200 {
                        self.env_output += 4 * increment;
                    }
                } else {
                    self.env_output += increment;
                }
                if self.env_output >= self.sustain_level {
                    self.env_state = EnvelopeState::Sustain;
                    self.recompute_rate(config);
                }
            }
            EnvelopeState::Sustain => {
                if self.ssg_enable {
                    if self.env_output < 0x200 {
                        self.env_output += 4 * increment;
                    }
                } else {
                    self.env_output += increment;
                    if self.env_output >= env_max {
                        self.env_output = env_max;
                    }
                }
            }
            EnvelopeState::Release => {
                if self.ssg_enable {
                    if self.env_output < 0x200 {
                        self.env_output += 4 * increment;
                    }
                } else {
                    self.env_output += increment;
                    if self.env_output >= env_max {
                        self.env_output = env_max;
                        self.env_state = EnvelopeState::Off;
                    }
                }
            }
            EnvelopeState::Off => {}
        }
    }

    /// Per-sample SSG-EG shape handler, run before the envelope clock.
    pub fn clock_ssg(&mut self, config: &FamilyConfig) {
        if !self.ssg_enable || self.env_output < 0x200 {
            return;
        }
        if self.ssg_alternate && (!self.ssg_hold || !self.ssg_inverted) {
            self.ssg_inverted = !self.ssg_inverted;
        }
        if !self.ssg_alternate && !self.ssg_hold {
            self.phase_counter = 0;
        }
        if self.env_state != EnvelopeState::Attack {
            if self.env_state != EnvelopeState::Release && !self.ssg_hold {
                self.start_envelope(config);
            } else if self.env_state == EnvelopeState::Release
                || !(self.ssg_inverted ^ self.ssg_attack)
            {
                self.env_output = 0x3FF;
            }
        }
    }
}
