//! Phase generator
//!
//! Each operator carries a 20-bit (OPLL: 19-bit) phase accumulator.
//! The increment is derived from the channel pitch registers per
//! family: OPN shifts an 11-bit frequency number by the block, OPM
//! looks a frequency number up from its note-code ROM, and the OPL
//! lineage folds the multiplier table and vibrato straight into the
//! increment. The top 10 (OPLL: 10 of 19) bits feed the output stage.

use crate::config::FamilyConfig;
use crate::engine::operator::Operator;
use crate::tables::{
    DETUNE2_CENTS, DETUNE_TABLE, FNUM_TO_KEYCODE, OPL_MULTIPLY, OPL_PM_TABLE, OPM_FREQNUMS,
};

/// Applies fine detune and the frequency multiplier to a raw increment.
///
/// Detune underflow wraps within 17 bits, matching the adder width on
/// the real parts.
fn apply_detune_multiply(base: u32, keycode: u32, detune: u8, multiply: u32) -> u32 {
    let amount = DETUNE_TABLE[(keycode & 31) as usize][(detune & 3) as usize] as u32;
    let phase = if detune & 4 != 0 {
        base.wrapping_sub(amount) & 0x1FFFF
    } else {
        base + amount
    };
    if multiply == 0 {
        phase >> 1
    } else {
        (phase * multiply) & 0xFFFFF
    }
}

/// Looks up the OPM frequency number for a note code and fraction,
/// with `delta` steps of coarse detune and vibrato applied.
fn opm_freqnum(kc: u32, kf: u32, delta: i32) -> u32 {
    // Note codes skip every fourth value, leaving 12 semitones
    let adjusted = (kc - (kc >> 2)) as i32;
    let index = ((adjusted << 6) | kf as i32) + delta;
    OPM_FREQNUMS[index.clamp(0, 767) as usize] as u32
}

/// OPL-lineage vibrato offset for the given frequency number.
pub(crate) fn opl_vibrato(fnum: u32, pm_clock: u32, deep: bool, row_shift: u32) -> i32 {
    let row = ((fnum >> row_shift) & 7) as usize;
    let mut delta = OPL_PM_TABLE[row][(pm_clock >> 19) as usize] as i32;
    if !deep {
        delta >>= 1;
    }
    delta
}

impl Operator {
    /// Recomputes keycode and phase increment from the OPN pitch
    /// registers.
    pub fn refresh_phase_opn(&mut self) {
        self.keycode =
            (self.block << 2) | FNUM_TO_KEYCODE[(self.fnum >> 7) as usize & 0xF] as u32;
        let base = (self.fnum << self.block) >> 1;
        self.phase_freq = apply_detune_multiply(base, self.keycode, self.detune, self.multiply);
    }

    /// Rederives the OPM frequency number from note code, fraction,
    /// coarse detune and vibrato, then rebuilds the increment. Runs
    /// every sample so vibrato tracks the LFO.
    pub fn update_frequency_opm(&mut self, config: &FamilyConfig, lfo_raw_pm: i32) {
        let mut delta = (DETUNE2_CENTS[(self.detune2 & 3) as usize] * 64 + 50) / 100;
        if self.pm_sens != 0 {
            if self.pm_sens < 6 {
                delta += lfo_raw_pm >> (6 - self.pm_sens);
            } else {
                delta += lfo_raw_pm << (self.pm_sens - 5);
            }
        }
        self.fnum = opm_freqnum(self.kc, self.kf, delta);
        self.keycode = (self.block << 2) | (self.kc >> 2);
        self.refresh_phase_opm();
        self.update_ksr(config);
    }

    /// Rebuilds the OPM phase increment from the current frequency
    /// number.
    pub fn refresh_phase_opm(&mut self) {
        let base = (self.fnum << self.block) >> 2;
        self.phase_freq = apply_detune_multiply(base, self.keycode, self.detune, self.multiply);
    }

    /// Recomputes the OPL phase increment, vibrato included.
    pub fn refresh_phase_opl(&mut self, pm_clock: u32, deep_pm: bool) {
        let vibrato = if self.vibrato {
            opl_vibrato(self.fnum, pm_clock, deep_pm, 7)
        } else {
            0
        };
        let adjusted = (self.fnum as i32 + vibrato) as u32;
        self.phase_freq =
            (adjusted.wrapping_mul(OPL_MULTIPLY[(self.multiply & 0xF) as usize]) << self.block)
                >> 1;
    }

    /// Recomputes the OPLL phase increment. The 9-bit frequency number
    /// moves the vibrato row selection down a bit.
    pub fn refresh_phase_opll(&mut self, pm_clock: u32) {
        let vibrato = if self.vibrato {
            opl_vibrato(self.fnum, pm_clock, false, 6)
        } else {
            0
        };
        let adjusted = (self.fnum as i32 + vibrato) as u32;
        self.phase_freq =
            (adjusted.wrapping_mul(OPL_MULTIPLY[(self.multiply & 0xF) as usize]) << self.block)
                >> 1;
    }

    /// Steps the accumulator and refreshes the 10-bit output phase.
    #[inline]
    pub fn advance_phase(&mut self, config: &FamilyConfig) {
        self.phase_counter = self.phase_counter.wrapping_add(self.phase_freq) & config.phase_mask;
        self.phase_output = self.phase_counter >> config.phase_out_shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opn_keycode_derivation() {
        let mut op = Operator::new(0);
        op.fnum = 0x400;
        op.block = 4;
        op.multiply = 1;
        op.refresh_phase_opn();
        // fnum >> 7 = 8 maps to sub-code 2
        assert_eq!(op.keycode, (4 << 2) | 2);
        assert_eq!(op.phase_freq, (0x400 << 4) >> 1);
    }

    #[test]
    fn test_detune_underflow_wraps_to_17_bits() {
        // Tiny base with maximum negative detune at a high keycode
        let phase = apply_detune_multiply(2, 31, 0x7, 1);
        let amount = DETUNE_TABLE[31][3] as u32;
        assert!(amount > 2);
        assert_eq!(phase, (2u32.wrapping_sub(amount)) & 0x1FFFF);
        assert!(phase > 0x10000, "underflow lands near the top of the adder");
    }

    #[test]
    fn test_multiply_zero_halves_the_increment() {
        let halved = apply_detune_multiply(0x1000, 0, 0, 0);
        let unity = apply_detune_multiply(0x1000, 0, 0, 1);
        assert_eq!(halved, 0x800);
        assert_eq!(unity, 0x1000);
        assert_eq!(apply_detune_multiply(0x1000, 0, 0, 4), 0x4000);
    }

    #[test]
    fn test_opm_octave_doubles_increment() {
        let config = FamilyConfig::opm();
        let mut low = Operator::new(0);
        low.kc = 4;
        low.kf = 0;
        low.block = 2;
        low.multiply = 1;
        low.update_frequency_opm(&config, 0);

        let mut high = Operator::new(0);
        high.kc = 4;
        high.kf = 0;
        high.block = 3;
        high.multiply = 1;
        high.update_frequency_opm(&config, 0);

        assert_eq!(high.phase_freq, low.phase_freq * 2);
    }

    #[test]
    fn test_opm_freqnum_index_stays_in_table() {
        // Top note plus maximum coarse detune would run off the end of
        // the ROM; the lookup saturates instead
        assert_eq!(opm_freqnum(15, 63, 700), 2593);
        assert_eq!(opm_freqnum(0, 0, -5), 1299);
    }

    #[test]
    fn test_opm_coarse_detune_raises_pitch() {
        let config = FamilyConfig::opm();
        let mut op = Operator::new(0);
        op.kc = 4;
        op.kf = 0;
        op.block = 4;
        op.multiply = 1;
        op.update_frequency_opm(&config, 0);
        let base_freq = op.phase_freq;

        op.detune2 = 1;
        op.update_frequency_opm(&config, 0);
        assert!(op.phase_freq > base_freq);
    }

    #[test]
    fn test_opl_vibrato_row_and_depth() {
        // fnum bits 9-7 = 7 picks the deepest row, step 2 is the peak
        let deep = opl_vibrato(0x380, 2 << 19, true, 7);
        assert_eq!(deep, 7);
        let shallow = opl_vibrato(0x380, 2 << 19, false, 7);
        assert_eq!(shallow, 3);

        // Negative half of the cycle
        let negative = opl_vibrato(0x380, 6 << 19, true, 7);
        assert_eq!(negative, -7);
        assert_eq!(opl_vibrato(0x380, 6 << 19, false, 7), -4);

        // Row 0 never moves
        assert_eq!(opl_vibrato(0x07F, 2 << 19, true, 7), 0);
    }

    #[test]
    fn test_opl_increment_formula() {
        let mut op = Operator::new(0);
        op.fnum = 0x155;
        op.block = 3;
        op.multiply = 2;
        op.refresh_phase_opl(0, false);
        assert_eq!(op.phase_freq, ((0x155 * 4) << 3) >> 1);
    }

    #[test]
    fn test_advance_wraps_at_accumulator_width() {
        let config = FamilyConfig::opn();
        let mut op = Operator::new(0);
        op.phase_counter = 0xFFFFF;
        op.phase_freq = 2;
        op.advance_phase(&config);
        assert_eq!(op.phase_counter, 1);
        assert_eq!(op.phase_output, 0);

        let opll = FamilyConfig::opll();
        let mut op = Operator::new(0);
        op.phase_counter = 0x7FFFE;
        op.phase_freq = 4;
        op.advance_phase(&opll);
        assert_eq!(op.phase_counter, 2);
    }
}
