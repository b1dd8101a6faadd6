//! Low-frequency oscillators
//!
//! OPM carries a full LFO block: four wave shapes read from a table,
//! a rate counter and a 17-bit noise LFSR that doubles as the wave
//! data for the noise shape. The OPL lineage only has the fixed-rate
//! tremolo and vibrato clocks. OPN (as configured here) has neither.

use crate::tables::OPL_AM_TABLE;

/// OPM noise generator, shared between the noise LFO shape and the
/// channel 7 noise output.
#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    lfsr: u32,
    counter: u32,
    /// Noise frequency register (period select)
    pub frequency: u32,
    /// Noise output enabled for channel 7 slot 4
    pub enable: bool,
    /// Current output bit
    pub state: bool,
}

impl NoiseGenerator {
    fn new() -> Self {
        NoiseGenerator {
            lfsr: 1,
            counter: 0,
            frequency: 0,
            enable: false,
            state: false,
        }
    }

    /// One LFSR step plus the period counter.
    fn clock(&mut self) {
        self.lfsr <<= 1;
        self.lfsr |= ((self.lfsr >> 17) ^ (self.lfsr >> 14) ^ 1) & 1;
        if self.counter >= self.frequency {
            self.counter = 0;
            self.state = (self.lfsr >> 17) & 1 != 0;
        } else {
            self.counter += 1;
        }
    }

    /// Last eight generated bits, newest in bit 0.
    fn output_byte(&self) -> u8 {
        ((self.lfsr >> 17) & 0xFF) as u8
    }
}

/// OPM LFO: wave tables, rate counter and noise.
#[derive(Debug, Clone)]
pub struct OpmLfo {
    tables: [[i32; 256]; 4],
    counter: u32,
    /// Rate register (mantissa low nibble, exponent high nibble)
    pub rate: u8,
    /// Counter hold flag
    pub reset: bool,
    /// Selected wave shape (0 saw, 1 square, 2 triangle, 3 noise)
    pub waveform: u8,
    /// Amplitude modulation depth
    pub am_depth: u8,
    /// Phase modulation depth
    pub pm_depth: u8,
    /// Current depth-scaled tremolo attenuation
    pub am_output: u32,
    /// Current depth-scaled vibrato value
    pub pm_output: i32,
    /// Noise generator
    pub noise: NoiseGenerator,
}

impl OpmLfo {
    /// Builds the LFO with its wave tables. Each entry packs the
    /// tremolo byte in bits 0-7 and the signed vibrato byte above.
    pub fn new() -> Self {
        let mut built = [[0i32; 256]; 4];
        for index in 0..256usize {
            let i = index as u32;

            let saw_am = (255 - i) as u8;
            let saw_pm = index as u8 as i8;
            built[0][index] = pack(saw_am, saw_pm);

            let square_am: u8 = if i & 0x80 != 0 { 0 } else { 0xFF };
            let square_pm = (square_am ^ 0x80) as i8;
            built[1][index] = pack(square_am, square_pm);

            let tri_am: u8 = if i & 0x80 != 0 {
                ((i << 1) & 0xFF) as u8
            } else {
                (((255 - i) << 1) & 0xFF) as u8
            };
            let tri_pm = if i & 0x40 != 0 { tri_am as i8 } else { !tri_am as i8 };
            built[2][index] = pack(tri_am, tri_pm);

            // The noise row fills in at run time from the LFSR
            built[3][index] = 0;
        }
        OpmLfo {
            tables: built,
            counter: 0,
            rate: 0,
            reset: false,
            waveform: 0,
            am_depth: 0,
            pm_depth: 0,
            am_output: 0,
            pm_output: 0,
            noise: NoiseGenerator::new(),
        }
    }

    /// Returns the LFO to its power-on state, keeping the wave tables.
    pub fn reset_state(&mut self) {
        self.counter = 0;
        self.rate = 0;
        self.reset = false;
        self.waveform = 0;
        self.am_depth = 0;
        self.pm_depth = 0;
        self.am_output = 0;
        self.pm_output = 0;
        self.noise = NoiseGenerator::new();
    }

    /// One sample step: two noise clocks, the rate counter, and the
    /// depth-scaled outputs.
    pub fn clock(&mut self) {
        self.noise.clock();
        self.noise.clock();

        let step = (0x10 | (self.rate as u32 & 0xF)) << (self.rate >> 4);
        self.counter = self.counter.wrapping_add(step);
        if self.reset {
            self.counter = 0;
        }

        let index = ((self.counter >> 22) & 0xFF) as usize;
        let noise_byte = self.noise.output_byte() as i32;
        self.tables[3][(index + 1) & 0xFF] = noise_byte | (noise_byte << 8);

        let ampm = self.tables[(self.waveform & 3) as usize][index];
        self.am_output = (((ampm & 0xFF) * self.am_depth as i32) >> 7) as u32;
        self.pm_output = ((ampm >> 8) * self.pm_depth as i32) >> 7;
    }
}

impl Default for OpmLfo {
    fn default() -> Self {
        OpmLfo::new()
    }
}

#[inline]
fn pack(am: u8, pm: i8) -> i32 {
    am as i32 | ((pm as i32) << 8)
}

/// OPL tremolo and vibrato clocks.
#[derive(Debug, Clone, Default)]
pub struct OplLfo {
    /// Tremolo clock, advanced once per sample
    pub am_clock: u32,
    /// Vibrato clock, 22 bits
    pub pm_clock: u32,
    /// 4.8 dB tremolo depth instead of 1 dB
    pub deep_am: bool,
    /// 14 cent vibrato depth instead of 7
    pub deep_pm: bool,
}

impl OplLfo {
    /// One sample step for both clocks.
    pub fn clock(&mut self) {
        self.pm_clock = self.pm_clock.wrapping_add(512) & 0x3FFFFF;
        self.am_clock = self.am_clock.wrapping_add(1);
    }

    /// Current tremolo attenuation.
    pub fn am_value(&self) -> u8 {
        let index = ((self.am_clock >> 6) % 210) as usize;
        let index = if self.deep_am { index } else { index >> 2 };
        OPL_AM_TABLE[index]
    }
}

/// Per-family LFO block.
#[derive(Debug, Clone)]
pub enum LfoUnit {
    /// No LFO hardware
    None,
    /// OPM wave LFO plus noise
    Opm(Box<OpmLfo>),
    /// OPL tremolo/vibrato clocks
    Opl(OplLfo),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_wave_extremes() {
        let mut lfo = OpmLfo::new();
        lfo.waveform = 1;
        lfo.am_depth = 127;
        lfo.pm_depth = 127;
        lfo.clock();
        // Counter is at 16 after one step, still index 0: high half
        assert_eq!(lfo.am_output, (255 * 127) >> 7);
        assert_eq!(lfo.pm_output, (127 * 127) >> 7);

        // Jump to the low half
        lfo.counter = 0x80 << 22;
        lfo.clock();
        assert_eq!(lfo.am_output, 0);
        assert_eq!(lfo.pm_output, (-128 * 127) >> 7);
    }

    #[test]
    fn test_sawtooth_values() {
        let mut lfo = OpmLfo::new();
        lfo.waveform = 0;
        lfo.am_depth = 127;
        lfo.pm_depth = 127;
        lfo.counter = 200 << 22;
        lfo.clock();
        // Index 200: tremolo ramps down, vibrato byte reads signed
        assert_eq!(lfo.am_output, ((255 - 200) * 127) >> 7);
        assert_eq!(lfo.pm_output, (-56 * 127) >> 7);
    }

    #[test]
    fn test_zero_depth_silences_outputs() {
        let mut lfo = OpmLfo::new();
        lfo.waveform = 2;
        lfo.counter = 0x40 << 22;
        lfo.clock();
        assert_eq!(lfo.am_output, 0);
        assert_eq!(lfo.pm_output, 0);
    }

    #[test]
    fn test_reset_flag_holds_counter() {
        let mut lfo = OpmLfo::new();
        lfo.rate = 0xFF;
        lfo.reset = true;
        for _ in 0..100 {
            lfo.clock();
        }
        assert_eq!((lfo.counter >> 22) & 0xFF, 0);
    }

    #[test]
    fn test_noise_sequence_is_deterministic() {
        let mut a = OpmLfo::new();
        let mut b = OpmLfo::new();
        for _ in 0..100 {
            a.clock();
            b.clock();
        }
        assert_eq!(a.noise.lfsr, b.noise.lfsr);
        assert_eq!(a.noise.state, b.noise.state);
    }

    #[test]
    fn test_noise_state_toggles_over_time() {
        let mut lfo = OpmLfo::new();
        lfo.noise.frequency = 0;
        let mut saw_high = false;
        let mut saw_low = false;
        for _ in 0..2_000 {
            lfo.clock();
            if lfo.noise.state {
                saw_high = true;
            } else {
                saw_low = true;
            }
        }
        assert!(saw_high && saw_low, "LFSR output should not be stuck");
    }

    #[test]
    fn test_noise_wave_vibrato_stays_non_negative() {
        let mut lfo = OpmLfo::new();
        lfo.waveform = 3;
        lfo.rate = 0xFF;
        lfo.am_depth = 127;
        lfo.pm_depth = 127;
        lfo.noise.frequency = 0;
        let mut any_output = false;
        for _ in 0..200 {
            lfo.clock();
            assert!(lfo.pm_output >= 0, "noise vibrato byte is unsigned");
            if lfo.am_output != 0 || lfo.pm_output != 0 {
                any_output = true;
            }
        }
        assert!(any_output, "noise shape should produce something");
    }

    #[test]
    fn test_opl_clocks_and_depth() {
        let mut lfo = OplLfo::default();
        lfo.pm_clock = 0x3FFE00;
        lfo.clock();
        assert_eq!(lfo.pm_clock, 0, "vibrato clock wraps at 22 bits");
        assert_eq!(lfo.am_clock, 1);

        lfo.am_clock = 208 << 6;
        lfo.deep_am = true;
        assert_eq!(lfo.am_value(), OPL_AM_TABLE[208]);
        lfo.deep_am = false;
        assert_eq!(lfo.am_value(), OPL_AM_TABLE[52]);
    }
}
