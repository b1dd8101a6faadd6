//! The synthesis core shared by every chip front-end
//!
//! [`FmEngine`] owns the channels, the envelope clock and the LFO
//! block. Register front-ends decode their own maps and call the
//! semantic setters here; each setter mirrors what a write to the real
//! part touches, including which derived values refresh immediately
//! and which wait for the per-sample clock.

use crate::config::{Family, FamilyConfig, LfoKind};
use crate::engine::channel::Channel;
use crate::engine::lfo::{LfoUnit, OplLfo, OpmLfo};
use crate::engine::waveform::Waveform;

/// Generic multi-operator FM synthesis core.
#[derive(Debug, Clone)]
pub struct FmEngine {
    config: FamilyConfig,
    /// Channels in chip order
    pub channels: Vec<Channel>,
    env_clock: u32,
    env_timer: u8,
    /// LFO block for the configured family
    pub lfo: LfoUnit,
    note_select: bool,
}

impl FmEngine {
    /// Builds an engine for one family shape.
    pub fn new(config: FamilyConfig) -> Self {
        let lfo = match config.lfo {
            LfoKind::None => LfoUnit::None,
            LfoKind::Opm => LfoUnit::Opm(Box::new(OpmLfo::new())),
            LfoKind::Opl => LfoUnit::Opl(OplLfo::default()),
        };
        let mut engine = FmEngine {
            config,
            channels: (0..config.channels)
                .map(|number| Channel::new(number, config.operators))
                .collect(),
            env_clock: 0,
            env_timer: 0,
            lfo,
            note_select: false,
        };
        engine.reset();
        engine
    }

    /// Returns everything to the power-on state.
    pub fn reset(&mut self) {
        let config = self.config;
        for channel in &mut self.channels {
            channel.reset(&config);
        }
        self.env_clock = 0;
        self.env_timer = 0;
        self.note_select = false;
        match &mut self.lfo {
            LfoUnit::None => {}
            LfoUnit::Opm(lfo) => lfo.reset_state(),
            LfoUnit::Opl(lfo) => *lfo = OplLfo::default(),
        }
    }

    /// The family shape this engine runs.
    pub fn config(&self) -> &FamilyConfig {
        &self.config
    }

    /// Mixed output of one channel for the current sample.
    #[inline]
    pub fn channel_output(&self, ch: usize) -> i32 {
        self.channels[ch].output
    }

    // ---- frequency ----------------------------------------------------

    /// Writes the low byte of a channel frequency number and applies
    /// the result.
    pub fn set_channel_frequency_low(&mut self, ch: usize, low: u8) {
        let channel = &mut self.channels[ch];
        channel.fnum = (channel.fnum & !0xFF) | low as u32;
        self.refresh_channel_frequency(ch);
    }

    /// Writes the upper frequency bits and block, applying immediately
    /// (OPL-style latching).
    pub fn set_channel_frequency_high(&mut self, ch: usize, high: u32, block: u32) {
        let channel = &mut self.channels[ch];
        channel.fnum = (channel.fnum & 0xFF) | (high << 8);
        channel.block = block & 7;
        self.refresh_channel_frequency(ch);
    }

    /// Stores the upper frequency bits and block without applying;
    /// the next low-byte write commits them (OPN-style latching).
    pub fn stage_channel_frequency_high(&mut self, ch: usize, high: u32, block: u32) {
        let channel = &mut self.channels[ch];
        channel.fnum = (channel.fnum & 0xFF) | (high << 8);
        channel.block = block & 7;
    }

    /// Selects the OPN channel 3 frequency mode and reapplies the
    /// channel pitch under the new rules.
    pub fn set_channel3_mode(&mut self, mode: u8) {
        self.channels[2].mode = mode & 3;
        self.refresh_channel_frequency(2);
    }

    /// Stores upper bits for one channel 3 operator frequency.
    pub fn stage_channel3_frequency_high(&mut self, slot: usize, high: u32, block: u32) {
        let channel = &mut self.channels[2];
        channel.op_fnums[slot] = (channel.op_fnums[slot] & 0xFF) | ((high & 7) << 8);
        channel.op_blocks[slot] = block & 7;
    }

    /// Writes the low byte of one channel 3 operator frequency. In
    /// special mode this retunes that operator alone.
    pub fn set_channel3_frequency_low(&mut self, slot: usize, low: u8) {
        let config = self.config;
        let channel = &mut self.channels[2];
        channel.op_fnums[slot] = (channel.op_fnums[slot] & 0x700) | low as u32;
        if channel.mode != 0 {
            let fnum = channel.op_fnums[slot];
            let block = channel.op_blocks[slot];
            let oper = &mut channel.opers[slot];
            oper.fnum = fnum;
            oper.block = block;
            oper.refresh_phase_opn();
            oper.update_ksr(&config);
        }
    }

    /// Sets an OPM channel's octave and note code.
    pub fn set_channel_note(&mut self, ch: usize, block: u32, kc: u32) {
        let channel = &mut self.channels[ch];
        channel.block = block & 7;
        channel.kc = kc & 0xF;
        self.refresh_channel_pitch(ch);
    }

    /// Sets an OPM channel's key fraction.
    pub fn set_channel_fraction(&mut self, ch: usize, kf: u32) {
        self.channels[ch].kf = kf & 0x3F;
        self.refresh_channel_pitch(ch);
    }

    fn refresh_channel_frequency(&mut self, ch: usize) {
        let config = self.config;
        let note_select = self.note_select;
        let channel = &mut self.channels[ch];
        match config.family {
            Family::Opn => {
                // In special mode the channel registers only drive the
                // last operator; the others keep their own pitch
                let solo = channel.number == 2 && channel.mode != 0;
                let fnum = channel.fnum;
                let block = channel.block;
                for oper in &mut channel.opers {
                    if solo && oper.slot != 3 {
                        continue;
                    }
                    oper.fnum = fnum;
                    oper.block = block;
                    oper.refresh_phase_opn();
                    oper.update_ksr(&config);
                }
            }
            Family::Opl | Family::Opll => {
                let fnum = channel.fnum;
                let block = channel.block;
                for oper in &mut channel.opers {
                    oper.fnum = fnum;
                    oper.block = block;
                    // Increments rebuild each sample; level and key
                    // scaling follow the pitch right away
                    oper.update_total_level(&config);
                    oper.update_rks(note_select, &config);
                }
            }
            Family::Opm => {}
        }
    }

    fn refresh_channel_pitch(&mut self, ch: usize) {
        let raw_pm = match &self.lfo {
            LfoUnit::Opm(lfo) => lfo.pm_output,
            _ => 0,
        };
        let config = self.config;
        let channel = &mut self.channels[ch];
        let (kc, kf, block, pm_sens) = (channel.kc, channel.kf, channel.block, channel.pm_sens);
        for oper in &mut channel.opers {
            oper.kc = kc;
            oper.kf = kf;
            oper.block = block;
            oper.pm_sens = pm_sens;
            oper.update_frequency_opm(&config, raw_pm);
        }
    }

    // ---- operator parameters ------------------------------------------

    /// Sets fine detune and multiplier (OPN/OPM).
    pub fn set_detune_multiply(&mut self, ch: usize, slot: usize, detune: u8, multiply: u8) {
        let oper = &mut self.channels[ch].opers[slot];
        oper.detune = detune & 7;
        oper.multiply = (multiply & 0xF) as u32;
        match self.config.family {
            Family::Opn => oper.refresh_phase_opn(),
            Family::Opm => oper.refresh_phase_opm(),
            _ => {}
        }
    }

    /// Sets the OPL operator flag byte: tremolo, vibrato, EG type,
    /// key scaling and multiplier.
    pub fn set_multiply_flags(
        &mut self,
        ch: usize,
        slot: usize,
        am: bool,
        vibrato: bool,
        sustained: bool,
        ksr: bool,
        multiply: u8,
    ) {
        let config = self.config;
        let note_select = self.note_select;
        let oper = &mut self.channels[ch].opers[slot];
        oper.am_enable = am;
        oper.vibrato = vibrato;
        oper.is_sustained = sustained;
        oper.is_ksr = ksr;
        oper.multiply = (multiply & 0xF) as u32;
        oper.update_rks(note_select, &config);
    }

    /// Sets an operator's total level (OPN/OPM scale).
    pub fn set_total_level(&mut self, ch: usize, slot: usize, level: u8) {
        self.channels[ch].opers[slot].total_level = ((level & 0x7F) as u32) << 3;
    }

    /// Sets key-scale-level and raw total level (OPL lineage).
    pub fn set_level_scaling(&mut self, ch: usize, slot: usize, ksl: u8, level: u8) {
        let config = self.config;
        let oper = &mut self.channels[ch].opers[slot];
        oper.ksl = ksl & 3;
        oper.raw_level = level & 0x3F;
        oper.update_total_level(&config);
    }

    /// Sets an OPLL carrier volume nibble.
    pub fn set_carrier_volume(&mut self, ch: usize, volume: u8) {
        let config = self.config;
        let oper = &mut self.channels[ch].opers[1];
        oper.raw_volume = volume & 0xF;
        oper.update_total_level(&config);
    }

    /// Sets rate scaling and attack rate (OPN/OPM).
    pub fn set_attack_scaling(&mut self, ch: usize, slot: usize, rate_scale: u8, attack: u8) {
        let config = self.config;
        let oper = &mut self.channels[ch].opers[slot];
        oper.key_scaling = 3 - (rate_scale & 3);
        oper.attack_rate = attack & 0x1F;
        oper.update_ksr(&config);
    }

    /// Sets decay rate and the tremolo enable riding its register
    /// (OPN/OPM).
    pub fn set_decay_am(&mut self, ch: usize, slot: usize, decay: u8, am: bool) {
        let oper = &mut self.channels[ch].opers[slot];
        oper.decay_rate = decay & 0x1F;
        oper.am_enable = am;
    }

    /// Sets the sustain (second decay) rate (OPN).
    pub fn set_sustain_rate(&mut self, ch: usize, slot: usize, sustain: u8) {
        self.channels[ch].opers[slot].sustain_rate = sustain & 0x1F;
    }

    /// Sets sustain rate and coarse detune together (OPM), retuning
    /// the operator.
    pub fn set_sustain_detune2(&mut self, ch: usize, slot: usize, sustain: u8, detune2: u8) {
        let raw_pm = match &self.lfo {
            LfoUnit::Opm(lfo) => lfo.pm_output,
            _ => 0,
        };
        let config = self.config;
        let oper = &mut self.channels[ch].opers[slot];
        oper.sustain_rate = sustain & 0x1F;
        oper.detune2 = detune2 & 3;
        oper.update_frequency_opm(&config, raw_pm);
    }

    /// Sets attack and decay nibbles (OPL lineage).
    pub fn set_attack_decay(&mut self, ch: usize, slot: usize, attack: u8, decay: u8) {
        let config = self.config;
        let oper = &mut self.channels[ch].opers[slot];
        oper.attack_rate = attack & 0xF;
        oper.decay_rate = decay & 0xF;
        oper.recompute_rate(&config);
    }

    /// Sets sustain level and release rate.
    pub fn set_sustain_release(&mut self, ch: usize, slot: usize, sustain: u8, release: u8) {
        let config = self.config;
        let oper = &mut self.channels[ch].opers[slot];
        match config.eg_tables {
            crate::config::EgTables::Opn => {
                // Register value 15 means -93 dB, not -45
                let level = if sustain == 15 { 31 } else { sustain & 0xF } as i32;
                oper.sustain_level = level << 5;
                oper.release_rate = release & 0xF;
            }
            crate::config::EgTables::Opl => {
                oper.sustain_level = ((sustain & 0xF) as i32) << 4;
                oper.release_rate = release & 0xF;
                oper.recompute_rate(&config);
            }
        }
    }

    /// Overrides an operator's release rate (OPLL sustain pedal).
    pub fn set_release_rate(&mut self, ch: usize, slot: usize, release: u8) {
        let config = self.config;
        let oper = &mut self.channels[ch].opers[slot];
        oper.release_rate = release & 0xF;
        oper.recompute_rate(&config);
    }

    /// Sets the SSG-EG shape flags (OPN).
    pub fn set_ssg_flags(
        &mut self,
        ch: usize,
        slot: usize,
        enable: bool,
        attack: bool,
        alternate: bool,
        hold: bool,
    ) {
        let oper = &mut self.channels[ch].opers[slot];
        oper.ssg_enable = enable;
        oper.ssg_attack = attack;
        oper.ssg_alternate = alternate;
        oper.ssg_hold = hold;
    }

    /// Selects an operator wave shape.
    pub fn set_waveform(&mut self, ch: usize, slot: usize, wave: u8) {
        self.channels[ch].opers[slot].waveform = Waveform::from_register(wave);
    }

    // ---- channel parameters -------------------------------------------

    /// Sets feedback depth and algorithm (4-operator families).
    pub fn set_feedback_algorithm(&mut self, ch: usize, feedback: u8, algorithm: u8) {
        let channel = &mut self.channels[ch];
        channel.feedback = feedback & 7;
        channel.algorithm = algorithm & 7;
    }

    /// Sets feedback depth and the additive connection flag (OPL).
    pub fn set_feedback_parallel(&mut self, ch: usize, feedback: u8, parallel: bool) {
        let channel = &mut self.channels[ch];
        channel.feedback = feedback & 7;
        channel.parallel = parallel;
    }

    /// Sets the stereo pan gates (OPM).
    pub fn set_pan(&mut self, ch: usize, left: bool, right: bool) {
        let channel = &mut self.channels[ch];
        channel.pan_left = left;
        channel.pan_right = right;
    }

    /// Sets vibrato and tremolo sensitivity for a channel (OPM).
    pub fn set_channel_sensitivity(&mut self, ch: usize, pm_sens: u8, am_sens: u8) {
        {
            let channel = &mut self.channels[ch];
            channel.pm_sens = pm_sens & 7;
            channel.am_sens = am_sens & 3;
        }
        self.refresh_channel_pitch(ch);
    }

    // ---- keys ---------------------------------------------------------

    /// Key-on for one operator.
    pub fn key_on(&mut self, ch: usize, slot: usize) {
        let config = self.config;
        self.channels[ch].opers[slot].key_on(&config);
    }

    /// Key-off for one operator.
    pub fn key_off(&mut self, ch: usize, slot: usize) {
        let config = self.config;
        self.channels[ch].opers[slot].key_off(&config);
    }

    /// Keys every operator of a channel together (OPL lineage).
    pub fn key_channel(&mut self, ch: usize, on: bool) {
        let config = self.config;
        for oper in &mut self.channels[ch].opers {
            if on {
                oper.key_on(&config);
            } else {
                oper.key_off(&config);
            }
        }
    }

    // ---- global -------------------------------------------------------

    /// Sets the OPM LFO rate register.
    pub fn set_lfo_rate(&mut self, rate: u8) {
        if let LfoUnit::Opm(lfo) = &mut self.lfo {
            lfo.rate = rate;
        }
    }

    /// Selects the OPM LFO wave shape.
    pub fn set_lfo_waveform(&mut self, wave: u8) {
        if let LfoUnit::Opm(lfo) = &mut self.lfo {
            lfo.waveform = wave & 3;
        }
    }

    /// Sets the OPM tremolo depth.
    pub fn set_lfo_am_depth(&mut self, depth: u8) {
        if let LfoUnit::Opm(lfo) = &mut self.lfo {
            lfo.am_depth = depth & 0x7F;
        }
    }

    /// Sets the OPM vibrato depth.
    pub fn set_lfo_pm_depth(&mut self, depth: u8) {
        if let LfoUnit::Opm(lfo) = &mut self.lfo {
            lfo.pm_depth = depth & 0x7F;
        }
    }

    /// Holds or releases the OPM LFO counter.
    pub fn set_lfo_reset(&mut self, reset: bool) {
        if let LfoUnit::Opm(lfo) = &mut self.lfo {
            lfo.reset = reset;
        }
    }

    /// Configures the OPM noise generator.
    pub fn set_noise(&mut self, enable: bool, frequency: u8) {
        if let LfoUnit::Opm(lfo) = &mut self.lfo {
            lfo.noise.enable = enable;
            lfo.noise.frequency = (frequency & 0x1F) as u32;
        }
    }

    /// Sets the OPL tremolo/vibrato depth flags.
    pub fn set_lfo_depth(&mut self, deep_am: bool, deep_pm: bool) {
        if let LfoUnit::Opl(lfo) = &mut self.lfo {
            lfo.deep_am = deep_am;
            lfo.deep_pm = deep_pm;
        }
    }

    /// Sets the OPL note-select flag for key scaling.
    pub fn set_note_select(&mut self, note_select: bool) {
        self.note_select = note_select;
    }

    // ---- clocking -----------------------------------------------------

    /// Advances the whole engine by one output sample.
    pub fn clock(&mut self) {
        match self.config.family {
            Family::Opn => self.clock_opn(),
            Family::Opm => self.clock_opm(),
            Family::Opl | Family::Opll => self.clock_opl(),
        }
    }

    fn clock_opn(&mut self) {
        let config = self.config;
        for channel in &mut self.channels {
            channel.clock_ssg(&config);
        }
        self.env_timer += 1;
        if self.env_timer >= config.env_divider {
            self.env_timer = 0;
            self.env_clock = self.env_clock.wrapping_add(1);
            let env_clock = self.env_clock;
            for channel in &mut self.channels {
                channel.clock_envelopes(&config, env_clock);
            }
        }
        for channel in &mut self.channels {
            channel.advance_phases(&config);
        }
        for channel in &mut self.channels {
            channel.four_op_output(&config, None);
        }
    }

    fn clock_opm(&mut self) {
        let config = self.config;
        if let LfoUnit::Opm(lfo) = &mut self.lfo {
            lfo.clock();
        }
        let (lfo_am, lfo_raw_pm, noise_enable, noise_state) = match &self.lfo {
            LfoUnit::Opm(lfo) => (lfo.am_output, lfo.pm_output, lfo.noise.enable, lfo.noise.state),
            _ => (0, 0, false, false),
        };

        self.env_timer += 1;
        if self.env_timer >= config.env_divider {
            self.env_timer = 0;
            self.env_clock = self.env_clock.wrapping_add(1);
            let env_clock = self.env_clock;
            for channel in &mut self.channels {
                channel.clock_envelopes(&config, env_clock);
            }
        }
        for channel in &mut self.channels {
            channel.lfo_am = channel.scaled_am(lfo_am);
            channel.clock_phases_opm(&config, lfo_raw_pm);
        }
        for (index, channel) in self.channels.iter_mut().enumerate() {
            let noise = if noise_enable && index == 7 {
                Some(noise_state)
            } else {
                None
            };
            channel.four_op_output(&config, noise);
        }
    }

    fn clock_opl(&mut self) {
        let config = self.config;
        self.env_clock = self.env_clock.wrapping_add(1);
        if let LfoUnit::Opl(lfo) = &mut self.lfo {
            lfo.clock();
        }
        let (am_value, pm_clock, deep_pm) = match &self.lfo {
            LfoUnit::Opl(lfo) => (lfo.am_value() as u32, lfo.pm_clock, lfo.deep_pm),
            _ => (0, 0, false),
        };
        // OPLL attenuation runs on a 7-bit scale; fold the tremolo
        // value down to match
        let am_value = if config.family == Family::Opll {
            am_value >> 2
        } else {
            am_value
        };
        let env_clock = self.env_clock;
        for channel in &mut self.channels {
            channel.lfo_am = am_value;
            channel.clock_phases_opl(&config, pm_clock, deep_pm);
            channel.clock_envelopes(&config, env_clock);
        }
        for channel in &mut self.channels {
            channel.two_op_output(&config);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::envelope::EnvelopeState;

    fn keyed_opn_engine() -> FmEngine {
        let mut engine = FmEngine::new(FamilyConfig::opn());
        engine.set_feedback_algorithm(0, 0, 7);
        engine.stage_channel_frequency_high(0, 2, 4);
        engine.set_channel_frequency_low(0, 0x6A);
        for slot in 0..4 {
            engine.set_detune_multiply(0, slot, 0, 1);
            engine.set_total_level(0, slot, 0);
            engine.set_attack_scaling(0, slot, 0, 31);
            engine.set_sustain_release(0, slot, 0, 15);
            engine.key_on(0, slot);
        }
        engine
    }

    #[test]
    fn test_engine_shape_follows_config() {
        let opn = FmEngine::new(FamilyConfig::opn());
        assert_eq!(opn.channels.len(), 3);
        assert_eq!(opn.channels[0].opers.len(), 4);

        let opl = FmEngine::new(FamilyConfig::opl());
        assert_eq!(opl.channels.len(), 9);
        assert_eq!(opl.channels[0].opers.len(), 2);
    }

    #[test]
    fn test_envelope_clock_divider() {
        let mut engine = FmEngine::new(FamilyConfig::opn());
        for _ in 0..3 {
            engine.clock();
        }
        assert_eq!(engine.env_clock, 1);
        for _ in 0..3 {
            engine.clock();
        }
        assert_eq!(engine.env_clock, 2);

        let mut opl = FmEngine::new(FamilyConfig::opl());
        opl.clock();
        opl.clock();
        assert_eq!(opl.env_clock, 2, "OPL lineage ticks every sample");
    }

    #[test]
    fn test_keyed_channel_produces_audio() {
        let mut engine = keyed_opn_engine();
        let mut heard = false;
        for _ in 0..200 {
            engine.clock();
            if engine.channel_output(0) != 0 {
                heard = true;
            }
        }
        assert!(heard, "a keyed full-volume channel must make sound");
        // The other channels stay silent
        for _ in 0..10 {
            engine.clock();
            assert_eq!(engine.channel_output(1), 0);
            assert_eq!(engine.channel_output(2), 0);
        }
    }

    #[test]
    fn test_reset_silences_engine() {
        let mut engine = keyed_opn_engine();
        for _ in 0..50 {
            engine.clock();
        }
        engine.reset();
        assert_eq!(engine.env_clock, 0);
        for channel in &engine.channels {
            assert_eq!(channel.output, 0);
            for oper in &channel.opers {
                assert_eq!(oper.env_state, EnvelopeState::Off);
                assert_eq!(oper.env_output, 0x3FF);
                assert!(!oper.is_keyon);
            }
        }
        for _ in 0..20 {
            engine.clock();
            assert_eq!(engine.channel_output(0), 0);
        }
    }

    #[test]
    fn test_channel3_special_mode_splits_pitch() {
        let mut engine = FmEngine::new(FamilyConfig::opn());
        engine.set_channel3_mode(1);
        engine.stage_channel3_frequency_high(0, 4, 5);
        engine.set_channel3_frequency_low(0, 0x20);
        // Channel-level registers only drive the last operator now
        engine.stage_channel_frequency_high(2, 1, 2);
        engine.set_channel_frequency_low(2, 0x80);

        let channel = &engine.channels[2];
        assert_eq!(channel.opers[0].fnum, 0x420);
        assert_eq!(channel.opers[0].block, 5);
        assert_eq!(channel.opers[3].fnum, 0x180);
        assert_eq!(channel.opers[3].block, 2);
        assert_ne!(channel.opers[0].phase_freq, channel.opers[3].phase_freq);

        // Dropping back to normal mode retunes everyone from the
        // channel registers
        engine.set_channel3_mode(0);
        let channel = &engine.channels[2];
        assert_eq!(channel.opers[0].fnum, 0x180);
        assert_eq!(channel.opers[0].phase_freq, channel.opers[3].phase_freq);
    }

    #[test]
    fn test_opm_noise_replaces_channel_7_carrier() {
        let mut engine = FmEngine::new(FamilyConfig::opm());
        engine.set_noise(true, 0);
        engine.set_feedback_algorithm(7, 0, 7);
        engine.set_attack_scaling(7, 3, 0, 31);
        engine.key_on(7, 3);
        engine.clock();
        assert_eq!(
            engine.channel_output(7).abs(),
            2046,
            "full-level envelope maps to the full noise amplitude"
        );
    }

    #[test]
    fn test_opl_keyed_channel_produces_audio() {
        let mut engine = FmEngine::new(FamilyConfig::opl());
        for slot in 0..2 {
            engine.set_multiply_flags(0, slot, false, false, true, false, 1);
            engine.set_attack_decay(0, slot, 15, 0);
            engine.set_level_scaling(0, slot, 0, 0);
        }
        engine.set_channel_frequency_high(0, 1, 4);
        engine.key_channel(0, true);

        let mut heard = false;
        for _ in 0..300 {
            engine.clock();
            if engine.channel_output(0) != 0 {
                heard = true;
            }
        }
        assert!(heard);
    }

    #[test]
    fn test_opm_pan_flags_stored() {
        let mut engine = FmEngine::new(FamilyConfig::opm());
        engine.set_pan(3, true, false);
        assert!(engine.channels[3].pan_left);
        assert!(!engine.channels[3].pan_right);
    }

    #[test]
    fn test_settled_voice_is_smooth_and_periodic() {
        let mut engine = FmEngine::new(FamilyConfig::opn());
        engine.set_feedback_algorithm(0, 0, 7);
        engine.stage_channel_frequency_high(0, 2, 4);
        engine.set_channel_frequency_low(0, 0x00);
        engine.set_detune_multiply(0, 0, 0, 1);
        engine.set_total_level(0, 0, 0);
        engine.set_attack_scaling(0, 0, 0, 31);
        engine.set_sustain_release(0, 0, 0, 15);
        for slot in 1..4 {
            engine.set_total_level(0, slot, 0x7F);
        }
        engine.key_on(0, 0);

        for _ in 0..20 {
            engine.clock();
        }
        let oper = &engine.channels[0].opers[0];
        assert!(
            matches!(oper.env_state, EnvelopeState::Decay | EnvelopeState::Sustain),
            "fastest attack should have finished, found {:?}",
            oper.env_state
        );
        // fnum 0x200 at block 4 steps the 10-bit phase by exactly 4,
        // so the tone repeats every 256 samples
        assert_eq!(oper.phase_freq, 4096);

        let samples: Vec<i32> = (0..768)
            .map(|_| {
                engine.clock();
                engine.channel_output(0)
            })
            .collect();

        let peak = samples.iter().map(|s| s.abs()).max().unwrap();
        assert!(peak <= 8168, "lone operator exceeded full scale: {}", peak);
        assert!(peak > 6000, "settled tone should swing near full scale");

        // Steepest slope of the quantized sine at this step width
        for pair in samples.windows(2) {
            assert!(
                (pair[1] - pair[0]).abs() <= 320,
                "discontinuity: {} to {}",
                pair[0],
                pair[1]
            );
        }
        for i in 0..512 {
            assert_eq!(samples[i], samples[i + 256], "tone must repeat exactly");
        }
    }
}
