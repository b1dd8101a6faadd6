//! Chip family parameterization and render-script configuration
//!
//! One synthesis core serves four Yamaha FM families. Everything that
//! differs between them in a tabular way lives here: channel and operator
//! counts, envelope rate-table selection, attenuation bit widths, phase
//! accumulator geometry and the capability flags that gate family-specific
//! features like SSG-EG or waveform select.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{FmError, Result};

/// Default master clock for all supported chips (NTSC colorburst).
pub const DEFAULT_MASTER_CLOCK: u32 = 3_579_545;

/// The four supported FM synthesis families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// OPN lineage (YM2203): 3 channels, 4 operators, SSG-EG
    Opn,
    /// OPM lineage (YM2151): 8 channels, 4 operators, stereo, noise
    Opm,
    /// OPL lineage (YM3812): 9 channels, 2 operators, wave select
    Opl,
    /// OPLL lineage (YM2413): 9 channels, 2 operators, instrument ROM
    Opll,
}

/// Which envelope rate-table set the family reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EgTables {
    /// OPN/OPM tables: shifts start at 11, increments reach 8
    Opn,
    /// OPL/OPLL tables: shifts start at 12, increments reach 4
    Opl,
}

/// Which low-frequency oscillator unit the family carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LfoKind {
    /// No LFO (YM2203)
    None,
    /// OPM unit: four waveforms, shared AM/PM depth registers
    Opm,
    /// OPL unit: fixed tremolo and vibrato tables
    Opl,
}

bitflags! {
    /// Feature switches that vary within a family's shared machinery.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChipCaps: u16 {
        /// SSG-type envelope shapes on the operators (OPN)
        const SSG_EG = 0x01;
        /// Fine detune via the detune ROM (OPN, OPM)
        const DETUNE = 0x02;
        /// Coarse detune in cents (OPM)
        const COARSE_DETUNE = 0x04;
        /// Per-channel stereo pan gates (OPM)
        const STEREO = 0x08;
        /// Noise generator replacing channel 8's carrier (OPM)
        const NOISE = 0x10;
        /// Selectable operator waveforms (OPL2 and later)
        const WAVE_SELECT = 0x20;
        /// Key-scale-level attenuation from the KSL ROM (OPL, OPLL)
        const KEY_SCALE_LEVEL = 0x40;
        /// Damp phase runs before each key-on (OPLL)
        const DAMP_STATE = 0x80;
    }
}

/// Numeric shape of one chip family, consumed by the synthesis core.
///
/// All fields are fixed per family; the four constructors below are the
/// only intended sources of values.
#[derive(Debug, Clone, Copy)]
pub struct FamilyConfig {
    /// Which family this is, for the few code paths tables cannot express
    pub family: Family,
    /// Number of FM channels
    pub channels: usize,
    /// Operators per channel (2 or 4)
    pub operators: usize,
    /// Envelope rate-table set
    pub eg_tables: EgTables,
    /// Rate formula multiplier: `rate = base * mult + key_scaling`
    pub rate_multiplier: u8,
    /// Samples per envelope clock tick (1 or 3)
    pub env_divider: u8,
    /// Attack curve shift: `env += (!env * inc) >> shift`
    pub attack_shift: u8,
    /// Rates at or above this skip the attack phase entirely
    pub instant_attack_rate: u8,
    /// Envelope ceiling (10-bit or 9-bit)
    pub env_max: u16,
    /// Attenuation clamp applied before the output stage
    pub atten_clamp: u16,
    /// Left shift aligning envelope attenuation with the log-sine scale
    pub atten_shift: u8,
    /// Phase accumulator mask
    pub phase_mask: u32,
    /// Right shift from accumulator to 10-bit phase
    pub phase_out_shift: u8,
    /// Final right shift applied to a 2-operator carrier (unused for 4-op)
    pub carrier_shift: u8,
    /// LFO unit
    pub lfo: LfoKind,
    /// Feature switches
    pub caps: ChipCaps,
}

impl FamilyConfig {
    /// OPN family shape (YM2203).
    pub const fn opn() -> Self {
        FamilyConfig {
            family: Family::Opn,
            channels: 3,
            operators: 4,
            eg_tables: EgTables::Opn,
            rate_multiplier: 2,
            env_divider: 3,
            attack_shift: 4,
            instant_attack_rate: 62,
            env_max: 0x3FF,
            atten_clamp: 0x3FF,
            atten_shift: 2,
            phase_mask: 0xFFFFF,
            phase_out_shift: 10,
            carrier_shift: 0,
            lfo: LfoKind::None,
            caps: ChipCaps::SSG_EG.union(ChipCaps::DETUNE),
        }
    }

    /// OPM family shape (YM2151).
    pub const fn opm() -> Self {
        FamilyConfig {
            family: Family::Opm,
            channels: 8,
            operators: 4,
            eg_tables: EgTables::Opn,
            rate_multiplier: 2,
            env_divider: 3,
            attack_shift: 4,
            instant_attack_rate: 62,
            env_max: 0x3FF,
            atten_clamp: 0x3FF,
            atten_shift: 2,
            phase_mask: 0xFFFFF,
            phase_out_shift: 10,
            carrier_shift: 0,
            lfo: LfoKind::Opm,
            caps: ChipCaps::DETUNE
                .union(ChipCaps::COARSE_DETUNE)
                .union(ChipCaps::STEREO)
                .union(ChipCaps::NOISE),
        }
    }

    /// OPL family shape (YM3812).
    pub const fn opl() -> Self {
        FamilyConfig {
            family: Family::Opl,
            channels: 9,
            operators: 2,
            eg_tables: EgTables::Opl,
            rate_multiplier: 4,
            env_divider: 1,
            attack_shift: 3,
            instant_attack_rate: 60,
            env_max: 0x1FF,
            atten_clamp: 0x1FF,
            atten_shift: 3,
            phase_mask: 0xFFFFF,
            phase_out_shift: 10,
            carrier_shift: 1,
            lfo: LfoKind::Opl,
            caps: ChipCaps::WAVE_SELECT.union(ChipCaps::KEY_SCALE_LEVEL),
        }
    }

    /// OPLL family shape (YM2413).
    pub const fn opll() -> Self {
        FamilyConfig {
            family: Family::Opll,
            channels: 9,
            operators: 2,
            eg_tables: EgTables::Opl,
            rate_multiplier: 4,
            env_divider: 1,
            attack_shift: 3,
            instant_attack_rate: 60,
            env_max: 0x1FF,
            atten_clamp: 0x7F,
            atten_shift: 4,
            phase_mask: 0x7FFFF,
            phase_out_shift: 9,
            carrier_shift: 5,
            lfo: LfoKind::Opl,
            caps: ChipCaps::KEY_SCALE_LEVEL.union(ChipCaps::DAMP_STATE),
        }
    }
}

/// Selects a chip front-end in render scripts and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChipKind {
    /// YM2203 (OPN), 3 FM channels, mono
    Ym2203,
    /// YM2151 (OPM), 8 FM channels, stereo
    Ym2151,
    /// YM3812 (OPL2), 9 FM channels, mono
    Ym3812,
    /// YM2413 (OPLL), 9 FM channels, mono
    Ym2413,
}

impl ChipKind {
    /// Master-clock divisor producing one output sample.
    pub fn sample_divisor(self) -> u32 {
        match self {
            ChipKind::Ym2151 => 64,
            _ => 72,
        }
    }

    /// Output sample rate for a given master clock.
    pub fn sample_rate(self, master_clock: u32) -> u32 {
        master_clock / self.sample_divisor()
    }
}

impl std::str::FromStr for ChipKind {
    type Err = FmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ym2203" | "opn" => Ok(ChipKind::Ym2203),
            "ym2151" | "opm" => Ok(ChipKind::Ym2151),
            "ym3812" | "opl" | "opl2" => Ok(ChipKind::Ym3812),
            "ym2413" | "opll" => Ok(ChipKind::Ym2413),
            other => Err(FmError::ConfigError(format!(
                "unknown chip '{}' (expected ym2203, ym2151, ym3812 or ym2413)",
                other
            ))),
        }
    }
}

/// A timed register write inside a render script.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegisterEvent {
    /// Sample index at which the write lands
    #[serde(default)]
    pub at: u64,
    /// Register address
    pub reg: u8,
    /// Register data
    pub data: u8,
}

/// A JSON render script: one chip, a register schedule, a length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderScript {
    /// Which chip the script drives
    pub chip: ChipKind,
    /// Master clock in Hz; colorburst when omitted
    #[serde(default)]
    pub clock: Option<u32>,
    /// Length of the rendered output in seconds
    pub seconds: f64,
    /// Register schedule, applied in order
    #[serde(default)]
    pub events: Vec<RegisterEvent>,
}

impl RenderScript {
    /// Parses a script from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let script: RenderScript = serde_json::from_str(text)
            .map_err(|e| FmError::ConfigError(format!("invalid render script: {}", e)))?;
        if script.seconds <= 0.0 {
            return Err(FmError::ConfigError(
                "render script length must be positive".into(),
            ));
        }
        Ok(script)
    }

    /// Master clock with the default applied.
    pub fn master_clock(&self) -> u32 {
        self.clock.unwrap_or(DEFAULT_MASTER_CLOCK)
    }

    /// Total number of output frames the script renders.
    pub fn frame_count(&self) -> u64 {
        let rate = self.chip.sample_rate(self.master_clock());
        (self.seconds * rate as f64) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_shapes_are_consistent() {
        for config in [
            FamilyConfig::opn(),
            FamilyConfig::opm(),
            FamilyConfig::opl(),
            FamilyConfig::opll(),
        ] {
            assert!(config.operators == 2 || config.operators == 4);
            assert!(
                config.atten_clamp <= config.env_max,
                "{:?}: output clamp cannot exceed the envelope ceiling",
                config.family
            );
            // Attenuation must line up with the 13-bit log-sine sum
            let top = (config.atten_clamp as u32) << config.atten_shift;
            assert!(
                top <= 0x1FFF,
                "{:?}: shifted attenuation {} overflows the log domain",
                config.family,
                top
            );
        }
    }

    #[test]
    fn test_two_op_families_use_opl_tables() {
        assert_eq!(FamilyConfig::opl().eg_tables, EgTables::Opl);
        assert_eq!(FamilyConfig::opll().eg_tables, EgTables::Opl);
        assert_eq!(FamilyConfig::opn().eg_tables, EgTables::Opn);
        assert_eq!(FamilyConfig::opm().eg_tables, EgTables::Opn);
    }

    #[test]
    fn test_chip_kind_parsing() {
        use std::str::FromStr;
        assert_eq!(ChipKind::from_str("YM2151").ok(), Some(ChipKind::Ym2151));
        assert_eq!(ChipKind::from_str("opll").ok(), Some(ChipKind::Ym2413));
        assert!(ChipKind::from_str("ym9999").is_err());
    }

    #[test]
    fn test_sample_rates() {
        assert_eq!(ChipKind::Ym2151.sample_rate(3_579_545), 55_930);
        assert_eq!(ChipKind::Ym2203.sample_rate(3_579_545), 49_715);
        assert_eq!(ChipKind::Ym2413.sample_rate(3_579_545), 49_715);
    }

    #[test]
    fn test_render_script_from_json() {
        let script = RenderScript::from_json(
            r#"{
                "chip": "ym2151",
                "seconds": 0.5,
                "events": [
                    { "reg": 32, "data": 199 },
                    { "at": 100, "reg": 8, "data": 120 }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(script.chip, ChipKind::Ym2151);
        assert_eq!(script.master_clock(), DEFAULT_MASTER_CLOCK);
        assert_eq!(script.events.len(), 2);
        assert_eq!(script.events[1].at, 100);
        assert_eq!(script.frame_count(), 27_965);

        let bad = RenderScript::from_json(r#"{ "chip": "ym2151", "seconds": 0 }"#);
        assert!(bad.is_err());
    }
}
