//! Multi-operator FM synthesis engine for Yamaha OPN/OPM/OPL/OPLL chips
//!
//! A sample-accurate emulation of the classic four- and two-operator FM
//! sound generators: the YM2203 (OPN), YM2151 (OPM), YM3812 (OPL2) and
//! YM2413 (OPLL). One synthesis core models the parts they share, the
//! log-sine/exponent output stage, phase accumulators with detune and
//! multiplier, the multi-state envelope generator and the operator
//! routing matrix, while a per-family configuration and four thin
//! register front-ends reproduce what each chip does differently.
//!
//! # Features
//! - Integer-exact phase, envelope and attenuation pipeline
//! - All 8 algorithms with self-feedback, plus the OPL 2-operator modes
//! - SSG-EG envelope shapes (OPN), noise carrier and vibrato/tremolo
//!   LFO (OPM), wave select (OPL), instrument ROM and damped
//!   retriggering (OPLL)
//! - Register-level bus interface with address latching
//! - WAV export and a JSON render-script demo binary
//!
//! # Crate feature flags
//! - `opn` (default): YM2203 front-end
//! - `opm` (default): YM2151 front-end
//! - `opl` (default): YM3812 front-end
//! - `opll` (default): YM2413 front-end
//!
//! # Quick start
//! ```
//! use opfm::backend::FmChip;
//! use opfm::chips::Ym2151;
//!
//! let mut chip = Ym2151::new(3_579_545);
//! chip.write_register(0x20, 0xC7); // both speakers, algorithm 7
//! chip.write_register(0x28, 0x4A); // octave 4, note 10
//! chip.write_register(0x60, 0x00); // operator 1 at full level
//! chip.write_register(0x80, 0x1F); // fastest attack
//! chip.write_register(0x08, 0x08); // key on operator 1
//! let frames = chip.render(1024);
//! assert_eq!(frames.len(), 2048); // stereo
//! ```
//!
//! Scripted renders, register writes with sample timestamps, go
//! through the `opfm` binary; see [`config::RenderScript`] for the
//! format.

#![warn(missing_docs)]

pub mod backend; // Chip trait abstraction
pub mod chips; // Register front-ends (YM2203/YM2151/YM3812/YM2413)
pub mod config; // Family parameterization and render scripts
pub mod engine; // Shared synthesis core
pub mod export; // WAV output
pub mod tables; // Log-sine, exponent, detune and rate ROMs

/// Error types for FM chip emulator operations
#[derive(thiserror::Error, Debug)]
pub enum FmError {
    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration or render script
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for FmError {
    /// Converts a String into `FmError::Other`.
    ///
    /// Convenience for generic string errors; use
    /// `FmError::ConfigError(msg)` where the discrimination matters.
    fn from(msg: String) -> Self {
        FmError::Other(msg)
    }
}

impl From<&str> for FmError {
    /// Converts a string slice into `FmError::Other`.
    fn from(msg: &str) -> Self {
        FmError::Other(msg.to_string())
    }
}

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, FmError>;

// Public API exports
pub use backend::FmChip;
pub use chips::create_chip;
pub use config::{ChipKind, RegisterEvent, RenderScript, DEFAULT_MASTER_CLOCK};
pub use engine::FmEngine;

#[cfg(feature = "opm")]
pub use chips::Ym2151;
#[cfg(feature = "opn")]
pub use chips::Ym2203;
#[cfg(feature = "opll")]
pub use chips::Ym2413;
#[cfg(feature = "opl")]
pub use chips::Ym3812;
