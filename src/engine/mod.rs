//! Sample-accurate generic FM synthesis core
//!
//! The engine reproduces the shared digital architecture of Yamaha's
//! 1980s FM parts: phase accumulators driving a log-sine table, an
//! exponential output stage, multi-state envelope generators and
//! algorithm routing with operator 1 feedback. Family differences are
//! data (see [`crate::config::FamilyConfig`]) except for a handful of
//! structural forks the modules branch on.

pub mod channel;
pub mod core;
pub mod envelope;
pub mod lfo;
pub mod operator;
pub mod phase;
pub mod waveform;

pub use self::core::FmEngine;
pub use self::envelope::EnvelopeState;
pub use self::operator::Operator;
pub use self::waveform::Waveform;
