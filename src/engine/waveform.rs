//! Waveform generation and the log-to-linear output stage
//!
//! Operators never hold a sine table in linear form. The phase indexes a
//! quarter-wave log-sine ROM, envelope attenuation is added in the log
//! domain, and an exponential ROM converts the sum back to a linear
//! sample. Wave-shape variants are index and sign rules layered on the
//! same two ROMs.

use num_traits::FromPrimitive;

use crate::tables::wave_tables;

/// Operator wave shapes.
///
/// Shape 0 is the only one present on OPN and OPM. OPL2 adds shapes
/// 1-3; the remaining four exist on later OPL parts and are kept here
/// so the output stage covers the whole family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, num_derive::FromPrimitive)]
pub enum Waveform {
    /// Full sine wave
    #[default]
    Sine = 0,
    /// Positive half only; negative half silent
    HalfSine = 1,
    /// Absolute value of the sine
    AbsSine = 2,
    /// Rising quarter repeated twice per cycle, rest silent
    PulseSine = 3,
    /// Double-speed sine in the first half, second half silent
    AlternatingSine = 4,
    /// Double-speed absolute sine in the first half, second half silent
    CamelSine = 5,
    /// Full-amplitude square
    Square = 6,
    /// Logarithmic sawtooth
    LogSawtooth = 7,
}

impl Waveform {
    /// Decodes a wave-select register field, masked to the available range.
    pub fn from_register(value: u8) -> Self {
        Waveform::from_u8(value & 0x07).unwrap_or(Waveform::Sine)
    }
}

/// Converts phase, modulation and attenuation into a signed linear sample.
///
/// `phase` is the operator's 10-bit phase output, `modulation` the signed
/// phase-modulation input, `attenuation` the already-clamped envelope
/// level and `atten_shift` the family's alignment between envelope steps
/// and the 1/256th-bit log-sine scale.
#[inline]
pub fn compute_sample(
    phase: u32,
    modulation: i32,
    attenuation: u32,
    atten_shift: u8,
    waveform: Waveform,
) -> i32 {
    let tables = wave_tables();
    let combined_phase = (phase as i32 + modulation) as u32 & 0x3FF;
    let sign = combined_phase & 0x200 != 0;
    let mirror = combined_phase & 0x100 != 0;

    let quarter = if mirror {
        !combined_phase & 0xFF
    } else {
        combined_phase & 0xFF
    };

    let (log_value, negate) = match waveform {
        Waveform::Sine => (tables.logsin[quarter as usize] as u32, sign),
        Waveform::HalfSine => {
            if sign {
                (0xFFF, false)
            } else {
                (tables.logsin[quarter as usize] as u32, false)
            }
        }
        Waveform::AbsSine => (tables.logsin[quarter as usize] as u32, false),
        Waveform::PulseSine => {
            if mirror {
                (0xFFF, false)
            } else {
                (tables.logsin[quarter as usize] as u32, false)
            }
        }
        Waveform::AlternatingSine | Waveform::CamelSine => {
            if sign {
                (0xFFF, false)
            } else {
                // Fold an eighth of the cycle so the first half carries
                // one complete sine period
                let folded = if combined_phase & 0x80 != 0 {
                    !combined_phase & 0xFF
                } else {
                    combined_phase & 0xFF
                };
                let index = ((folded & 0x7F) << 1) as usize;
                let negate = waveform == Waveform::AlternatingSine && mirror;
                (tables.logsin[index] as u32, negate)
            }
        }
        Waveform::Square => (0, sign),
        Waveform::LogSawtooth => {
            let mut ramp = combined_phase & 0x1FF;
            if sign {
                ramp ^= 0x1FF;
            }
            (ramp << 3, sign)
        }
    };

    let combined = (log_value + ((attenuation) << atten_shift)) & 0x1FFF;
    let shift = (combined >> 8) & 0x1F;
    let magnitude = ((tables.exp[(combined & 0xFF) as usize] as u32) << 2) >> shift;

    if negate {
        -(magnitude as i32)
    } else {
        magnitude as i32
    }
}
