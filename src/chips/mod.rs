//! Chip front-ends mapping bus register writes onto the shared core
//!
//! Each front-end owns an [`FmEngine`](crate::engine::FmEngine)
//! configured for its family, decodes the chip's register map into
//! engine parameter updates and mixes the channel outputs the way the
//! part's DAC stage did. Front-ends compile behind their feature
//! flags; all four are on by default.

#[cfg(feature = "opm")]
pub mod ym2151;
#[cfg(feature = "opn")]
pub mod ym2203;
#[cfg(feature = "opll")]
pub mod ym2413;
#[cfg(feature = "opl")]
pub mod ym3812;

#[cfg(feature = "opm")]
pub use self::ym2151::Ym2151;
#[cfg(feature = "opn")]
pub use self::ym2203::Ym2203;
#[cfg(feature = "opll")]
pub use self::ym2413::Ym2413;
#[cfg(feature = "opl")]
pub use self::ym3812::Ym3812;

use crate::backend::FmChip;
use crate::config::ChipKind;
use crate::{FmError, Result};

/// Builds a boxed chip of the requested kind.
#[allow(unused_variables)]
pub fn create_chip(kind: ChipKind, master_clock: u32) -> Result<Box<dyn FmChip>> {
    match kind {
        #[cfg(feature = "opn")]
        ChipKind::Ym2203 => Ok(Box::new(Ym2203::new(master_clock))),
        #[cfg(feature = "opm")]
        ChipKind::Ym2151 => Ok(Box::new(Ym2151::new(master_clock))),
        #[cfg(feature = "opl")]
        ChipKind::Ym3812 => Ok(Box::new(Ym3812::new(master_clock))),
        #[cfg(feature = "opll")]
        ChipKind::Ym2413 => Ok(Box::new(Ym2413::new(master_clock))),
        #[allow(unreachable_patterns)]
        other => Err(FmError::ConfigError(format!(
            "support for {:?} was not compiled in",
            other
        ))),
    }
}

#[cfg(all(feature = "opn", feature = "opm", feature = "opl", feature = "opll"))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_builds_every_kind() {
        let kinds = [
            ChipKind::Ym2203,
            ChipKind::Ym2151,
            ChipKind::Ym3812,
            ChipKind::Ym2413,
        ];
        for kind in kinds {
            let chip = create_chip(kind, 3_579_545).unwrap();
            assert_eq!(chip.sample_divisor(), kind.sample_divisor());
            assert_eq!(chip.master_clock(), 3_579_545);
            assert!(chip.sample_rate() > 0);
        }
    }

    #[test]
    fn test_stereo_only_on_the_opm() {
        let mono = create_chip(ChipKind::Ym3812, 3_579_545).unwrap();
        let stereo = create_chip(ChipKind::Ym2151, 3_579_545).unwrap();
        assert_eq!(mono.output_channels(), 1);
        assert_eq!(stereo.output_channels(), 2);
    }
}
