//! Audio export for rendered chip output
//!
//! Writes interleaved 16-bit frames, as produced by
//! [`FmChip::render`](crate::backend::FmChip::render), to WAV files.
//! The post-processing knobs cover what chip renders usually need:
//! raw DAC levels sit well below full scale, so normalization brings
//! them up, and a short fade hides envelope tails cut mid-release.

mod wav;
pub use wav::*;

/// Export configuration options.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Whether to scale the peak to 95% of full scale
    pub normalize: bool,
    /// Fade out duration in seconds (0 = no fade)
    pub fade_out_duration: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            fade_out_duration: 0.0,
        }
    }
}

impl ExportConfig {
    /// Create config that keeps samples at their raw DAC levels.
    pub fn raw() -> Self {
        Self {
            normalize: false,
            fade_out_duration: 0.0,
        }
    }

    /// Enable or disable normalization
    pub fn normalize(mut self, enable: bool) -> Self {
        self.normalize = enable;
        self
    }

    /// Add fade out at the end
    pub fn fade_out(mut self, duration_seconds: f32) -> Self {
        self.fade_out_duration = duration_seconds;
        self
    }
}

/// Scale samples so the peak sits at 95% of full scale
fn normalize_samples(samples: &mut [i16]) {
    let peak = samples
        .iter()
        .map(|s| i32::from(*s).abs())
        .max()
        .unwrap_or(0);
    if peak == 0 {
        return;
    }

    let scale = 0.95 * f32::from(i16::MAX) / peak as f32;
    for sample in samples.iter_mut() {
        *sample = (f32::from(*sample) * scale) as i16;
    }
}

/// Apply fade out to the end of an interleaved sample buffer
fn apply_fade_out(samples: &mut [i16], channels: u16, fade_duration: f32, sample_rate: u32) {
    if fade_duration <= 0.0 || samples.is_empty() {
        return;
    }

    let step = channels.max(1) as usize;
    let fade_frames = (fade_duration * sample_rate as f32) as usize;
    if fade_frames == 0 {
        return;
    }

    let frames = samples.len() / step;
    let start_fade = frames.saturating_sub(fade_frames);

    for frame in start_fade..frames {
        let progress = (frame - start_fade) as f32 / fade_frames as f32;
        let fade_factor = 1.0 - progress;
        for sample in &mut samples[frame * step..frame * step + step] {
            *sample = (f32::from(*sample) * fade_factor) as i16;
        }
    }
}
