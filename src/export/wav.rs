//! WAV file export functionality

use super::{apply_fade_out, normalize_samples, ExportConfig};
use crate::backend::FmChip;
use crate::Result;
use std::path::Path;

/// Render a number of frames from a chip straight to a WAV file
///
/// The file takes its sample rate and channel count from the chip.
///
/// # Examples
///
/// ```no_run
/// use opfm::backend::FmChip;
/// use opfm::chips::Ym2151;
/// use opfm::export::render_to_wav;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut chip = Ym2151::new(3_579_545);
/// chip.write_register(0x28, 0x4A);
/// render_to_wav(&mut chip, 55_930, "one_second.wav")?;
/// # Ok(())
/// # }
/// ```
pub fn render_to_wav<P: AsRef<Path>>(
    chip: &mut dyn FmChip,
    frames: usize,
    output_path: P,
) -> Result<()> {
    render_to_wav_with_config(chip, frames, output_path, ExportConfig::default())
}

/// Render frames to a WAV file with custom post-processing
///
/// With normalization and fade disabled the render streams to disk in
/// chunks instead of collecting every sample first.
pub fn render_to_wav_with_config<P: AsRef<Path>>(
    chip: &mut dyn FmChip,
    frames: usize,
    output_path: P,
    config: ExportConfig,
) -> Result<()> {
    let sample_rate = chip.sample_rate();
    let channels = chip.output_channels() as u16;

    if config.normalize || config.fade_out_duration > 0.0 {
        let mut samples = chip.render(frames);
        if config.normalize {
            normalize_samples(&mut samples);
        }
        if config.fade_out_duration > 0.0 {
            apply_fade_out(&mut samples, channels, config.fade_out_duration, sample_rate);
        }
        write_wav_file(output_path.as_ref(), &samples, sample_rate, channels)
    } else {
        write_wav_file_streaming(chip, output_path.as_ref(), frames, sample_rate, channels)
    }
}

/// Write an interleaved sample buffer to a WAV file
pub fn write_wav<P: AsRef<Path>>(
    output_path: P,
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
) -> Result<()> {
    write_wav_file(output_path.as_ref(), samples, sample_rate, channels)
}

/// Post-process an interleaved sample buffer, then write it
pub fn write_wav_with_config<P: AsRef<Path>>(
    output_path: P,
    mut samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
    config: ExportConfig,
) -> Result<()> {
    if config.normalize {
        normalize_samples(&mut samples);
    }
    if config.fade_out_duration > 0.0 {
        apply_fade_out(&mut samples, channels, config.fade_out_duration, sample_rate);
    }
    write_wav_file(output_path.as_ref(), &samples, sample_rate, channels)
}

/// Write samples to WAV file
fn write_wav_file(path: &Path, samples: &[i16], sample_rate: u32, channels: u16) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| format!("Failed to create WAV file: {}", e))?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| format!("Failed to write sample: {}", e))?;
    }

    writer
        .finalize()
        .map_err(|e| format!("Failed to finalize WAV file: {}", e))?;

    Ok(())
}

/// Write samples to WAV file using streaming (memory-efficient for long renders)
fn write_wav_file_streaming(
    chip: &mut dyn FmChip,
    path: &Path,
    frames: usize,
    sample_rate: u32,
    channels: u16,
) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| format!("Failed to create WAV file: {}", e))?;

    const FRAMES_PER_CHUNK: usize = 4096;
    let step = channels as usize;
    let mut buffer = vec![0i16; FRAMES_PER_CHUNK * step];
    let mut frames_written = 0;

    while frames_written < frames {
        let chunk_frames = (frames - frames_written).min(FRAMES_PER_CHUNK);
        let chunk = &mut buffer[..chunk_frames * step];
        chip.render_into(chunk);

        for &sample in chunk.iter() {
            writer
                .write_sample(sample)
                .map_err(|e| format!("Failed to write sample: {}", e))?;
        }

        frames_written += chunk_frames;
    }

    writer
        .finalize()
        .map_err(|e| format!("Failed to finalize WAV file: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_header_and_length() {
        let path = std::env::temp_dir().join("opfm_wav_header_test.wav");
        let samples: Vec<i16> = (0..64).map(|i| (i * 100) as i16).collect();
        write_wav(&path, &samples, 49_715, 1).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 49_715);
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.len(), 64);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_written_samples_survive_roundtrip() {
        let path = std::env::temp_dir().join("opfm_wav_roundtrip_test.wav");
        let samples = vec![0i16, 100, -100, i16::MAX, i16::MIN, 42];
        write_wav(&path, &samples, 55_930, 2).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let read_back: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read_back, samples);
        std::fs::remove_file(&path).ok();
    }

    #[cfg(feature = "opl")]
    #[test]
    fn test_streaming_render_writes_every_frame() {
        use crate::chips::Ym3812;

        let path = std::env::temp_dir().join("opfm_wav_streaming_test.wav");
        let mut chip = Ym3812::new(3_579_545);
        render_to_wav_with_config(&mut chip, 10_000, &path, ExportConfig::raw()).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.len(), 10_000);
        assert_eq!(reader.spec().sample_rate, 49_715);
        std::fs::remove_file(&path).ok();
    }
}
