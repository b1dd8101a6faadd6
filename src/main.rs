//! Render-script front end for the FM chip cores
//!
//! Reads a JSON render script (chip kind, length, timestamped register
//! writes), replays it against the selected chip and writes the result
//! as a WAV file. With no script it renders a short built-in demo.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use opfm::backend::FmChip;
use opfm::config::{ChipKind, RenderScript, DEFAULT_MASTER_CLOCK};
use opfm::export::{self, ExportConfig};

fn print_usage() {
    eprintln!(
        "Usage:\n  opfm [--raw] [--fade <seconds>] [--output <file.wav>] <script.json>\n\n\
         Flags:\n\
         \x20 --raw                Keep raw DAC levels (skip peak normalization)\n\
         \x20 --fade <seconds>     Fade out at the end of the render\n\
         \x20 -o, --output <file>  Output path (default: script path with .wav)\n\
         \x20 -h, --help           Show this help\n\n\
         With no script, a short built-in demo is rendered to opfm-demo.wav.\n\n\
         Script format:\n\
         \x20 {{\"chip\": \"ym2413\", \"seconds\": 2.0, \"events\": [\n\
         \x20   {{\"at\": 0, \"reg\": 48, \"data\": 16}},\n\
         \x20   {{\"at\": 0, \"reg\": 16, \"data\": 128}},\n\
         \x20   {{\"at\": 0, \"reg\": 32, \"data\": 20}}\n\
         \x20 ]}}\n"
    );
}

/// Replays the script's register schedule while collecting frames.
fn render_script(chip: &mut dyn FmChip, script: &RenderScript) -> Vec<i16> {
    let frames = script.frame_count();
    let mut samples = Vec::with_capacity(frames as usize * chip.output_channels());

    let mut events = script.events.clone();
    events.sort_by_key(|event| event.at);
    let mut next = 0;

    for frame in 0..frames {
        while next < events.len() && events[next].at <= frame {
            chip.write_register(events[next].reg, events[next].data);
            next += 1;
        }
        chip.clock();
        samples.extend_from_slice(chip.get_samples());
    }
    samples
}

/// Three plucked notes on the OPM, written to opfm-demo.wav.
fn render_demo() -> Result<()> {
    let mut chip = opfm::create_chip(ChipKind::Ym2151, DEFAULT_MASTER_CLOCK)?;

    // Electric-piano style patch on channel 0, algorithm 4
    for (reg, data) in [
        (0x40u8, 0x01u8),
        (0x48, 0x31),
        (0x50, 0x02),
        (0x58, 0x01), // detune / multiplier
        (0x60, 0x23),
        (0x68, 0x1E),
        (0x70, 0x04),
        (0x78, 0x04), // level: quiet modulators, loud carriers
        (0x80, 0x1F),
        (0x88, 0x19),
        (0x90, 0x1F),
        (0x98, 0x19), // attack
        (0xA0, 0x05),
        (0xA8, 0x05),
        (0xB0, 0x05),
        (0xB8, 0x07), // decay
        (0xC0, 0x02),
        (0xC8, 0x02),
        (0xD0, 0x02),
        (0xD8, 0x03), // sustain rate
        (0xE0, 0x11),
        (0xE8, 0x11),
        (0xF0, 0xF6),
        (0xF8, 0xF6), // sustain level / release
    ] {
        chip.write_register(reg, data);
    }
    chip.write_register(0x20, 0xC4);

    let sample_rate = chip.sample_rate();
    let note_frames = sample_rate as usize * 2 / 5;
    let gap_frames = sample_rate as usize / 10;
    let mut samples = Vec::new();

    for &note in &[0x4Au8, 0x4E, 0x51] {
        chip.write_register(0x28, note);
        chip.write_register(0x08, 0x78); // key all four operators
        for _ in 0..note_frames {
            chip.clock();
            samples.extend_from_slice(chip.get_samples());
        }
        chip.write_register(0x08, 0x00);
        for _ in 0..gap_frames {
            chip.clock();
            samples.extend_from_slice(chip.get_samples());
        }
    }

    let path = PathBuf::from("opfm-demo.wav");
    export::write_wav_with_config(
        &path,
        samples,
        sample_rate,
        chip.output_channels() as u16,
        ExportConfig::default().fade_out(0.05),
    )?;
    println!("Wrote demo to {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    println!("opfm - Yamaha FM chip renderer");
    println!("==============================\n");

    let mut raw = false;
    let mut fade: f32 = 0.0;
    let mut output: Option<PathBuf> = None;
    let mut script_arg: Option<String> = None;
    let mut show_help = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--raw" => raw = true,
            "--fade" => match args.next() {
                Some(value) => {
                    fade = value
                        .parse()
                        .with_context(|| format!("invalid fade duration '{}'", value))?;
                }
                None => bail!("--fade requires an argument in seconds"),
            },
            "--output" | "-o" => match args.next() {
                Some(value) => output = Some(PathBuf::from(value)),
                None => bail!("--output requires a file path"),
            },
            "--help" | "-h" => show_help = true,
            _ if arg.starts_with('-') => {
                eprintln!("Unknown flag: {}\n", arg);
                show_help = true;
            }
            _ => script_arg = Some(arg),
        }
    }

    if show_help {
        print_usage();
        return Ok(());
    }

    let Some(script_path) = script_arg else {
        println!("No render script given, rendering the built-in demo.\n");
        return render_demo();
    };

    let text = fs::read_to_string(&script_path)
        .with_context(|| format!("Failed to read script '{}'", script_path))?;
    let script = RenderScript::from_json(&text)?;

    let mut chip = opfm::create_chip(script.chip, script.master_clock())?;
    let frames = script.frame_count();
    println!("Chip:        {:?}", script.chip);
    println!("Sample rate: {} Hz", chip.sample_rate());
    println!(
        "Length:      {} frames ({:.2}s)",
        frames,
        frames as f64 / chip.sample_rate() as f64
    );
    println!("Events:      {}", script.events.len());

    let samples = render_script(chip.as_mut(), &script);

    let out_path = output.unwrap_or_else(|| PathBuf::from(&script_path).with_extension("wav"));
    let config = ExportConfig::default().normalize(!raw).fade_out(fade);
    export::write_wav_with_config(
        &out_path,
        samples,
        chip.sample_rate(),
        chip.output_channels() as u16,
        config,
    )?;

    println!("\nWrote {}", out_path.display());
    Ok(())
}
