//! Benchmarks for the FM synthesis hot path
//!
//! Run with: cargo bench --bench engine

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use opfm::backend::FmChip;
use opfm::chips::{Ym2151, Ym2203, Ym2413, Ym3812};

const MASTER_CLOCK: u32 = 3_579_545;

/// Register offset of a channel's operator pair in the OPL banks.
fn opl_offset(ch: u8, op: u8) -> u8 {
    (ch / 3) * 8 + (ch % 3) + op * 3
}

fn keyed_ym2203() -> Ym2203 {
    let mut chip = Ym2203::new(MASTER_CLOCK);
    for ch in 0..3u8 {
        for bank in 0..4u8 {
            let op = bank * 4 + ch;
            chip.write_register(0x30 + op, 0x01); // MUL 1
            chip.write_register(0x40 + op, 0x10);
            chip.write_register(0x50 + op, 0x1F); // AR 31
            chip.write_register(0x60 + op, 0x05);
            chip.write_register(0x70 + op, 0x02);
            chip.write_register(0x80 + op, 0x2F);
        }
        chip.write_register(0xB0 + ch, 0x3C); // feedback 7, algorithm 4
        chip.write_register(0xA4 + ch, 0x22 + ch);
        chip.write_register(0xA0 + ch, 0x69);
        chip.write_register(0x28, 0xF0 | ch);
    }
    chip
}

fn keyed_ym2151() -> Ym2151 {
    let mut chip = Ym2151::new(MASTER_CLOCK);
    chip.write_register(0x0F, 0x9F); // noise on the last carrier
    chip.write_register(0x18, 0xE6); // LFO rate
    chip.write_register(0x19, 0x40); // AM depth
    chip.write_register(0x19, 0xC0); // PM depth
    chip.write_register(0x1B, 0x02); // triangle
    for ch in 0..8u8 {
        chip.write_register(0x20 + ch, 0xC0 | ch);
        chip.write_register(0x28 + ch, 0x30 + ch);
        chip.write_register(0x38 + ch, 0x53); // vibrato and tremolo sensitivity
        for bank in 0..4u8 {
            let op = bank * 8 + ch;
            chip.write_register(0x40 + op, 0x11);
            chip.write_register(0x60 + op, 0x18);
            chip.write_register(0x80 + op, 0x1F);
            chip.write_register(0xA0 + op, 0x85); // tremolo enable + decay
            chip.write_register(0xC0 + op, 0x42); // coarse detune + sustain rate
            chip.write_register(0xE0 + op, 0x26);
        }
        chip.write_register(0x08, 0x78 | ch);
    }
    chip
}

fn keyed_ym3812() -> Ym3812 {
    let mut chip = Ym3812::new(MASTER_CLOCK);
    chip.write_register(0x01, 0x20); // arm wave select
    chip.write_register(0xBD, 0xC0); // deep tremolo and vibrato
    for ch in 0..9u8 {
        for op in 0..2u8 {
            let offset = opl_offset(ch, op);
            chip.write_register(0x20 + offset, 0xE1); // tremolo, vibrato, sustained
            chip.write_register(0x40 + offset, 0x08);
            chip.write_register(0x60 + offset, 0xF4);
            chip.write_register(0x80 + offset, 0x27);
            chip.write_register(0xE0 + offset, op + 1);
        }
        chip.write_register(0xC0 + ch, 0x0B); // feedback 5, additive
        chip.write_register(0xA0 + ch, 0x41);
        chip.write_register(0xB0 + ch, 0x2D + (ch & 3)); // key on
    }
    chip
}

fn keyed_ym2413() -> Ym2413 {
    let mut chip = Ym2413::new(MASTER_CLOCK);
    for ch in 0..9u8 {
        chip.write_register(0x30 + ch, ((ch % 15 + 1) << 4) | 0x02);
        chip.write_register(0x10 + ch, 0x80 + ch * 7);
        chip.write_register(0x20 + ch, 0x14 | ((ch & 1) << 5)); // key on
    }
    chip
}

fn bench_clock_per_chip(c: &mut Criterion) {
    let mut group = c.benchmark_group("clock");

    let mut chips: Vec<(&str, Box<dyn FmChip>)> = vec![
        ("ym2203", Box::new(keyed_ym2203())),
        ("ym2151", Box::new(keyed_ym2151())),
        ("ym3812", Box::new(keyed_ym3812())),
        ("ym2413", Box::new(keyed_ym2413())),
    ];

    for (name, chip) in chips.iter_mut() {
        group.bench_function(BenchmarkId::from_parameter(*name), |b| {
            b.iter(|| {
                for _ in 0..1000 {
                    chip.clock();
                    black_box(chip.get_samples());
                }
            });
        });
    }

    group.finish();
}

fn bench_render_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_frames");

    let mut chip = keyed_ym2151();
    for frame_count in [882_usize, 4410, 44100].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(frame_count),
            frame_count,
            |b, &frame_count| {
                b.iter(|| {
                    black_box(chip.render(frame_count));
                });
            },
        );
    }

    group.finish();
}

fn bench_register_updates(c: &mut Criterion) {
    let mut chip = Ym2151::new(MASTER_CLOCK);

    // The note write retunes all four operators, the others are plain
    // parameter stores
    c.bench_function("write_register", |b| {
        b.iter(|| {
            chip.write_register(black_box(0x28), black_box(0x4A));
            chip.write_register(black_box(0x30), black_box(0x40));
            chip.write_register(black_box(0x60), black_box(0x20));
            chip.write_register(black_box(0xE0), black_box(0x2F));
        });
    });
}

fn bench_ssg_envelopes(c: &mut Criterion) {
    let mut chip = keyed_ym2203();
    for ch in 0..3u8 {
        for bank in 0..4u8 {
            chip.write_register(0x90 + bank * 4 + ch, 0x08 | bank);
        }
    }

    c.bench_function("ssg_shapes_three_channels", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                chip.clock();
                black_box(chip.get_samples());
            }
        });
    });
}

criterion_group!(
    benches,
    bench_clock_per_chip,
    bench_render_frames,
    bench_register_updates,
    bench_ssg_envelopes
);
criterion_main!(benches);
