//! Audio Performance Benchmarks
//!
//! Benchmarks for checking that the sequencer and quantizers fit comfortably
//! inside a real-time audio budget at common sample rates and buffer sizes.
//!
//! ## Real-Time Audio Constraints
//!
//! ```text
//! time_budget = buffer_size / sample_rate
//! ```
//!
//! | Sample Rate | Buffer 64  | Buffer 128 | Buffer 256 |
//! |-------------|------------|------------|------------|
//! | 44.1 kHz    | 1.45 ms    | 2.90 ms    | 5.80 ms    |
//! | 48 kHz      | 1.33 ms    | 2.67 ms    | 5.33 ms    |
//! | 96 kHz      | 0.67 ms    | 1.33 ms    | 2.67 ms    |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use semitone::prelude::*;

// ============================================================================
// Sample Rate Constants
// ============================================================================

const SAMPLE_RATES: [f64; 3] = [44100.0, 48000.0, 96000.0];
const BUFFER_SIZES: [usize; 3] = [64, 128, 256];

// ============================================================================
// Helper Functions
// ============================================================================

/// A running sequencer with every feature that costs per-sample work enabled
fn create_busy_sequencer(sample_rate: f64) -> SemitoneSequencer {
    let mut seq = SemitoneSequencer::new(sample_rate);
    seq.set_chord_mode(true);
    seq.set_detune_mode(DetuneMode::RandomLfo);
    seq.set_quantization_mode(QuantizationMode::Major);
    seq.set_param(seq_params::DETUNE_AMOUNT, 0.5);
    seq.set_param(seq_params::SWING, 2.0);
    seq.set_param(seq_params::SLIDE, 0.3);
    seq.set_param(seq_params::GATE_PROBABILITY, 0.7);

    let inputs = PortValues::new();
    let mut outputs = PortValues::new();
    seq.tick(&inputs, &mut outputs);
    seq.set_param(seq_params::RUN, 1.0);
    seq.tick(&inputs, &mut outputs);
    seq.set_param(seq_params::RUN, 0.0);
    seq
}

// ============================================================================
// Module Benchmarks
// ============================================================================

fn bench_sequencer(c: &mut Criterion) {
    let mut group = c.benchmark_group("modules/semitone_sequencer");

    for sample_rate in SAMPLE_RATES {
        let sr_name = format!("{}kHz", sample_rate as u32 / 1000);

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("tick", &sr_name),
            &sample_rate,
            |b, &sr| {
                let mut seq = SemitoneSequencer::new(sr);
                let inputs = PortValues::new();
                let mut outputs = PortValues::new();

                b.iter(|| {
                    seq.tick(black_box(&inputs), &mut outputs);
                    outputs.get(11).unwrap_or(0.0)
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("tick_busy", &sr_name),
            &sample_rate,
            |b, &sr| {
                let mut seq = create_busy_sequencer(sr);
                let inputs = PortValues::new();
                let mut outputs = PortValues::new();

                b.iter(|| {
                    seq.tick(black_box(&inputs), &mut outputs);
                    outputs.get(10).unwrap_or(0.0)
                });
            },
        );
    }

    group.finish();
}

fn bench_guide_quant(c: &mut Criterion) {
    let mut group = c.benchmark_group("modules/guide_quant");

    group.throughput(Throughput::Elements(1));
    group.bench_function("tick_guided", |b| {
        let mut quant = GuideQuant::new();
        let mut inputs = PortValues::new();
        let guide: Vec<f64> = (0..MAX_CHANNELS).map(|i| i as f64 * 0.07).collect();
        inputs.set_poly(0, PolyVoltage::from_slice(&guide));
        inputs.set(1, 1.234);
        let mut outputs = PortValues::new();

        b.iter(|| {
            quant.tick(black_box(&inputs), &mut outputs);
            outputs.get(10).unwrap_or(0.0)
        });
    });

    group.bench_function("tick_default_scale", |b| {
        let mut quant = GuideQuant::new();
        let mut inputs = PortValues::new();
        inputs.set(1, 1.234);
        let mut outputs = PortValues::new();

        b.iter(|| {
            quant.tick(black_box(&inputs), &mut outputs);
            outputs.get(10).unwrap_or(0.0)
        });
    });

    group.finish();
}

fn bench_quantizers(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantizers");

    for scale in VoltageScale::ALL {
        let quantizer = NearestNoteQuantizer::new(scale);
        group.bench_with_input(
            BenchmarkId::new("nearest_note", scale.name()),
            &quantizer,
            |b, q| b.iter(|| q.quantize(black_box(-2.71))),
        );
    }

    let mut guided = GuidedQuantizer::new();
    let guide: Vec<f64> = (0..MAX_CHANNELS).map(|i| i as f64 / 12.0).collect();
    guided.set_allowed_notes(&guide);
    group.bench_function("guided/16_notes", |b| {
        b.iter(|| guided.quantize(black_box(0.61)))
    });

    group.finish();
}

// ============================================================================
// Buffer Benchmarks
// ============================================================================

fn bench_buffer_processing(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_processing");

    for sample_rate in SAMPLE_RATES {
        for buffer_size in BUFFER_SIZES {
            let sr_name = format!("{}kHz", sample_rate as u32 / 1000);
            let name = format!("{}/{}samples", sr_name, buffer_size);

            let time_budget_us = (buffer_size as f64 / sample_rate) * 1_000_000.0;

            group.throughput(Throughput::Elements(buffer_size as u64));
            group.bench_with_input(
                BenchmarkId::new("busy_sequencer", &name),
                &(sample_rate, buffer_size),
                |b, &(sr, buf_size)| {
                    let mut seq = create_busy_sequencer(sr);
                    let inputs = PortValues::new();
                    let mut outputs = PortValues::new();
                    b.iter(|| {
                        for _ in 0..buf_size {
                            seq.tick(&inputs, &mut outputs);
                        }
                        black_box(outputs.get(10))
                    });
                },
            );

            eprintln!(
                "  {} @ {} samples: budget = {:.2}µs",
                sr_name, buffer_size, time_budget_us
            );
        }
    }

    group.finish();
}

// ============================================================================
// Criterion Groups
// ============================================================================

criterion_group!(
    module_benches,
    bench_sequencer,
    bench_guide_quant,
    bench_quantizers,
);

criterion_group!(buffer_benches, bench_buffer_processing,);

criterion_main!(module_benches, buffer_benches);
