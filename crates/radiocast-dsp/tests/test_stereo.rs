//! End-to-end stereo demodulation of a synthesized composite baseband.

use rand::Rng;

use radiocast_core::sample_types::*;
use radiocast_dsp::demodulator::Demodulator;
use radiocast_dsp::Wbfm;

const CHANNEL_RATE: usize = 250_000;
const AUDIO_RATE: usize = 48_000;

/// Gain the demodulator applies to the recovered L−R component; the
/// synthesized sub-carrier is pre-divided by it so the matrix comes out
/// balanced.
const SUBCARRIER_SCALE: f32 = 1.0175;

/// Build one second of stereo multiplex and FM-modulate it.
///
/// The sub-carrier term carries the full L−R (not the halved broadcast
/// convention) because mixing with a unit-amplitude 38 kHz reference halves
/// it again on the receive side.
fn modulated_composite(left: &[f32], right: &[f32]) -> Vec<ComplexSample> {
    let n = CHANNEL_RATE;
    let mut rng = rand::rng();
    let mut phase = 0.0f32;
    (0..n)
        .map(|i| {
            let t = i as f32 / n as f32;
            let pilot = (2.0 * std::f32::consts::PI * 19_000.0 * t).cos();
            let carrier = (2.0 * std::f32::consts::PI * 38_000.0 * t).cos();
            let sum = 0.5 * (left[i] + right[i]);
            let diff = left[i] - right[i];
            let noise: f32 = rng.random_range(-1e-3..1e-3);
            let composite =
                0.4 * sum + 0.08 * pilot + 0.4 * diff * carrier / SUBCARRIER_SCALE + noise;
            phase += std::f32::consts::PI * composite;
            ComplexSample::from_polar(1.0, phase)
        })
        .collect()
}

fn tone(n: usize, cycles: f32, rate: usize) -> Vec<f32> {
    (0..n)
        .map(|i| (2.0 * std::f32::consts::PI * cycles * i as f32 / rate as f32).sin())
        .collect()
}

/// Amplitude of the `cycles`-per-second component via a single-bin DFT.
fn tone_amplitude(x: &[f32], cycles: f32) -> f32 {
    let n = x.len() as f64;
    let mut re = 0.0f64;
    let mut im = 0.0f64;
    for (k, &v) in x.iter().enumerate() {
        let angle = 2.0 * std::f64::consts::PI * cycles as f64 * k as f64 / n;
        re += v as f64 * angle.cos();
        im += v as f64 * angle.sin();
    }
    (2.0 * (re * re + im * im).sqrt() / n) as f32
}

fn deinterleave(audio: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let left = audio.iter().step_by(2).copied().collect();
    let right = audio.iter().skip(1).step_by(2).copied().collect();
    (left, right)
}

#[test]
fn test_stereo_separation() {
    // L carries 1 kHz, R carries 3 kHz
    let left_in = tone(CHANNEL_RATE, 1_000.0, CHANNEL_RATE);
    let right_in = tone(CHANNEL_RATE, 3_000.0, CHANNEL_RATE);

    let mut wbfm = Wbfm::new(CHANNEL_RATE, AUDIO_RATE, 75e-6).unwrap();
    let audio = wbfm.run(&modulated_composite(&left_in, &right_in)).unwrap();
    assert_eq!(audio.len(), 2 * AUDIO_RATE);
    assert_eq!(wbfm.channels(), 2);

    let (left, right) = deinterleave(&audio);

    let left_wanted = tone_amplitude(&left, 1_000.0);
    let left_leak = tone_amplitude(&left, 3_000.0);
    let right_wanted = tone_amplitude(&right, 3_000.0);
    let right_leak = tone_amplitude(&right, 1_000.0);

    // Both programs are present at a healthy level
    assert!(left_wanted > 0.1, "left 1 kHz amplitude {}", left_wanted);
    assert!(right_wanted > 0.05, "right 3 kHz amplitude {}", right_wanted);

    // And each one stays out of the other channel
    assert!(
        left_wanted > 10.0 * right_leak,
        "1 kHz separation: {} vs {}",
        left_wanted,
        right_leak
    );
    assert!(
        right_wanted > 10.0 * left_leak,
        "3 kHz separation: {} vs {}",
        right_wanted,
        left_leak
    );

    // Output stays in audio range
    assert!(audio.iter().all(|v| v.abs() <= 0.999));
}

#[test]
fn test_mono_program_stays_mono() {
    // With L == R the sub-carrier is empty and both channels must agree
    let program = tone(CHANNEL_RATE, 1_000.0, CHANNEL_RATE);

    let mut wbfm = Wbfm::new(CHANNEL_RATE, AUDIO_RATE, 75e-6).unwrap();
    let audio = wbfm.run(&modulated_composite(&program, &program)).unwrap();
    let (left, right) = deinterleave(&audio);

    let left_amp = tone_amplitude(&left, 1_000.0);
    let right_amp = tone_amplitude(&right, 1_000.0);
    assert!(left_amp > 0.1);
    assert!(
        (left_amp - right_amp).abs() < 0.05 * left_amp,
        "mono imbalance: {} vs {}",
        left_amp,
        right_amp
    );

    // Sample-level agreement away from the resampler edges
    let mut worst = 0.0f32;
    for i in 1_000..AUDIO_RATE - 1_000 {
        worst = worst.max((left[i] - right[i]).abs());
    }
    assert!(worst < 0.05 * left_amp, "worst L/R deviation {}", worst);
}
