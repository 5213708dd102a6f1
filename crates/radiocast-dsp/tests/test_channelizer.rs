//! Tuner to demodulator chain on a scaled-down multi-channel capture.

use radiocast_config::DemodulatorKind;
use radiocast_core::sample_types::*;
use radiocast_dsp::demodulator::Demodulator;
use radiocast_dsp::{Fm, Tuner};

const CHANNEL_BW: f64 = 8_000.0;

/// Complex tone at `frequency` Hz in a one second capture of `rate` samples.
fn capture_tone(rate: usize, frequency: f64, amplitude: f32) -> Vec<ComplexSample> {
    (0..rate)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * frequency * i as f64 / rate as f64;
            ComplexSample::from_polar(amplitude, phase as f32)
        })
        .collect()
}

fn add(a: &mut [ComplexSample], b: &[ComplexSample]) {
    for (x, y) in a.iter_mut().zip(b) {
        *x += y;
    }
}

#[test]
fn test_two_stations_demodulate_independently() {
    let mut tuner = Tuner::new();
    tuner.add_channel(200_000.0, CHANNEL_BW, DemodulatorKind::Fm).unwrap();
    tuner.add_channel(216_000.0, CHANNEL_BW, DemodulatorKind::Fm).unwrap();

    // Stations span 196..220 kHz; capture centers at 208 kHz, 24 kHz wide
    assert_eq!(tuner.input_frequency(), 208_000.0);
    assert_eq!(tuner.input_bandwidth(), 24_000.0);

    let rate = tuner.input_bandwidth() as usize;
    let center = tuner.input_frequency();

    // Station one transmits a carrier 10 Hz above its center, station two
    // 20 Hz above its own; both land in the capture relative to its center
    let mut capture = capture_tone(rate, 200_000.0 + 10.0 - center, 1.0);
    add(&mut capture, &capture_tone(rate, 216_000.0 + 20.0 - center, 0.8));

    tuner.load(&capture).unwrap();

    let mut demod_one = Fm::new(CHANNEL_BW as usize, CHANNEL_BW as usize).unwrap();
    let mut demod_two = Fm::new(CHANNEL_BW as usize, CHANNEL_BW as usize).unwrap();

    // A constant carrier offset demodulates to a constant level of
    // offset / (bandwidth / 2)
    let baseband_one = tuner.run(0).unwrap();
    assert_eq!(baseband_one.len(), CHANNEL_BW as usize);
    let audio_one = demod_one.run(&baseband_one).unwrap();
    let expected_one = 10.0 / (CHANNEL_BW as f32 / 2.0);
    for (i, value) in audio_one.iter().enumerate().skip(1).take(audio_one.len() - 2) {
        assert!(
            (value - expected_one).abs() < 3e-4,
            "channel 0 sample {}: {} vs {}",
            i,
            value,
            expected_one
        );
    }

    let baseband_two = tuner.run(1).unwrap();
    let audio_two = demod_two.run(&baseband_two).unwrap();
    let expected_two = 20.0 / (CHANNEL_BW as f32 / 2.0);
    for (i, value) in audio_two.iter().enumerate().skip(1).take(audio_two.len() - 2) {
        assert!(
            (value - expected_two).abs() < 3e-4,
            "channel 1 sample {}: {} vs {}",
            i,
            value,
            expected_two
        );
    }

    // Repeated runs on the same window give the same result
    let again = tuner.run(0).unwrap();
    assert_eq!(again, baseband_one);
}

#[test]
fn test_neighboring_station_rejected() {
    let mut tuner = Tuner::new();
    tuner.add_channel(200_000.0, CHANNEL_BW, DemodulatorKind::Fm).unwrap();
    tuner.add_channel(216_000.0, CHANNEL_BW, DemodulatorKind::Fm).unwrap();

    let rate = tuner.input_bandwidth() as usize;
    let center = tuner.input_frequency();

    // Only station two transmits
    let capture = capture_tone(rate, 216_000.0 - center, 1.0);
    tuner.load(&capture).unwrap();

    // Station one's channel contains (next to) nothing of it
    let baseband_one = tuner.run(0).unwrap();
    let power: f32 = baseband_one.iter().map(|v| v.norm_sqr()).sum::<f32>()
        / baseband_one.len() as f32;
    assert!(power < 1e-3, "leakage power {}", power);

    // While station two's channel holds the full carrier
    let baseband_two = tuner.run(1).unwrap();
    let power: f32 = baseband_two.iter().map(|v| v.norm_sqr()).sum::<f32>()
        / baseband_two.len() as f32;
    assert!(power > 0.5, "carrier power {}", power);
}
