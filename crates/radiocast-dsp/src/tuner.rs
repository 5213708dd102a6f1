//! Frequency-domain channelizer.

use radiocast_config::DemodulatorKind;
use radiocast_core::sample_types::*;
use radiocast_core::DspError;

use crate::fft::{self, Planner};
use crate::filter;

/// Frequency boundaries and metadata of one registered channel.
#[derive(Debug, Clone)]
pub struct Channel {
    pub index: usize,
    pub center_frequency: f64,
    pub bandwidth: f64,
    pub lower_frequency: f64,
    pub higher_frequency: f64,
    pub demodulator: DemodulatorKind,
}

impl Channel {
    /// Little-endian encoding of the center frequency in Hz, used to
    /// address published audio frames.
    pub fn address(&self) -> [u8; 4] {
        (self.center_frequency as u32).to_le_bytes()
    }
}

/// Extracts narrowband channels out of one wideband capture.
///
/// One FFT per input window is amortized across all channels: `load` once,
/// then `run(i)` per channel circularly shifts the spectrum so the channel
/// centers at DC and resamples it down to the channel bandwidth, which is a
/// band-limited downconversion and decimation in one step.
///
/// Input windows hold one second of samples, so one FFT bin corresponds to
/// one Hz and frequency arithmetic happens directly in bins.
pub struct Tuner {
    channels: Vec<Channel>,
    input_frequency: f64,
    input_bandwidth: f64,
    window: Option<Vec<RealSample>>,
    spectrum: Option<Vec<ComplexSample>>,
    planner: Planner,
}

impl Tuner {
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
            input_frequency: 0.0,
            input_bandwidth: 0.0,
            window: None,
            spectrum: None,
            planner: Planner::new(),
        }
    }

    /// Center frequency the device should tune to.
    pub fn input_frequency(&self) -> f64 {
        self.input_frequency
    }

    /// Bandwidth (and sample rate) the device should capture.
    pub fn input_bandwidth(&self) -> f64 {
        self.input_bandwidth
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Register a channel and re-derive the capture boundaries.
    /// Only legal before the first `load`.
    pub fn add_channel(
        &mut self,
        frequency: f64,
        bandwidth: f64,
        demodulator: DemodulatorKind,
    ) -> Result<(), DspError> {
        if self.spectrum.is_some() {
            return Err(DspError::InvalidArgument("channels cannot be added after capture has started".to_string()));
        }
        if frequency <= 0.0 || bandwidth <= 0.0 {
            return Err(DspError::InvalidArgument(format!(
                "channel frequency and bandwidth must be positive ({}, {})",
                frequency, bandwidth
            )));
        }

        self.channels.push(Channel {
            index: self.channels.len(),
            center_frequency: frequency,
            bandwidth,
            lower_frequency: frequency - bandwidth / 2.0,
            higher_frequency: frequency + bandwidth / 2.0,
            demodulator,
        });
        self.recalculate();

        tracing::info!(
            "Channel {} at {:.3} MHz ({:.0} kHz wide), capture now {:.3} MHz / {:.3} MHz wide",
            self.channels.len() - 1,
            frequency / 1e6,
            bandwidth / 1e3,
            self.input_frequency / 1e6,
            self.input_bandwidth / 1e6,
        );
        Ok(())
    }

    /// Raise the capture bandwidth, for devices whose hardware rate exceeds
    /// the natural channel span. Fails below the derived minimum and leaves
    /// state unchanged.
    pub fn request_bandwidth(&mut self, bandwidth: f64) -> Result<(), DspError> {
        if bandwidth < self.input_bandwidth {
            return Err(DspError::BandwidthTooLow {
                requested: bandwidth,
                minimum: self.input_bandwidth,
            });
        }
        self.input_bandwidth = bandwidth;
        self.window = None;
        Ok(())
    }

    /// Drop all channels and derived state.
    pub fn reset(&mut self) {
        self.channels.clear();
        self.input_frequency = 0.0;
        self.input_bandwidth = 0.0;
        self.window = None;
        self.spectrum = None;
    }

    /// Transform one input window. The window must hold exactly
    /// `input_bandwidth` samples (one second at the capture rate).
    pub fn load(&mut self, input: &[ComplexSample]) -> Result<(), DspError> {
        if self.channels.is_empty() {
            return Err(DspError::NotReady("load requires at least one channel"));
        }
        let expected = self.input_bandwidth as usize;
        if input.len() != expected {
            return Err(DspError::SizeMismatch { expected, actual: input.len() });
        }

        let spectrum = self.spectrum.get_or_insert_with(|| vec![ComplexSample::ZERO; expected]);
        if spectrum.len() != expected {
            spectrum.resize(expected, ComplexSample::ZERO);
        }
        spectrum.copy_from_slice(input);
        self.planner.plan_fft_forward(expected).process(spectrum);
        Ok(())
    }

    /// Channelize the most recently loaded window for channel `i`.
    pub fn run(&mut self, channel_index: usize) -> Result<Vec<ComplexSample>, DspError> {
        if self.spectrum.is_none() {
            return Err(DspError::NotReady("run requires a prior load"));
        }
        let channel = self
            .channels
            .get(channel_index)
            .ok_or_else(|| DspError::InvalidArgument(format!("no channel with index {}", channel_index)))?
            .clone();

        let size = self.input_bandwidth as usize;
        if self.window.is_none() {
            self.window = Some(fft::fftshift(&filter::hann_periodic(size)));
        }

        let roll_bins = (self.input_frequency - channel.center_frequency).floor() as i64;
        let Some(spectrum) = self.spectrum.as_ref() else {
            return Err(DspError::NotReady("run requires a prior load"));
        };
        let shifted = fft::roll(spectrum, roll_bins);

        Ok(fft::resample_spectrum(
            &mut self.planner,
            &shifted,
            channel.bandwidth as usize,
            self.window.as_deref(),
        ))
    }

    fn recalculate(&mut self) {
        let lower = self.channels.iter().map(|c| c.lower_frequency).fold(f64::INFINITY, f64::min);
        let higher = self.channels.iter().map(|c| c.higher_frequency).fold(f64::NEG_INFINITY, f64::max);

        self.input_frequency = (lower + higher) / 2.0;

        // Pad the span so it divides evenly by the mean channel bandwidth
        // (integer mean, matching the per-channel bin counts)
        let mut bandwidth = (higher - lower) as u64;
        let mean = self.channels.iter().map(|c| c.bandwidth as u64).sum::<u64>()
            / self.channels.len() as u64;
        if mean > 0 {
            bandwidth += (mean - bandwidth % mean) % mean;
        }
        self.input_bandwidth = bandwidth as f64;
        self.window = None;
    }
}

impl Default for Tuner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_boundaries() {
        let mut tuner = Tuner::new();
        tuner.add_channel(94.5e6, 250e3, DemodulatorKind::Wbfm).unwrap();
        tuner.add_channel(97.5e6, 250e3, DemodulatorKind::Wbfm).unwrap();
        tuner.add_channel(96.9e6, 250e3, DemodulatorKind::Wbfm).unwrap();

        // Extremes: 94.375 .. 97.625 MHz
        assert_eq!(tuner.input_frequency(), 96.0e6);
        // Span 3.25 MHz padded up to a multiple of 250 kHz
        assert_eq!(tuner.input_bandwidth(), 3.25e6);

        assert_eq!(tuner.channels().len(), 3);
        assert_eq!(tuner.channels()[1].index, 1);
        assert_eq!(tuner.channels()[2].address(), (96_900_000u32).to_le_bytes());
    }

    #[test]
    fn test_bandwidth_padding() {
        let mut tuner = Tuner::new();
        tuner.add_channel(100.0e6, 200e3, DemodulatorKind::Mfm).unwrap();
        tuner.add_channel(100.51e6, 200e3, DemodulatorKind::Mfm).unwrap();

        // Span is 710 kHz, padded up to 800 kHz (multiple of 200 kHz)
        assert_eq!(tuner.input_bandwidth(), 800e3);
    }

    #[test]
    fn test_request_bandwidth() {
        let mut tuner = Tuner::new();
        tuner.add_channel(96.9e6, 250e3, DemodulatorKind::Wbfm).unwrap();
        assert_eq!(tuner.input_bandwidth(), 250e3);

        tuner.request_bandwidth(10e6).unwrap();
        assert_eq!(tuner.input_bandwidth(), 10e6);

        // Below the current value: hard failure, state unchanged
        let result = tuner.request_bandwidth(1e6);
        assert!(matches!(result, Err(DspError::BandwidthTooLow { .. })));
        assert_eq!(tuner.input_bandwidth(), 10e6);
    }

    #[test]
    fn test_state_machine() {
        let mut tuner = Tuner::new();

        // Empty: load illegal
        assert!(matches!(tuner.load(&[]), Err(DspError::NotReady(_))));
        assert!(matches!(tuner.run(0), Err(DspError::NotReady(_))));

        tuner.add_channel(2000.0, 1000.0, DemodulatorKind::Fm).unwrap();

        // Configured but not loaded: run illegal
        assert!(matches!(tuner.run(0), Err(DspError::NotReady(_))));

        let window = vec![ComplexSample::ZERO; tuner.input_bandwidth() as usize];
        tuner.load(&window).unwrap();
        assert!(tuner.run(0).is_ok());
        assert!(tuner.run(1).is_err());

        // Loaded: channel list is frozen
        assert!(tuner.add_channel(4000.0, 1000.0, DemodulatorKind::Fm).is_err());

        tuner.reset();
        assert!(tuner.channels().is_empty());
        assert!(matches!(tuner.run(0), Err(DspError::NotReady(_))));
    }

    #[test]
    fn test_load_length_checked() {
        let mut tuner = Tuner::new();
        tuner.add_channel(2000.0, 1000.0, DemodulatorKind::Fm).unwrap();
        assert!(matches!(
            tuner.load(&vec![ComplexSample::ZERO; 123]),
            Err(DspError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_single_channel_tone_lands_at_offset() {
        // Scaled-down version of the broadcast scenario: a 8192 Hz capture,
        // one 1024 Hz channel at its center, a tone 10 Hz above the channel
        // center.
        let mut tuner = Tuner::new();
        tuner.add_channel(100_000.0, 1024.0, DemodulatorKind::Fm).unwrap();
        tuner.request_bandwidth(8192.0).unwrap();

        let n = 8192;
        let offset = 10.0f32;
        // Capture is centered on the channel, so the tone sits `offset` bins
        // above the middle of the spectrum
        let input: Vec<ComplexSample> = (0..n)
            .map(|i| {
                ComplexSample::from_polar(1.0, 2.0 * std::f32::consts::PI * offset * i as f32 / n as f32)
            })
            .collect();

        tuner.load(&input).unwrap();
        let baseband = tuner.run(0).unwrap();
        assert_eq!(baseband.len(), 1024);

        // Dominant tone of the channelized output is at +10 Hz
        let mut planner = Planner::new();
        let mut spectrum = baseband.clone();
        planner.plan_fft_forward(spectrum.len()).process(&mut spectrum);
        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 10);
    }
}
