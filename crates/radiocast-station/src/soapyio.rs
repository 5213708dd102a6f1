//! SoapySDR receive-side device handling.

use radiocast_config::CfgDevice;
use radiocast_core::sample_types::*;

type StreamType = ComplexSample;

/// It is annoying to repeat error handling so do that in a macro.
/// ? could be used but then it could not print which SoapySDR call failed.
macro_rules! soapycheck {
    ($text:literal, $soapysdr_call:expr) => {
        match $soapysdr_call {
            Ok(ret) => ret,
            Err(err) => {
                tracing::error!("SoapySDR: Failed to {}: {}", $text, err);
                return Err(err);
            }
        }
    };
}

/// RX-only wrapper around a SoapySDR device.
///
/// Sample rate, center frequency and gain mode are set before the stream is
/// activated; afterwards the device only serves `receive` calls until
/// `deactivate`.
pub struct SoapyIo {
    rx_ch: usize,
    /// Actual RX sample rate reported by the hardware.
    rx_fs: f64,
    dev: soapysdr::Device,
    rx: soapysdr::RxStream<StreamType>,
}

impl SoapyIo {
    pub fn new(
        cfg: &CfgDevice,
        sample_rate: f64,
        center_frequency: f64,
    ) -> Result<Self, soapysdr::Error> {
        let rx_ch = 0;

        let mut dev_args = soapysdr::Args::new();
        dev_args.set("driver", cfg.driver.as_str());
        let dev = soapycheck!("open SoapySDR device", soapysdr::Device::new(dev_args));

        soapycheck!(
            "set RX sample rate",
            dev.set_sample_rate(soapysdr::Direction::Rx, rx_ch, sample_rate)
        );
        // Read the actual sample rate obtained and store it
        // to avoid having to read it again every time it is needed.
        let rx_fs = soapycheck!("get RX sample rate", dev.sample_rate(soapysdr::Direction::Rx, rx_ch));

        soapycheck!(
            "set RX center frequency",
            dev.set_frequency(soapysdr::Direction::Rx, rx_ch, center_frequency, soapysdr::Args::new())
        );

        if cfg.agc {
            soapycheck!("enable RX gain mode", dev.enable_agc(soapysdr::Direction::Rx, rx_ch, true));
        } else if let Some(gain) = cfg.gain {
            soapycheck!("set RX gain", dev.set_gain(soapysdr::Direction::Rx, rx_ch, gain));
        }

        let mut rx = soapycheck!("setup RX stream", dev.rx_stream(&[rx_ch]));
        soapycheck!("activate RX stream", rx.activate(None));

        tracing::info!(
            "SDR '{}' running at {:.3} MS/s, tuned to {:.3} MHz",
            cfg.driver,
            rx_fs / 1e6,
            center_frequency / 1e6
        );

        Ok(Self { rx_ch, rx_fs, dev, rx })
    }

    /// Fill `buffer` with up to `buffer.len()` samples, returning the count
    /// actually written. Short reads are routine; only the returned prefix
    /// is valid.
    pub fn receive(&mut self, buffer: &mut [StreamType]) -> Result<usize, soapysdr::Error> {
        self.rx.read(&mut [buffer], 1_000_000)
    }

    pub fn rx_sample_rate(&self) -> f64 {
        self.rx_fs
    }

    pub fn rx_center_frequency(&self) -> Result<f64, soapysdr::Error> {
        self.dev.frequency(soapysdr::Direction::Rx, self.rx_ch)
    }

    /// Stop the stream. The stream itself is closed when the device drops.
    pub fn deactivate(&mut self) {
        if let Err(err) = self.rx.deactivate(None) {
            tracing::warn!("SoapySDR: Failed to deactivate RX stream: {}", err);
        }
    }
}
