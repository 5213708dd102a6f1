use serde::Deserialize;

/// Which demodulator runs on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DemodulatorKind {
    /// Generic FM discriminator.
    Fm,
    /// Mono broadcast FM.
    Mfm,
    /// Stereo broadcast FM.
    Wbfm,
}

/// One tuned channel of a multi-channel receiver.
#[derive(Debug, Clone)]
pub struct CfgChannel {
    /// Channel center frequency in Hz.
    pub frequency: f64,
    /// Channel bandwidth in Hz. Defaults to the receiver `demod_rate`.
    pub bandwidth: Option<f64>,
    /// Demodulator override. Defaults to the receiver `demodulator`.
    pub demodulator: Option<DemodulatorKind>,
}

/// Radio front-end settings.
#[derive(Debug, Clone)]
pub struct CfgDevice {
    /// SoapySDR driver name, e.g. "airspy" or "rtlsdr".
    pub driver: String,
    /// Samples per device read.
    pub device_buffer: usize,
    /// Ring capacity in seconds of input.
    pub buffer_multiplier: usize,
    /// Hardware automatic gain control.
    pub agc: bool,
    /// Manual overall gain in dB, applied when AGC is off.
    pub gain: Option<f64>,
}

impl Default for CfgDevice {
    fn default() -> Self {
        Self {
            driver: "airspy".to_string(),
            device_buffer: 65536,
            buffer_multiplier: 3,
            agc: true,
            gain: None,
        }
    }
}

/// Local audio monitor settings.
#[derive(Debug, Clone)]
pub struct CfgAudio {
    pub enabled: bool,
    /// Number of pre-allocated audio blocks between DSP and the callback.
    pub slot_count: usize,
}

impl Default for CfgAudio {
    fn default() -> Self {
        Self { enabled: true, slot_count: 4 }
    }
}

/// Pub/sub audio transport settings.
#[derive(Debug, Clone)]
pub struct CfgPublish {
    pub bind: String,
    pub port: u16,
}

/// Full receiver configuration.
#[derive(Debug, Clone)]
pub struct RxConfig {
    /// Device sample rate in Hz; also the tuner input bandwidth.
    pub input_rate: f64,
    /// Channel bandwidth after tuning, in Hz.
    pub demod_rate: f64,
    /// Final audio sample rate in Hz.
    pub audio_rate: f64,
    /// Tuned frequency for the single-channel path.
    pub frequency: Option<f64>,
    /// Channel list for the multi-channel path. Takes precedence over `frequency`.
    pub channels: Vec<CfgChannel>,
    /// Deemphasis time constant in seconds: 75e-6 for the Americas and
    /// Korea, 50e-6 for the rest of the world.
    pub deemphasis: f64,
    /// Default demodulator kind.
    pub demodulator: DemodulatorKind,
    pub device: CfgDevice,
    /// Accelerator backend request. Parsed for compatibility; only the CPU
    /// backend is compiled in, so enabling this fails at station build.
    pub enable_cuda: bool,
    pub audio: CfgAudio,
    pub publish: Option<CfgPublish>,
    /// Directory for per-channel raw captures (FM_<freq>.if32). None disables.
    pub record_dir: Option<String>,
    /// Verbose log file path.
    pub debug_log: Option<String>,
}

impl Default for RxConfig {
    fn default() -> Self {
        Self {
            input_rate: 10e6,
            demod_rate: 250e3,
            audio_rate: 48e3,
            frequency: None,
            channels: Vec::new(),
            deemphasis: 75e-6,
            demodulator: DemodulatorKind::Wbfm,
            device: CfgDevice::default(),
            enable_cuda: false,
            audio: CfgAudio::default(),
            publish: None,
            record_dir: None,
            debug_log: None,
        }
    }
}

impl RxConfig {
    /// Effective bandwidth of channel `index`.
    pub fn channel_bandwidth(&self, index: usize) -> f64 {
        self.channels[index].bandwidth.unwrap_or(self.demod_rate)
    }

    /// Effective demodulator of channel `index`.
    pub fn channel_demodulator(&self, index: usize) -> DemodulatorKind {
        self.channels[index].demodulator.unwrap_or(self.demodulator)
    }
}
