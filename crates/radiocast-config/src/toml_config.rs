use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use toml::Value;

use super::stack_config::{CfgAudio, CfgChannel, CfgDevice, CfgPublish, DemodulatorKind, RxConfig};

/// Build an [`RxConfig`] from a TOML configuration string.
pub fn from_toml_str(toml_str: &str) -> Result<RxConfig, Box<dyn std::error::Error>> {
    let root: TomlConfigRoot = toml::from_str(toml_str)?;

    // Various sanity checks
    let expected_config_version = "0.1";
    if !root.config_version.eq(expected_config_version) {
        return Err(format!(
            "Unrecognized config_version: {}, expect {}",
            root.config_version, expected_config_version
        )
        .into());
    }
    if !root.extra.is_empty() {
        return Err(format!("Unrecognized top-level fields: {:?}", sorted_keys(&root.extra)).into());
    }
    if let Some(ref rx) = root.receiver {
        if !rx.extra.is_empty() {
            return Err(format!("Unrecognized fields: receiver::{:?}", sorted_keys(&rx.extra)).into());
        }
    }
    if let Some(ref dev) = root.device {
        if !dev.extra.is_empty() {
            return Err(format!("Unrecognized fields: device::{:?}", sorted_keys(&dev.extra)).into());
        }
    }
    if let Some(ref audio) = root.audio {
        if !audio.extra.is_empty() {
            return Err(format!("Unrecognized fields: audio::{:?}", sorted_keys(&audio.extra)).into());
        }
    }
    if let Some(ref publish) = root.publish {
        if !publish.extra.is_empty() {
            return Err(format!("Unrecognized fields: publish::{:?}", sorted_keys(&publish.extra)).into());
        }
    }
    for (i, channel) in root.channels.iter().enumerate() {
        if !channel.extra.is_empty() {
            return Err(format!(
                "Unrecognized fields: channels[{}]::{:?}",
                i,
                sorted_keys(&channel.extra)
            )
            .into());
        }
    }

    // Build config from required and optional values
    let mut cfg = RxConfig {
        debug_log: root.debug_log,
        ..RxConfig::default()
    };

    if let Some(rx) = root.receiver {
        apply_receiver_patch(&mut cfg, rx);
    }
    if let Some(dev) = root.device {
        apply_device_patch(&mut cfg.device, dev);
    }
    if let Some(audio) = root.audio {
        apply_audio_patch(&mut cfg.audio, audio);
    }
    if let Some(publish) = root.publish {
        cfg.publish = Some(CfgPublish {
            bind: publish.bind.unwrap_or_else(|| "0.0.0.0".to_string()),
            port: publish.port,
        });
    }

    cfg.channels = root
        .channels
        .into_iter()
        .map(|c| CfgChannel {
            frequency: c.frequency,
            bandwidth: c.bandwidth,
            demodulator: c.demodulator,
        })
        .collect();

    if cfg.channels.is_empty() && cfg.frequency.is_none() {
        return Err("Configuration needs either receiver.frequency or a [[channels]] list".into());
    }

    Ok(cfg)
}

/// Build an [`RxConfig`] from any reader.
pub fn from_reader<R: Read>(reader: R) -> Result<RxConfig, Box<dyn std::error::Error>> {
    let mut contents = String::new();
    let mut reader = BufReader::new(reader);
    reader.read_to_string(&mut contents)?;
    from_toml_str(&contents)
}

/// Build an [`RxConfig`] from a file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<RxConfig, Box<dyn std::error::Error>> {
    let f = File::open(path)?;
    let r = BufReader::new(f);
    let cfg = from_reader(r)?;
    Ok(cfg)
}

fn apply_receiver_patch(dst: &mut RxConfig, src: ReceiverDto) {
    if let Some(v) = src.input_rate {
        dst.input_rate = v;
    }
    if let Some(v) = src.demod_rate {
        dst.demod_rate = v;
    }
    if let Some(v) = src.audio_rate {
        dst.audio_rate = v;
    }
    dst.frequency = src.frequency;
    if let Some(v) = src.deemphasis {
        dst.deemphasis = v;
    }
    if let Some(v) = src.demodulator {
        dst.demodulator = v;
    }
    if let Some(v) = src.enable_cuda {
        dst.enable_cuda = v;
    }
    dst.record_dir = src.record_dir;
}

fn apply_device_patch(dst: &mut CfgDevice, src: DeviceDto) {
    if let Some(v) = src.driver {
        dst.driver = v;
    }
    if let Some(v) = src.device_buffer {
        dst.device_buffer = v;
    }
    if let Some(v) = src.buffer_multiplier {
        dst.buffer_multiplier = v;
    }
    if let Some(v) = src.agc {
        dst.agc = v;
    }
    dst.gain = src.gain;
}

fn apply_audio_patch(dst: &mut CfgAudio, src: AudioDto) {
    if let Some(v) = src.enabled {
        dst.enabled = v;
    }
    if let Some(v) = src.slot_count {
        dst.slot_count = v;
    }
}

fn sorted_keys(map: &HashMap<String, Value>) -> Vec<&String> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys
}

#[derive(Debug, Deserialize)]
struct TomlConfigRoot {
    config_version: String,
    debug_log: Option<String>,
    receiver: Option<ReceiverDto>,
    device: Option<DeviceDto>,
    audio: Option<AudioDto>,
    publish: Option<PublishDto>,
    #[serde(default)]
    channels: Vec<ChannelDto>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ReceiverDto {
    input_rate: Option<f64>,
    demod_rate: Option<f64>,
    audio_rate: Option<f64>,
    frequency: Option<f64>,
    deemphasis: Option<f64>,
    demodulator: Option<DemodulatorKind>,
    enable_cuda: Option<bool>,
    record_dir: Option<String>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct DeviceDto {
    driver: Option<String>,
    device_buffer: Option<usize>,
    buffer_multiplier: Option<usize>,
    agc: Option<bool>,
    gain: Option<f64>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct AudioDto {
    enabled: Option<bool>,
    slot_count: Option<usize>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct PublishDto {
    bind: Option<String>,
    port: u16,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ChannelDto {
    frequency: f64,
    bandwidth: Option<f64>,
    demodulator: Option<DemodulatorKind>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        config_version = "0.1"

        [receiver]
        frequency = 96.9e6
    "#;

    #[test]
    fn test_minimal_config() {
        let cfg = from_toml_str(MINIMAL).unwrap();
        assert_eq!(cfg.frequency, Some(96.9e6));
        assert_eq!(cfg.input_rate, 10e6);
        assert_eq!(cfg.demodulator, DemodulatorKind::Wbfm);
        assert!(cfg.channels.is_empty());
    }

    #[test]
    fn test_multi_channel_config() {
        let cfg = from_toml_str(
            r#"
            config_version = "0.1"

            [receiver]
            input_rate = 10e6
            demod_rate = 250e3
            demodulator = "Mfm"

            [device]
            driver = "rtlsdr"
            buffer_multiplier = 10

            [publish]
            port = 5555

            [[channels]]
            frequency = 94.5e6

            [[channels]]
            frequency = 96.9e6
            demodulator = "Wbfm"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.channels.len(), 2);
        assert_eq!(cfg.channel_demodulator(0), DemodulatorKind::Mfm);
        assert_eq!(cfg.channel_demodulator(1), DemodulatorKind::Wbfm);
        assert_eq!(cfg.channel_bandwidth(0), 250e3);
        assert_eq!(cfg.device.driver, "rtlsdr");
        assert_eq!(cfg.publish.unwrap().port, 5555);
    }

    #[test]
    fn test_wrong_version_rejected() {
        let result = from_toml_str("config_version = \"9.9\"\n[receiver]\nfrequency = 1e6\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = from_toml_str(
            r#"
            config_version = "0.1"

            [receiver]
            frequency = 96.9e6
            bogus_knob = 1
            "#,
        );
        assert!(result.unwrap_err().to_string().contains("bogus_knob"));
    }

    #[test]
    fn test_needs_frequency_or_channels() {
        let result = from_toml_str("config_version = \"0.1\"\n");
        assert!(result.is_err());
    }
}
