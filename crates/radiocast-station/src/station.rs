//! Receive chain assembly and the producer/consumer thread pair.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use radiocast_config::RxConfig;
use radiocast_core::sample_types::*;
use radiocast_core::{Carrousel, SampleRing};
use radiocast_dsp::demodulator::{build_demodulator, Demodulator};
use radiocast_dsp::{Decimate, Tuner};

use crate::audio::AudioOutput;
use crate::error::StationError;
use crate::publisher::Publisher;
use crate::recorder::Recorder;
use crate::soapyio::SoapyIo;

/// How long the DSP thread waits for a window before rechecking `running`.
/// Bounds shutdown latency.
const WINDOW_TIMEOUT: Duration = Duration::from_secs(1);

enum FrontEnd {
    /// Multi-channel path: one FFT per window, channelized per station.
    Tuned(Tuner),
    /// Single-channel path: plain decimation of the capture to the channel rate.
    Direct(Decimate<ComplexSample>),
}

struct ChannelPipeline {
    address: [u8; 4],
    demodulator: Box<dyn Demodulator>,
    recorder: Option<Recorder>,
}

/// Build the whole receive chain from the configuration and run it until
/// `running` goes false. Blocks the calling thread; tears the DSP thread
/// down first and the device thread second.
pub fn run_station(cfg: RxConfig, running: Arc<AtomicBool>) -> Result<(), StationError> {
    if cfg.enable_cuda {
        return Err(StationError::Config(
            "the accelerator backend is not compiled in, set enable_cuda = false".to_string(),
        ));
    }

    let input_rate = cfg.input_rate as usize;
    let audio_size = cfg.audio_rate as usize;
    let single_channel = cfg.channels.is_empty();

    // Channel plan
    let mut tuner = Tuner::new();
    if single_channel {
        let frequency = cfg.frequency.ok_or_else(|| {
            StationError::Config("either frequency or a channel list is required".to_string())
        })?;
        tuner.add_channel(frequency, cfg.demod_rate, cfg.demodulator)?;
    } else {
        for (index, channel) in cfg.channels.iter().enumerate() {
            tuner.add_channel(
                channel.frequency,
                cfg.channel_bandwidth(index),
                cfg.channel_demodulator(index),
            )?;
        }
    }
    tuner.request_bandwidth(cfg.input_rate)?;
    let center_frequency = tuner.input_frequency();

    // Per-channel demodulators and recorders
    let mut pipelines = Vec::new();
    for channel in tuner.channels() {
        let recorder = match &cfg.record_dir {
            Some(dir) => Some(Recorder::create(Path::new(dir), channel.center_frequency)?),
            None => None,
        };
        pipelines.push(ChannelPipeline {
            address: channel.address(),
            demodulator: build_demodulator(
                channel.demodulator,
                channel.bandwidth as usize,
                audio_size,
                cfg.deemphasis,
            )?,
            recorder,
        });
    }

    let front_end = if single_channel {
        FrontEnd::Direct(Decimate::new(input_rate, cfg.demod_rate as usize, false)?)
    } else {
        FrontEnd::Tuned(tuner)
    };

    // Device and the producer/consumer ring between the two threads
    let sdr = SoapyIo::new(&cfg.device, cfg.input_rate, center_frequency)?;
    let ring = Arc::new(SampleRing::<ComplexSample>::new(
        input_rate * cfg.device.buffer_multiplier,
    )?);

    // Optional sinks
    let publisher = match &cfg.publish {
        Some(publish) => Some(Arc::new(Publisher::bind(&publish.bind, publish.port)?)),
        None => None,
    };
    let monitor_channels = pipelines[0].demodulator.channels();
    let (audio_ring, _audio_output) = if cfg.audio.enabled {
        let block_len = audio_size * monitor_channels;
        let ring = Arc::new(Carrousel::<AudioSample>::new(cfg.audio.slot_count, block_len)?);
        let output = AudioOutput::start(cfg.audio_rate as u32, monitor_channels, block_len, ring.clone())?;
        (Some(ring), Some(output))
    } else {
        (None, None)
    };

    tracing::info!(
        "Station up: {} channel(s), capture {:.3} MHz at {:.3} MS/s",
        pipelines.len(),
        center_frequency / 1e6,
        cfg.input_rate / 1e6
    );

    // Device thread (producer): blocks inside the driver read
    let device_thread = {
        let ring = ring.clone();
        let running = running.clone();
        let device_buffer = cfg.device.device_buffer;
        let mut sdr = sdr;
        thread::Builder::new()
            .name("radiocast-device".to_string())
            .spawn(move || {
                let mut chunk = vec![ComplexSample::ZERO; device_buffer];
                while running.load(Ordering::SeqCst) {
                    match sdr.receive(&mut chunk) {
                        // Short reads are routine; append only what arrived
                        Ok(count) if count > 0 => {
                            if let Err(err) = ring.append(&chunk[..count]) {
                                tracing::error!("ring append failed: {}", err);
                                break;
                            }
                        }
                        Ok(_) => continue,
                        Err(err) => {
                            tracing::error!("device read failed: {}", err);
                            break;
                        }
                    }
                }
                sdr.deactivate();
                running.store(false, Ordering::SeqCst);
            })
            .map_err(StationError::Io)?
    };

    // DSP thread (single consumer, owns all stateful operators)
    let dsp_thread = {
        let ring = ring.clone();
        let running = running.clone();
        let publisher = publisher.clone();
        let audio_ring = audio_ring.clone();
        let mut front_end = front_end;
        let mut pipelines = pipelines;
        thread::Builder::new()
            .name("radiocast-dsp".to_string())
            .spawn(move || {
                let mut window = vec![ComplexSample::ZERO; input_rate];
                while running.load(Ordering::SeqCst) {
                    match ring.popleft(&mut window, WINDOW_TIMEOUT) {
                        Ok(true) => {}
                        // Timeout: recheck the running flag
                        Ok(false) => continue,
                        Err(err) => {
                            tracing::error!("ring read failed: {}", err);
                            break;
                        }
                    }
                    if let Err(err) = process_window(
                        &window,
                        &mut front_end,
                        &mut pipelines,
                        publisher.as_deref(),
                        audio_ring.as_deref(),
                    ) {
                        tracing::error!("dsp failed: {}", err);
                        break;
                    }
                }
                running.store(false, Ordering::SeqCst);
            })
            .map_err(StationError::Io)?
    };

    dsp_thread
        .join()
        .map_err(|_| StationError::Config("dsp thread panicked".to_string()))?;
    running.store(false, Ordering::SeqCst);
    device_thread
        .join()
        .map_err(|_| StationError::Config("device thread panicked".to_string()))?;
    Ok(())
}

fn process_window(
    window: &[ComplexSample],
    front_end: &mut FrontEnd,
    pipelines: &mut [ChannelPipeline],
    publisher: Option<&Publisher>,
    audio_ring: Option<&Carrousel<AudioSample>>,
) -> Result<(), StationError> {
    match front_end {
        FrontEnd::Direct(decimate) => {
            let baseband = decimate.run(window)?;
            let pipeline = &mut pipelines[0];
            let audio = pipeline.demodulator.run(&baseband)?;
            fan_out(pipeline, &audio, publisher, audio_ring, true);
        }
        FrontEnd::Tuned(tuner) => {
            tuner.load(window)?;
            for (index, pipeline) in pipelines.iter_mut().enumerate() {
                let baseband = tuner.run(index)?;
                let audio = pipeline.demodulator.run(&baseband)?;
                // Only the first channel goes to the local monitor
                fan_out(pipeline, &audio, publisher, audio_ring, index == 0);
            }
        }
    }
    Ok(())
}

fn fan_out(
    pipeline: &ChannelPipeline,
    audio: &[AudioSample],
    publisher: Option<&Publisher>,
    audio_ring: Option<&Carrousel<AudioSample>>,
    monitor: bool,
) {
    if let Some(publisher) = publisher {
        publisher.publish(pipeline.address, audio);
    }
    if let Some(recorder) = &pipeline.recorder {
        recorder.write(audio);
    }
    if monitor {
        if let Some(ring) = audio_ring {
            let mut slot = ring.enqueue();
            radiocast_core::assert_warn!(
                slot.len() == audio.len(),
                "audio block size {} does not match slot size {}",
                audio.len(),
                slot.len()
            );
            if slot.len() == audio.len() {
                slot.copy_from_slice(audio);
            }
        }
    }
}
