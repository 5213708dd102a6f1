//! Local audio monitor via cpal.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use radiocast_core::assert_warn;
use radiocast_core::Carrousel;

use crate::error::StationError;

/// Output stream fed from a carrousel of pre-allocated audio blocks.
///
/// The callback never blocks and never allocates: it drains the current
/// block through a cursor, dequeues the next ready block when the cursor
/// runs out, and emits silence when none is ready (startup, underrun).
pub struct AudioOutput {
    _stream: cpal::Stream,
}

impl AudioOutput {
    pub fn start(
        sample_rate: u32,
        channels: usize,
        block_len: usize,
        ring: Arc<Carrousel<f32>>,
    ) -> Result<Self, StationError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| StationError::Audio("no default output device".to_string()))?;

        let config = cpal::StreamConfig {
            channels: channels as cpal::ChannelCount,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let mut pending = vec![0.0f32; block_len];
        let mut cursor = block_len;
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for out in data.iter_mut() {
                        if cursor >= pending.len() {
                            match ring.dequeue() {
                                Ok(slot) if slot.len() == pending.len() => {
                                    pending.copy_from_slice(&slot);
                                    cursor = 0;
                                }
                                Ok(slot) => {
                                    assert_warn!(
                                        slot.len() == pending.len(),
                                        "audio block size {} does not match slot size {}",
                                        pending.len(),
                                        slot.len()
                                    );
                                    *out = 0.0;
                                    continue;
                                }
                                Err(_) => {
                                    // Underrun (or startup): silence
                                    *out = 0.0;
                                    continue;
                                }
                            }
                        }
                        *out = pending[cursor];
                        cursor += 1;
                    }
                },
                |err| tracing::error!("audio stream error: {}", err),
                None,
            )
            .map_err(|err| StationError::Audio(err.to_string()))?;

        stream.play().map_err(|err| StationError::Audio(err.to_string()))?;
        tracing::info!("Audio monitor running at {} Hz, {} channel(s)", sample_rate, channels);
        Ok(Self { _stream: stream })
    }
}
