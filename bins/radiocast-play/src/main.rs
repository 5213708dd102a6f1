use clap::Parser;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use radiocast_core::{debug, Carrousel};
use radiocast_station::audio::AudioOutput;
use radiocast_station::Subscriber;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Radiocast playback client",
    long_about = "Subscribes to a running radiocast-rx publisher and plays one channel locally"
)]
struct Args {
    /// Publisher address, e.g. 127.0.0.1:5555
    server: String,

    /// Channel center frequency in Hz
    #[arg(long, default_value_t = 96.9e6)]
    frequency: f64,

    /// Audio sample rate in Hz
    #[arg(long, default_value_t = 48_000)]
    audio_rate: u32,

    /// Audio channels of the subscribed stream (2 for stereo)
    #[arg(long, default_value_t = 2)]
    channels: usize,
}

fn main() {
    eprintln!("Radiocast {}", radiocast_core::STACK_VERSION);

    let args = Args::parse();
    let _log_guard = debug::setup_logging_default(None);

    let block_len = args.audio_rate as usize * args.channels;
    let ring = match Carrousel::<f32>::new(4, block_len) {
        Ok(ring) => Arc::new(ring),
        Err(err) => {
            tracing::error!("failed to allocate audio blocks: {}", err);
            std::process::exit(1);
        }
    };
    let _audio = match AudioOutput::start(args.audio_rate, args.channels, block_len, ring.clone()) {
        Ok(audio) => audio,
        Err(err) => {
            tracing::error!("failed to open audio output: {}", err);
            std::process::exit(1);
        }
    };

    let mut subscriber = match Subscriber::connect(args.server.as_str(), args.frequency) {
        Ok(subscriber) => subscriber,
        Err(err) => {
            tracing::error!("failed to connect to {}: {}", args.server, err);
            std::process::exit(1);
        }
    };
    tracing::info!("Subscribed to {} for {:.3} MHz", args.server, args.frequency / 1e6);

    // Set up Ctrl+C handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("failed to set Ctrl+C handler");

    while running.load(Ordering::SeqCst) {
        match subscriber.recv() {
            Ok((_, samples)) => {
                let mut slot = ring.enqueue();
                radiocast_core::assert_warn!(
                    slot.len() == samples.len(),
                    "frame size {} does not match audio block size {}",
                    samples.len(),
                    slot.len()
                );
                if slot.len() == samples.len() {
                    slot.copy_from_slice(&samples);
                }
            }
            // No frame within the read timeout: recheck the running flag
            Err(err) if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                continue;
            }
            Err(err) => {
                tracing::error!("connection lost: {}", err);
                break;
            }
        }
    }
}
