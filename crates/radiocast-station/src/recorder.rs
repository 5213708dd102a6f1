//! Asynchronous per-channel raw audio recorder.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::thread;

use crossbeam_channel::{unbounded, Sender};

#[derive(Debug, Clone)]
enum RecorderMsg {
    Samples(Vec<f32>),
    Shutdown,
}

/// Writes demodulated audio to `FM_<center_frequency_Hz>.if32` as raw
/// little-endian float-32, interleaved L,R for stereo. Writing happens on a
/// background thread fed over a channel, so the DSP loop never blocks on
/// disk.
pub struct Recorder {
    sender: Sender<RecorderMsg>,
}

impl Recorder {
    pub fn create(dir: &Path, center_frequency: f64) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("FM_{}.if32", center_frequency as u64));
        let file = OpenOptions::new().write(true).create(true).truncate(true).open(&path)?;
        tracing::info!("Recording channel audio to {}", path.display());

        let (sender, receiver) = unbounded::<RecorderMsg>();
        thread::Builder::new()
            .name(format!("recorder-{}", center_frequency as u64))
            .spawn(move || {
                let mut writer = BufWriter::new(file);
                while let Ok(msg) = receiver.recv() {
                    match msg {
                        RecorderMsg::Samples(samples) => {
                            for value in &samples {
                                if writer.write_all(&value.to_le_bytes()).is_err() {
                                    tracing::error!("recorder write failed, stopping");
                                    return;
                                }
                            }
                        }
                        RecorderMsg::Shutdown => break,
                    }
                }
                let _ = writer.flush();
            })?;

        Ok(Self { sender })
    }

    /// Queue one block of samples for writing (non-blocking).
    pub fn write(&self, samples: &[f32]) {
        let _ = self.sender.send(RecorderMsg::Samples(samples.to_vec()));
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        let _ = self.sender.send(RecorderMsg::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_write_and_read_back() {
        let mut dir = std::env::temp_dir();
        dir.push(format!(
            "radiocast_recorder_test_{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));

        let samples = [0.0f32, 0.5, -0.5, 1.0];
        {
            let recorder = Recorder::create(&dir, 96_900_000.0).unwrap();
            recorder.write(&samples);
        }

        // The writer thread finishes asynchronously
        let path = dir.join("FM_96900000.if32");
        let deadline = Instant::now() + Duration::from_secs(3);
        let bytes = loop {
            if let Ok(bytes) = fs::read(&path) {
                if bytes.len() == samples.len() * 4 {
                    break bytes;
                }
            }
            assert!(Instant::now() < deadline, "recorder output never appeared");
            thread::sleep(Duration::from_millis(20));
        };

        let read_back: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(read_back, samples);

        let _ = fs::remove_dir_all(&dir);
    }
}
