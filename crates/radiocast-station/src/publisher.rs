//! TCP pub/sub transport for demodulated audio.
//!
//! Wire format: every frame is a `u32` big-endian length, a 4-byte
//! little-endian channel address (the center frequency in Hz) and the raw
//! float-32 little-endian audio payload, interleaved L,R for stereo. A
//! subscriber sends its own 4-byte address filter right after connecting;
//! all-zero subscribes to every channel.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};

/// Upper bound on a frame, well above one second of stereo float audio.
const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

enum PublishMsg {
    Frame { address: [u8; 4], payload: Vec<u8> },
    Shutdown,
}

/// Publishing side of the audio transport.
///
/// The accept loop and the per-subscriber fan-out run on a worker thread;
/// `publish` only queues a frame and never blocks the DSP loop. Dead
/// subscribers are pruned on the first failed send.
pub struct Publisher {
    sender: Sender<PublishMsg>,
    local_addr: SocketAddr,
}

impl Publisher {
    pub fn bind(bind: &str, port: u16) -> io::Result<Self> {
        let listener = TcpListener::bind((bind, port))?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Publishing audio on {}", local_addr);

        let (sender, receiver) = unbounded::<PublishMsg>();
        thread::Builder::new()
            .name("publisher".to_string())
            .spawn(move || {
                let mut subscribers: Vec<SubscriberConn> = Vec::new();
                loop {
                    accept_pending(&listener, &mut subscribers);
                    match receiver.recv_timeout(Duration::from_millis(100)) {
                        Ok(PublishMsg::Frame { address, payload }) => {
                            subscribers.retain_mut(|sub| {
                                if sub.filter != [0u8; 4] && sub.filter != address {
                                    return true;
                                }
                                match send_frame(&mut sub.stream, &address, &payload) {
                                    Ok(()) => true,
                                    Err(err) => {
                                        tracing::info!("subscriber {} dropped: {}", sub.peer, err);
                                        false
                                    }
                                }
                            });
                        }
                        Ok(PublishMsg::Shutdown) => break,
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        Ok(Self { sender, local_addr })
    }

    /// Address the listener actually bound to (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Queue one audio block for all subscribers of `address`.
    pub fn publish(&self, address: [u8; 4], samples: &[f32]) {
        let mut payload = Vec::with_capacity(samples.len() * 4);
        for value in samples {
            payload.extend_from_slice(&value.to_le_bytes());
        }
        let _ = self.sender.send(PublishMsg::Frame { address, payload });
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        let _ = self.sender.send(PublishMsg::Shutdown);
    }
}

struct SubscriberConn {
    stream: TcpStream,
    peer: SocketAddr,
    filter: [u8; 4],
}

fn accept_pending(listener: &TcpListener, subscribers: &mut Vec<SubscriberConn>) {
    loop {
        match listener.accept() {
            Ok((stream, peer)) => match init_subscriber(stream, peer) {
                Ok(sub) => {
                    tracing::info!("subscriber {} connected", peer);
                    subscribers.push(sub);
                }
                Err(err) => {
                    tracing::warn!("subscriber {} rejected: {}", peer, err);
                }
            },
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
            Err(err) => {
                tracing::error!("accept failed: {}", err);
                break;
            }
        }
    }
}

fn init_subscriber(stream: TcpStream, peer: SocketAddr) -> io::Result<SubscriberConn> {
    stream.set_read_timeout(Some(Duration::from_secs(2)))?;
    let mut filter = [0u8; 4];
    let mut stream = stream;
    stream.read_exact(&mut filter)?;
    let _ = stream.set_nodelay(true);
    Ok(SubscriberConn { stream, peer, filter })
}

fn send_frame(stream: &mut TcpStream, address: &[u8; 4], payload: &[u8]) -> io::Result<()> {
    let length = (payload.len() + address.len()) as u32;
    stream.write_all(&length.to_be_bytes())?;
    stream.write_all(address)?;
    stream.write_all(payload)?;
    stream.flush()
}

/// Blocking client for published audio frames.
pub struct Subscriber {
    stream: TcpStream,
}

impl Subscriber {
    /// Subscribe to the channel at `frequency` Hz.
    pub fn connect<A: ToSocketAddrs>(addr: A, frequency: f64) -> io::Result<Self> {
        Self::connect_filtered(addr, (frequency as u32).to_le_bytes())
    }

    /// Subscribe to every channel.
    pub fn connect_all<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        Self::connect_filtered(addr, [0u8; 4])
    }

    fn connect_filtered<A: ToSocketAddrs>(addr: A, filter: [u8; 4]) -> io::Result<Self> {
        let mut stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(Duration::from_secs(2)))?;
        stream.write_all(&filter)?;
        Ok(Self { stream })
    }

    /// Block until the next frame arrives, returning its address and samples.
    ///
    /// Waits at most the stream's read timeout; when no frame arrives in
    /// time the error kind is `WouldBlock` (or `TimedOut`), which callers
    /// polling a shutdown flag should treat as retryable.
    pub fn recv(&mut self) -> io::Result<([u8; 4], Vec<f32>)> {
        let mut length = [0u8; 4];
        self.stream.read_exact(&mut length)?;
        let length = u32::from_be_bytes(length) as usize;
        if !(4..=MAX_FRAME_BYTES).contains(&length) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("bad frame length {}", length),
            ));
        }

        let mut address = [0u8; 4];
        self.stream.read_exact(&mut address)?;

        let mut payload = vec![0u8; length - 4];
        self.stream.read_exact(&mut payload)?;
        let samples = payload
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        Ok((address, samples))
    }
}
