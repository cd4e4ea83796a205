//! Live voice session lifecycle
//!
//! `Idle -> Connecting -> Streaming -> Idle`. The outbound path forwards
//! microphone frames as they are produced; the inbound path schedules
//! decoded audio for gapless playback. Stopping is idempotent: the
//! microphone and the playback output are released exactly once, whether
//! the stop came from the user or from the transport.

use super::frames::{self, ServerEvent};
use super::playback::{PlaybackQueue, SessionClock};
use super::socket;
use crate::audio::{resample_linear, MicrophoneInput, SampleBuffer, SpeakerOutput};
use crate::config::{ServiceConfig, FRAME_SAMPLES};
use crate::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};
use tungstenite::Message;

/// Added to the system instruction while a voice session is active
const LIVE_INSTRUCTION_SUFFIX: &str = " You are in a Live Voice Session. Be brief and warm.";

const SOCKET_READ_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveState {
    Idle,
    Connecting,
    Streaming,
}

#[derive(Debug, Clone)]
pub enum LiveEvent {
    /// Handshake completed, both paths running
    Streaming,

    /// An inbound buffer was placed on the playback timeline
    Scheduled { start: f64, duration: f64 },

    /// Barge-in: pending playback was discarded
    Interrupted,

    /// Visible, dismissible notice for the user
    Notice { message: String },

    /// The session ended; no automatic reconnect
    Stopped,
}

struct LiveShared {
    state: Mutex<LiveState>,
    stopping: AtomicBool,
    released: AtomicBool,
}

pub struct LiveSession {
    shared: Arc<LiveShared>,
    event_rx: Receiver<LiveEvent>,
    mic: MicrophoneInput,
    output: SpeakerOutput,
    transport: Option<JoinHandle<()>>,
    pump: Option<JoinHandle<()>>,
}

impl LiveSession {
    /// Acquire the microphone, open the streaming connection and start both
    /// paths.
    ///
    /// Fails with `PermissionDenied` when no capture device is available and
    /// with `ConnectionError` when the handshake does not complete; either
    /// way every resource acquired so far is released before returning.
    pub fn start(config: &ServiceConfig, system_instruction: &str) -> Result<Self> {
        let shared = Arc::new(LiveShared {
            state: Mutex::new(LiveState::Connecting),
            stopping: AtomicBool::new(false),
            released: AtomicBool::new(false),
        });
        let (event_tx, event_rx) = bounded(256);

        let mut mic = MicrophoneInput::new(config.input_sample_rate, FRAME_SAMPLES)?;

        let mut live_socket = socket::connect(&config.api_key, SOCKET_READ_TIMEOUT)?;
        let instruction = format!("{}{}", system_instruction, LIVE_INSTRUCTION_SUFFIX);
        live_socket
            .send(Message::text(frames::setup_message(
                &config.live_model,
                &instruction,
            )))
            .map_err(|e| {
                crate::SolaceError::ConnectionError(format!("setup message failed: {}", e))
            })?;

        let mut output = SpeakerOutput::new()?;
        let feed = SampleBuffer::new(config.output_sample_rate as usize * 30);
        output.start(feed.clone())?;

        let (frame_tx, frame_rx) = bounded::<Vec<f32>>(64);
        mic.start(frame_tx)?;

        let queue = Arc::new(Mutex::new(PlaybackQueue::new(config.output_sample_rate)));
        let clock = SessionClock::start();

        let transport = spawn_transport(
            live_socket,
            frame_rx,
            Arc::clone(&queue),
            feed.clone(),
            clock,
            config.input_sample_rate,
            config.output_sample_rate,
            Arc::clone(&shared),
            event_tx.clone(),
        );
        let pump = spawn_pump(
            queue,
            feed,
            clock,
            config.output_sample_rate,
            output.sample_rate(),
            Arc::clone(&shared),
        );

        *shared.state.lock() = LiveState::Streaming;
        let _ = event_tx.try_send(LiveEvent::Streaming);
        info!("live session streaming");

        Ok(Self {
            shared,
            event_rx,
            mic,
            output,
            transport: Some(transport),
            pump: Some(pump),
        })
    }

    pub fn state(&self) -> LiveState {
        *self.shared.state.lock()
    }

    pub fn try_recv_event(&self) -> Option<LiveEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Stop the session and release the devices.
    ///
    /// Safe to call repeatedly and concurrently with a transport failure;
    /// the release logic runs exactly once.
    pub fn stop(&mut self) {
        self.shared.stopping.store(true, Ordering::SeqCst);

        if !self.shared.released.swap(true, Ordering::SeqCst) {
            self.mic.stop();
            self.output.stop();
            *self.shared.state.lock() = LiveState::Idle;
            info!("live session stopped");
        }

        if let Some(handle) = self.transport.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.pump.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_transport(
    mut live_socket: socket::LiveSocket,
    frame_rx: Receiver<Vec<f32>>,
    queue: Arc<Mutex<PlaybackQueue>>,
    feed: SampleBuffer,
    clock: SessionClock,
    input_rate: u32,
    output_rate: u32,
    shared: Arc<LiveShared>,
    event_tx: Sender<LiveEvent>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        'session: loop {
            if shared.stopping.load(Ordering::SeqCst) {
                let _ = live_socket.close(None);
                break;
            }

            // Outbound: forward frames as produced, no batching
            while let Ok(frame) = frame_rx.try_recv() {
                let payload = frames::encode_audio_frame(&frame, input_rate);
                if let Err(e) = live_socket.send(Message::text(payload)) {
                    warn!("outbound send failed: {}", e);
                    let _ = event_tx.try_send(LiveEvent::Notice {
                        message: "The voice connection was lost. Please start a new session."
                            .to_string(),
                    });
                    break 'session;
                }
            }

            // Inbound: schedule audio, honor interruptions
            match live_socket.read() {
                Ok(Message::Text(text)) => {
                    handle_inbound(text.as_str(), &queue, &feed, &clock, output_rate, &event_tx);
                }
                Ok(Message::Binary(bytes)) => {
                    if let Ok(text) = std::str::from_utf8(&bytes) {
                        handle_inbound(text, &queue, &feed, &clock, output_rate, &event_tx);
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("live connection closed by remote");
                    break;
                }
                Ok(_) => {}
                Err(tungstenite::Error::Io(ref e))
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut => {}
                Err(e) => {
                    warn!("live connection error: {}", e);
                    let _ = event_tx.try_send(LiveEvent::Notice {
                        message: "The voice connection was lost. Please start a new session."
                            .to_string(),
                    });
                    break;
                }
            }
        }

        // Termination is final for this session
        shared.stopping.store(true, Ordering::SeqCst);
        queue.lock().interrupt();
        feed.clear();
        *shared.state.lock() = LiveState::Idle;
        let _ = event_tx.try_send(LiveEvent::Stopped);
    })
}

fn handle_inbound(
    raw: &str,
    queue: &Arc<Mutex<PlaybackQueue>>,
    feed: &SampleBuffer,
    clock: &SessionClock,
    output_rate: u32,
    event_tx: &Sender<LiveEvent>,
) {
    match frames::decode_server_message(raw) {
        Ok(ServerEvent::Audio(samples)) => {
            let duration = samples.len() as f64 / output_rate as f64;
            let start = queue.lock().schedule(clock.now(), samples);
            debug!(start, duration, "scheduled inbound buffer");
            let _ = event_tx.try_send(LiveEvent::Scheduled { start, duration });
        }
        Ok(ServerEvent::Interrupted) => {
            queue.lock().interrupt();
            feed.clear();
            let _ = event_tx.try_send(LiveEvent::Interrupted);
        }
        Ok(ServerEvent::TurnComplete) | Ok(ServerEvent::Ignored) => {}
        Err(e) => {
            warn!("undecodable live payload: {}", e);
        }
    }
}

fn spawn_pump(
    queue: Arc<Mutex<PlaybackQueue>>,
    feed: SampleBuffer,
    clock: SessionClock,
    output_rate: u32,
    device_rate: u32,
    shared: Arc<LiveShared>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        loop {
            if shared.stopping.load(Ordering::SeqCst) {
                break;
            }

            let due = queue.lock().pop_due(clock.now());
            match due {
                Some(buffer) => {
                    if device_rate == output_rate {
                        feed.push(&buffer.samples);
                    } else {
                        feed.push(&resample_linear(&buffer.samples, output_rate, device_rate));
                    }
                }
                None => std::thread::sleep(Duration::from_millis(5)),
            }
        }
    })
}
