pub mod frames;
pub mod playback;
#[cfg(feature = "audio-io")]
pub mod session;
pub mod socket;

pub use frames::{decode_server_message, encode_audio_frame, ServerEvent};
pub use playback::{PlaybackQueue, ScheduledBuffer, SessionClock};
#[cfg(feature = "audio-io")]
pub use session::{LiveEvent, LiveSession, LiveState};
