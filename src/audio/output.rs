use crate::audio::SampleBuffer;
use crate::{Result, SolaceError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

/// Speaker playback fed from a shared sample buffer
pub struct SpeakerOutput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    is_playing: Arc<Mutex<bool>>,
}

impl SpeakerOutput {
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host.default_output_device().ok_or_else(|| {
            SolaceError::PermissionDenied("no output device available".to_string())
        })?;

        info!(
            "Using output device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_output_config()
            .map_err(|e| {
                SolaceError::PermissionDenied(format!("output config unavailable: {}", e))
            })?
            .into();

        Ok(Self {
            device,
            config,
            stream: None,
            is_playing: Arc::new(Mutex::new(false)),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Start playing mono samples from `feed`, replicated across channels
    pub fn start(&mut self, feed: SampleBuffer) -> Result<()> {
        if *self.is_playing.lock() {
            warn!("Already playing");
            return Ok(());
        }

        let channels = self.config.channels as usize;
        let is_playing = Arc::clone(&self.is_playing);

        let err_fn = |err| {
            warn!("Speaker stream error: {}", err);
        };

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !*is_playing.lock() {
                        data.fill(0.0);
                        return;
                    }

                    let frames = data.len() / channels;
                    let mut mono = vec![0.0f32; frames];
                    let available = feed.pop_into(&mut mono);

                    for (i, frame) in data.chunks_mut(channels).enumerate() {
                        let sample = if i < available { mono[i] } else { 0.0 };
                        frame.fill(sample);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| {
                SolaceError::PermissionDenied(format!("failed to open speaker: {}", e))
            })?;

        stream.play().map_err(|e| {
            SolaceError::PermissionDenied(format!("failed to start speaker: {}", e))
        })?;

        *self.is_playing.lock() = true;
        self.stream = Some(stream);

        info!("Speaker playback started");
        Ok(())
    }

    /// Stop playback and release the device; safe to call repeatedly
    pub fn stop(&mut self) {
        *self.is_playing.lock() = false;

        if let Some(stream) = self.stream.take() {
            drop(stream);
            info!("Speaker playback stopped");
        }
    }

    pub fn is_playing(&self) -> bool {
        *self.is_playing.lock()
    }
}

impl Drop for SpeakerOutput {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_lifecycle() {
        // Hosts without output devices skip this test
        if let Ok(mut output) = SpeakerOutput::new() {
            assert!(output.sample_rate() > 0);
            assert!(!output.is_playing());

            let feed = SampleBuffer::new(1024);
            if output.start(feed).is_ok() {
                assert!(output.is_playing());
                output.stop();
                assert!(!output.is_playing());
                output.stop();
            }
        }
    }
}
