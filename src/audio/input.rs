use crate::audio::resample_linear;
use crate::{Result, SolaceError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Microphone capture producing fixed-size mono frames at the target rate
pub struct MicrophoneInput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    is_capturing: Arc<Mutex<bool>>,
    target_rate: u32,
    frame_samples: usize,
}

impl MicrophoneInput {
    /// Acquire the default input device.
    ///
    /// A missing or refused device is a `PermissionDenied`.
    pub fn new(target_rate: u32, frame_samples: usize) -> Result<Self> {
        let host = cpal::default_host();

        let device = host.default_input_device().ok_or_else(|| {
            SolaceError::PermissionDenied("no microphone available".to_string())
        })?;

        info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_input_config()
            .map_err(|e| {
                SolaceError::PermissionDenied(format!("microphone config unavailable: {}", e))
            })?
            .into();

        Ok(Self {
            device,
            config,
            stream: None,
            is_capturing: Arc::new(Mutex::new(false)),
            target_rate,
            frame_samples,
        })
    }

    pub fn device_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Start capturing; each complete frame is sent on `frame_tx`
    pub fn start(&mut self, frame_tx: Sender<Vec<f32>>) -> Result<()> {
        if *self.is_capturing.lock() {
            warn!("Already capturing");
            return Ok(());
        }

        let channels = self.config.channels as usize;
        let device_rate = self.config.sample_rate.0;
        let target_rate = self.target_rate;
        let frame_samples = self.frame_samples;
        let is_capturing = Arc::clone(&self.is_capturing);
        let mut pending: Vec<f32> = Vec::with_capacity(frame_samples * 2);

        let err_fn = |err| {
            warn!("Microphone stream error: {}", err);
        };

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !*is_capturing.lock() {
                        return;
                    }

                    // Average interleaved channels down to mono
                    let mono: Vec<f32> = if channels == 1 {
                        data.to_vec()
                    } else {
                        data.chunks(channels)
                            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                            .collect()
                    };

                    pending.extend(resample_linear(&mono, device_rate, target_rate));

                    while pending.len() >= frame_samples {
                        let frame: Vec<f32> = pending.drain(..frame_samples).collect();
                        if let Err(e) = frame_tx.try_send(frame) {
                            debug!("Dropping microphone frame: {}", e);
                        }
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| {
                SolaceError::PermissionDenied(format!("failed to open microphone: {}", e))
            })?;

        stream.play().map_err(|e| {
            SolaceError::PermissionDenied(format!("failed to start microphone: {}", e))
        })?;

        *self.is_capturing.lock() = true;
        self.stream = Some(stream);

        info!("Microphone capture started");
        Ok(())
    }

    /// Stop capturing and release the device; safe to call repeatedly
    pub fn stop(&mut self) {
        *self.is_capturing.lock() = false;

        if let Some(stream) = self.stream.take() {
            drop(stream);
            info!("Microphone capture stopped");
        }
    }

    pub fn is_capturing(&self) -> bool {
        *self.is_capturing.lock()
    }
}

impl Drop for MicrophoneInput {
    fn drop(&mut self) {
        self.stop();
    }
}
