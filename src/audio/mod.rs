pub mod buffer;
#[cfg(feature = "audio-io")]
pub mod input;
#[cfg(feature = "audio-io")]
pub mod output;

pub use buffer::SampleBuffer;
#[cfg(feature = "audio-io")]
pub use input::MicrophoneInput;
#[cfg(feature = "audio-io")]
pub use output::SpeakerOutput;

/// Linear-interpolation resampling, good enough for speech
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let new_len = (samples.len() as f64 / ratio) as usize;
    let mut output = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_pos = i as f64 * ratio;
        let src_idx = src_pos as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let s1 = samples.get(src_idx).copied().unwrap_or(0.0);
        let s2 = samples.get(src_idx + 1).copied().unwrap_or(s1);
        output.push(s1 * (1.0 - frac) + s2 * frac);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_identity() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_linear(&samples, 16000, 16000), samples);
    }

    #[test]
    fn test_resample_halves_length() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let resampled = resample_linear(&samples, 48000, 24000);
        assert_eq!(resampled.len(), 50);
        // Monotone input stays monotone
        assert!(resampled.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_resample_doubles_length() {
        let samples = vec![0.0, 1.0];
        let resampled = resample_linear(&samples, 12000, 24000);
        assert_eq!(resampled.len(), 4);
    }
}
