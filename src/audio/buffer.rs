use parking_lot::Mutex;
use ringbuf::{traits::*, HeapRb};
use std::sync::Arc;

/// Shared sample feed between the playback pump and the output callback.
///
/// Overflow drops the oldest samples so playback skips ahead instead of
/// lagging further behind the conversation.
pub struct SampleBuffer {
    inner: Arc<Mutex<HeapRb<f32>>>,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HeapRb::new(capacity))),
        }
    }

    pub fn push(&self, samples: &[f32]) {
        let mut buffer = self.inner.lock();
        for &sample in samples {
            if buffer.try_push(sample).is_err() {
                let _ = buffer.try_pop();
                let _ = buffer.try_push(sample);
            }
        }
    }

    /// Fill `out` from the feed; returns how many samples were written
    pub fn pop_into(&self, out: &mut [f32]) -> usize {
        let mut buffer = self.inner.lock();
        let mut written = 0;
        for slot in out.iter_mut() {
            match buffer.try_pop() {
                Some(sample) => {
                    *slot = sample;
                    written += 1;
                }
                None => break,
            }
        }
        written
    }

    /// Discard everything buffered; used on barge-in
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Clone for SampleBuffer {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
