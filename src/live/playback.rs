//! Gapless scheduling of inbound audio buffers
//!
//! Each buffer starts at `max(clock, cursor)` and the cursor advances by the
//! buffer's duration, so in-order arrivals play back to back with no gap and
//! no overlap regardless of network jitter. An interruption discards every
//! scheduled buffer and rewinds the cursor to zero.

use std::collections::VecDeque;
use std::time::Instant;

/// One buffer placed on the playback timeline
#[derive(Debug, Clone)]
pub struct ScheduledBuffer {
    pub start: f64,
    pub duration: f64,
    pub samples: Vec<f32>,
}

pub struct PlaybackQueue {
    sample_rate: u32,
    cursor: f64,
    scheduled: VecDeque<ScheduledBuffer>,
}

impl PlaybackQueue {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            cursor: 0.0,
            scheduled: VecDeque::new(),
        }
    }

    /// Place a buffer on the timeline; returns its start time
    pub fn schedule(&mut self, clock_now: f64, samples: Vec<f32>) -> f64 {
        let start = clock_now.max(self.cursor);
        let duration = samples.len() as f64 / self.sample_rate as f64;
        self.cursor = start + duration;
        self.scheduled.push_back(ScheduledBuffer {
            start,
            duration,
            samples,
        });
        start
    }

    /// Barge-in: drop everything scheduled and rewind the cursor
    pub fn interrupt(&mut self) {
        self.scheduled.clear();
        self.cursor = 0.0;
    }

    /// Take the next buffer whose start time has been reached
    pub fn pop_due(&mut self, clock_now: f64) -> Option<ScheduledBuffer> {
        if self
            .scheduled
            .front()
            .map(|b| b.start <= clock_now)
            .unwrap_or(false)
        {
            self.scheduled.pop_front()
        } else {
            None
        }
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn pending(&self) -> usize {
        self.scheduled.len()
    }
}

/// Wall-clock for one live session, in seconds since start
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    started: Instant,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}
