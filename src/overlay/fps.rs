//! Frame time averaging for the overlay readout

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Number of frames averaged
const WINDOW: usize = 120;

pub struct FrameTimer {
    last: Option<Instant>,
    samples: VecDeque<Duration>,
    total: Duration,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last: None,
            samples: VecDeque::with_capacity(WINDOW),
            total: Duration::ZERO,
        }
    }

    /// Record a frame boundary at `now`
    pub fn tick(&mut self, now: Instant) {
        if let Some(last) = self.last {
            let delta = now.saturating_duration_since(last);
            if self.samples.len() == WINDOW {
                if let Some(oldest) = self.samples.pop_front() {
                    self.total -= oldest;
                }
            }
            self.samples.push_back(delta);
            self.total += delta;
        }
        self.last = Some(now);
    }

    /// Average frame time in milliseconds, 0 before two ticks
    pub fn average_ms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.total.as_secs_f32() * 1000.0 / self.samples.len() as f32
    }

    pub fn fps(&self) -> f32 {
        let ms = self.average_ms();
        if ms > 0.0 { 1000.0 / ms } else { 0.0 }
    }
}
