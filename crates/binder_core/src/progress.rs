use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Number of recent per-item timings kept for the moving average.
pub const SAMPLE_WINDOW: usize = 5;

/// Derived progress figures for one update call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    /// Completion percentage, rounded to one decimal place.
    pub percent: f64,
    pub elapsed: Duration,
    /// Moving-average remaining-time estimate; zero while the sample
    /// window is empty.
    pub remaining: Duration,
    /// Throughput, rounded to two decimal places; zero while the sample
    /// window is empty.
    pub items_per_sec: f64,
}

impl ProgressStats {
    /// Coarse human form of the remaining estimate, for display.
    pub fn remaining_text(&self) -> String {
        format_duration(self.remaining)
    }
}

/// Tracks elapsed time and estimates time remaining from a bounded window
/// of recent elapsed-per-item observations (FIFO, capacity
/// [`SAMPLE_WINDOW`]). One instance per job; never shared.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    started: Instant,
    samples: VecDeque<Duration>,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self::with_start(total, Instant::now())
    }

    /// Start instant injected for deterministic tests.
    pub fn with_start(total: usize, started: Instant) -> Self {
        Self {
            total,
            started,
            samples: VecDeque::with_capacity(SAMPLE_WINDOW),
        }
    }

    pub fn update(&mut self, completed: usize) -> ProgressStats {
        self.update_at(completed, Instant::now())
    }

    /// As [`update`](Self::update) but with an explicit "now", so tests can
    /// drive the tracker without sleeping.
    pub fn update_at(&mut self, completed: usize, now: Instant) -> ProgressStats {
        let elapsed = now.saturating_duration_since(self.started);
        if self.total == 0 {
            // Degenerate job: nothing to do, report done immediately.
            return ProgressStats {
                percent: 100.0,
                elapsed,
                remaining: Duration::ZERO,
                items_per_sec: 0.0,
            };
        }

        if completed > 0 {
            if self.samples.len() == SAMPLE_WINDOW {
                self.samples.pop_front();
            }
            self.samples.push_back(elapsed / completed as u32);
        }

        let average = self.average_per_item();
        let left = self.total.saturating_sub(completed) as u32;
        let remaining = average * left;
        let items_per_sec = if average > Duration::ZERO {
            round2(1.0 / average.as_secs_f64())
        } else {
            0.0
        };

        ProgressStats {
            percent: round1(100.0 * completed as f64 / self.total as f64),
            elapsed,
            remaining,
            items_per_sec,
        }
    }

    fn average_per_item(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.samples.iter().sum();
        sum / self.samples.len() as u32
    }
}

/// Coarse human duration: seconds under a minute, minutes and seconds
/// under an hour, hours and minutes above that.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
