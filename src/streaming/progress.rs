// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Stream Progress Reporting

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Number of recent chunks the throughput average covers
pub const THROUGHPUT_WINDOW: usize = 8;

/// Snapshot sent after every chunk
#[derive(Debug, Clone, PartialEq)]
pub struct StreamProgress {
    /// Plaintext bytes processed so far
    pub bytes_processed: u64,
    /// Expected plaintext size, when the caller supplied one
    pub total_bytes: Option<u64>,
    pub chunks_processed: u64,
    /// 0-100, only with a known total
    pub percent: Option<f64>,
    /// Rolling average over the last [`THROUGHPUT_WINDOW`] chunks
    pub throughput_bytes_per_sec: f64,
    /// Estimated time remaining, only with a known total and non-zero throughput
    pub eta: Option<Duration>,
}

pub(crate) struct ProgressTracker {
    total: Option<u64>,
    bytes: u64,
    chunks: u64,
    window: VecDeque<(u64, Duration)>,
    last: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(total: Option<u64>) -> Self {
        Self {
            total,
            bytes: 0,
            chunks: 0,
            window: VecDeque::with_capacity(THROUGHPUT_WINDOW),
            last: Instant::now(),
        }
    }

    pub(crate) fn bytes(&self) -> u64 {
        self.bytes
    }

    pub(crate) fn chunks(&self) -> u64 {
        self.chunks
    }

    /// Record a chunk using wall-clock time since the previous one
    pub(crate) fn record(&mut self, bytes: u64) -> StreamProgress {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last);
        self.last = now;
        self.record_elapsed(bytes, elapsed)
    }

    pub(crate) fn record_elapsed(&mut self, bytes: u64, elapsed: Duration) -> StreamProgress {
        self.bytes += bytes;
        self.chunks += 1;

        if self.window.len() == THROUGHPUT_WINDOW {
            self.window.pop_front();
        }
        self.window.push_back((bytes, elapsed));

        let window_bytes: u64 = self.window.iter().map(|(b, _)| b).sum();
        let window_secs: f64 = self.window.iter().map(|(_, d)| d.as_secs_f64()).sum();
        let throughput = if window_secs > 0.0 {
            window_bytes as f64 / window_secs
        } else {
            0.0
        };

        let percent = self.total.map(|total| {
            if total == 0 {
                100.0
            } else {
                (self.bytes as f64 / total as f64 * 100.0).min(100.0)
            }
        });

        let eta = match self.total {
            Some(total) if throughput > 0.0 => {
                let remaining = total.saturating_sub(self.bytes);
                Some(Duration::from_secs_f64(remaining as f64 / throughput))
            }
            _ => None,
        };

        StreamProgress {
            bytes_processed: self.bytes,
            total_bytes: self.total,
            chunks_processed: self.chunks,
            percent,
            throughput_bytes_per_sec: throughput,
            eta,
        }
    }
}
