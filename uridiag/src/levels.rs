//! Shared measurement state between the audio loop and the foreground
//!
//! Targets flow in, measured levels flow out, with most-recent-value
//! semantics on both sides. The exchange is a pair of independently updated
//! atomic scalars rather than a lock: a reader may see values one audio
//! block stale, which is fine for a human display and for sequencers that
//! sit behind a one-second settle window.

use std::{
    future::Future,
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::dsp::analyzer::BlockLevels;

#[derive(Debug, Default)]
pub struct SharedLevels {
    freq1: AtomicU32,
    freq2: AtomicU32,
    overall: AtomicU32,
    left: AtomicU32,
    right: AtomicU32,
}

impl SharedLevels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes new tone targets; zero silences a channel
    pub fn set_targets(&self, freq1: f32, freq2: f32) {
        self.freq1.store(freq1.to_bits(), Ordering::Relaxed);
        self.freq2.store(freq2.to_bits(), Ordering::Relaxed);
    }

    pub fn targets(&self) -> (f32, f32) {
        (
            f32::from_bits(self.freq1.load(Ordering::Relaxed)),
            f32::from_bits(self.freq2.load(Ordering::Relaxed)),
        )
    }

    /// Called by the audio loop after analyzing each block
    pub fn publish(&self, levels: BlockLevels) {
        self.overall.store(levels.overall.to_bits(), Ordering::Relaxed);
        self.left.store(levels.left.to_bits(), Ordering::Relaxed);
        self.right.store(levels.right.to_bits(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LevelSnapshot {
        LevelSnapshot {
            overall: f32::from_bits(self.overall.load(Ordering::Relaxed)),
            left: f32::from_bits(self.left.load(Ordering::Relaxed)),
            right: f32::from_bits(self.right.load(Ordering::Relaxed)),
        }
    }
}

/// Most recent output of the spectral analyzer, in display units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub overall: f32,
    /// Selective level around the first (left channel) target
    pub left: f32,
    /// Selective level around the second (right channel) target
    pub right: f32,
}

/// Feeds level snapshots to `sink` on a fixed interval until `cancel`
/// resolves. The interactive front end passes a future that resolves on the
/// first keystroke; tests pass a sleep.
pub async fn monitor_levels<F>(
    levels: &SharedLevels,
    interval: Duration,
    cancel: impl Future<Output = ()>,
    mut sink: F,
) where
    F: FnMut(LevelSnapshot),
{
    tokio::pin!(cancel);
    loop {
        tokio::select! {
            _ = &mut cancel => break,
            _ = tokio::time::sleep(interval) => sink(levels.snapshot()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn targets_roundtrip() {
        let levels = SharedLevels::new();
        levels.set_targets(1004.0, 204.0);
        assert_eq!(levels.targets(), (1004.0, 204.0));
    }

    #[test]
    fn snapshot_reflects_last_publish() {
        let levels = SharedLevels::new();
        levels.publish(BlockLevels {
            overall: 550.0,
            left: 540.0,
            right: 0.0,
        });
        levels.publish(BlockLevels {
            overall: 117.0,
            left: 110.0,
            right: 5.0,
        });
        let snap = levels.snapshot();
        assert_eq!((snap.overall, snap.left, snap.right), (117.0, 110.0, 5.0));
    }

    #[tokio::test]
    async fn monitor_stops_on_cancel() {
        let levels = SharedLevels::new();
        levels.publish(BlockLevels {
            overall: 42.0,
            left: 0.0,
            right: 0.0,
        });

        let mut seen = Vec::new();
        monitor_levels(
            &levels,
            Duration::from_millis(5),
            tokio::time::sleep(Duration::from_millis(40)),
            |snap| seen.push(snap),
        )
        .await;

        assert!(!seen.is_empty());
        assert_eq!(seen[0].overall, 42.0);
    }
}
