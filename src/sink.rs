//! Render sink seam between the ingestion thread and the visual surface
//!
//! The ingestion loop publishes owned state snapshots through [`RenderSink`]
//! and never waits for rendering. [`ChannelSink`] is the production
//! implementation: a bounded crossbeam channel whose receiving end is owned
//! by whatever thread drives the dashboard widgets. Sends are
//! fire-and-forget; if the renderer falls behind, updates are dropped and
//! counted rather than blocking ingestion.

use crate::state::GridSnapshot;
use crate::types::{Channel, LineSeries, TrailPoint};
use crossbeam_channel::{bounded, Receiver, Sender};

/// One state snapshot published to the renderer
#[derive(Debug, Clone, PartialEq)]
pub enum RenderUpdate {
    /// Replace all line series for one channel
    LineSeries {
        channel: Channel,
        series: Vec<LineSeries>,
    },
    /// Redraw the whole grid
    Grid(GridSnapshot),
    /// Redraw the whole trail
    Trail(Vec<TrailPoint>),
}

/// Consumer of visualization state snapshots
///
/// Implementations must not block the ingestion thread; every payload is an
/// owned copy, so the renderer can hold it as long as it likes.
#[cfg_attr(test, mockall::automock)]
pub trait RenderSink: Send {
    /// Replace the line series shown for `channel`
    fn update_line_series(&mut self, channel: Channel, series: Vec<LineSeries>);

    /// Redraw the grid from a fresh dense snapshot
    fn update_grid(&mut self, snapshot: GridSnapshot);

    /// Redraw the trail from the full point history
    fn update_trail(&mut self, points: Vec<TrailPoint>);
}

/// Channel-backed sink for handing snapshots to a renderer thread
pub struct ChannelSink {
    tx: Sender<RenderUpdate>,
    dropped_updates: u64,
}

impl ChannelSink {
    /// Create a sink and the receiver for the renderer side
    pub fn new(capacity: usize) -> (Self, Receiver<RenderUpdate>) {
        let (tx, rx) = bounded(capacity);
        (
            Self {
                tx,
                dropped_updates: 0,
            },
            rx,
        )
    }

    /// Updates dropped because the renderer queue was full
    pub fn dropped_updates(&self) -> u64 {
        self.dropped_updates
    }

    /// Try to send an update, counting drops if the queue is full
    fn try_send(&mut self, update: RenderUpdate) {
        if self.tx.try_send(update).is_err() {
            self.dropped_updates += 1;
            tracing::trace!("render queue full, dropping update");
        }
    }
}

impl RenderSink for ChannelSink {
    fn update_line_series(&mut self, channel: Channel, series: Vec<LineSeries>) {
        self.try_send(RenderUpdate::LineSeries { channel, series });
    }

    fn update_grid(&mut self, snapshot: GridSnapshot) {
        self.try_send(RenderUpdate::Grid(snapshot));
    }

    fn update_trail(&mut self, points: Vec<TrailPoint>) {
        self.try_send(RenderUpdate::Trail(points));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Grid;

    #[test]
    fn test_channel_sink_delivers_updates() {
        let (mut sink, rx) = ChannelSink::new(16);

        sink.update_trail(vec![[0.5, 1.5]]);
        sink.update_grid(Grid::new(2, 2).snapshot());

        assert_eq!(rx.recv().unwrap(), RenderUpdate::Trail(vec![[0.5, 1.5]]));
        assert!(matches!(rx.recv().unwrap(), RenderUpdate::Grid(_)));
        assert_eq!(sink.dropped_updates(), 0);
    }

    #[test]
    fn test_channel_sink_drops_when_full_without_blocking() {
        let (mut sink, rx) = ChannelSink::new(1);

        sink.update_trail(vec![[1.0, 1.0]]);
        sink.update_trail(vec![[2.0, 2.0]]);
        sink.update_trail(vec![[3.0, 3.0]]);

        assert_eq!(sink.dropped_updates(), 2);
        // Only the first update made it through.
        assert_eq!(rx.recv().unwrap(), RenderUpdate::Trail(vec![[1.0, 1.0]]));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_line_series_update_carries_channel() {
        let (mut sink, rx) = ChannelSink::new(4);
        sink.update_line_series(
            Channel::Conductivity,
            vec![LineSeries {
                label: "1kHz".to_string(),
                points: vec![[0.0, 2.0]],
            }],
        );

        match rx.recv().unwrap() {
            RenderUpdate::LineSeries { channel, series } => {
                assert_eq!(channel, Channel::Conductivity);
                assert_eq!(series.len(), 1);
                assert_eq!(series[0].label, "1kHz");
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }
}
