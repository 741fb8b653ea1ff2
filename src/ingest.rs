//! TCP ingestion loop
//!
//! This module contains the blocking accept/read loop that feeds the
//! visualization state. It owns every store and the render sink; nothing
//! else mutates them.
//!
//! # Connection policy
//!
//! One client at a time, explicitly: the instrument controller is the only
//! expected peer, so the loop accepts a connection, serves it until it
//! closes or faults, and only then returns to accepting. A second client
//! waits in the OS backlog meanwhile.
//!
//! # Framing
//!
//! One socket read is one logical message. There is no length prefix, no
//! delimiter scanning, and no buffering across reads; the sender writes each
//! message in a single send on a loopback link.
//!
//! # Failure policy
//!
//! Per-message failures (decode errors, out-of-range grid cells) are logged,
//! counted, and skipped; the connection lives on. Transport errors end the
//! connection and the loop re-enters accept. A bind failure is fatal and
//! surfaces out of [`IngestServer::run`].

use crate::config::AppConfig;
use crate::error::{Result, VisError};
use crate::protocol::{decode, Message};
use crate::sink::RenderSink;
use crate::state::{Grid, SeriesStore, Trail};
use crate::types::{FrequencyLabels, IngestStats};
use std::io::Read;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How often accumulated ingest statistics are logged
const STATS_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// The ingestion server: listener, stores, and sink in one place
///
/// All state lives on the thread that calls [`IngestServer::run`]; snapshots
/// handed to the sink are owned copies, so no locking is needed anywhere.
pub struct IngestServer<S: RenderSink> {
    /// Application configuration
    config: AppConfig,
    /// Per-channel frequency series
    series: SeriesStore,
    /// Dense prediction grid
    grid: Grid,
    /// Position history
    trail: Trail,
    /// Presentation labels for frequency bins
    labels: FrequencyLabels,
    /// Destination for state snapshots
    sink: S,
    /// Running flag, checked between connections and between reads
    running: Arc<AtomicBool>,
    /// Counters surfaced via periodic debug logging
    stats: IngestStats,
    /// Last time stats were logged
    last_stats_log: Instant,
}

impl<S: RenderSink> IngestServer<S> {
    /// Create a server from configuration
    ///
    /// The stores are sized from the config and live until the server is
    /// dropped; reconnects do not reset them.
    pub fn new(config: AppConfig, sink: S, running: Arc<AtomicBool>) -> Self {
        let grid = Grid::new(config.grid.width, config.grid.height);
        let trail = Trail::new(config.trail.max_points);
        let labels = config.frequency_labels();

        Self {
            config,
            series: SeriesStore::new(),
            grid,
            trail,
            labels,
            sink,
            running,
            stats: IngestStats::default(),
            last_stats_log: Instant::now(),
        }
    }

    /// Bind the listener and serve until the running flag clears
    pub fn run(&mut self) -> Result<()> {
        let listener = self.bind()?;
        self.serve(listener)
    }

    /// Bind the configured listen address
    ///
    /// Failure here is fatal for the process; the loop never starts.
    pub fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.listen.addr;
        let listener = TcpListener::bind(addr).map_err(|e| VisError::Bind { addr, source: e })?;
        tracing::info!("listening on {}", addr);
        Ok(listener)
    }

    /// Accept and serve clients, one at a time
    pub fn serve(&mut self, listener: TcpListener) -> Result<()> {
        while self.running.load(Ordering::SeqCst) {
            let (stream, peer) = match listener.accept() {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!("accept failed: {}", e);
                    continue;
                }
            };

            self.stats.connections_accepted += 1;
            tracing::info!("client connected from {}", peer);

            match self.serve_client(stream) {
                Ok(()) => tracing::info!("client {} disconnected", peer),
                Err(e) => tracing::warn!("connection to {} ended: {}", peer, e),
            }
        }
        Ok(())
    }

    /// Read and dispatch messages from one client until it goes away
    fn serve_client(&mut self, mut stream: TcpStream) -> Result<()> {
        stream.set_read_timeout(self.config.ingest.read_timeout())?;
        let mut buf = vec![0u8; self.config.ingest.read_buffer_size];

        while self.running.load(Ordering::SeqCst) {
            match stream.read(&mut buf) {
                // Orderly close from the peer.
                Ok(0) => return Ok(()),
                Ok(n) => {
                    self.stats.bytes_read += n as u64;
                    // The sender's encoder never fails here; lossy decoding
                    // substitutes rather than killing the connection.
                    let payload = String::from_utf8_lossy(&buf[..n]).into_owned();
                    self.handle_payload(&payload);
                }
                Err(e) => return Err(VisError::Transport(e)),
            }
        }
        Ok(())
    }

    /// Decode and apply one payload, absorbing per-message failures
    pub fn handle_payload(&mut self, payload: &str) {
        match self.dispatch(payload) {
            Ok(()) => self.stats.messages_applied += 1,
            Err(e) if e.is_per_message() => {
                if matches!(e, VisError::Protocol(_)) {
                    self.stats.decode_errors += 1;
                } else {
                    self.stats.apply_errors += 1;
                }
                tracing::warn!("dropping message: {}", e);
            }
            Err(e) => {
                // Nothing below dispatch produces other kinds today.
                self.stats.apply_errors += 1;
                tracing::error!("unexpected dispatch failure: {}", e);
            }
        }

        if self.last_stats_log.elapsed() >= STATS_LOG_INTERVAL {
            self.log_stats();
            self.last_stats_log = Instant::now();
        }
    }

    /// Route a decoded message to its store and publish the result
    fn dispatch(&mut self, payload: &str) -> Result<()> {
        match decode(payload)? {
            Message::ChannelBatch { channel, groups } => {
                // Each batch carries the channel's full history, so the view
                // is rebuilt from scratch before applying.
                self.series.clear(channel);
                self.series.apply(channel, &groups);
                let series = self.series.line_series(channel, &self.labels);
                self.sink.update_line_series(channel, series);
            }
            Message::GridSample { x, y, value } => {
                let snapshot = self.grid.apply(x, y, value)?;
                self.sink.update_grid(snapshot);
            }
            Message::TrailSample { x, y } => {
                let points = self.trail.append(x, y);
                self.sink.update_trail(points);
            }
        }
        Ok(())
    }

    fn log_stats(&self) {
        tracing::debug!(
            "ingest stats: {} connections, {} applied, {} decode errors, {} apply errors, {} bytes, {:.1}% ok",
            self.stats.connections_accepted,
            self.stats.messages_applied,
            self.stats.decode_errors,
            self.stats.apply_errors,
            self.stats.bytes_read,
            self.stats.success_rate(),
        );
    }

    /// Current counters
    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// The live series store (read-only)
    pub fn series(&self) -> &SeriesStore {
        &self.series
    }

    /// The live grid (read-only)
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The live trail (read-only)
    pub fn trail(&self) -> &Trail {
        &self.trail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{MockRenderSink, RenderUpdate};
    use crate::state::GridSnapshot;
    use crate::types::{Channel, LineSeries, TrailPoint};

    /// Sink that records every update for inspection
    #[derive(Default)]
    struct RecordingSink {
        updates: Vec<RenderUpdate>,
    }

    impl RenderSink for RecordingSink {
        fn update_line_series(&mut self, channel: Channel, series: Vec<LineSeries>) {
            self.updates.push(RenderUpdate::LineSeries { channel, series });
        }

        fn update_grid(&mut self, snapshot: GridSnapshot) {
            self.updates.push(RenderUpdate::Grid(snapshot));
        }

        fn update_trail(&mut self, points: Vec<TrailPoint>) {
            self.updates.push(RenderUpdate::Trail(points));
        }
    }

    fn create_test_server() -> IngestServer<RecordingSink> {
        let running = Arc::new(AtomicBool::new(true));
        IngestServer::new(AppConfig::default(), RecordingSink::default(), running)
    }

    #[test]
    fn test_batch_rebuilds_series_view() {
        let mut server = create_test_server();

        server.handle_payload("C[1;2|3;4]");
        assert_eq!(server.series().bin_count(Channel::Conductivity), 2);
        assert_eq!(
            server.series().samples(Channel::Conductivity, 0),
            Some(&[1.0, 3.0][..])
        );
        assert_eq!(
            server.series().samples(Channel::Conductivity, 1),
            Some(&[2.0, 4.0][..])
        );

        // A later batch replaces the view instead of extending it.
        server.handle_payload("C[9;8]");
        assert_eq!(
            server.series().samples(Channel::Conductivity, 0),
            Some(&[9.0][..])
        );
        assert_eq!(server.stats().messages_applied, 2);
    }

    #[test]
    fn test_batch_publishes_labeled_series() {
        let mut server = create_test_server();
        server.handle_payload("R[1;2]");

        assert_eq!(server.sink.updates.len(), 1);
        match &server.sink.updates[0] {
            RenderUpdate::LineSeries { channel, series } => {
                assert_eq!(*channel, Channel::Raw);
                assert_eq!(series.len(), 2);
                assert_eq!(series[0].label, "1kHz");
                assert_eq!(series[0].points, vec![[0.0, 1.0]]);
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[test]
    fn test_grid_sample_publishes_snapshot() {
        let mut server = create_test_server();
        server.handle_payload("P[2;3;1.5]");

        assert_eq!(server.grid().snapshot().get(2, 3), Some(1.5));
        match &server.sink.updates[0] {
            RenderUpdate::Grid(snapshot) => assert_eq!(snapshot.get(2, 3), Some(1.5)),
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[test]
    fn test_trail_sample_publishes_full_history() {
        let mut server = create_test_server();
        server.handle_payload("A[0.5;1.5]");
        server.handle_payload("A[2.5;3.5]");

        assert_eq!(server.trail().len(), 2);
        assert_eq!(
            server.sink.updates[1],
            RenderUpdate::Trail(vec![[0.5, 1.5], [2.5, 3.5]])
        );
    }

    #[test]
    fn test_unknown_tag_is_counted_and_skipped() {
        let mut server = create_test_server();
        server.handle_payload("Z[1;2]");

        assert_eq!(server.stats().decode_errors, 1);
        assert_eq!(server.stats().messages_applied, 0);
        assert!(server.sink.updates.is_empty());
        assert!(server.trail().is_empty());
    }

    #[test]
    fn test_out_of_range_grid_sample_is_counted_and_skipped() {
        let mut server = create_test_server();
        server.handle_payload("P[7;0;1.0]");

        assert_eq!(server.stats().apply_errors, 1);
        assert!(server.sink.updates.is_empty());
        // The grid is untouched.
        assert!(server.grid().snapshot().cells.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_errors_do_not_stop_later_messages() {
        let mut server = create_test_server();
        server.handle_payload("Z junk");
        server.handle_payload("P[99;99;1.0]");
        server.handle_payload("A[1.0;2.0]");

        assert_eq!(server.stats().decode_errors, 1);
        assert_eq!(server.stats().apply_errors, 1);
        assert_eq!(server.stats().messages_applied, 1);
        assert_eq!(server.trail().len(), 1);
    }

    #[test]
    fn test_dispatch_with_mock_sink() {
        let mut sink = MockRenderSink::new();
        sink.expect_update_grid()
            .withf(|snapshot| snapshot.get(1, 1) == Some(2.5))
            .times(1)
            .return_const(());

        let running = Arc::new(AtomicBool::new(true));
        let mut server = IngestServer::new(AppConfig::default(), sink, running);
        server.handle_payload("P[1;1;2.5]");
    }

    #[test]
    fn test_bind_error_is_fatal() {
        // Port 1 on loopback is essentially never bindable for a test user;
        // if it somehow is, the occupied-port fallback below still applies.
        let mut config = AppConfig::default();
        config.listen.addr = "127.0.0.1:1".parse().unwrap();

        let running = Arc::new(AtomicBool::new(true));
        let server = IngestServer::new(config, RecordingSink::default(), running);
        match server.bind() {
            Err(VisError::Bind { addr, .. }) => {
                assert_eq!(addr.port(), 1);
            }
            Ok(_) => {
                // Running as a privileged user; occupy the port and retry.
                let mut config = AppConfig::default();
                let holder = TcpListener::bind("127.0.0.1:0").unwrap();
                config.listen.addr = holder.local_addr().unwrap();
                let running = Arc::new(AtomicBool::new(true));
                let server = IngestServer::new(config, RecordingSink::default(), running);
                // Binding an already-bound port must fail.
                assert!(matches!(server.bind(), Err(VisError::Bind { .. })));
            }
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }

    #[test]
    fn test_lossily_decoded_payload_still_applies() {
        // serve_client feeds handle_payload lossily-decoded text; simulate
        // the substitution result here.
        let mut server = create_test_server();
        let lossy = String::from_utf8_lossy(b"A[1.0;2.0]").into_owned();
        server.handle_payload(&lossy);
        assert_eq!(server.stats().messages_applied, 1);
    }
}
