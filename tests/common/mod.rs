//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

use ebivis::{Channel, GridSnapshot, LineSeries, RenderSink, RenderUpdate, TrailPoint};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Sink that records every update behind a shared handle
///
/// The sink moves into the server; the returned handle stays with the test
/// for inspection.
pub struct SharedRecordingSink {
    updates: Arc<Mutex<Vec<RenderUpdate>>>,
}

impl SharedRecordingSink {
    pub fn new() -> (Self, Arc<Mutex<Vec<RenderUpdate>>>) {
        let updates = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                updates: updates.clone(),
            },
            updates,
        )
    }
}

impl RenderSink for SharedRecordingSink {
    fn update_line_series(&mut self, channel: Channel, series: Vec<LineSeries>) {
        self.updates
            .lock()
            .unwrap()
            .push(RenderUpdate::LineSeries { channel, series });
    }

    fn update_grid(&mut self, snapshot: GridSnapshot) {
        self.updates.lock().unwrap().push(RenderUpdate::Grid(snapshot));
    }

    fn update_trail(&mut self, points: Vec<TrailPoint>) {
        self.updates.lock().unwrap().push(RenderUpdate::Trail(points));
    }
}

/// Poll until `predicate` holds or the timeout elapses
pub fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    predicate()
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
