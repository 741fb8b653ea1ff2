//! Active-search position trail
//!
//! The controller reports each probe position it visits; the dashboard
//! redraws the whole history on every update. The source appends forever,
//! so the retention bound is an explicit configuration choice: `None`
//! preserves the deployed unbounded behavior, `Some(n)` evicts the oldest
//! points once `n` is reached.

use crate::types::TrailPoint;
use std::collections::VecDeque;

/// Append-only 2-D point history with an optional retention bound
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<TrailPoint>,
    max_points: Option<usize>,
}

impl Trail {
    /// Create an empty trail
    ///
    /// `max_points: None` keeps every point for the process lifetime.
    pub fn new(max_points: Option<usize>) -> Self {
        Self {
            points: VecDeque::new(),
            max_points,
        }
    }

    /// Append a point and return the full history so far
    ///
    /// Accepts any real pair; there is nothing to validate. The returned
    /// sequence is an owned copy for the sink to redraw in full.
    pub fn append(&mut self, x: f64, y: f64) -> Vec<TrailPoint> {
        if let Some(max) = self.max_points {
            while self.points.len() >= max.max(1) {
                self.points.pop_front();
            }
        }
        self.points.push_back([x, y]);
        self.points()
    }

    /// The full history as an owned copy
    pub fn points(&self) -> Vec<TrailPoint> {
        self.points.iter().copied().collect()
    }

    /// Number of points currently held
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no point has been appended yet
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
