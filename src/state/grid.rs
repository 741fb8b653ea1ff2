//! Dense prediction grid updated by sparse samples
//!
//! The grid has fixed dimensions for the process lifetime (7x7 in the
//! deployed instrument, configurable here). Each grid sample overwrites one
//! cell; sinks redraw the whole matrix on every update, so applying a sample
//! hands back a full dense snapshot.

use crate::error::{Result, VisError};

/// An owned dense copy of the grid, safe to hand to another thread
#[derive(Debug, Clone, PartialEq)]
pub struct GridSnapshot {
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// Row-major cell values (`cells[y * width + x]`)
    pub cells: Vec<f64>,
}

impl GridSnapshot {
    /// Cell value at `(x, y)`, if inside the grid
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x < self.width && y < self.height {
            Some(self.cells[y * self.width + x])
        } else {
            None
        }
    }
}

/// The live grid, owned by the ingestion thread
///
/// Cells start at 0.0 and are last-write-wins.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<f64>,
}

impl Grid {
    /// Create a zeroed grid with the given dimensions
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0.0; width * height],
        }
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.height
    }

    /// Apply one sparse sample and return the updated dense snapshot
    ///
    /// Coordinates outside `[0, dim)` on either axis fail with
    /// [`VisError::OutOfRange`] and leave the grid untouched.
    pub fn apply(&mut self, x: i32, y: i32, value: f64) -> Result<GridSnapshot> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return Err(VisError::OutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        self.cells[y as usize * self.width + x as usize] = value;
        Ok(self.snapshot())
    }

    /// A dense copy of the current state
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            width: self.width,
            height: self.height,
            cells: self.cells.clone(),
        }
    }
}
