//! # ebivis: bioimpedance dashboard ingestion core
//!
//! Receives measurement messages from an instrument controller over a local
//! TCP connection and maintains the live state behind an operator dashboard:
//! per-frequency line series for two channels, a dense prediction grid, and
//! the active-search position trail. Rendering itself is external; the core
//! publishes owned state snapshots through a sink trait.
//!
//! ## Architecture
//!
//! - **Protocol**: decodes the controller's compact text wire format into
//!   typed messages
//! - **State**: series store, grid, and trail owned by the ingestion thread
//! - **Ingest**: blocking accept/read loop, one client and one message per
//!   read at a time
//! - **Sink**: crossbeam-channel hand-off of snapshots to the renderer
//!   thread, fire-and-forget
//!
//! ## Example
//!
//! ```ignore
//! use ebivis::{AppConfig, ChannelSink, IngestServer};
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//!
//! fn main() -> ebivis::Result<()> {
//!     let config = AppConfig::default();
//!     let (sink, updates) = ChannelSink::new(64);
//!
//!     // The renderer thread drains `updates` and redraws.
//!     std::thread::spawn(move || {
//!         for update in updates {
//!             // hand to the plotting widgets
//!             let _ = update;
//!         }
//!     });
//!
//!     let running = Arc::new(AtomicBool::new(true));
//!     IngestServer::new(config, sink, running).run()
//! }
//! ```

pub mod config;
pub mod error;
pub mod ingest;
pub mod protocol;
pub mod sink;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{ProtocolError, Result, VisError};
pub use ingest::IngestServer;
pub use protocol::{decode, Message};
pub use sink::{ChannelSink, RenderSink, RenderUpdate};
pub use state::{Grid, GridSnapshot, SeriesStore, Trail};
pub use types::{Channel, FrequencyLabels, IngestStats, LineSeries, TrailPoint};
