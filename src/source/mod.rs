//! Data source abstraction for receiving patient snapshot batches.
//!
//! Sources stand in for the transport that delivers readings: a JSON file
//! rewritten by a collector, a TCP feed of bedside devices, or an
//! in-process channel. They only deliver raw batches; validation and
//! evaluation happen in the [`Aggregator`](crate::Aggregator).

mod channel;
mod file;
mod snapshot;
mod stream;

pub use channel::ChannelSource;
pub use file::FileSource;
pub use snapshot::{parse_batch, parse_batch_slice, LatestByPatient, RawBatch};
pub use stream::StreamSource;

use std::fmt::Debug;

/// Trait for receiving snapshot batches from various sources.
///
/// # Example
///
/// ```
/// use vitalwatch::{DataSource, FileSource};
///
/// let mut source = FileSource::new("vitals.json");
/// if let Some(batch) = source.poll() {
///     println!("Got {} snapshots", batch.len());
/// }
/// ```
pub trait DataSource: Send + Debug {
    /// Poll for the latest batch.
    ///
    /// Returns `Some(batch)` if new data is available, `None` otherwise.
    /// This method should be non-blocking.
    fn poll(&mut self) -> Option<RawBatch>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;

    /// The error from the most recent read attempt, if it failed.
    fn error(&self) -> Option<String>;
}
