//! In-process data source.
//!
//! A producer running in the same process (a simulator, a gateway task)
//! publishes whole batches through a tokio watch channel.

use tokio::sync::watch;

use super::{DataSource, RawBatch};

/// A data source fed by a watch channel.
///
/// Only the most recently published batch is kept; a batch published
/// while the previous one has not been polled replaces it. Once every
/// sender is dropped the source reports the producer as disconnected,
/// after delivering any batch it had not yet returned.
///
/// # Example
///
/// ```
/// use vitalwatch::{ChannelSource, DataSource};
/// use serde_json::json;
///
/// let (tx, mut source) = ChannelSource::create("ward-3 gateway");
/// tx.send(vec![json!({"id": 1})]).unwrap();
/// assert_eq!(source.poll().map(|batch| batch.len()), Some(1));
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<RawBatch>,
    description: String,
    disconnected: bool,
}

impl ChannelSource {
    pub fn new(receiver: watch::Receiver<RawBatch>, producer: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", producer),
            disconnected: false,
        }
    }

    /// A connected sender and source pair.
    pub fn create(producer: &str) -> (watch::Sender<RawBatch>, Self) {
        let (tx, rx) = watch::channel(RawBatch::new());
        (tx, Self::new(rx, producer))
    }
}

impl DataSource for ChannelSource {
    fn poll(&mut self) -> Option<RawBatch> {
        match self.receiver.has_changed() {
            Ok(true) => Some(self.receiver.borrow_and_update().clone()),
            Ok(false) => None,
            Err(_) => {
                if !self.disconnected {
                    tracing::warn!("{}: producer disconnected", self.description);
                    self.disconnected = true;
                }
                let last = self.receiver.borrow_and_update();
                if last.has_changed() {
                    Some(RawBatch::clone(&last))
                } else {
                    None
                }
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.disconnected.then(|| "Producer disconnected".to_string())
    }
}
