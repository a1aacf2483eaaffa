//! Stream-based data source.
//!
//! Receives snapshots from an async byte stream, such as a TCP connection
//! to a device gateway or connections accepted from bedside devices.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::mpsc;

use super::{parse_batch, parse_batch_slice, DataSource, LatestByPatient, RawBatch};

/// Pause after a failed accept. Errors such as EMFILE persist until a
/// connection closes, so retrying immediately only spins.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A data source that receives snapshots from an async stream.
///
/// Each newline-delimited JSON line holds one snapshot or an array of
/// them. The source keeps the latest snapshot per patient, and `poll()`
/// returns that latest-per-patient batch whenever anything new arrived.
///
/// # Example with a byte stream
///
/// ```
/// use std::io::Cursor;
/// use vitalwatch::StreamSource;
///
/// # tokio_test::block_on(async {
/// let data = b"{\"id\": 1}\n";
/// let stream = Cursor::new(data.to_vec());
/// let source = StreamSource::spawn(stream, "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<RawBatch>,
    description: String,
    latest: LatestByPatient,
    last_error: Arc<Mutex<Option<String>>>,
}

impl StreamSource {
    /// Spawn a background task that reads from the given async reader.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        let last_error = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        *error_handle.lock() = Some("Connection closed".to_string());
                        break;
                    }
                    Ok(_) if line.trim().is_empty() => {}
                    Ok(_) => match parse_batch(line.trim()) {
                        Ok(batch) => {
                            *error_handle.lock() = None;
                            if tx.send(batch).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Skipping unparsable line: {}", e);
                            *error_handle.lock() = Some(format!("Parse error: {}", e));
                        }
                    },
                    Err(e) => {
                        *error_handle.lock() = Some(format!("Read error: {}", e));
                        break;
                    }
                }
            }
        });

        Self::with_receiver(rx, format!("stream: {}", description), last_error)
    }

    /// Create a StreamSource from a channel of raw JSON payloads.
    ///
    /// Each message is parsed as one snapshot or an array of snapshots.
    pub fn from_bytes_channel(mut rx: mpsc::Receiver<Vec<u8>>, description: &str) -> Self {
        let (tx, batch_rx) = mpsc::channel(16);
        let last_error = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();

        tokio::spawn(async move {
            while let Some(bytes) = rx.recv().await {
                match parse_batch_slice(&bytes) {
                    Ok(batch) => {
                        *error_handle.lock() = None;
                        if tx.send(batch).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Skipping unparsable payload: {}", e);
                        *error_handle.lock() = Some(format!("Parse error: {}", e));
                    }
                }
            }
        });

        Self::with_receiver(batch_rx, format!("stream: {}", description), last_error)
    }

    /// Listen for device connections and merge their feeds.
    ///
    /// Every accepted connection sends newline-delimited JSON snapshots.
    pub async fn listen<A: ToSocketAddrs>(addr: A, description: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local = listener.local_addr()?;
        tracing::info!("Listening for devices on {}", local);

        let (tx, rx) = mpsc::channel::<Vec<u8>>(64);
        tokio::spawn(async move {
            loop {
                let (socket, peer) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::error!("Accept failed: {}", e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                };
                tracing::info!("New device connection from {}", peer);

                let tx = tx.clone();
                tokio::spawn(async move {
                    let mut lines = BufReader::new(socket).lines();
                    loop {
                        match lines.next_line().await {
                            Ok(Some(line)) if line.trim().is_empty() => {}
                            Ok(Some(line)) => {
                                if tx.send(line.into_bytes()).await.is_err() {
                                    break;
                                }
                            }
                            Ok(None) => break,
                            Err(e) => {
                                tracing::warn!("Error reading from {}: {}", peer, e);
                                break;
                            }
                        }
                    }
                    tracing::info!("Device {} disconnected", peer);
                });
            }
        });

        Ok(Self::from_bytes_channel(rx, &format!("{} ({})", description, local)))
    }

    fn with_receiver(
        receiver: mpsc::Receiver<RawBatch>,
        description: String,
        last_error: Arc<Mutex<Option<String>>>,
    ) -> Self {
        Self {
            receiver,
            description,
            latest: LatestByPatient::new(),
            last_error,
        }
    }
}

impl DataSource for StreamSource {
    fn poll(&mut self) -> Option<RawBatch> {
        let mut received = false;
        loop {
            match self.receiver.try_recv() {
                Ok(batch) => {
                    self.latest.merge(batch);
                    received = true;
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    let mut error = self.last_error.lock();
                    if error.is_none() {
                        *error = Some("Stream disconnected".to_string());
                    }
                    break;
                }
            }
        }

        received.then(|| self.latest.batch())
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}
