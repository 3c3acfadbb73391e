use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};
use crate::models::error::StoreError;

struct AppendRequest {
    line: Vec<u8>,
    done: oneshot::Sender<io::Result<()>>,
}

/// Append-only log holding one JSON document per line.
///
/// Appends are funnelled through a single writer task, so every line reaches the
/// file with one `write_all` and lines from concurrent callers never interleave.
/// A call returns only after its line was flushed and synced to disk. A line whose
/// write fails is cut off again, so a failed append never shows up in reads.
pub struct JsonLines {
    path: PathBuf,
    writer: mpsc::Sender<AppendRequest>,
}

impl JsonLines {
    pub async fn open(path: impl Into<PathBuf>, queue: usize) -> Result<Self, StoreError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        let torn = ends_mid_line(&path).await?;
        if torn {
            warn!("{} ends with an unterminated record", path.display());
        }

        Ok(Self::spawn(path, file, torn, queue))
    }

    fn spawn<S: LineSink>(path: PathBuf, sink: S, torn: bool, queue: usize) -> Self {
        let (writer, pending) = mpsc::channel(queue.max(1));
        tokio::spawn(LineWriter { sink, pending, torn }.run_actor());
        Self { path, writer }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append<T: Serialize>(&self, record: &T) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let (done, written) = oneshot::channel();
        self.writer.send(AppendRequest { line, done }).await
            .map_err(|_| StoreError::Closed)?;
        written.await.map_err(|_| StoreError::Closed)??;
        Ok(())
    }

    /// Reads every well-formed line in append order. Lines that do not parse as
    /// JSON are logged and skipped. A log that was never written reads as empty.
    pub async fn read_values(&self) -> Result<Vec<Value>, StoreError> {
        let file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut segments = BufReader::new(file).split(b'\n');
        let mut values = Vec::new();
        let mut line_number = 0usize;
        while let Some(segment) = segments.next_segment().await? {
            line_number += 1;
            if segment.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<Value>(&segment) {
                Ok(value) => values.push(value),
                Err(e) => warn!("skipping malformed record at {}:{}: {}", self.path.display(), line_number, e),
            }
        }
        Ok(values)
    }
}

async fn ends_mid_line(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path).await?;
    if file.metadata().await?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] != b'\n')
}

/// Destination of the writer task.
#[async_trait]
trait LineSink: Send + 'static {
    async fn committed_len(&mut self) -> io::Result<u64>;

    /// Writes the bytes and makes them durable.
    async fn append(&mut self, bytes: &[u8]) -> io::Result<()>;

    async fn truncate(&mut self, len: u64) -> io::Result<()>;
}

#[async_trait]
impl LineSink for File {
    async fn committed_len(&mut self) -> io::Result<u64> {
        Ok(self.metadata().await?.len())
    }

    async fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes).await?;
        self.flush().await?;
        self.sync_data().await
    }

    async fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len).await?;
        self.sync_data().await
    }
}

struct LineWriter<S> {
    sink: S,
    pending: mpsc::Receiver<AppendRequest>,
    // set when the file may end in a partial line
    torn: bool,
}

impl<S: LineSink> LineWriter<S> {
    async fn run_actor(mut self) {
        while let Some(AppendRequest { line, done }) = self.pending.recv().await {
            let result = self.write_line(line).await;
            if let Err(e) = &result {
                error!("append failed: {}", e);
            }
            done.send(result).ok();
        }
        debug!("line writer stopped");
    }

    async fn write_line(&mut self, mut line: Vec<u8>) -> io::Result<()> {
        let committed = self.sink.committed_len().await?;
        if self.torn {
            line.insert(0, b'\n');
        }
        if let Err(e) = self.sink.append(&line).await {
            if let Err(rollback) = self.sink.truncate(committed).await {
                error!("unable to cut off failed append: {}", rollback);
                self.torn = true;
            }
            return Err(e);
        }
        self.torn = false;
        Ok(())
    }
}
