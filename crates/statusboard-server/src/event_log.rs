use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use statusboard_core::StatusEvent;
use statusboard_core::events::{IDLE, WORKING};
use tokio::sync::{Mutex, broadcast};

/// Default broadcast channel capacity for appended-record fan-out.
const DEFAULT_BROADCAST_CAPACITY: usize = 1024;

/// Agent marked working when an empty log is seeded.
pub const SEED_WORKING_AGENT: &str = "Time Tracking Agent";

/// Append-only CSV status log with broadcast fan-out of appended rows.
///
/// The file is the source of truth; nothing is cached in memory, so rows
/// appended by other writers are picked up on the next read. File access
/// runs on the blocking pool. Appends are serialised so a new file gets
/// exactly one header.
pub struct EventLog {
    path: PathBuf,
    broadcast_tx: broadcast::Sender<StatusEvent>,
    append_lock: Mutex<()>,
}

impl EventLog {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_capacity(path, DEFAULT_BROADCAST_CAPACITY)
    }

    pub fn with_capacity(path: impl Into<PathBuf>, broadcast_capacity: usize) -> Self {
        let (broadcast_tx, _) = broadcast::channel(broadcast_capacity.max(1));
        Self {
            path: path.into(),
            broadcast_tx,
            append_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every row in file order. See [`read_rows`].
    pub async fn read_all(&self) -> Vec<StatusEvent> {
        let path = self.path.clone();
        match tokio::task::spawn_blocking(move || read_rows(&path)).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("Event log reader task failed: {e}");
                Vec::new()
            },
        }
    }

    /// Append one row, then broadcast it to subscribers.
    pub async fn append(&self, event: &StatusEvent) -> Result<(), csv::Error> {
        let _guard = self.append_lock.lock().await;
        self.append_locked(event).await
    }

    async fn append_locked(&self, event: &StatusEvent) -> Result<(), csv::Error> {
        let path = self.path.clone();
        let row = event.clone();
        tokio::task::spawn_blocking(move || append_row(&path, &row))
            .await
            .map_err(|e| csv::Error::from(io::Error::other(e)))??;

        tracing::debug!(agent = %event.agent_name, status = %event.status, "Appended status row");
        // No subscribers is not an error
        let _ = self.broadcast_tx.send(event.clone());
        Ok(())
    }

    /// Write an initial row for every agent if the log has no rows yet.
    /// Returns the number of rows written.
    pub async fn seed_if_empty(&self, agents: &[String]) -> Result<usize, csv::Error> {
        let _guard = self.append_lock.lock().await;
        if agents.is_empty() || !self.read_all().await.is_empty() {
            return Ok(0);
        }

        let working = agents
            .iter()
            .find(|a| a.as_str() == SEED_WORKING_AGENT)
            .or_else(|| agents.last())
            .map(String::as_str);

        for agent in agents {
            let status = if Some(agent.as_str()) == working {
                WORKING
            } else {
                IDLE
            };
            self.append_locked(&StatusEvent::now(agent.as_str(), status)).await?;
        }
        tracing::info!(path = %self.path.display(), rows = agents.len(), "Seeded empty event log");
        Ok(agents.len())
    }

    /// Current file size in bytes; 0 if the file does not exist yet.
    pub async fn size_bytes(&self) -> u64 {
        tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.len())
            .unwrap_or(0)
    }

    /// Subscribe to rows appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.broadcast_tx.subscribe()
    }
}

/// Column positions, taken from the header row.
struct Columns {
    timestamp: usize,
    agent_name: usize,
    status: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let find = |name: &str, fallback: usize| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .unwrap_or(fallback)
        };
        Self {
            timestamp: find("timestamp", 0),
            agent_name: find("agent_name", 1),
            status: find("status", 2),
        }
    }

    /// Missing trailing fields read as empty strings.
    fn row(&self, record: &csv::StringRecord) -> StatusEvent {
        let field = |i: usize| record.get(i).unwrap_or_default().to_string();
        StatusEvent {
            timestamp: field(self.timestamp),
            agent_name: field(self.agent_name),
            status: field(self.status),
        }
    }
}

/// Blocking read of every row in file order. A missing file reads as empty.
/// Short rows keep the fields they have; rows that are not valid UTF-8 are
/// skipped. An I/O error ends the read with the rows decoded so far.
pub fn read_rows(path: &Path) -> Vec<StatusEvent> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::error!(path = %path.display(), "Failed to open event log: {e}");
            return Vec::new();
        },
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let columns = match reader.headers() {
        Ok(headers) => Columns::from_headers(headers),
        Err(e) => {
            tracing::error!(path = %path.display(), "Failed to read event log header: {e}");
            return Vec::new();
        },
    };

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        match result {
            Ok(record) => rows.push(columns.row(&record)),
            Err(e) if e.is_io_error() => {
                tracing::error!(path = %path.display(), "Event log read stopped: {e}");
                break;
            },
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "Skipped undecodable event log rows");
    }
    rows
}

/// Blocking append of one row, writing the header first if the file is new
/// or empty.
pub fn append_row(path: &Path, event: &StatusEvent) -> Result<(), csv::Error> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let needs_header = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    writer.serialize(event)?;
    writer.flush()?;
    Ok(())
}

/// The last `count` rows, newest first.
pub fn recent(rows: &[StatusEvent], count: usize) -> Vec<StatusEvent> {
    rows.iter().rev().take(count).cloned().collect()
}
