//! Durable ledger backed by an append-only commit log.

use crate::backend::{CommitRequest, LedgerBackend, Version, Versioned};
use crate::error::{StorageError, StorageResult};
use crate::state::LedgerState;
use bytes::Bytes;
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Size of the frame header: body length (u32) + SHA-256 digest of the body.
const FRAME_HEADER_SIZE: usize = 4 + 32;

/// A file-backed ledger.
///
/// Every commit is appended to a single log file as one frame:
///
/// ```text
/// | body_len: u32 LE | sha256(body): [u8; 32] | body |
/// body = | version: u64 LE | count: u32 LE | (key_len: u32, key, value_len: u32, value)* |
/// ```
///
/// On open the log is replayed into memory. A torn final frame (crash during
/// append) is discarded and the file truncated to the last whole frame; a
/// digest mismatch in a whole frame is reported as corruption.
///
/// A failed append is cut back to the previous frame boundary before the
/// error is returned. If that truncation fails too, the ledger refuses every
/// later commit with [`StorageError::Corrupted`].
///
/// The file is held under an exclusive advisory lock for the lifetime of the
/// ledger.
///
/// # Example
///
/// ```no_run
/// use agritrace_storage::{CommitRequest, FileLedger, LedgerBackend};
/// use bytes::Bytes;
/// use std::path::Path;
///
/// let ledger = FileLedger::open(Path::new("agritrace.ledger")).unwrap();
/// let mut request = CommitRequest::default();
/// request.put("P1", Bytes::from_static(b"..."));
/// ledger.commit(request).unwrap();
/// ```
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    file: Mutex<File>,
    state: RwLock<LedgerState>,
    sync_on_commit: bool,
    torn: AtomicBool,
}

impl FileLedger {
    /// Opens or creates a ledger at `path` and replays its log.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Locked`] if another process holds the file,
    /// [`StorageError::Corrupted`] if a frame fails verification, or an I/O
    /// error.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        file.try_lock_exclusive()
            .map_err(|_| StorageError::Locked)?;

        let mut data = Vec::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut data)?;

        let (state, valid_len) = replay(&data)?;
        if valid_len < data.len() {
            tracing::warn!(
                path = %path.display(),
                discarded = data.len() - valid_len,
                "discarding torn frame at end of ledger log"
            );
            file.set_len(valid_len as u64)?;
            file.sync_all()?;
        }

        tracing::debug!(
            path = %path.display(),
            keys = state.len(),
            head = %state.head(),
            "ledger opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            state: RwLock::new(state),
            sync_on_commit: true,
            torn: AtomicBool::new(false),
        })
    }

    /// Opens or creates a ledger, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the ledger cannot
    /// be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Sets whether each commit is synced to disk before returning.
    #[must_use]
    pub fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    /// Returns the path to the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    /// Returns true if no key has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LedgerBackend for FileLedger {
    fn get(&self, key: &str) -> StorageResult<Option<Versioned>> {
        Ok(self.state.read().get(key))
    }

    fn scan(&self, start: &str, end: &str) -> StorageResult<Vec<(String, Versioned)>> {
        Ok(self.state.read().range(start, end))
    }

    fn commit(&self, request: CommitRequest) -> StorageResult<Version> {
        let mut state = self.state.write();
        state.validate(&request)?;

        if request.writes.is_empty() {
            return Ok(state.head());
        }

        if self.torn.load(Ordering::Acquire) {
            return Err(StorageError::corrupted(
                "ledger log holds a partial frame from an earlier failed commit",
            ));
        }

        let version = state.head().next();
        let frame = encode_frame(version, &request.writes);
        {
            let mut file = self.file.lock();
            if let Err(err) = append_frame(&mut *file, &frame, self.sync_on_commit) {
                if matches!(err, StorageError::Corrupted(_)) {
                    self.torn.store(true, Ordering::Release);
                }
                return Err(err);
            }
        }

        state.apply_at(version, request.writes);
        Ok(version)
    }

    fn head(&self) -> StorageResult<Version> {
        Ok(self.state.read().head())
    }
}

impl Drop for FileLedger {
    fn drop(&mut self) {
        let file = self.file.lock();
        if let Err(err) = FileExt::unlock(&*file) {
            tracing::debug!(error = %err, "failed to release ledger lock");
        }
    }
}

/// The log operations a commit needs, so appends can be tested against a
/// failing writer.
trait LogFile: Write + Seek {
    fn truncate_to(&mut self, len: u64) -> std::io::Result<()>;
    fn sync(&mut self) -> std::io::Result<()>;
}

impl LogFile for File {
    fn truncate_to(&mut self, len: u64) -> std::io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> std::io::Result<()> {
        self.sync_data()
    }
}

/// Appends `frame` at the end of the log, or leaves the log as it was.
fn append_frame<F: LogFile>(file: &mut F, frame: &[u8], sync: bool) -> StorageResult<()> {
    let start = file.seek(SeekFrom::End(0))?;
    let Err(err) = write_frame(file, frame, sync) else {
        return Ok(());
    };
    match file.truncate_to(start) {
        Ok(()) => {
            tracing::warn!(offset = start, error = %err, "ledger append failed, frame rolled back");
            Err(err.into())
        }
        Err(rollback) => {
            tracing::error!(
                offset = start,
                error = %err,
                rollback = %rollback,
                "ledger append failed and the partial frame could not be removed"
            );
            Err(StorageError::corrupted(format!(
                "partial frame at offset {start}: {err}"
            )))
        }
    }
}

fn write_frame<F: LogFile>(file: &mut F, frame: &[u8], sync: bool) -> std::io::Result<()> {
    file.write_all(frame)?;
    file.flush()?;
    if sync {
        file.sync()?;
    }
    Ok(())
}

fn encode_frame(version: Version, writes: &BTreeMap<String, Bytes>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&version.as_u64().to_le_bytes());
    body.extend_from_slice(&(writes.len() as u32).to_le_bytes());
    for (key, value) in writes {
        body.extend_from_slice(&(key.len() as u32).to_le_bytes());
        body.extend_from_slice(key.as_bytes());
        body.extend_from_slice(&(value.len() as u32).to_le_bytes());
        body.extend_from_slice(value);
    }

    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
    frame.extend_from_slice(&Sha256::digest(&body));
    frame.extend_from_slice(&body);
    frame
}

/// Replays whole frames; returns the state and the length of the valid prefix.
fn replay(data: &[u8]) -> StorageResult<(LedgerState, usize)> {
    let mut state = LedgerState::default();
    let mut pos = 0;

    while pos + FRAME_HEADER_SIZE <= data.len() {
        let body_len = read_u32(data, pos) as usize;
        let body_start = pos + FRAME_HEADER_SIZE;
        let body_end = body_start + body_len;
        if body_end > data.len() {
            break;
        }

        let body = &data[body_start..body_end];
        let stored = &data[pos + 4..body_start];
        if Sha256::digest(body).as_slice() != stored {
            return Err(StorageError::corrupted(format!(
                "digest mismatch in frame at offset {pos}"
            )));
        }

        let (version, writes) = decode_body(body)
            .ok_or_else(|| StorageError::corrupted(format!("malformed frame at offset {pos}")))?;
        state.apply_at(version, writes);
        pos = body_end;
    }

    Ok((state, pos))
}

fn decode_body(body: &[u8]) -> Option<(Version, BTreeMap<String, Bytes>)> {
    let mut cursor = Cursor { data: body, pos: 0 };
    let version = Version::new(u64::from_le_bytes(cursor.take(8)?.try_into().ok()?));
    let count = u32::from_le_bytes(cursor.take(4)?.try_into().ok()?);

    let mut writes = BTreeMap::new();
    for _ in 0..count {
        let key_len = u32::from_le_bytes(cursor.take(4)?.try_into().ok()?) as usize;
        let key = std::str::from_utf8(cursor.take(key_len)?).ok()?.to_string();
        let value_len = u32::from_le_bytes(cursor.take(4)?.try_into().ok()?) as usize;
        let value = Bytes::copy_from_slice(cursor.take(value_len)?);
        writes.insert(key, value);
    }

    (cursor.pos == body.len()).then_some((version, writes))
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let slice = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }
}
