//! Off-thread file acquisition and directory listing.
//!
//! The UI thread must never block on storage: every load or listing
//! request runs on a dedicated worker thread and publishes its outcome
//! through a [`Mailbox`](chipdeck_common::Mailbox) the control thread
//! polls once per tick.
//!
//! # Worker discipline
//!
//! At most one worker is ever alive. A new request first flips the
//! in-flight worker's flag to `Canceling` and **joins** it before
//! spawning the replacement. Cancellation is cooperative, polled between
//! fixed 16 KiB read chunks and between directory entries, so honoring it
//! can take up to one chunk. A canceled request publishes nothing:
//! cancellation is not a failure.
//!
//! # Example
//!
//! ```ignore
//! use chipdeck_common::LoadRequest;
//! use chipdeck_loader::{LoadCoordinator, LoadOutcome};
//!
//! let mut loader = LoadCoordinator::new();
//! loader.request_load(LoadRequest::play("music/track.sid"));
//! loop {
//!     if let Some(LoadOutcome::FileLoaded { request, data }) = loader.poll() {
//!         // hand (request, data) to the playback engine
//!         break;
//!     }
//! }
//! ```

#![warn(missing_docs)]

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::debug;

use chipdeck_common::{LoadRequest, Mailbox};

/// Fixed I/O chunk size; the cancellation poll granularity.
const CHUNK_SIZE: usize = 16 * 1024;

/// Worker lifecycle flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum WorkerState {
    Idle = 0,
    Working = 1,
    Canceling = 2,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File or directory name.
    pub name: String,
    /// Full path.
    pub path: PathBuf,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// Outcome of a worker run, published through the coordinator's mailbox.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The requested file was read completely.
    FileLoaded {
        /// The originating request, for the control thread to act on.
        request: LoadRequest,
        /// The acquired bytes.
        data: Vec<u8>,
    },
    /// A directory was listed.
    Listing {
        /// The listed directory.
        path: PathBuf,
        /// Sorted entries (directories, then files by name).
        entries: Vec<DirEntry>,
    },
    /// The request failed; never silently swallowed.
    Failed {
        /// The path the request named.
        path: PathBuf,
        /// Human-readable reason.
        message: String,
    },
}

/// Off-thread load coordinator.
pub struct LoadCoordinator {
    mailbox: Arc<Mailbox<LoadOutcome>>,
    state: Arc<AtomicU8>,
    worker: Option<JoinHandle<()>>,
}

impl LoadCoordinator {
    /// Create an idle coordinator.
    pub fn new() -> LoadCoordinator {
        LoadCoordinator {
            mailbox: Arc::new(Mailbox::new()),
            state: Arc::new(AtomicU8::new(WorkerState::Idle as u8)),
            worker: None,
        }
    }

    /// Acquire a file's bytes off-thread.
    ///
    /// Cancels and joins any in-flight worker first; there is never more
    /// than one worker.
    pub fn request_load(&mut self, request: LoadRequest) {
        self.replace_worker(move |state, mailbox| {
            let path = request.path.clone();
            match read_chunked(&path, &state) {
                Ok(Some(data)) => {
                    mailbox.post(LoadOutcome::FileLoaded { request, data });
                }
                Ok(None) => debug!(path = %path.display(), "load canceled"),
                Err(message) => {
                    mailbox.post(LoadOutcome::Failed { path, message });
                }
            }
        });
    }

    /// List a directory off-thread, keeping only directories and files
    /// whose extension is in `extensions` (dotted, lowercase).
    pub fn request_listing(&mut self, path: PathBuf, extensions: Vec<String>) {
        self.replace_worker(move |state, mailbox| {
            match list_directory(&path, &extensions, &state) {
                Ok(Some(entries)) => {
                    mailbox.post(LoadOutcome::Listing { path, entries });
                }
                Ok(None) => debug!(path = %path.display(), "listing canceled"),
                Err(message) => {
                    mailbox.post(LoadOutcome::Failed { path, message });
                }
            }
        });
    }

    /// Cancel the in-flight request, if any, and wait for the worker.
    pub fn cancel(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.state
                .store(WorkerState::Canceling as u8, Ordering::Release);
            let _ = worker.join();
            self.state.store(WorkerState::Idle as u8, Ordering::Release);
        }
    }

    /// Drain the outcome mailbox; called once per control-thread tick.
    pub fn poll(&self) -> Option<LoadOutcome> {
        self.mailbox.take()
    }

    fn replace_worker(&mut self, work: impl FnOnce(Arc<AtomicU8>, Arc<Mailbox<LoadOutcome>>) + Send + 'static) {
        self.cancel();

        self.state
            .store(WorkerState::Working as u8, Ordering::Release);
        let state = Arc::clone(&self.state);
        let done_state = Arc::clone(&self.state);
        let mailbox = Arc::clone(&self.mailbox);
        self.worker = Some(std::thread::spawn(move || {
            work(state, mailbox);
            done_state.store(WorkerState::Idle as u8, Ordering::Release);
        }));
    }
}

impl Default for LoadCoordinator {
    fn default() -> Self {
        LoadCoordinator::new()
    }
}

impl Drop for LoadCoordinator {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn canceled(state: &AtomicU8) -> bool {
    state.load(Ordering::Acquire) == WorkerState::Canceling as u8
}

/// Read a regular file in fixed chunks, polling for cancellation between
/// chunks. `Ok(None)` means the read was canceled.
fn read_chunked(path: &Path, state: &AtomicU8) -> Result<Option<Vec<u8>>, String> {
    let metadata =
        std::fs::metadata(path).map_err(|e| format!("cannot stat '{}': {e}", path.display()))?;
    if !metadata.is_file() {
        return Err(format!("'{}' is not a regular file", path.display()));
    }

    let mut file =
        File::open(path).map_err(|e| format!("cannot open '{}': {e}", path.display()))?;
    let mut data = Vec::with_capacity(metadata.len() as usize);
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        if canceled(state) {
            return Ok(None);
        }
        let read = file
            .read(&mut chunk)
            .map_err(|e| format!("read error on '{}': {e}", path.display()))?;
        if read == 0 {
            return Ok(Some(data));
        }
        data.extend_from_slice(&chunk[..read]);
    }
}

/// List a directory, polling for cancellation between entries.
fn list_directory(
    path: &Path,
    extensions: &[String],
    state: &AtomicU8,
) -> Result<Option<Vec<DirEntry>>, String> {
    let reader = std::fs::read_dir(path)
        .map_err(|e| format!("cannot list '{}': {e}", path.display()))?;

    let mut entries = Vec::new();
    for entry in reader {
        if canceled(state) {
            return Ok(None);
        }
        let entry = entry.map_err(|e| format!("listing error in '{}': {e}", path.display()))?;
        let entry_path = entry.path();
        let is_dir = entry_path.is_dir();
        if !is_dir && !has_supported_extension(&entry_path, extensions) {
            continue;
        }
        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry_path,
            is_dir,
        });
    }

    entries.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    Ok(Some(entries))
}

fn has_supported_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let dotted = format!(".{}", extension.to_ascii_lowercase());
    extensions.iter().any(|e| e == &dotted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wait_for_outcome(loader: &LoadCoordinator) -> LoadOutcome {
        for _ in 0..500 {
            if let Some(outcome) = loader.poll() {
                return outcome;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        panic!("no outcome within one second");
    }

    #[test]
    fn loads_a_file_off_thread() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mod");
        std::fs::write(&path, vec![7u8; 40_000]).unwrap();

        let mut loader = LoadCoordinator::new();
        loader.request_load(LoadRequest::play(&path));

        match wait_for_outcome(&loader) {
            LoadOutcome::FileLoaded { request, data } => {
                assert_eq!(request.path, path);
                assert_eq!(data.len(), 40_000);
                assert!(data.iter().all(|&b| b == 7));
            }
            other => panic!("expected FileLoaded, got {other:?}"),
        }
    }

    #[test]
    fn missing_path_fails_with_a_message() {
        let mut loader = LoadCoordinator::new();
        loader.request_load(LoadRequest::play("/nonexistent/nowhere.sid"));

        match wait_for_outcome(&loader) {
            LoadOutcome::Failed { path, message } => {
                assert_eq!(path, PathBuf::from("/nonexistent/nowhere.sid"));
                assert!(message.contains("nowhere.sid"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn directory_as_file_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = LoadCoordinator::new();
        loader.request_load(LoadRequest::play(dir.path()));

        match wait_for_outcome(&loader) {
            LoadOutcome::Failed { message, .. } => {
                assert!(message.contains("not a regular file"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn a_new_request_replaces_the_in_flight_one() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.mod");
        let second = dir.path().join("second.mod");
        std::fs::write(&first, vec![1u8; 2_000_000]).unwrap();
        std::fs::write(&second, vec![2u8; 1_000]).unwrap();

        let mut loader = LoadCoordinator::new();
        loader.request_load(LoadRequest::play(&first));
        loader.request_load(LoadRequest::play(&second));

        // The replacement's outcome must surface. The first request was
        // either canceled silently or, if it won the race, its slot value
        // is overwritten by the second (last-write-wins).
        let outcome = loop {
            match wait_for_outcome(&loader) {
                LoadOutcome::FileLoaded { request, .. } if request.path == first => continue,
                other => break other,
            }
        };
        match outcome {
            LoadOutcome::FileLoaded { request, data } => {
                assert_eq!(request.path, second);
                assert_eq!(data, vec![2u8; 1_000]);
            }
            other => panic!("expected FileLoaded, got {other:?}"),
        }
        assert!(loader.poll().is_none());
    }

    #[test]
    fn cancel_without_worker_is_a_no_op() {
        let mut loader = LoadCoordinator::new();
        loader.cancel();
        assert!(loader.poll().is_none());
    }

    #[test]
    fn listing_filters_by_extension_and_keeps_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("albums")).unwrap();
        std::fs::write(dir.path().join("keep.sid"), b"x").unwrap();
        std::fs::write(dir.path().join("KEEP2.SID"), b"x").unwrap();
        std::fs::write(dir.path().join("skip.txt"), b"x").unwrap();

        let mut loader = LoadCoordinator::new();
        loader.request_listing(dir.path().to_path_buf(), vec![".sid".to_string()]);

        match wait_for_outcome(&loader) {
            LoadOutcome::Listing { entries, .. } => {
                let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
                assert_eq!(names, vec!["albums", "keep.sid", "KEEP2.SID"]);
                assert!(entries[0].is_dir);
            }
            other => panic!("expected Listing, got {other:?}"),
        }
    }
}
