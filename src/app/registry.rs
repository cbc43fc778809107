//! Run registry: one in-flight ingestion at a time, plus run history.
//!
//! The pipeline itself does no locking. Two guards sit around it:
//!
//! - `RunLock`: an exclusively created lock file in the artifact root, held
//!   by one process for the whole load -> run -> save cycle, so separate
//!   `fare ingest` invocations cannot interleave their runs or their history
//!   writes
//! - `RunRegistry::begin`: hands out at most one live `RunTicket` per
//!   registry, for callers that start runs from several threads
//!
//! The ticket records every stage transition and the outcome; dropping an
//! unfinished ticket marks the run failed.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{IngestionResult, Stage};
use crate::error::{AppError, PipelineError, exit_code};

/// Lock file inside the artifact root.
pub const LOCK_FILE_NAME: &str = "ingestion.lock";

/// One ingestion run as seen by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: u64,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub stage: Stage,
    pub succeeded: bool,
    pub message: String,
}

impl RunRecord {
    pub fn is_running(&self) -> bool {
        !self.stage.is_terminal()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunInProgress {
    /// This registry already handed out a live ticket.
    #[error("ingestion run {0} is already in progress")]
    InProcess(u64),
    /// Another process holds the artifact-root lock.
    #[error("lock file '{}' is held by {holder}; remove it if no ingestion is running", path.display())]
    Locked { path: PathBuf, holder: String },
}

/// Cross-process run lock, released (file removed) on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Take the lock in `artifact_dir`, creating the directory if needed.
    pub fn acquire(artifact_dir: &Path) -> Result<Self, AppError> {
        fs::create_dir_all(artifact_dir).map_err(|e| {
            AppError::new(exit_code::IO, format!("Failed to create '{}': {e}", artifact_dir.display()))
        })?;
        let path = artifact_dir.join(LOCK_FILE_NAME);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                // The pid is informational only.
                let _ = writeln!(file, "pid {}", std::process::id());
                tracing::debug!(lock = %path.display(), "run lock acquired");
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&path)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_default();
                let holder = if holder.is_empty() { "another process".to_string() } else { holder };
                Err(RunInProgress::Locked { path, holder }.into())
            }
            Err(e) => Err(AppError::new(
                exit_code::IO,
                format!("Failed to create lock file '{}': {e}", path.display()),
            )),
        }
    }

    /// Whether some process currently holds the lock in `artifact_dir`.
    pub fn is_held(artifact_dir: &Path) -> bool {
        artifact_dir.join(LOCK_FILE_NAME).exists()
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(lock = %self.path.display(), "failed to release run lock: {e}");
        }
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    runs: Vec<RunRecord>,
    active: Option<u64>,
    next_id: u64,
}

/// Shared registry handle; clones refer to the same registry.
#[derive(Debug, Clone, Default)]
pub struct RunRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with previously recorded runs.
    pub fn with_history(runs: Vec<RunRecord>) -> Self {
        let next_id = runs.iter().map(|r| r.id + 1).max().unwrap_or(0);
        Self {
            state: Arc::new(Mutex::new(RegistryState {
                runs,
                active: None,
                next_id,
            })),
        }
    }

    /// Mark runs that were recorded in flight, but are not owned by this
    /// registry, as failed. Only sound while holding the `RunLock`.
    pub fn mark_interrupted(&self) -> usize {
        let mut state = self.state.lock();
        let active = state.active;
        let mut marked = 0;
        for run in state.runs.iter_mut().filter(|r| r.is_running() && Some(r.id) != active) {
            run.stage = Stage::Failed;
            run.succeeded = false;
            run.message = "Run was interrupted.".to_string();
            marked += 1;
        }
        if marked > 0 {
            tracing::warn!(runs = marked, "marked interrupted runs as failed");
        }
        marked
    }

    /// Load the history file at `path`; a missing file is an empty history.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let file = File::open(path).map_err(|e| {
            AppError::new(exit_code::USAGE, format!("Failed to open run history '{}': {e}", path.display()))
        })?;
        let runs: Vec<RunRecord> = serde_json::from_reader(file).map_err(|e| {
            AppError::new(exit_code::USAGE, format!("Invalid run history '{}': {e}", path.display()))
        })?;
        Ok(Self::with_history(runs))
    }

    /// Write the history to `path` as JSON.
    ///
    /// The file is staged as `<name>.partial` and renamed into place, so a
    /// reader never sees a half-written history.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| AppError::new(exit_code::IO, format!("Failed to create '{}': {e}", dir.display())))?;
        }
        let mut staged_name = path.file_name().unwrap_or_default().to_os_string();
        staged_name.push(".partial");
        let staged = path.with_file_name(staged_name);

        let file = File::create(&staged).map_err(|e| {
            AppError::new(exit_code::IO, format!("Failed to create run history '{}': {e}", staged.display()))
        })?;
        serde_json::to_writer_pretty(file, &self.history())
            .map_err(|e| AppError::new(exit_code::IO, format!("Failed to write run history: {e}")))?;
        fs::rename(&staged, path).map_err(|e| {
            AppError::new(exit_code::IO, format!("Failed to move run history into '{}': {e}", path.display()))
        })
    }

    /// Start a run, unless one is already in flight.
    pub fn begin(&self) -> Result<RunTicket, RunInProgress> {
        let mut state = self.state.lock();
        if let Some(active) = state.active {
            return Err(RunInProgress::InProcess(active));
        }

        let id = state.next_id;
        state.next_id += 1;
        state.active = Some(id);
        state.runs.push(RunRecord {
            id,
            started_at: Local::now(),
            finished_at: None,
            stage: Stage::Idle,
            succeeded: false,
            message: "Run started.".to_string(),
        });
        tracing::info!(run = id, "ingestion run registered");

        Ok(RunTicket {
            registry: self.clone(),
            id,
            finished: false,
        })
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().active.is_some()
    }

    /// All runs, oldest first.
    pub fn history(&self) -> Vec<RunRecord> {
        self.state.lock().runs.clone()
    }

    fn update(&self, id: u64, apply: impl FnOnce(&mut RunRecord)) {
        let mut state = self.state.lock();
        if let Some(run) = state.runs.iter_mut().find(|r| r.id == id) {
            apply(run);
        }
    }

    fn close(&self, id: u64, succeeded: bool, message: String) {
        let mut state = self.state.lock();
        if state.active == Some(id) {
            state.active = None;
        }
        if let Some(run) = state.runs.iter_mut().find(|r| r.id == id) {
            run.stage = if succeeded { Stage::Done } else { Stage::Failed };
            run.succeeded = succeeded;
            run.finished_at = Some(Local::now());
            run.message = message;
        }
    }
}

/// Exclusive right to run one ingestion.
#[derive(Debug)]
pub struct RunTicket {
    registry: RunRegistry,
    id: u64,
    finished: bool,
}

impl RunTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Record a pipeline stage transition.
    pub fn record_stage(&self, stage: Stage) {
        self.registry.update(self.id, |run| run.stage = stage);
    }

    /// Record the outcome and release the registry.
    pub fn finish(mut self, outcome: &Result<IngestionResult, PipelineError>) {
        let (succeeded, message) = match outcome {
            Ok(result) => (result.succeeded, result.message.clone()),
            Err(err) => (false, err.to_string()),
        };
        self.registry.close(self.id, succeeded, message);
        self.finished = true;
    }
}

impl Drop for RunTicket {
    fn drop(&mut self) {
        if !self.finished {
            self.registry.close(self.id, false, "Run was abandoned.".to_string());
        }
    }
}
