//! `--dev-watch`: rebuild the project whenever a framework or add-on
//! directory changes.
//!
//! Change events are debounced into one rebuild.  A rebuild composes the
//! project into a fresh temp directory and then syncs it file by file into
//! the real target.  While a rebuild is running, new bursts are not queued
//! separately; they are folded into the next debounce window.  Ctrl-C removes
//! the current temp directory before the process exits.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use notify::{EventKind, RecursiveMode, Watcher};
use tracing::{debug, info, instrument, warn};

use trellis_adapters::{
    FileSyncer, FilesystemFrameworkLoader, HttpAddOnSource, LocalEnvironment, SyncReport,
    file_syncer::DEFAULT_IGNORED,
    framework_loader::{load_add_on_dir, scan_add_on_directories},
};
use trellis_core::{
    application::{AddOnResolver, CONFIG_FILE_NAME, Environment},
    domain::{
        AddOn, AddOnType, Framework, Options, package_manager::install_command,
        populate_add_on_options_defaults,
    },
    error::TrellisError,
};

use crate::{
    commands::compose_service,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Quiet period before a burst of changes triggers a rebuild.
pub const DEBOUNCE: Duration = Duration::from_millis(500);
const IDLE_POLL: Duration = Duration::from_secs(1);

const FRAMEWORK_MANIFEST: &str = "framework.json";
const ADD_ONS_DIR: &str = "add-ons";
const ASSETS_DIR: &str = "assets";

const WATCHED_ADD_ON_DIRECTORIES: &[AddOnType] = &[
    AddOnType::AddOn,
    AddOnType::Toolchain,
    AddOnType::Example,
    AddOnType::Deployment,
    AddOnType::Host,
];

// ── Watch source ──────────────────────────────────────────────────────────────

/// What the watched directory contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchSource {
    /// A whole framework (`framework.json`).
    Framework(PathBuf),
    /// A tree of add-on directories (`add-ons/`, `toolchains/`, ...).
    AddOns(PathBuf),
    /// A single add-on (`assets/`).
    AddOn(PathBuf),
}

impl WatchSource {
    /// Check `path` before anything else runs.
    pub fn validate(path: &Path) -> CliResult<Self> {
        let invalid = |reason: &str| CliError::InvalidWatchPath {
            path: path.to_path_buf(),
            reason: reason.into(),
        };

        if !path.exists() {
            return Err(invalid("path does not exist"));
        }
        if !path.is_dir() {
            return Err(invalid("path is not a directory"));
        }
        let dir = path
            .canonicalize()
            .map_err(|e| invalid(&format!("cannot resolve path: {e}")))?;

        if dir.join(FRAMEWORK_MANIFEST).is_file() {
            Ok(Self::Framework(dir))
        } else if dir.join(ADD_ONS_DIR).is_dir() {
            Ok(Self::AddOns(dir))
        } else if dir.join(ASSETS_DIR).is_dir() {
            Ok(Self::AddOn(dir))
        } else {
            Err(invalid("expected add-ons/, assets/ or framework.json inside"))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Framework(p) | Self::AddOns(p) | Self::AddOn(p) => p,
        }
    }

    /// The framework to compose with, read fresh from disk.
    ///
    /// A watched framework replaces `base` entirely; watched add-ons replace
    /// same-id add-ons of `base` or are appended to it.
    pub fn overlay(&self, base: &Framework) -> CliResult<Framework> {
        let loaded: Vec<AddOn> = match self {
            Self::Framework(dir) => {
                let framework = FilesystemFrameworkLoader::new(dir)
                    .load()
                    .map_err(TrellisError::from)?;
                if framework.id != base.id {
                    debug!(watched = %framework.id, selected = %base.id, "using watched framework");
                }
                return Ok(framework);
            }
            Self::AddOns(dir) => {
                let dirs: Vec<(PathBuf, AddOnType)> = WATCHED_ADD_ON_DIRECTORIES
                    .iter()
                    .map(|kind| (dir.join(kind.directory_name()), *kind))
                    .collect();
                scan_add_on_directories(&dirs)
            }
            Self::AddOn(dir) => {
                vec![load_add_on_dir(dir, AddOnType::AddOn).map_err(TrellisError::from)?]
            }
        };

        let mut framework = base.clone();
        for add_on in loaded {
            let add_on = Arc::new(add_on);
            match framework.add_ons.iter_mut().find(|a| a.id == add_on.id) {
                Some(slot) => *slot = add_on,
                None => framework.add_ons.push(add_on),
            }
        }
        Ok(framework)
    }
}

// ── Debounce ──────────────────────────────────────────────────────────────────

/// Collects changed paths until the source has been quiet for `delay`.
#[derive(Debug)]
pub struct DebounceQueue {
    delay: Duration,
    pending: BTreeSet<PathBuf>,
    last_change: Option<Instant>,
}

impl DebounceQueue {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: BTreeSet::new(),
            last_change: None,
        }
    }

    pub fn push(&mut self, path: PathBuf, now: Instant) {
        self.pending.insert(path);
        self.last_change = Some(now);
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        self.time_until_ready(now) == Some(Duration::ZERO)
    }

    /// `None` when nothing is pending.
    pub fn time_until_ready(&self, now: Instant) -> Option<Duration> {
        if self.pending.is_empty() {
            return None;
        }
        let last = self.last_change?;
        Some(self.delay.saturating_sub(now.saturating_duration_since(last)))
    }

    pub fn drain(&mut self) -> Vec<PathBuf> {
        self.last_change = None;
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    /// Put a rejected batch back and restart the window.
    pub fn defer(&mut self, paths: Vec<PathBuf>, now: Instant) {
        self.pending.extend(paths);
        self.last_change = Some(now);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

/// Admits one rebuild at a time.
#[derive(Debug, Clone, Default)]
pub struct BuildGate {
    in_flight: Arc<AtomicBool>,
}

impl BuildGate {
    /// `None` while another build holds the gate.
    pub fn try_begin(&self) -> Option<BuildGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BuildGuard {
                in_flight: Arc::clone(&self.in_flight),
            })
    }
}

/// Releases the gate when dropped.
#[derive(Debug)]
pub struct BuildGuard {
    in_flight: Arc<AtomicBool>,
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

/// Whether a changed path lies in a directory that never triggers rebuilds.
pub fn is_ignored(path: &Path) -> bool {
    path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|name| DEFAULT_IGNORED.contains(&name))
    })
}

// ── Temp directory tracking ───────────────────────────────────────────────────

/// The temp directory of the running rebuild, shared with the Ctrl-C handler.
#[derive(Debug, Clone, Default)]
struct TempTracker(Arc<Mutex<Option<PathBuf>>>);

impl TempTracker {
    fn set(&self, path: Option<PathBuf>) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = path;
        }
    }

    fn cleanup(&self) {
        let Ok(mut slot) = self.0.lock() else {
            return;
        };
        if let Some(path) = slot.take() {
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(path = %path.display(), error = %e, "failed to remove temp directory");
            }
        }
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Everything a rebuild needs.
pub struct Session {
    pub source: WatchSource,
    /// The registry framework watched add-ons are layered onto.
    pub base_framework: Arc<Framework>,
    /// Options of the initial run; the target is the real project.
    pub options: Options,
}

enum Message {
    Changed(Vec<PathBuf>),
    Built(Result<SyncReport, TrellisError>),
}

/// Watch until interrupted.
pub fn run(session: Session, output: &OutputManager) -> CliResult<()> {
    let session = Arc::new(session);
    let (tx, rx) = mpsc::channel::<Message>();

    let events = tx.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
        Ok(event) if matches!(event.kind, EventKind::Access(_)) => {}
        Ok(event) => {
            let _ = events.send(Message::Changed(event.paths));
        }
        Err(e) => warn!(error = %e, "watch error"),
    })
    .map_err(|e| watch_error(session.source.path(), e))?;
    watcher
        .watch(session.source.path(), RecursiveMode::Recursive)
        .map_err(|e| watch_error(session.source.path(), e))?;

    let tracker = TempTracker::default();
    let on_interrupt = tracker.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        on_interrupt.cleanup();
        eprintln!("\nStopped watching.");
        std::process::exit(130);
    }) {
        warn!(error = %e, "cannot install Ctrl-C handler; temp directories may be left behind");
    }

    output.info(&format!(
        "Watching {} (Ctrl-C to stop)",
        session.source.path().display()
    ))?;

    let mut queue = DebounceQueue::new(DEBOUNCE);
    let gate = BuildGate::default();

    loop {
        let timeout = queue.time_until_ready(Instant::now()).unwrap_or(IDLE_POLL);
        match rx.recv_timeout(timeout) {
            Ok(Message::Changed(paths)) => {
                let now = Instant::now();
                for path in paths.into_iter().filter(|p| !is_ignored(p)) {
                    queue.push(path, now);
                }
            }
            Ok(Message::Built(result)) => report(result, output)?,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if !queue.is_ready(Instant::now()) {
            continue;
        }
        let batch = queue.drain();
        let Some(guard) = gate.try_begin() else {
            queue.defer(batch, Instant::now());
            debug!(pending = queue.len(), "rebuild in flight; folding changes into next window");
            continue;
        };

        debug!(changes = batch.len(), "starting rebuild");
        let session = Arc::clone(&session);
        let tracker = tracker.clone();
        let done = tx.clone();
        thread::spawn(move || {
            let result = rebuild(&session, &tracker);
            drop(guard);
            let _ = done.send(Message::Built(result));
        });
    }

    Ok(())
}

/// Compose into a temp directory, sync into the project, clean up.
#[instrument(skip_all, fields(target = %session.options.target_dir.display()))]
fn rebuild(session: &Session, tracker: &TempTracker) -> Result<SyncReport, TrellisError> {
    let framework = Arc::new(
        session
            .source
            .overlay(&session.base_framework)
            .map_err(|e| TrellisError::Configuration {
                message: e.to_string(),
            })?,
    );
    let chosen_ids = session.options.chosen_ids();
    let chosen = AddOnResolver::new(Box::new(HttpAddOnSource::new())).finalize_add_ons(
        &framework,
        &session.options.mode,
        &chosen_ids,
    )?;

    let temp = tempfile::Builder::new()
        .prefix("trellis-watch-")
        .tempdir()
        .map_err(|e| TrellisError::Internal {
            message: format!("cannot create temp directory: {e}"),
        })?;
    tracker.set(Some(temp.path().to_path_buf()));

    let mut add_on_options = populate_add_on_options_defaults(&chosen);
    for (id, values) in &session.options.add_on_options {
        add_on_options
            .entry(id.clone())
            .or_default()
            .extend(values.clone());
    }

    let mut options = session.options.clone();
    options.framework = framework;
    options.chosen_add_ons = chosen;
    options.add_on_options = add_on_options;
    options.target_dir = temp.path().join(&options.project_name);
    options.git = false;
    options.install = false;
    options.force = true;

    let env = LocalEnvironment::new();
    let result = compose_service()
        .create_app(&options, &env)
        .and_then(|_| env.delete_file(&options.target_dir.join(CONFIG_FILE_NAME)))
        .and_then(|()| FileSyncer::new().sync(&options.target_dir, &session.options.target_dir));

    tracker.set(None);
    if let Err(e) = temp.close() {
        warn!(error = %e, "failed to remove temp directory");
    }

    let report = result?;
    if touched(&report, "package.json") {
        info!("package.json changed, reinstalling");
        let install = install_command(session.options.package_manager, None, false);
        env.execute(&install.command, &install.args, &session.options.target_dir)?;
    }
    Ok(report)
}

fn touched(report: &SyncReport, path: &str) -> bool {
    report.created.iter().any(|p| p == path) || report.updated.iter().any(|u| u.path == path)
}

fn report(result: Result<SyncReport, TrellisError>, output: &OutputManager) -> CliResult<()> {
    let stamp = chrono::Local::now().format("%H:%M:%S");
    match result {
        Ok(report) if report.written() == 0 && !report.has_errors() => {
            output.info(&format!("[{stamp}] No changes"))?;
        }
        Ok(report) => {
            output.success(&format!(
                "[{stamp}] Synced {} updated, {} created",
                report.updated.len(),
                report.created.len()
            ))?;
            for file in &report.updated {
                output.detail(&format!(
                    "~ {} (+{} -{})",
                    file.path, file.added_lines, file.removed_lines
                ))?;
            }
            for path in &report.created {
                output.detail(&format!("+ {path}"))?;
            }
            for error in &report.errors {
                output.error(error)?;
            }
        }
        Err(e) => {
            // Keep watching; the next save may fix it.
            output.error(&format!("[{stamp}] Rebuild failed: {e}"))?;
        }
    }
    Ok(())
}

fn watch_error(path: &Path, e: notify::Error) -> CliError {
    CliError::InvalidWatchPath {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}
