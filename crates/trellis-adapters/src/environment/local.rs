//! Local environment adapter using `std::fs` and `std::process`.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::process::Command;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::{debug, instrument};

use trellis_core::{
    application::{ApplicationError, ports::Environment},
    domain::BINARY_PREFIX,
    error::{TrellisError, TrellisResult},
};

/// Production environment: real disk, real subprocesses.
#[derive(Debug, Clone, Copy)]
pub struct LocalEnvironment;

impl LocalEnvironment {
    /// Create a new local environment adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for LocalEnvironment {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_file(&self, path: &Path) -> TrellisResult<String> {
        fs::read_to_string(path).map_err(|e| map_io_error(path, e, "read file"))
    }

    fn write_file(&self, path: &Path, content: &str) -> TrellisResult<()> {
        ensure_parent(path)?;
        let bytes = decode_content(path, content)?;
        fs::write(path, bytes).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn append_file(&self, path: &Path, content: &str) -> TrellisResult<()> {
        ensure_parent(path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| map_io_error(path, e, "open file"))?;
        file.write_all(content.as_bytes())
            .map_err(|e| map_io_error(path, e, "append to file"))
    }

    fn delete_file(&self, path: &Path) -> TrellisResult<()> {
        match fs::remove_file(path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(map_io_error(path, e, "delete file")),
            _ => Ok(()),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> TrellisResult<()> {
        match fs::remove_dir_all(path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                Err(map_io_error(path, e, "remove directory"))
            }
            _ => Ok(()),
        }
    }

    #[instrument(skip(self, args), fields(cwd = %cwd.display()))]
    fn execute(&self, command: &str, args: &[String], cwd: &Path) -> TrellisResult<()> {
        let command_line = std::iter::once(command)
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        debug!(command = %command_line, "Spawning");

        let output = Command::new(command)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|e| ApplicationError::CommandFailed {
                command: command_line.clone(),
                reason: e.to_string(),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
        let detail = tail.into_iter().rev().collect::<Vec<_>>().join("\n");
        Err(ApplicationError::CommandFailed {
            command: command_line,
            reason: if detail.is_empty() {
                output.status.to_string()
            } else {
                format!("{}\n{detail}", output.status)
            },
        }
        .into())
    }

    fn readdir(&self, path: &Path) -> TrellisResult<Vec<String>> {
        let entries = fs::read_dir(path).map_err(|e| map_io_error(path, e, "read directory"))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| map_io_error(path, e, "read directory entry"))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

/// Decode a `base64::` payload; plain text is written as is.
fn decode_content(path: &Path, content: &str) -> TrellisResult<Vec<u8>> {
    match content.strip_prefix(BINARY_PREFIX) {
        Some(encoded) => STANDARD.decode(encoded).map_err(|e| {
            ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: format!("invalid binary payload: {e}"),
            }
            .into()
        }),
        None => Ok(content.as_bytes().to_vec()),
    }
}

fn ensure_parent(path: &Path) -> TrellisResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| map_io_error(parent, e, "create directory"))
        }
        _ => Ok(()),
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> TrellisError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {operation}: {e}"),
    }
    .into()
}
