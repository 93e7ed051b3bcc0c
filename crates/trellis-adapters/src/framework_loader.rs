//! Filesystem-based framework and add-on loader.
//!
//! Discovers framework directories, scans their base project and add-on
//! directories, and converts them into domain [`Framework`] and [`AddOn`]
//! values ready for the registry.
//!
//! # Directory layout expected
//!
//! ```text
//! frameworks/
//! └── react/
//!     ├── framework.json         ← manifest (required)
//!     ├── project/
//!     │   ├── base/              ← base files, copied or rendered
//!     │   ├── package.json       ← base manifest
//!     │   └── packages.json      ← optional blocks: "typescript", "tailwindcss", <mode>
//!     ├── add-ons/
//!     │   └── tanstack-query/
//!     │       ├── info.json      ← descriptor (required)
//!     │       ├── package.json   ← static additions, or package.json.ejs
//!     │       ├── README.md
//!     │       └── assets/        ← files keyed as "./<path>"
//!     ├── toolchains/
//!     ├── examples/
//!     ├── deployments/
//!     └── hosts/
//! ```
//!
//! # `framework.json` format
//!
//! ```json
//! {
//!   "id": "react",
//!   "name": "React",
//!   "description": "React with TanStack Router",
//!   "supportedModes": {
//!     "file-router": { "displayName": "File Router", "forceTypescript": true },
//!     "code-router": { "displayName": "Code Router" }
//!   },
//!   "defaultMode": "file-router"
//! }
//! ```
//!
//! # Templates
//!
//! Files ending in `.ejs` are templates, but they are rendered with Tera
//! syntax, not EJS. Fragments written for EJS (`<% %>`, `<%= %>`) are left
//! as literal text and must be ported:
//!
//! ```text
//! <% if (addOnEnabled.query) { %>...<% } %>   →   {% if add_on_enabled.query %}...{% endif %}
//! <%= projectName %>                         →   {{ project_name }}
//! <% ignoreFile() %>                         →   {{ ignore_file() }}
//! ```
//!
//! See [`crate::renderer::TeraRenderer`] for the context variables and helper
//! functions available to templates.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use trellis_core::domain::{
    AddOn, AddOnType, BINARY_PREFIX, DomainError, DomainValidator, Framework, Mode, ModeInfo,
    PackageAdditions,
};

const MANIFEST_FILE: &str = "framework.json";
const INFO_FILE: &str = "info.json";
const ASSETS_DIR: &str = "assets";

/// Extensions always stored as base64 payloads.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "ico", "webp", "avif", "bmp", "woff", "woff2", "ttf", "otf",
    "eot", "pdf", "zip",
];

/// Add-on directories scanned inside a framework, with the type their
/// add-ons default to.
const ADD_ON_DIRECTORIES: &[AddOnType] = &[
    AddOnType::AddOn,
    AddOnType::Toolchain,
    AddOnType::Example,
    AddOnType::Deployment,
    AddOnType::Host,
];

// ── Manifest types ────────────────────────────────────────────────────────────

/// Deserialised representation of `framework.json`.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkManifest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub supported_modes: BTreeMap<String, ModeInfo>,
    #[serde(default)]
    pub default_mode: Option<Mode>,
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Loads frameworks from directories on disk.
///
/// # Example
///
/// ```rust,no_run
/// use trellis_adapters::FilesystemFrameworkLoader;
///
/// let frameworks = FilesystemFrameworkLoader::discover(&["./frameworks".into()]);
/// println!("Loaded {} frameworks", frameworks.len());
/// ```
pub struct FilesystemFrameworkLoader {
    framework_dir: PathBuf,
}

impl FilesystemFrameworkLoader {
    /// Create a loader pointed at one framework directory.
    pub fn new(framework_dir: impl Into<PathBuf>) -> Self {
        Self {
            framework_dir: framework_dir.into(),
        }
    }

    /// Load every framework found under `roots`.
    ///
    /// A root may itself be a framework directory or contain framework
    /// directories. Missing roots and invalid frameworks are skipped with a
    /// `WARN` log rather than failing the whole batch.
    pub fn discover(roots: &[PathBuf]) -> Vec<Framework> {
        let mut frameworks = Vec::new();

        for root in roots {
            if !root.is_dir() {
                debug!(root = %root.display(), "framework root not found, skipping");
                continue;
            }

            let candidates: Vec<PathBuf> = if root.join(MANIFEST_FILE).is_file() {
                vec![root.clone()]
            } else {
                match sorted_subdirectories(root) {
                    Ok(dirs) => dirs,
                    Err(e) => {
                        warn!(root = %root.display(), error = %e, "cannot read framework root");
                        continue;
                    }
                }
            };

            for dir in candidates {
                if !dir.join(MANIFEST_FILE).is_file() {
                    continue;
                }
                match Self::new(&dir).load() {
                    Ok(framework) => {
                        debug!(id = %framework.id, add_ons = framework.add_ons.len(), "loaded framework");
                        frameworks.push(framework);
                    }
                    Err(e) => {
                        warn!(
                            dir   = %dir.display(),
                            error = %e,
                            "skipping framework directory due to load error"
                        );
                    }
                }
            }
        }

        frameworks
    }

    /// Load the framework at `framework_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidFramework`] if `framework.json` is missing
    /// or malformed, or if a base file cannot be read. Invalid add-on
    /// directories are skipped with a warning.
    #[instrument(skip(self), fields(dir = %self.framework_dir.display()))]
    pub fn load(&self) -> Result<Framework, DomainError> {
        let dir = &self.framework_dir;
        let manifest: FrameworkManifest = read_json(&dir.join(MANIFEST_FILE))?;

        let mut framework = Framework::new(manifest.id, manifest.name);
        framework.description = manifest.description;
        framework.base_directory = dir.clone();
        framework.supported_modes = manifest.supported_modes;
        framework.default_mode = manifest.default_mode;

        let project = dir.join("project");
        let base = project.join("base");
        if base.is_dir() {
            framework.base_files = scan_files(&base)?;
        }
        let package_json = project.join("package.json");
        if package_json.is_file() {
            framework.base_package_json = read_json(&package_json)?;
        }
        let packages_json = project.join("packages.json");
        if packages_json.is_file() {
            framework.optional_packages = read_json(&packages_json)?;
        }

        let add_on_dirs: Vec<(PathBuf, AddOnType)> = ADD_ON_DIRECTORIES
            .iter()
            .map(|kind| (dir.join(kind.directory_name()), *kind))
            .collect();
        framework.add_ons = scan_add_on_directories(&add_on_dirs)
            .into_iter()
            .map(Arc::new)
            .collect();

        DomainValidator::validate_framework(&framework)?;
        Ok(framework)
    }
}

/// Load every add-on found directly under each directory.
///
/// Add-ons without an explicit `type` take the one paired with their
/// directory. Invalid add-ons are skipped with a warning.
pub fn scan_add_on_directories(dirs: &[(PathBuf, AddOnType)]) -> Vec<AddOn> {
    let mut add_ons = Vec::new();

    for (dir, kind) in dirs {
        if !dir.is_dir() {
            continue;
        }
        let entries = match sorted_subdirectories(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot read add-on directory");
                continue;
            }
        };

        for add_on_dir in entries {
            match load_add_on_dir(&add_on_dir, *kind) {
                Ok(add_on) => add_ons.push(add_on),
                Err(e) => warn!(
                    dir   = %add_on_dir.display(),
                    error = %e,
                    "skipping add-on directory due to load error"
                ),
            }
        }
    }

    add_ons
}

/// Load one add-on directory.
///
/// The directory name is the add-on id.
pub fn load_add_on_dir(dir: &Path, default_kind: AddOnType) -> Result<AddOn, DomainError> {
    let id = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| DomainError::InvalidFramework(format!("bad add-on path '{}'", dir.display())))?;
    let invalid = |reason: String| DomainError::InvalidAddOn {
        id: id.clone(),
        reason,
    };

    let mut info: Value = read_json(&dir.join(INFO_FILE))?;
    let Value::Object(map) = &mut info else {
        return Err(invalid("info.json must be an object".into()));
    };
    map.insert("id".into(), Value::String(id.clone()));
    map.entry("name").or_insert_with(|| Value::String(id.clone()));
    map.entry("type")
        .or_insert_with(|| Value::String(default_kind.as_str().into()));

    let mut add_on: AddOn =
        serde_json::from_value(info).map_err(|e| invalid(format!("invalid info.json: {e}")))?;

    let package_json = dir.join("package.json");
    let package_template = dir.join("package.json.ejs");
    if package_json.is_file() {
        add_on.package_additions = read_json::<PackageAdditions>(&package_json)?;
    } else if package_template.is_file() {
        add_on.package_template = Some(read_text(&package_template)?);
    }

    let readme = dir.join("README.md");
    if readme.is_file() {
        add_on.readme = Some(read_text(&readme)?);
    }

    let assets = dir.join(ASSETS_DIR);
    if assets.is_dir() {
        add_on.files = scan_files(&assets)?;
    }

    DomainValidator::validate_add_on(&add_on)?;
    debug!(id = %add_on.id, files = add_on.files.len(), "loaded add-on");
    Ok(add_on)
}

/// Every file under `dir`, keyed by `./`-prefixed relative path.
pub fn scan_files(dir: &Path) -> Result<BTreeMap<String, String>, DomainError> {
    let mut files = BTreeMap::new();

    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry =
            entry.map_err(|e| DomainError::InvalidFramework(format!("directory walk error: {e}")))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry.path().strip_prefix(dir).map_err(|_| {
            DomainError::InvalidFramework(format!(
                "failed to relativise '{}' against '{}'",
                entry.path().display(),
                dir.display()
            ))
        })?;
        let key = format!("./{}", normalize_path(&rel.to_string_lossy()));
        files.insert(key, read_file_content(entry.path())?);
    }

    Ok(files)
}

/// Read a file as text, or as a `base64::` payload when it is binary.
pub fn read_file_content(path: &Path) -> Result<String, DomainError> {
    let bytes = fs::read(path).map_err(|e| {
        DomainError::InvalidFramework(format!("failed to read '{}': {e}", path.display()))
    })?;

    let binary_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| BINARY_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));

    if binary_extension {
        return Ok(format!("{BINARY_PREFIX}{}", STANDARD.encode(&bytes)));
    }
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => Ok(format!("{BINARY_PREFIX}{}", STANDARD.encode(e.as_bytes()))),
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn read_text(path: &Path) -> Result<String, DomainError> {
    fs::read_to_string(path).map_err(|e| {
        DomainError::InvalidFramework(format!("failed to read '{}': {e}", path.display()))
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, DomainError> {
    let raw = read_text(path)?;
    serde_json::from_str(&raw).map_err(|e| {
        DomainError::InvalidFramework(format!("failed to parse '{}': {e}", path.display()))
    })
}

fn sorted_subdirectories(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Forward slashes on every platform.
fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}
