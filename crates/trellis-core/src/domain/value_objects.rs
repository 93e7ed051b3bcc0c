//! Domain value objects: AddOnType, Phase, Mode, PackageManager.
//!
//! # Design
//!
//! These are pure value types with equality-by-value and no identity. Each
//! one defines its string representation and a `FromStr` parser; the serde
//! names match the strings used in `info.json` descriptors.
//!
//! # Composition order
//!
//! [`COMPOSITION_TYPES`] and [`COMPOSITION_PHASES`] fix the order in which
//! add-on files are layered onto the base project. Attribution walks the same
//! order in reverse.

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── AddOnType ────────────────────────────────────────────────────────────────

/// The kind of contribution an add-on makes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum AddOnType {
    #[default]
    AddOn,
    Example,
    Toolchain,
    Deployment,
    Starter,
    Host,
}

/// Types layered by the composition pipeline, in order.
pub const COMPOSITION_TYPES: [AddOnType; 4] = [
    AddOnType::AddOn,
    AddOnType::Example,
    AddOnType::Toolchain,
    AddOnType::Deployment,
];

impl AddOnType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AddOn => "add-on",
            Self::Example => "example",
            Self::Toolchain => "toolchain",
            Self::Deployment => "deployment",
            Self::Starter => "starter",
            Self::Host => "host",
        }
    }

    /// Whether at most one add-on of this type may be selected.
    pub const fn is_single_select(self) -> bool {
        matches!(self, Self::Deployment)
    }

    /// Directory name under a framework root that holds add-ons of this type.
    pub const fn directory_name(self) -> &'static str {
        match self {
            Self::AddOn => "add-ons",
            Self::Example => "examples",
            Self::Toolchain => "toolchains",
            Self::Deployment => "deployments",
            Self::Starter => "starters",
            Self::Host => "hosts",
        }
    }
}

impl fmt::Display for AddOnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddOnType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add-on" | "addon" => Ok(Self::AddOn),
            "example" => Ok(Self::Example),
            "toolchain" => Ok(Self::Toolchain),
            "deployment" => Ok(Self::Deployment),
            "starter" => Ok(Self::Starter),
            "host" => Ok(Self::Host),
            other => Err(DomainError::UnknownValue {
                kind: "add-on type",
                value: other.into(),
            }),
        }
    }
}

// ── Phase ────────────────────────────────────────────────────────────────────

/// Ordering bucket inside one add-on type.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Setup,
    #[default]
    AddOn,
    Example,
}

/// Phases in application order.
pub const COMPOSITION_PHASES: [Phase; 3] = [Phase::Setup, Phase::AddOn, Phase::Example];

impl Phase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::AddOn => "add-on",
            Self::Example => "example",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "setup" => Ok(Self::Setup),
            "add-on" | "addon" => Ok(Self::AddOn),
            "example" => Ok(Self::Example),
            other => Err(DomainError::UnknownValue {
                kind: "phase",
                value: other.into(),
            }),
        }
    }
}

// ── Mode ─────────────────────────────────────────────────────────────────────

/// Routing style of the generated project.
///
/// Frameworks may declare modes beyond the two well-known ones, so this is an
/// open newtype rather than an enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mode(String);

impl Mode {
    pub const FILE_ROUTER: &'static str = "file-router";
    pub const CODE_ROUTER: &'static str = "code-router";

    pub fn new(mode: impl Into<String>) -> Self {
        Self(mode.into())
    }

    pub fn file_router() -> Self {
        Self::new(Self::FILE_ROUTER)
    }

    pub fn code_router() -> Self {
        Self::new(Self::CODE_ROUTER)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_file_router(&self) -> bool {
        self.0 == Self::FILE_ROUTER
    }

    pub fn is_code_router(&self) -> bool {
        self.0 == Self::CODE_ROUTER
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::file_router()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Mode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ── PackageManager ───────────────────────────────────────────────────────────

/// A JavaScript package manager the generated project is driven with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Yarn,
    Pnpm,
    Bun,
    Deno,
}

impl PackageManager {
    /// All supported managers, in user-agent detection order.
    pub const ALL: [PackageManager; 5] = [Self::Npm, Self::Yarn, Self::Pnpm, Self::Bun, Self::Deno];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Pnpm => "pnpm",
            Self::Bun => "bun",
            Self::Deno => "deno",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageManager {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "npm" => Ok(Self::Npm),
            "yarn" => Ok(Self::Yarn),
            "pnpm" => Ok(Self::Pnpm),
            "bun" => Ok(Self::Bun),
            "deno" => Ok(Self::Deno),
            other => Err(DomainError::UnknownValue {
                kind: "package manager",
                value: other.into(),
            }),
        }
    }
}
