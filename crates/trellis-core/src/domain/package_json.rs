//! `package.json` assembly.

use serde_json::{Map, Value};

use crate::domain::entities::add_on::PackageAdditions;

/// Key in a framework's optional packages gated by `typescript`.
pub const TYPESCRIPT_PACKAGES: &str = "typescript";
/// Key in a framework's optional packages gated by `tailwind`.
pub const TAILWIND_PACKAGES: &str = "tailwindcss";

/// Recursively merge `overlay` into `base`.
///
/// Objects merge key by key; any other value in `overlay` replaces the one in
/// `base`. `null` in `overlay` leaves `base` untouched.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Manifest fragment for one add-on's static additions.
pub fn additions_value(additions: &PackageAdditions) -> Value {
    serde_json::to_value(additions).unwrap_or_else(|_| Value::Object(Map::new()))
}

/// Builds the final manifest one layer at a time.
#[derive(Debug, Clone)]
pub struct PackageJsonBuilder {
    manifest: Value,
}

impl PackageJsonBuilder {
    pub fn new(base: &Value) -> Self {
        let manifest = match base {
            Value::Object(_) => base.clone(),
            _ => Value::Object(Map::new()),
        };
        Self { manifest }
    }

    pub fn name(mut self, project_name: &str) -> Self {
        if let Value::Object(map) = &mut self.manifest {
            map.insert("name".into(), Value::String(project_name.into()));
        }
        self
    }

    /// Merge `layer` when it is present.
    pub fn layer(mut self, layer: Option<&Value>) -> Self {
        if let Some(layer) = layer {
            deep_merge(&mut self.manifest, layer);
        }
        self
    }

    pub fn build(self) -> Value {
        self.manifest
    }
}

/// Serialize a manifest the way it lands on disk.
pub fn to_pretty_string(manifest: &Value) -> String {
    let mut out = serde_json::to_string_pretty(manifest).unwrap_or_else(|_| "{}".into());
    out.push('\n');
    out
}
