//! Path rewriting rules for composed files.
//!
//! Source paths in add-ons and framework bases use a few conventions that are
//! resolved on the way out:
//!
//! - `_dot_` at the start of a segment stands for a leading `.`
//!   (`_dot_gitignore` → `.gitignore`), so dotfiles survive packaging.
//! - A trailing `.ejs` marks a file that goes through the template renderer.
//! - A trailing `.append` (after `.ejs` is removed) appends to the target
//!   instead of replacing it.
//! - With TypeScript off, `.tsx` becomes `.jsx` and `.ts` becomes `.js`.

use std::sync::LazyLock;

use regex::Regex;

/// Marks a file that is rendered before being written.
pub const TEMPLATE_SUFFIX: &str = ".ejs";
/// Marks a file whose content is appended to the target.
pub const APPEND_SUFFIX: &str = ".append";

const DOT_MARKER: &str = "_dot_";

static PLACEHOLDER_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+/)?__([^_]+)__(.+)$").expect("placeholder pattern is valid")
});

/// Where one source file lands and how it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPath {
    /// Relative to the project root, `/`-separated, no leading `./`.
    pub path: String,
    pub append: bool,
}

pub fn is_template(source: &str) -> bool {
    source.ends_with(TEMPLATE_SUFFIX)
}

/// Turn `_dot_`-prefixed segments into dot-prefixed ones.
pub fn convert_dot_files(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(DOT_MARKER) {
            Some(rest) => format!(".{rest}"),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Compute the output path for a source file.
pub fn target_path(source: &str, typescript: bool) -> TargetPath {
    let trimmed = strip_leading_dot_slash(source);
    let without_template = trimmed.strip_suffix(TEMPLATE_SUFFIX).unwrap_or(trimmed);
    let mut path = convert_dot_files(without_template);

    let append = match path.strip_suffix(APPEND_SUFFIX) {
        Some(stripped) => {
            path = stripped.to_string();
            true
        }
        None => false,
    };

    if !typescript {
        path = to_javascript_extension(&path);
    }

    TargetPath { path, append }
}

/// `.tsx` → `.jsx`, `.ts` → `.js`; anything else unchanged.
pub fn to_javascript_extension(path: &str) -> String {
    if let Some(stem) = path.strip_suffix(".tsx") {
        format!("{stem}.jsx")
    } else if let Some(stem) = path.strip_suffix(".ts") {
        format!("{stem}.js")
    } else {
        path.to_string()
    }
}

/// Whether the output at `target` gets code formatting.
pub fn is_formattable(target: &str) -> bool {
    target.ends_with(".ts") || target.ends_with(".tsx")
}

/// Normalize a source path for matching against composed output paths.
///
/// Drops a leading `./` and trailing `.ejs`, converts every `_dot_` to `.`,
/// and removes a `__name__` prefix from the final segment.
pub fn normalize_source_path(path: &str) -> String {
    let p = strip_leading_dot_slash(path);
    let p = p.strip_suffix(TEMPLATE_SUFFIX).unwrap_or(p);
    let p = p.replace(DOT_MARKER, ".");

    match PLACEHOLDER_SEGMENT.captures(&p) {
        Some(caps) => {
            let dir = caps.get(1).map_or("", |m| m.as_str());
            let rest = caps.get(3).map_or("", |m| m.as_str());
            format!("{dir}{rest}")
        }
        None => p,
    }
}

pub fn strip_leading_dot_slash(path: &str) -> &str {
    path.strip_prefix("./").unwrap_or(path)
}

/// Import-style path from the file at `from` to `to`.
///
/// Backslashes are treated as separators. The result always starts with
/// `./` or `../`. With `strip_extension`, the final extension is dropped.
pub fn relative_path(from: &str, to: &str, strip_extension: bool) -> String {
    let from = from.replace('\\', "/");
    let to = to.replace('\\', "/");

    let from_dir: Vec<&str> = split_segments(&from);
    let from_dir = &from_dir[..from_dir.len().saturating_sub(1)];
    let to_segments = split_segments(&to);

    let common = from_dir
        .iter()
        .zip(&to_segments)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = from_dir.len() - common;
    let mut out = if ups == 0 {
        String::from("./")
    } else {
        "../".repeat(ups)
    };
    out.push_str(&to_segments[common..].join("/"));

    if strip_extension {
        if let Some(dot) = out.rfind('.') {
            if dot > out.rfind('/').unwrap_or(0) {
                out.truncate(dot);
            }
        }
    }
    out
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Turn a file or directory name into a JavaScript identifier in PascalCase.
pub fn js_safe_name(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_markers_only_at_segment_start() {
        assert_eq!(convert_dot_files("_dot_vscode/settings.json"), ".vscode/settings.json");
        assert_eq!(convert_dot_files("src/my_dot_file.ts"), "src/my_dot_file.ts");
    }

    #[test]
    fn template_suffix_and_leading_dot_slash_are_removed() {
        let t = target_path("./src/main.tsx.ejs", true);
        assert_eq!(t.path, "src/main.tsx");
        assert!(!t.append);
    }

    #[test]
    fn append_suffix_is_detected_after_template_suffix() {
        let t = target_path("./_dot_env.local.append.ejs", true);
        assert_eq!(t.path, ".env.local");
        assert!(t.append);
    }

    #[test]
    fn javascript_mode_rewrites_extensions() {
        assert_eq!(target_path("src/App.tsx.ejs", false).path, "src/App.jsx");
        assert_eq!(target_path("src/lib/utils.ts", false).path, "src/lib/utils.js");
        assert_eq!(target_path("src/styles.css", false).path, "src/styles.css");
    }

    #[test]
    fn only_typescript_outputs_are_formatted() {
        assert!(is_formattable("src/a.ts"));
        assert!(is_formattable("src/a.tsx"));
        assert!(!is_formattable("src/a.js"));
        assert!(!is_formattable("package.json"));
    }

    #[test]
    fn normalize_source_path_rules() {
        assert_eq!(normalize_source_path("./src/main.tsx.ejs"), "src/main.tsx");
        assert_eq!(normalize_source_path("_dot_gitignore"), ".gitignore");
        assert_eq!(normalize_source_path("./src/routes/__root.tsx"), "src/routes/__root.tsx");
        assert_eq!(
            normalize_source_path("./src/__file-router__App.tsx.ejs"),
            "src/App.tsx"
        );
    }

    #[test]
    fn relative_path_same_directory() {
        assert_eq!(relative_path("src/utils.ts", "src/index.ts", true), "./index");
        assert_eq!(relative_path("src/utils.ts", "src/index.ts", false), "./index.ts");
    }

    #[test]
    fn relative_path_across_directories() {
        assert_eq!(relative_path("src/something/utils.ts", "src/index.ts", false), "../index.ts");
        assert_eq!(
            relative_path("src/utils.ts", "src/something/index.ts", false),
            "./something/index.ts"
        );
        assert_eq!(
            relative_path("src/bar/baz/utils.ts", "src/foo/bar/index.ts", false),
            "../../foo/bar/index.ts"
        );
        assert_eq!(
            relative_path(
                "src/routes/__root.tsx.ejs",
                "src/integrations/tanstack-query/layout.tsx",
                false
            ),
            "../integrations/tanstack-query/layout.tsx"
        );
    }

    #[test]
    fn relative_path_accepts_windows_separators() {
        assert_eq!(
            relative_path(
                ".\\src\\main.tsx.ejs",
                "src/integrations/tanstack-query/root-provider.tsx",
                false
            ),
            "./integrations/tanstack-query/root-provider.tsx"
        );
    }

    #[test]
    fn js_safe_names() {
        assert_eq!(js_safe_name("tanstack-query"), "TanstackQuery");
        assert_eq!(js_safe_name("demo.store"), "DemoStore");
        assert_eq!(js_safe_name("clerk"), "Clerk");
    }
}
