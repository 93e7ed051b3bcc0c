//! Formatters for generated TypeScript.
//!
//! [`TypeScriptFormatter`] reprints `.ts`/`.tsx` output with dprint using
//! prettier-compatible settings: no semicolons, single quotes and trailing
//! commas on multi-line lists. [`NormalizingFormatter`] only cleans up the
//! whitespace that template conditionals leave behind and serves as the
//! fallback when a file does not parse.

use std::path::Path;

use dprint_plugin_typescript::{
    FormatTextOptions,
    configuration::{
        Configuration, ConfigurationBuilder, QuoteStyle, SemiColons, TrailingCommas,
    },
    format_text,
};
use tracing::warn;
use trellis_core::{application::ports::CodeFormatter, error::TrellisResult};

/// Line-ending, trailing-whitespace and blank-line normalization.
#[derive(Debug, Clone, Copy)]
pub struct NormalizingFormatter {
    max_blank_lines: usize,
}

impl NormalizingFormatter {
    pub fn new() -> Self {
        Self { max_blank_lines: 1 }
    }

    pub fn max_blank_lines(mut self, n: usize) -> Self {
        self.max_blank_lines = n;
        self
    }
}

impl Default for NormalizingFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeFormatter for NormalizingFormatter {
    fn format(&self, _path: &str, content: &str) -> TrellisResult<String> {
        let mut out = String::with_capacity(content.len());
        let mut blank_run = 0;
        let mut seen_code = false;

        for line in content.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                blank_run += 1;
                if !seen_code || blank_run > self.max_blank_lines {
                    continue;
                }
            } else {
                blank_run = 0;
                seen_code = true;
            }
            out.push_str(line);
            out.push('\n');
        }

        while out.ends_with("\n\n") {
            out.pop();
        }
        Ok(out)
    }
}

// ── TypeScriptFormatter ─────────────────────────────────────────────────────

/// dprint-backed formatter configured like `prettier --no-semi --single-quote
/// --trailing-comma all`.
pub struct TypeScriptFormatter {
    config: Configuration,
    fallback: NormalizingFormatter,
}

impl TypeScriptFormatter {
    pub fn new() -> Self {
        let config = ConfigurationBuilder::new()
            .line_width(80)
            .indent_width(2)
            .quote_style(QuoteStyle::PreferSingle)
            .semi_colons(SemiColons::Asi)
            .trailing_commas(TrailingCommas::OnlyMultiLine)
            .build();
        Self {
            config,
            fallback: NormalizingFormatter::new(),
        }
    }
}

impl Default for TypeScriptFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeFormatter for TypeScriptFormatter {
    fn format(&self, path: &str, content: &str) -> TrellisResult<String> {
        let options = FormatTextOptions {
            path: Path::new(path),
            extension: None,
            text: content.to_string(),
            config: &self.config,
            external_formatter: None,
        };
        match format_text(options) {
            Ok(Some(formatted)) => Ok(formatted),
            Ok(None) => Ok(content.to_string()),
            Err(e) => {
                warn!(path, error = %e, "Could not parse generated file, normalizing whitespace only");
                self.fallback.format(path, content)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pretty(path: &str, input: &str) -> String {
        TypeScriptFormatter::new().format(path, input).unwrap()
    }

    #[test]
    fn typescript_uses_single_quotes_without_semicolons() {
        let out = pretty(
            "src/store.ts",
            "import { Store } from \"@tanstack/store\";\nexport const store = new Store({count: 0});\n",
        );
        assert!(out.contains("from '@tanstack/store'"), "{out}");
        assert!(out.contains("new Store({ count: 0 })"), "{out}");
        assert!(!out.contains(';'), "{out}");
    }

    #[test]
    fn multi_line_lists_get_trailing_commas() {
        let out = pretty("src/routes.ts", "export const routes = [\n  \"a\",\n  \"b\"\n]\n");
        assert!(out.contains("'b',\n]"), "{out}");
    }

    #[test]
    fn tsx_is_parsed_as_jsx() {
        let out = pretty(
            "src/App.tsx",
            "export default function App() { return <div className=\"app\">hi</div>; }\n",
        );
        assert!(out.contains("<div className=\"app\">hi</div>"), "{out}");
        assert!(!out.contains(';'), "{out}");
    }

    #[test]
    fn unparsable_input_falls_back_to_whitespace_cleanup() {
        let out = pretty("src/broken.ts", "const = {   \n\n\n\n");
        assert_eq!(out, "const = {\n");
    }

    fn format(input: &str) -> String {
        NormalizingFormatter::new().format("src/a.ts", input).unwrap()
    }

    #[test]
    fn collapses_blank_runs_and_trailing_space() {
        assert_eq!(
            format("import a from 'a'   \n\n\n\nconst x = 1\r\n"),
            "import a from 'a'\n\nconst x = 1\n"
        );
    }

    #[test]
    fn drops_leading_blank_lines_and_ends_with_one_newline() {
        assert_eq!(format("\n\nexport {}\n\n\n"), "export {}\n");
    }

    #[test]
    fn blank_line_limit_is_configurable() {
        let out = NormalizingFormatter::new()
            .max_blank_lines(2)
            .format("a.ts", "a\n\n\n\nb")
            .unwrap();
        assert_eq!(out, "a\n\n\nb\n");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(format(""), "");
    }
}
