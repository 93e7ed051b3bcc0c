//! Tera-backed template renderer.
//!
//! Templates see the [`TemplateContext`] fields as snake_case variables plus
//! a few functions:
//!
//! - `ignore_file()` - do not write this file
//! - `get_package_manager_add_script(package, dev=false)`
//! - `get_package_manager_run_script(script, args=[])`
//! - `relative_path(path, strip_extension=false)` - import path from the file
//!   being rendered to `path`

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tera::{Context, Tera, Value};
use tracing::{instrument, trace};

use trellis_core::{
    application::{
        ApplicationError,
        ports::{RenderOutcome, TemplateRenderer},
    },
    domain::{
        PackageManager, TemplateContext,
        package_manager::{format_command, install_command, script_command},
        paths,
    },
    error::{TrellisError, TrellisResult},
};

/// Renders `.ejs`-marked sources with Tera.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeraRenderer;

impl TeraRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateRenderer for TeraRenderer {
    #[instrument(skip(self, content, context))]
    fn render(
        &self,
        file: &str,
        content: &str,
        context: &TemplateContext,
    ) -> TrellisResult<RenderOutcome> {
        let skipped = Arc::new(AtomicBool::new(false));

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        register_functions(&mut tera, file, context.package_manager, Arc::clone(&skipped));

        let ctx = Context::from_serialize(context).map_err(|e| render_error(file, &e))?;
        let rendered = tera
            .render_str(content, &ctx)
            .map_err(|e| render_error(file, &e))?;

        if skipped.load(Ordering::SeqCst) {
            trace!(file, "ignore_file() called");
            return Ok(RenderOutcome::Skipped);
        }
        Ok(RenderOutcome::Rendered(rendered))
    }
}

fn register_functions(tera: &mut Tera, file: &str, pm: PackageManager, skipped: Arc<AtomicBool>) {
    tera.register_function("ignore_file", move |_: &HashMap<String, Value>| {
        skipped.store(true, Ordering::SeqCst);
        Ok(Value::String(String::new()))
    });

    tera.register_function(
        "get_package_manager_add_script",
        move |args: &HashMap<String, Value>| {
            let package = string_arg(args, "get_package_manager_add_script", "package")?;
            let dev = args.get("dev").and_then(Value::as_bool).unwrap_or(false);
            let command = install_command(pm, Some(&package), dev);
            Ok(Value::String(format_command(&command)))
        },
    );

    tera.register_function(
        "get_package_manager_run_script",
        move |args: &HashMap<String, Value>| {
            let script = string_arg(args, "get_package_manager_run_script", "script")?;
            let extra: Vec<String> = match args.get("args") {
                Some(Value::Array(values)) => values
                    .iter()
                    .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
                    .collect(),
                _ => Vec::new(),
            };
            let mut all: Vec<&str> = vec![script.as_str()];
            all.extend(extra.iter().map(String::as_str));
            Ok(Value::String(format_command(&script_command(pm, &all))))
        },
    );

    let from = file.to_string();
    tera.register_function("relative_path", move |args: &HashMap<String, Value>| {
        let to = string_arg(args, "relative_path", "path")?;
        let strip = args
            .get("strip_extension")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(Value::String(paths::relative_path(&from, &to, strip)))
    });
}

fn string_arg(args: &HashMap<String, Value>, function: &str, key: &str) -> tera::Result<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| tera::Error::msg(format!("`{function}` needs a string `{key}` argument")))
}

/// Flatten Tera's error chain into one message.
fn render_error(file: &str, err: &tera::Error) -> TrellisError {
    let mut cause = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        cause.push_str(": ");
        cause.push_str(&inner.to_string());
        source = inner.source();
    }
    ApplicationError::TemplateRendering {
        path: file.into(),
        cause,
    }
    .into()
}
