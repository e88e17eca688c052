pub(crate) mod check;
pub(crate) mod diff;
pub(crate) mod migrate;

use std::path::Path;
use std::process;

use serde_json::Value;

use crate::{report_error, OutputFormat};

/// Read and parse a JSON document, exiting with `code` on failure.
pub(crate) fn read_document(path: &Path, code: i32, output: OutputFormat, quiet: bool) -> Value {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(code);
        }
    };
    match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error parsing JSON in '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(code);
        }
    }
}

pub(crate) fn print_json(value: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}
