use std::path::Path;
use std::process;

use studyconf_engine::compare::{self, AttributedDiff, CompareOptions};
use studyconf_model::{revive, Document};

use super::{print_json, read_document};
use crate::config::Config;
use crate::{report_error, OutputFormat};

/// Exit code when the documents cannot be compared.
const EXIT_ERROR: i32 = 2;

pub(crate) fn cmd_diff(
    target_path: &Path,
    source_path: &Path,
    raw: bool,
    config: &Config,
    output: OutputFormat,
    quiet: bool,
) {
    let target = load(target_path, output, quiet);
    let source = load(source_path, output, quiet);
    let options = CompareOptions {
        detect_renames: config.compare.detect_renames,
    };

    let differences = match compare::compare_with(&target, &source, &options) {
        Ok(d) => d,
        Err(e) => {
            report_error(&format!("diff error: {}", e), output, quiet);
            process::exit(EXIT_ERROR);
        }
    };
    let diff = if raw {
        AttributedDiff::unattributed(differences)
    } else {
        compare::attribute(differences, target.registry())
    };

    if !quiet {
        let registry = target.registry();
        match output {
            OutputFormat::Json => match diff.to_json() {
                Ok(json) => print_json(&json),
                Err(e) => {
                    report_error(&format!("diff error: {}", e), output, quiet);
                    process::exit(EXIT_ERROR);
                }
            },
            OutputFormat::Csv => print!("{}", diff.to_csv(registry)),
            OutputFormat::Text if diff.is_empty() => println!("no differences"),
            OutputFormat::Text => println!("{}", diff.to_text(registry)),
        }
    }
    if !diff.is_empty() {
        process::exit(1);
    }
}

fn load(path: &Path, output: OutputFormat, quiet: bool) -> Document {
    let plain = read_document(path, EXIT_ERROR, output, quiet);
    match revive(&plain) {
        Ok(d) => d,
        Err(e) => {
            report_error(&format!("{}: {}", path.display(), e), output, quiet);
            process::exit(EXIT_ERROR);
        }
    }
}
