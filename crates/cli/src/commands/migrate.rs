use std::path::Path;
use std::process;

use serde_json::json;
use studyconf_engine::migration::{document_version, MigrationReport, Migrator};

use super::{print_json, read_document};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_migrate(path: &Path, write: Option<&Path>, output: OutputFormat, quiet: bool) {
    let mut document = read_document(path, 1, output, quiet);
    let migrator = Migrator::standard();

    let from = match document_version(&document) {
        Ok(v) => v,
        Err(e) => {
            report_error(&format!("{}: {}", path.display(), e), output, quiet);
            process::exit(1);
        }
    };

    let reports = match migrator.migrate(&mut document) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!("{}: {}", path.display(), e);
            report_failure(&msg, e.completed(), output, quiet);
            process::exit(1);
        }
    };
    let to = migrator.current_version();

    if let Some(out) = write {
        let pretty = serde_json::to_string_pretty(&document).unwrap_or_default();
        if let Err(e) = std::fs::write(out, pretty + "\n") {
            let msg = format!("error writing '{}': {}", out.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
        tracing::info!(path = %out.display(), "migrated document written");
    }

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => print_json(&json!({
            "from_version": from,
            "to_version": to,
            "reports": reports,
        })),
        OutputFormat::Text | OutputFormat::Csv => println!("{}", to_text(from, to, &reports)),
    }
}

/// Report a failed migration along with the steps that succeeded before it.
fn report_failure(msg: &str, completed: &[MigrationReport], output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            eprintln!("{}", json!({ "error": msg, "completed": completed }));
        }
        OutputFormat::Text | OutputFormat::Csv => {
            for report in completed {
                println!("{}", report);
            }
            if !completed.is_empty() {
                println!("{} step(s) applied before the failure", completed.len());
            }
            report_error(msg, output, quiet);
        }
    }
}

fn to_text(from: u64, to: u64, reports: &[MigrationReport]) -> String {
    if reports.is_empty() {
        return format!("document is up to date (version {})", to);
    }
    let mut lines: Vec<String> = reports.iter().map(|r| r.to_string()).collect();
    lines.push(format!(
        "migrated from version {} to {} in {} step(s)",
        from,
        to,
        reports.len()
    ));
    lines.join("\n")
}
