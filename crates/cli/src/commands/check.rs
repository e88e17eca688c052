use std::path::Path;
use std::process;

use serde_json::json;
use studyconf_engine::migration::Migrator;
use studyconf_model::revive;

use super::{print_json, read_document};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_check(path: &Path, output: OutputFormat, quiet: bool) {
    let plain = read_document(path, 1, output, quiet);
    let document = match revive(&plain) {
        Ok(d) => d,
        Err(e) => {
            report_error(&format!("{}: {}", path.display(), e), output, quiet);
            process::exit(1);
        }
    };

    let migrator = Migrator::standard();
    let current = migrator.current_version();
    let version = document.config_version();
    let up_to_date = version == Some(current);
    let study = document.node(document.root()).id().unwrap_or_default().to_string();

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => print_json(&json!({
            "study": study,
            "nodes": document.node_count(),
            "config_version": version,
            "current_version": current,
            "up_to_date": up_to_date,
        })),
        OutputFormat::Text | OutputFormat::Csv => {
            let status = match version {
                Some(v) if v == current => "up to date".to_string(),
                Some(v) if v > current => format!("newer than supported version {}", current),
                Some(v) => format!("migration required: {} -> {}", v, current),
                None => "no configVersion".to_string(),
            };
            println!(
                "{}: {} nodes, version {} ({})",
                study,
                document.node_count(),
                version.map(|v| v.to_string()).unwrap_or_else(|| "unknown".to_string()),
                status
            );
        }
    }
}
