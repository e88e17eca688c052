//! Optional `studyconf.toml` settings. Command line flags take precedence.
//!
//! ```toml
//! [output]
//! format = "json"
//!
//! [compare]
//! detect_renames = true
//!
//! [log]
//! level = "info"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::OutputFormat;

/// Looked up in the working directory when `--config` is not given.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "studyconf.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub output: OutputConfig,
    pub compare: CompareConfig,
    pub log: LogConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct OutputConfig {
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CompareConfig {
    /// Pair renamed children instead of reporting an addition and a removal.
    pub detect_renames: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LogConfig {
    pub level: Option<String>,
}

/// Read the explicit config file, or the default one if it exists.
pub(crate) fn load(explicit: Option<&Path>) -> Result<Config, String> {
    match explicit {
        Some(path) => read(path),
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.is_file() {
                read(path)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn read(path: &Path) -> Result<Config, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    parse(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}

fn parse(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}
