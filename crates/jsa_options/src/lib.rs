//! jsa_options: `jsa.json` parsing and analyzer options.
//!
//! The analyzed source never carries configuration; these options come from
//! the host, either an explicit path or a `jsa.json` in the working
//! directory. Missing fields take their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "jsa.json";

/// Host-level analyzer options, matching the `jsa.json` schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct AnalyzerOptions {
    /// Extra names treated as declared in the program scope.
    pub globals: Vec<String>,
    /// Run the optimizer. When false the optimized code equals the
    /// generated code.
    pub optimize: bool,
    /// Bound on optimizer fixpoint iterations.
    pub max_optimizer_passes: u32,
    /// Watch-mode delay between the last change and re-analysis.
    pub debounce_ms: u64,
    /// Warn about local bindings that are never read.
    pub report_unused_variables: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            globals: Vec::new(),
            optimize: true,
            max_optimizer_passes: 32,
            debounce_ms: 1500,
            report_unused_variables: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parse options from JSON text.
pub fn parse_config(content: &str) -> Result<AnalyzerOptions, ConfigError> {
    Ok(serde_json::from_str(content)?)
}

/// Parse options from a file.
pub fn load_config(path: &Path) -> Result<AnalyzerOptions, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// The `jsa.json` in `dir`, if there is one.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    let candidate = dir.join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = AnalyzerOptions::default();
        assert!(options.globals.is_empty());
        assert!(options.optimize);
        assert_eq!(options.max_optimizer_passes, 32);
        assert_eq!(options.debounce_ms, 1500);
        assert!(options.report_unused_variables);
    }

    #[test]
    fn test_parse_camel_case() {
        let options = parse_config(
            r#"{
                "globals": ["$", "jQuery"],
                "optimize": false,
                "maxOptimizerPasses": 4,
                "debounceMs": 250,
                "reportUnusedVariables": false
            }"#,
        )
        .unwrap();
        assert_eq!(options.globals, vec!["$", "jQuery"]);
        assert!(!options.optimize);
        assert_eq!(options.max_optimizer_passes, 4);
        assert_eq!(options.debounce_ms, 250);
        assert!(!options.report_unused_variables);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let options = parse_config(r#"{ "debounceMs": 100 }"#).unwrap();
        assert_eq!(options.debounce_ms, 100);
        assert!(options.optimize);
        assert_eq!(parse_config("{}").unwrap(), AnalyzerOptions::default());
    }

    #[test]
    fn test_rejects_unknown_fields_and_bad_json() {
        assert!(matches!(parse_config(r#"{ "optimise": true }"#), Err(ConfigError::Parse(_))));
        assert!(matches!(parse_config("{ not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("does/not/exist/jsa.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("does/not/exist/jsa.json"));
    }

    #[test]
    fn test_round_trip_through_json() {
        let options = AnalyzerOptions {
            globals: vec!["app".to_string()],
            ..AnalyzerOptions::default()
        };
        let json = serde_json::to_string(&options).unwrap();
        assert!(json.contains("\"maxOptimizerPasses\":32"));
        assert_eq!(parse_config(&json).unwrap(), options);
    }
}
