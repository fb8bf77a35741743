// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Runtime settings loaded from environment variables.

use anyhow::{Context, Result};
use signmap_vision::ExtractionConfig;
use std::path::{Path, PathBuf};

/// CLI runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Number of worker threads for parallel page processing.
    pub worker_threads: usize,
    /// Extraction config file used when `--config` is not given.
    pub config_path: Option<PathBuf>,
    /// Tesseract language code.
    pub language: String,
}

impl Settings {
    /// Load settings from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            worker_threads: var("SIGNMAP_WORKER_THREADS")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or_else(num_cpus::get),
            config_path: var("SIGNMAP_CONFIG")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            language: var("SIGNMAP_LANG").unwrap_or_else(|| "eng".into()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Read an extraction config file; missing fields keep their defaults.
pub fn load_extraction_config(path: &Path) -> Result<ExtractionConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    ExtractionConfig::from_json(&json)
        .with_context(|| format!("Invalid config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let settings = Settings::from_lookup(lookup(&[]));
        assert_eq!(settings.worker_threads, num_cpus::get());
        assert_eq!(settings.config_path, None);
        assert_eq!(settings.language, "eng");
    }

    #[test]
    fn test_environment_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("SIGNMAP_WORKER_THREADS", "3"),
            ("SIGNMAP_CONFIG", "/etc/signmap.json"),
            ("SIGNMAP_LANG", "deu"),
        ]));
        assert_eq!(settings.worker_threads, 3);
        assert_eq!(settings.config_path, Some(PathBuf::from("/etc/signmap.json")));
        assert_eq!(settings.language, "deu");
    }

    #[test]
    fn test_invalid_thread_count_falls_back() {
        for value in ["zero", "0", "-2"] {
            let settings = Settings::from_lookup(lookup(&[("SIGNMAP_WORKER_THREADS", value)]));
            assert_eq!(settings.worker_threads, num_cpus::get());
        }
    }

    #[test]
    fn test_load_partial_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signmap.json");
        std::fs::write(&path, r#"{ "render_dpi": 300 }"#).unwrap();

        let config = load_extraction_config(&path).unwrap();
        assert_eq!(config.render_dpi, 300);
        assert_eq!(config.stacking.standard_height_px, 40);

        assert!(load_extraction_config(&dir.path().join("missing.json")).is_err());
    }
}
