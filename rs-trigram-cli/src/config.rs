use std::path::Path;

use log::{debug, warn};
use rs_trigram_core::SmoothingKind;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "rs-trigram";
const CONFIG_NAME: Option<&str> = Some("config");

/// Defaults for every command; command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub smoothing: SmoothingKind,
    pub lambda: f64,
    pub min_frequency: u64,
    /// Counting threads; 0 uses every core.
    pub threads: usize,
    /// Sample length cap; 0 means no cap.
    pub max_length: usize,
    pub samples: usize,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            smoothing: SmoothingKind::AddLambda,
            lambda: 0.01,
            min_frequency: 1,
            threads: 0,
            max_length: 50,
            samples: 10,
            seed: None,
        }
    }
}

impl Config {
    /// Loads `path` if given, the per-user configuration otherwise.
    ///
    /// Falls back to defaults when the file is missing or cannot be read
    /// or parsed. A missing file is never created.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) if !path.exists() => {
                warn!("Config {} does not exist, using defaults", path.display());
                return Self::default();
            }
            Some(path) => path.to_path_buf(),
            None => match confy::get_configuration_file_path(APP_NAME, CONFIG_NAME) {
                Ok(path) => path,
                Err(err) => {
                    warn!("Cannot locate the user config, using defaults: {err}");
                    return Self::default();
                }
            },
        };
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match confy::load_path(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!("Failed to load config {}, using defaults: {err}", path.display());
                Self::default()
            }
        }
    }
}
