//! # Config Loader
//!
//! Reads the optional overlay file (`.env`) of a configuration directory.
//!
//! Absence is never an error: a missing directory, a directory without an
//! overlay file, or a file that cannot be read all yield an empty overlay, so
//! the run proceeds as if no configuration directory had been requested.
use crate::{constants::DOTENV_FILENAME, core::dotenv, system::os::OperatingSystem};
use std::{collections::BTreeMap, path::Path};

/// Loads the overlay entries found in `config_dir`.
///
/// # Arguments
///
/// * `config_dir` - The directory expected to hold the overlay file.
/// * `os` - The operating system whose filesystem is searched.
pub fn load(config_dir: &Path, os: &dyn OperatingSystem) -> BTreeMap<String, String> {
    let filesystem = os.filesystem();

    if !filesystem.contains(config_dir) {
        log::debug!(
            "Config directory '{}' does not exist, nothing to overlay.",
            config_dir.display()
        );
        return BTreeMap::new();
    }

    let directory = match filesystem.mount(config_dir) {
        Ok(directory) => directory,
        Err(e) => {
            log::warn!(
                "Could not open config directory '{}': {}",
                config_dir.display(),
                e
            );
            return BTreeMap::new();
        }
    };

    if !directory.contains(DOTENV_FILENAME) {
        log::debug!(
            "No {} file in '{}', nothing to overlay.",
            DOTENV_FILENAME,
            config_dir.display()
        );
        return BTreeMap::new();
    }

    match directory.read(DOTENV_FILENAME) {
        Ok(content) => {
            let entries = dotenv::parse(&content);
            log::debug!(
                "Loaded {} overlay entries from '{}'.",
                entries.len(),
                config_dir.join(DOTENV_FILENAME).display()
            );
            entries
        }
        Err(e) => {
            log::warn!(
                "Could not read '{}': {}",
                config_dir.join(DOTENV_FILENAME).display(),
                e
            );
            BTreeMap::new()
        }
    }
}
