//! Driver executable lookup.
//!
//! Resolution order: explicit root directory, the webrig cache directory,
//! well-known system locations, then `PATH`. Locating may be preceded by an
//! out-of-band install (package manager, vendor download); webrig does not
//! download binaries itself.

use std::path::{Path, PathBuf};

use crate::error::{Result, RigError};
use crate::options::Browser;

const CACHE_SUBDIR: &str = "webrig";

const SYSTEM_DIRS: &[&str] = &["/usr/local/bin", "/usr/bin", "/opt/homebrew/bin"];

pub struct DriverManager {
    browser: Browser,
    root: Option<PathBuf>,
}

impl DriverManager {
    pub fn new(browser: Browser) -> Self {
        DriverManager {
            browser,
            root: None,
        }
    }

    /// Search this directory before anything else.
    pub fn with_root(mut self, root: Option<PathBuf>) -> Self {
        self.root = root;
        self
    }

    fn executable_name(&self) -> String {
        let name = self.browser.driver_executable();
        if cfg!(windows) {
            format!("{name}.exe")
        } else {
            name.to_string()
        }
    }

    /// Locate the matching driver executable, or explain how to get one.
    pub fn install(&self) -> Result<PathBuf> {
        let file_name = self.executable_name();
        let mut candidates: Vec<PathBuf> = Vec::new();

        if let Some(root) = &self.root {
            candidates.push(root.join(&file_name));
        }
        if let Some(cache) = dirs::cache_dir() {
            candidates.push(cache.join(CACHE_SUBDIR).join(&file_name));
        }
        for dir in SYSTEM_DIRS {
            candidates.push(Path::new(dir).join(&file_name));
        }
        if let Some(path) = std::env::var_os("PATH") {
            for dir in std::env::split_paths(&path) {
                candidates.push(dir.join(&file_name));
            }
        }

        for candidate in candidates {
            if candidate.is_file() {
                log::debug!(
                    "Using {} for {}",
                    candidate.display(),
                    self.browser
                );
                return Ok(candidate);
            }
        }

        Err(RigError::DriverNotFound(format!(
            "{file_name} not found for '{}'.\n\n\
             You can:\n\
             - Install it with your package manager (Ubuntu/Debian: sudo apt install chromium-driver)\n\
             - Download it from the vendor and place it on PATH\n\
             - Or point the resolver at a directory containing it (driver root)",
            self.browser
        )))
    }
}
