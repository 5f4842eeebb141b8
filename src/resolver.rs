//! The configuration-resolution engine.
//!
//! One call to [`Resolver::resolve`] turns a driver-construction request
//! (browser identifier, raw flags, extensions, capability overrides) into a
//! single consistent [`ResolvedConfiguration`]: a populated options object
//! plus either a local driver service descriptor or a remote grid
//! capabilities mapping, never both.
//!
//! Resolution is synchronous and ordered; each call builds its own options
//! object, so concurrent resolutions never share mutable state. The only
//! I/O on this path is the driver executable lookup and the stealth patch
//! for local execution.

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::args::{apply_arguments, flag_value, scan_known_flags, LaunchArg};
use crate::attributes::{user_agent_pool, window_size_pool, window_size_string};
use crate::error::{Result, RigError};
use crate::manager::DriverManager;
use crate::options::{
    default_experimental_options, Browser, BrowserOptions, BrowserTarget, Extension,
    DEFAULT_CHROME_ARGUMENTS,
};
use crate::port::free_port;
use crate::stealth::remove_cdc;

/// Profile name assumed when a grid profile directory is bound without an
/// explicit `--profile-directory`.
pub const DEFAULT_PROFILE: &str = "Profile";

const DEFAULT_DEBUG_HOST: &str = "127.0.0.1";
const DEFAULT_LANG: &str = "en-US";

/// Fixed capability set advertised to the Selenoid grid.
fn selenoid_capabilities() -> Map<String, Value> {
    let mut selenoid = Map::new();
    selenoid.insert("enableVNC".to_string(), Value::Bool(true));
    selenoid.insert("enableVideo".to_string(), Value::Bool(false));
    selenoid.insert("enableLog".to_string(), Value::Bool(true));

    let mut capabilities = Map::new();
    capabilities.insert(
        "browserName".to_string(),
        Value::String("chrome".to_string()),
    );
    capabilities.insert("selenoid:options".to_string(), Value::Object(selenoid));
    capabilities
}

/// One driver-construction request.
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    /// Composite browser identifier; the `_remote` suffix selects grid
    /// execution (e.g. `chrome_remote`).
    pub browser: String,
    /// Raw caller-supplied flags and experimental-option maps.
    pub arguments: Vec<LaunchArg>,
    pub extensions: Vec<Extension>,
    /// Capability overrides; applied last, so they win over computed
    /// defaults.
    pub capabilities: Map<String, Value>,
    /// Extra runtime flags forwarded verbatim to the local driver service.
    pub service_args: Vec<String>,
    /// Convenience field translated into `--profile-directory=`.
    pub profile: Option<String>,
    /// Convenience field translated into `--user-data-dir=`.
    pub user_data_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub lang: Option<String>,
}

impl ResolveRequest {
    pub fn new(browser: impl Into<String>) -> Self {
        ResolveRequest {
            browser: browser.into(),
            ..ResolveRequest::default()
        }
    }
}

/// Local driver service descriptor: the executable to spawn plus its
/// runtime flags and listen port.
#[derive(Debug, Clone)]
pub struct DriverService {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub port: u16,
}

/// Final output of one resolution.
///
/// Exactly one of `service` (local execution) and `capabilities` (remote
/// grid execution) is populated.
#[derive(Debug, Clone)]
pub struct ResolvedConfiguration {
    pub options: BrowserOptions,
    pub service: Option<DriverService>,
    pub capabilities: Option<Map<String, Value>>,
}

pub struct Resolver {
    driver_root: Option<PathBuf>,
    stealth: bool,
}

impl Default for Resolver {
    fn default() -> Self {
        Resolver {
            driver_root: None,
            stealth: true,
        }
    }
}

impl Resolver {
    pub fn new() -> Self {
        Resolver::default()
    }

    /// Directory searched first for driver executables.
    pub fn with_driver_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.driver_root = Some(root.into());
        self
    }

    /// Disable the anti-detection binary patch for local drivers.
    pub fn with_stealth(mut self, stealth: bool) -> Self {
        self.stealth = stealth;
        self
    }

    pub fn resolve(&self, request: &ResolveRequest) -> Result<ResolvedConfiguration> {
        let target: BrowserTarget = request.browser.parse()?;
        let browser = target.browser;
        // The grid only runs Chrome sessions; other remote targets would
        // pair a mismatched options object with Chrome capabilities.
        if target.remote && browser != Browser::Chrome {
            return Err(RigError::UnsupportedBrowser(request.browser.clone()));
        }
        let mut options = browser.new_options();

        // Working argument list: defaults, caller flags, then derived flags
        // appended in resolution order. Existing entries are never rewritten.
        let mut arguments: Vec<LaunchArg> = Vec::new();
        if browser == Browser::Chrome {
            arguments.extend(DEFAULT_CHROME_ARGUMENTS.iter().map(|flag| LaunchArg::flag(*flag)));
        }
        arguments.extend(request.arguments.iter().cloned());

        if browser.is_chromium() {
            if let Some(profile) = &request.profile {
                arguments.push(LaunchArg::flag(format!("--profile-directory={profile}")));
            }
            if let Some(dir) = &request.user_data_dir {
                arguments.push(LaunchArg::flag(format!(
                    "--user-data-dir={}",
                    dir.display()
                )));
            }
            arguments.push(LaunchArg::Experimental(default_experimental_options()));
        } else if request.profile.is_some() || request.user_data_dir.is_some() {
            log::warn!("profile binding is only implemented for the Chromium family");
        }

        self.add_extensions(&mut options, &mut arguments, request)?;

        // Recover explicit fields, then fill the gaps deterministically.
        let known = scan_known_flags(&arguments);
        let profile_name = known
            .profile_directory
            .clone()
            .or_else(|| request.profile.clone());

        // The fingerprint and debugging flags are Chromium surface; other
        // browsers run with the caller's arguments alone.
        if browser.is_chromium() {
            let user_agents = user_agent_pool()?;
            let window_sizes = window_size_pool()?;

            let (user_agent, window_size) = if let Some(name) = &profile_name {
                // Dominant path for persistent profiles: the hashed draw
                // keeps the fingerprint stable across process restarts.
                (
                    user_agents.hashed(Some(name)).clone(),
                    window_size_string(*window_sizes.hashed(Some(name))),
                )
            } else {
                let user_agent = known
                    .user_agent
                    .clone()
                    .unwrap_or_else(|| user_agents.random().clone());
                let window_size = known
                    .window_size
                    .clone()
                    .unwrap_or_else(|| window_size_string(*window_sizes.random()));
                (user_agent, window_size)
            };

            arguments.push(LaunchArg::flag(format!("--user-agent={user_agent}")));
            arguments.push(LaunchArg::flag(format!("--window-size={window_size}")));

            let host = request
                .host
                .clone()
                .unwrap_or_else(|| DEFAULT_DEBUG_HOST.to_string());
            let debug_port = match request.port {
                Some(port) => port,
                None => free_port()?,
            };
            let lang = request
                .lang
                .clone()
                .unwrap_or_else(|| DEFAULT_LANG.to_string());
            arguments.push(LaunchArg::flag(format!("--remote-debugging-host={host}")));
            arguments.push(LaunchArg::flag(format!(
                "--remote-debugging-port={debug_port}"
            )));
            arguments.push(LaunchArg::flag(format!("--lang={lang}")));
        }

        let mut service = None;
        let mut remote_capabilities = None;
        let final_capabilities;

        if target.remote {
            let mut capabilities = selenoid_capabilities();
            self.bind_grid_profile(&mut capabilities, &arguments, profile_name.as_deref());
            // Caller overrides merge last so they win over every computed
            // entry, the grid profile binding included.
            for (name, value) in &request.capabilities {
                capabilities.insert(name.clone(), value.clone());
            }
            remote_capabilities = Some(capabilities.clone());
            final_capabilities = capabilities;
        } else {
            let manager = DriverManager::new(browser).with_root(self.driver_root.clone());
            let executable = manager.install()?;
            if self.stealth && browser == Browser::Chrome {
                remove_cdc(&executable)?;
            }
            service = Some(DriverService {
                executable,
                args: request.service_args.clone(),
                port: free_port()?,
            });
            final_capabilities = request.capabilities.clone();
        }

        for (name, value) in &final_capabilities {
            options.set_capability(name, value.clone());
        }

        // Sentinel from the parser means "start over with a fresh object".
        let options =
            apply_arguments(options, &arguments).unwrap_or_else(|| browser.new_options());

        Ok(ResolvedConfiguration {
            options,
            service,
            capabilities: remote_capabilities,
        })
    }

    /// Extension merging: when every entry is an unpacked directory they
    /// collapse into one comma-joined `--load-extension` flag; otherwise
    /// every entry is installed individually (packed files are read and
    /// base64-encoded, unpacked directories cannot be and are skipped).
    fn add_extensions(
        &self,
        options: &mut BrowserOptions,
        arguments: &mut Vec<LaunchArg>,
        request: &ResolveRequest,
    ) -> Result<()> {
        if request.extensions.is_empty() {
            return Ok(());
        }
        if !options.browser().is_chromium() {
            log::warn!(
                "extensions are only implemented for the Chromium family, ignored for '{}'",
                options.browser()
            );
            return Ok(());
        }

        let all_unpacked = request
            .extensions
            .iter()
            .all(|extension| matches!(extension, Extension::Unpacked(_)));

        if all_unpacked {
            let paths: Vec<String> = request
                .extensions
                .iter()
                .map(|extension| match extension {
                    Extension::Unpacked(path) => path.display().to_string(),
                    Extension::Packed(path) => path.display().to_string(),
                })
                .collect();
            arguments.push(LaunchArg::flag(format!(
                "--load-extension={}",
                paths.join(",")
            )));
            return Ok(());
        }

        log::debug!("packed or mixed extension list, installing individually");
        for extension in &request.extensions {
            match extension {
                Extension::Packed(path) => {
                    use base64::Engine;
                    let content = std::fs::read(path)?;
                    let encoded = base64::engine::general_purpose::STANDARD.encode(content);
                    if let Err(err) = options.try_add_extension(encoded) {
                        log::warn!("{err}");
                    }
                }
                Extension::Unpacked(path) => {
                    log::warn!(
                        "unpacked extension {} cannot be installed individually, skipping",
                        path.display()
                    );
                }
            }
        }
        Ok(())
    }

    /// Remote mode: bind the browser profile directory, if any, into the
    /// grid environment so the containerized browser reuses it.
    fn bind_grid_profile(
        &self,
        capabilities: &mut Map<String, Value>,
        arguments: &[LaunchArg],
        profile_name: Option<&str>,
    ) {
        for argument in arguments {
            let LaunchArg::Flag(flag) = argument else {
                continue;
            };
            if !flag.contains("--user-data-dir") {
                continue;
            }
            let dir = flag_value(flag);
            let entry = capabilities
                .entry("selenoid:options".to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(selenoid) = entry {
                selenoid.insert(
                    "env".to_string(),
                    Value::Array(vec![Value::String(format!("BROWSER_PROFILE_DIR={dir}"))]),
                );
            }
            log::debug!(
                "grid profile '{}' bound to {dir}",
                profile_name.unwrap_or(DEFAULT_PROFILE)
            );
            break;
        }
    }
}
