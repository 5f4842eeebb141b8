//! Browser identifiers and per-browser options objects.
//!
//! The supported browsers form a closed set, so lookup failures happen at
//! parse time rather than deep inside configuration. Each options variant
//! exposes an explicit capability interface: additions the browser does not
//! support return a soft [`RigError::UnsupportedCapability`] instead of
//! being probed for at runtime.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::RigError;

/// Suffix on a composite browser identifier that selects grid execution,
/// e.g. `chrome_remote`.
const REMOTE_SUFFIX: &str = "_remote";

/// Chrome launch arguments applied to every resolution, tuned to keep the
/// browser quiet and fingerprint-stable under automation.
pub const DEFAULT_CHROME_ARGUMENTS: &[&str] = &[
    "--start-maximized",
    "--no-first-run",
    "--disable-backgrounding-occluded-windows",
    "--disable-hang-monitor",
    "--metrics-recording-only",
    "--disable-sync",
    "--disable-background-timer-throttling",
    "--disable-prompt-on-repost",
    "--disable-background-networking",
    "--disable-infobars",
    "--remote-allow-origins=*",
    "--homepage=about:blank",
    "--no-service-autorun",
    "--disable-ipc-flooding-protection",
    "--disable-session-crashed-bubble",
    "--force-fieldtrials=*BackgroundTracing/default/",
    "--disable-breakpad",
    "--password-store=basic",
    "--disable-features=IsolateOrigins,site-per-process",
    "--disable-client-side-phishing-detection",
    "--use-mock-keychain",
    "--no-pings",
    "--disable-renderer-backgrounding",
    "--disable-component-update",
    "--disable-dev-shm-usage",
    "--disable-default-apps",
    "--disable-domain-reliability",
    "--no-default-browser-check",
    "--disable-features=PrivacySandboxSettings4",
];

/// Experimental options that strip the "controlled by automated software"
/// markers from Chromium-family browsers.
pub fn default_experimental_options() -> Map<String, Value> {
    let mut options = Map::new();
    options.insert(
        "excludeSwitches".to_string(),
        serde_json::json!(["enable-automation"]),
    );
    options.insert("useAutomationExtension".to_string(), Value::Bool(false));
    options
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Browser {
    Chrome,
    Firefox,
    Edge,
    Safari,
}

impl Browser {
    pub fn name(&self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
            Browser::Edge => "edge",
            Browser::Safari => "safari",
        }
    }

    /// Chrome and Edge share the Chromium option surface (experimental
    /// options, extensions, profile flags).
    pub fn is_chromium(&self) -> bool {
        matches!(self, Browser::Chrome | Browser::Edge)
    }

    /// Base name of the matching WebDriver executable.
    pub fn driver_executable(&self) -> &'static str {
        match self {
            Browser::Chrome => "chromedriver",
            Browser::Firefox => "geckodriver",
            Browser::Edge => "msedgedriver",
            Browser::Safari => "safaridriver",
        }
    }

    /// Fresh, empty options object for this browser.
    pub fn new_options(&self) -> BrowserOptions {
        match self {
            Browser::Chrome => BrowserOptions::Chrome(ChromiumOptions::default()),
            Browser::Edge => BrowserOptions::Edge(ChromiumOptions::default()),
            Browser::Firefox => BrowserOptions::Firefox(FirefoxOptions::default()),
            Browser::Safari => BrowserOptions::Safari(SafariOptions::default()),
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed composite browser identifier: the browser plus whether driver
/// commands go to a remote grid instead of a local process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserTarget {
    pub browser: Browser,
    pub remote: bool,
}

impl FromStr for BrowserTarget {
    type Err = RigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (name, remote) = match value.strip_suffix(REMOTE_SUFFIX) {
            Some(name) => (name, true),
            None => (value, false),
        };
        let browser = match name {
            "chrome" => Browser::Chrome,
            "firefox" => Browser::Firefox,
            "edge" => Browser::Edge,
            "safari" => Browser::Safari,
            _ => return Err(RigError::UnsupportedBrowser(value.to_string())),
        };
        Ok(BrowserTarget { browser, remote })
    }
}

/// A browser extension supplied to the resolver.
#[derive(Debug, Clone)]
pub enum Extension {
    /// Unpacked extension directory, loadable via `--load-extension`.
    Unpacked(PathBuf),
    /// Packed `.crx` file, installed individually (base64-encoded).
    Packed(PathBuf),
}

#[derive(Debug, Clone, Default)]
pub struct ChromiumOptions {
    arguments: Vec<String>,
    experimental: Vec<(String, Value)>,
    extensions: Vec<String>,
    capabilities: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct FirefoxOptions {
    arguments: Vec<String>,
    capabilities: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct SafariOptions {
    capabilities: Map<String, Value>,
}

/// Options object being assembled for one driver-construction request.
///
/// Flags and experimental options keep their insertion order; conflicting
/// flags are deduplicated in effect by the browser (last occurrence wins).
#[derive(Debug, Clone)]
pub enum BrowserOptions {
    Chrome(ChromiumOptions),
    Edge(ChromiumOptions),
    Firefox(FirefoxOptions),
    Safari(SafariOptions),
}

impl BrowserOptions {
    pub fn browser(&self) -> Browser {
        match self {
            BrowserOptions::Chrome(_) => Browser::Chrome,
            BrowserOptions::Edge(_) => Browser::Edge,
            BrowserOptions::Firefox(_) => Browser::Firefox,
            BrowserOptions::Safari(_) => Browser::Safari,
        }
    }

    /// Add a plain launch argument. Safari takes none.
    pub fn try_add_argument(&mut self, argument: &str) -> Result<(), RigError> {
        match self {
            BrowserOptions::Chrome(options) | BrowserOptions::Edge(options) => {
                options.arguments.push(argument.to_string());
                Ok(())
            }
            BrowserOptions::Firefox(options) => {
                options.arguments.push(argument.to_string());
                Ok(())
            }
            BrowserOptions::Safari(_) => Err(RigError::UnsupportedCapability {
                browser: "safari",
                kind: "launch arguments",
            }),
        }
    }

    /// Add an experimental option. Chromium family only.
    pub fn try_add_experimental(&mut self, name: &str, value: Value) -> Result<(), RigError> {
        match self {
            BrowserOptions::Chrome(options) | BrowserOptions::Edge(options) => {
                options.experimental.push((name.to_string(), value));
                Ok(())
            }
            BrowserOptions::Firefox(_) => Err(RigError::UnsupportedCapability {
                browser: "firefox",
                kind: "experimental options",
            }),
            BrowserOptions::Safari(_) => Err(RigError::UnsupportedCapability {
                browser: "safari",
                kind: "experimental options",
            }),
        }
    }

    /// Install a packed extension (base64-encoded CRX payload).
    pub fn try_add_extension(&mut self, encoded: String) -> Result<(), RigError> {
        match self {
            BrowserOptions::Chrome(options) | BrowserOptions::Edge(options) => {
                options.extensions.push(encoded);
                Ok(())
            }
            BrowserOptions::Firefox(_) => Err(RigError::UnsupportedCapability {
                browser: "firefox",
                kind: "packed extensions",
            }),
            BrowserOptions::Safari(_) => Err(RigError::UnsupportedCapability {
                browser: "safari",
                kind: "packed extensions",
            }),
        }
    }

    /// Set a raw capability. Supported by every browser.
    pub fn set_capability(&mut self, name: &str, value: Value) {
        let capabilities = match self {
            BrowserOptions::Chrome(options) | BrowserOptions::Edge(options) => {
                &mut options.capabilities
            }
            BrowserOptions::Firefox(options) => &mut options.capabilities,
            BrowserOptions::Safari(options) => &mut options.capabilities,
        };
        capabilities.insert(name.to_string(), value);
    }

    pub fn arguments(&self) -> &[String] {
        match self {
            BrowserOptions::Chrome(options) | BrowserOptions::Edge(options) => &options.arguments,
            BrowserOptions::Firefox(options) => &options.arguments,
            BrowserOptions::Safari(_) => &[],
        }
    }

    pub fn experimental(&self) -> &[(String, Value)] {
        match self {
            BrowserOptions::Chrome(options) | BrowserOptions::Edge(options) => {
                &options.experimental
            }
            _ => &[],
        }
    }

    pub fn extensions(&self) -> &[String] {
        match self {
            BrowserOptions::Chrome(options) | BrowserOptions::Edge(options) => &options.extensions,
            _ => &[],
        }
    }

    pub fn capabilities(&self) -> &Map<String, Value> {
        match self {
            BrowserOptions::Chrome(options) | BrowserOptions::Edge(options) => {
                &options.capabilities
            }
            BrowserOptions::Firefox(options) => &options.capabilities,
            BrowserOptions::Safari(options) => &options.capabilities,
        }
    }
}
