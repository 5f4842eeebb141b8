//! Explicit driver construction from a [`ResolvedConfiguration`].
//!
//! Resolution produces plain data; this module is the separate step that
//! consumes it: convert the options object into thirtyfour capabilities,
//! then either connect to the remote grid hub or spawn the local driver
//! service and connect to it.

use std::process::Stdio;
use std::time::Duration;

use serde_json::{Map, Value};
use thirtyfour::prelude::*;
use thirtyfour::DesiredCapabilities;
use tokio::process::{Child, Command};

use crate::error::{Result, RigError};
use crate::options::{Browser, BrowserOptions};
use crate::resolver::{DriverService, ResolvedConfiguration};

/// Selenoid hub endpoint used when the caller does not override it.
pub const DEFAULT_GRID_URL: &str = "http://0.0.0.0:4444/wd/hub";

/// How long a freshly spawned driver service gets to start listening.
const SERVICE_STARTUP_TIMEOUT: Duration = Duration::from_secs(20);

/// A live WebDriver session plus the locally spawned service process, if
/// any. Dropping without `quit()` leaves session teardown to the service
/// child being killed on drop.
pub struct ManagedDriver {
    driver: WebDriver,
    service: Option<Child>,
}

impl ManagedDriver {
    pub fn driver(&self) -> &WebDriver {
        &self.driver
    }

    /// End the session and stop the local service process.
    pub async fn quit(mut self) -> Result<()> {
        self.driver.quit().await?;
        if let Some(mut child) = self.service.take() {
            let _ = child.kill().await;
        }
        Ok(())
    }
}

/// Build a driver against the default grid hub (remote) or a local service.
pub async fn build_driver(resolved: &ResolvedConfiguration) -> Result<ManagedDriver> {
    build_driver_at(resolved, DEFAULT_GRID_URL).await
}

pub async fn build_driver_at(
    resolved: &ResolvedConfiguration,
    grid_url: &str,
) -> Result<ManagedDriver> {
    let capabilities = to_capabilities(&resolved.options)?;

    match (&resolved.service, &resolved.capabilities) {
        (None, Some(_)) => {
            let driver = WebDriver::new(grid_url, capabilities).await?;
            Ok(ManagedDriver {
                driver,
                service: None,
            })
        }
        (Some(service), None) => {
            let child = spawn_service(service)?;
            wait_for_service(service.port).await?;
            let url = format!("http://127.0.0.1:{}", service.port);
            let driver = WebDriver::new(&url, capabilities).await?;
            Ok(ManagedDriver {
                driver,
                service: Some(child),
            })
        }
        _ => Err(RigError::Configuration(
            "resolved configuration must carry exactly one of a local service \
             or remote capabilities"
                .to_string(),
        )),
    }
}

/// Key of the vendor options block carrying experimental options and
/// packed extensions.
fn vendor_options_key(browser: Browser) -> Option<&'static str> {
    match browser {
        Browser::Chrome => Some("goog:chromeOptions"),
        Browser::Edge => Some("ms:edgeOptions"),
        Browser::Firefox | Browser::Safari => None,
    }
}

/// Convert the resolved options object into thirtyfour capabilities.
pub fn to_capabilities(options: &BrowserOptions) -> Result<Capabilities> {
    let mut capabilities: Capabilities = match options.browser() {
        Browser::Chrome => {
            let mut caps = DesiredCapabilities::chrome();
            for argument in options.arguments() {
                caps.add_arg(argument)?;
            }
            caps.into()
        }
        Browser::Edge => {
            let mut caps = DesiredCapabilities::edge();
            for argument in options.arguments() {
                caps.add_arg(argument)?;
            }
            caps.into()
        }
        Browser::Firefox => {
            let mut caps = DesiredCapabilities::firefox();
            for argument in options.arguments() {
                caps.add_arg(argument)?;
            }
            caps.into()
        }
        Browser::Safari => DesiredCapabilities::safari().into(),
    };

    // Experimental options and packed extensions live in the vendor block
    // next to the args thirtyfour already placed there.
    if let Some(key) = vendor_options_key(options.browser()) {
        if !options.experimental().is_empty() || !options.extensions().is_empty() {
            let entry = capabilities
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(vendor) = entry {
                for (name, value) in options.experimental() {
                    vendor.insert(name.clone(), value.clone());
                }
                if !options.extensions().is_empty() {
                    vendor.insert(
                        "extensions".to_string(),
                        Value::Array(
                            options
                                .extensions()
                                .iter()
                                .map(|encoded| Value::String(encoded.clone()))
                                .collect(),
                        ),
                    );
                }
            }
        }
    }

    for (name, value) in options.capabilities() {
        capabilities.insert(name.clone(), value.clone());
    }

    Ok(capabilities)
}

fn spawn_service(service: &DriverService) -> Result<Child> {
    let mut command = Command::new(&service.executable);
    command
        .arg(format!("--port={}", service.port))
        .args(&service.args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    command.spawn().map_err(|err| {
        RigError::Service(format!(
            "failed to spawn {}: {err}",
            service.executable.display()
        ))
    })
}

/// Poll until the service accepts connections, bounded by
/// [`SERVICE_STARTUP_TIMEOUT`].
async fn wait_for_service(port: u16) -> Result<()> {
    let deadline = tokio::time::Instant::now() + SERVICE_STARTUP_TIMEOUT;
    loop {
        match tokio::net::TcpStream::connect(("127.0.0.1", port)).await {
            Ok(_) => return Ok(()),
            Err(err) => {
                if tokio::time::Instant::now() >= deadline {
                    return Err(RigError::Service(format!(
                        "driver service on port {port} did not start within {}s: {err}",
                        SERVICE_STARTUP_TIMEOUT.as_secs()
                    )));
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}
