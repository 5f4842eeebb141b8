use thiserror::Error;

#[derive(Error, Debug)]
pub enum RigError {
    #[error("Unsupported browser: '{0}'")]
    UnsupportedBrowser(String),

    #[error("'{browser}' does not support {kind}")]
    UnsupportedCapability {
        browser: &'static str,
        kind: &'static str,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Driver executable not found: {0}")]
    DriverNotFound(String),

    #[error("Driver service error: {0}")]
    Service(String),

    #[error("Grid error: {0}")]
    Grid(String),

    #[error("Grid did not become ready within {0} seconds")]
    GridTimeout(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WebDriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),
}

pub type Result<T> = std::result::Result<T, RigError>;
