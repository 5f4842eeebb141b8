pub mod args;
pub mod attributes;
pub mod driver;
pub mod error;
pub mod grid;
pub mod manager;
pub mod options;
pub mod port;
pub mod profiles;
pub mod resolver;
pub mod stealth;

// Re-export commonly used items
pub use args::{apply_arguments, scan_known_flags, KnownFlags, LaunchArg};
pub use attributes::{user_agent_pool, window_size_pool, window_size_string, AttributePool};
pub use driver::{build_driver, build_driver_at, ManagedDriver, DEFAULT_GRID_URL};
pub use error::{Result, RigError};
pub use grid::{Grid, GridConfig};
pub use manager::DriverManager;
pub use options::{Browser, BrowserOptions, BrowserTarget, Extension};
pub use port::free_port;
pub use profiles::ProfileStore;
pub use resolver::{
    DriverService, ResolveRequest, ResolvedConfiguration, Resolver, DEFAULT_PROFILE,
};
