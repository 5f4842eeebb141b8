use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::json;
use webrig::args::LaunchArg;
use webrig::grid::{Grid, GridConfig};
use webrig::profiles::ProfileStore;
use webrig::resolver::{ResolveRequest, Resolver};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a launch configuration and print it as JSON
    Resolve {
        /// Browser identifier; append `_remote` for grid execution
        #[arg(long, default_value = "chrome")]
        browser: String,
        /// Raw launch flag, repeatable
        #[arg(long = "flag")]
        flags: Vec<String>,
        /// Profile name (pins user agent and window size)
        #[arg(long)]
        profile: Option<String>,
        /// Browser user-data directory
        #[arg(long)]
        user_data_dir: Option<PathBuf>,
        /// Directory searched first for driver executables
        #[arg(long)]
        driver_root: Option<PathBuf>,
        /// Skip the anti-detection driver patch
        #[arg(long)]
        no_stealth: bool,
    },
    /// Manage the profile store
    Profile {
        /// Directory holding profiles.json
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Manage the containerized browser grid
    Grid {
        /// Directory the grid layout is rendered into
        #[arg(long, default_value = "grid")]
        target: PathBuf,
        #[command(subcommand)]
        action: GridAction,
    },
}

#[derive(Subcommand, Debug)]
enum ProfileAction {
    /// List stored profiles
    List,
    /// Create a profile pinned to its hashed fingerprint
    Create { name: String },
    /// Remove one profile
    Remove { name: String },
    /// Delete every profile and the backing file
    Clear,
}

#[derive(Subcommand, Debug)]
enum GridAction {
    /// Render the layout, create the network and build the Chrome image
    Setup {
        #[arg(long, default_value_t = 127)]
        chrome_version: u32,
    },
    /// Start the grid and wait for the hub
    Up {
        /// Readiness timeout in seconds
        #[arg(long, default_value_t = 120)]
        timeout: u64,
    },
    /// Stop the grid
    Down,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Resolve {
            browser,
            flags,
            profile,
            user_data_dir,
            driver_root,
            no_stealth,
        } => {
            let mut request = ResolveRequest::new(browser);
            request.arguments = flags.into_iter().map(LaunchArg::Flag).collect();
            request.profile = profile;
            request.user_data_dir = user_data_dir;

            let mut resolver = Resolver::new().with_stealth(!no_stealth);
            if let Some(root) = driver_root {
                resolver = resolver.with_driver_root(root);
            }
            let resolved = resolver.resolve(&request)?;

            let summary = json!({
                "browser": resolved.options.browser().name(),
                "arguments": resolved.options.arguments(),
                "experimental": resolved.options.experimental()
                    .iter()
                    .cloned()
                    .collect::<serde_json::Map<String, serde_json::Value>>(),
                "capabilities": resolved.capabilities,
                "service": resolved.service.as_ref().map(|service| json!({
                    "executable": service.executable.display().to_string(),
                    "args": service.args,
                    "port": service.port,
                })),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Profile { dir, action } => {
            let mut store = ProfileStore::open(&dir)?;
            match action {
                ProfileAction::List => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::Value::Object(
                            store.records().clone()
                        ))?
                    );
                }
                ProfileAction::Create { name } => {
                    let record = store.create_profile(&name)?;
                    println!("{}", serde_json::to_string_pretty(&record)?);
                }
                ProfileAction::Remove { name } => {
                    store.remove(&name)?;
                    log::info!("Removed profile '{name}'");
                }
                ProfileAction::Clear => {
                    store.clear()?;
                    log::info!("Profile store cleared");
                }
            }
        }
        Command::Grid { target, action } => match action {
            GridAction::Setup { chrome_version } => {
                let mut config = GridConfig::new(target);
                config.chrome_version = chrome_version;
                Grid::new(config)?.setup().await?;
            }
            GridAction::Up { timeout } => {
                let mut config = GridConfig::new(target);
                config.ready_timeout = Duration::from_secs(timeout);
                Grid::new(config)?.up().await?;
            }
            GridAction::Down => {
                Grid::new(GridConfig::new(target))?.down().await?;
            }
        },
    }

    Ok(())
}
