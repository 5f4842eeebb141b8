//! Containerized Selenoid browser-grid orchestration.
//!
//! The grid layout (Dockerfile, browsers.json, compose file) is rendered
//! from embedded templates into a target directory, then driven through the
//! docker CLI. Readiness is observed by streaming the compose log output:
//! a reader task signals a channel once when the Selenoid listen marker
//! appears, and the caller awaits that signal under a bounded timeout.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::error::{Result, RigError};

pub const DOCKER_NETWORK: &str = "webrig";
pub const CONTAINER_SELENOID: &str = "webrig-selenoid";
pub const CONTAINER_SELENOID_UI: &str = "webrig-selenoid-ui";

const COMPOSE_FILE: &str = "docker-compose.yml";
const CHROME_VERSIONS: std::ops::RangeInclusive<u32> = 48..=127;

/// Line emitted by Selenoid once the hub accepts sessions.
const READY_MARKER: &str = "Listening on";
const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(120);

const DOCKERFILE_TEMPLATE: &str = include_str!("../docker/Dockerfile-chrome");
const BROWSERS_TEMPLATE: &str = include_str!("../docker/browsers.json");
const COMPOSE_TEMPLATE: &str = include_str!("../docker/docker-compose-selenoid.yml");

/// Tag of the Chrome image built for `version`.
pub fn chrome_image(version: u32) -> String {
    format!("webrig-chrome_{version}.0")
}

pub struct GridConfig {
    pub network: String,
    pub chrome_version: u32,
    pub target_dir: PathBuf,
    /// Upper bound on the wait for the hub to accept sessions.
    pub ready_timeout: Duration,
}

impl GridConfig {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        GridConfig {
            network: DOCKER_NETWORK.to_string(),
            chrome_version: *CHROME_VERSIONS.end(),
            target_dir: target_dir.into(),
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}

pub struct Grid {
    config: GridConfig,
}

impl Grid {
    pub fn new(config: GridConfig) -> Result<Self> {
        if !CHROME_VERSIONS.contains(&config.chrome_version) {
            return Err(RigError::Configuration(format!(
                "chrome version {} outside supported range {}..={}",
                config.chrome_version,
                CHROME_VERSIONS.start(),
                CHROME_VERSIONS.end()
            )));
        }
        Ok(Grid { config })
    }

    pub fn render_dockerfile(&self) -> String {
        DOCKERFILE_TEMPLATE.replace("{version}", &self.config.chrome_version.to_string())
    }

    pub fn render_browsers_json(&self) -> String {
        BROWSERS_TEMPLATE.replace("{version}", &self.config.chrome_version.to_string())
    }

    pub fn render_compose(&self) -> String {
        COMPOSE_TEMPLATE.replace("{network}", &self.config.network)
    }

    fn compose_path(&self) -> PathBuf {
        self.config.target_dir.join(COMPOSE_FILE)
    }

    /// Render the grid layout into the target directory: working
    /// subdirectories plus Dockerfile, browsers.json and the compose file.
    pub fn write_layout(&self) -> Result<()> {
        let target = &self.config.target_dir;
        for dir in ["target", "video", "logs"] {
            std::fs::create_dir_all(target.join(dir))?;
        }
        std::fs::write(target.join("Dockerfile"), self.render_dockerfile())?;
        std::fs::write(target.join("browsers.json"), self.render_browsers_json())?;
        std::fs::write(self.compose_path(), self.render_compose())?;
        Ok(())
    }

    /// Write the layout, create the docker network and build the Chrome
    /// image. Build output and failures come back from the docker CLI
    /// uninterpreted.
    pub async fn setup(&self) -> Result<()> {
        self.write_layout()?;
        self.create_network().await?;

        let tag = format!("{}:latest", chrome_image(self.config.chrome_version));
        let dockerfile = self.config.target_dir.join("Dockerfile");
        run_docker(&[
            "build",
            "-t",
            &tag,
            "-f",
            &dockerfile.display().to_string(),
            &self.config.target_dir.display().to_string(),
        ])
        .await?;
        log::info!("Built grid image {tag}");
        Ok(())
    }

    async fn create_network(&self) -> Result<()> {
        match run_docker(&["network", "create", &self.config.network]).await {
            Ok(_) => Ok(()),
            // Recreating an existing network is not a failure.
            Err(RigError::Grid(stderr)) if stderr.contains("already exists") => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Start the grid and wait until the Selenoid hub accepts sessions.
    ///
    /// `docker compose up -d` returns once the containers are created; the
    /// hub needs longer. A reader task follows the compose logs and signals
    /// the channel on the first listen marker; the wait is bounded by
    /// `ready_timeout`.
    pub async fn up(&self) -> Result<()> {
        let compose = self.compose_path().display().to_string();
        run_docker(&["compose", "-f", &compose, "up", "-d"]).await?;

        let mut logs = Command::new("docker")
            .args(["compose", "-f", &compose, "logs", "-f", "--no-color"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let (ready_tx, mut ready_rx) = mpsc::channel::<()>(1);
        if let Some(stdout) = logs.stdout.take() {
            spawn_marker_watch(stdout, ready_tx.clone());
        }
        if let Some(stderr) = logs.stderr.take() {
            spawn_marker_watch(stderr, ready_tx);
        }

        let outcome = tokio::time::timeout(self.config.ready_timeout, ready_rx.recv()).await;
        let _ = logs.kill().await;

        match outcome {
            Ok(Some(())) => {
                log::info!("Grid ready on the '{}' network", self.config.network);
                Ok(())
            }
            Ok(None) => Err(RigError::Grid(
                "compose log stream ended before the grid became ready".to_string(),
            )),
            Err(_) => Err(RigError::GridTimeout(self.config.ready_timeout.as_secs())),
        }
    }

    pub async fn down(&self) -> Result<()> {
        let compose = self.compose_path().display().to_string();
        run_docker(&["compose", "-f", &compose, "down"]).await?;
        Ok(())
    }
}

/// Follow one log stream, forwarding lines to the debug log and signalling
/// `ready` once when the listen marker appears.
fn spawn_marker_watch(
    stream: impl tokio::io::AsyncRead + Unpin + Send + 'static,
    ready: mpsc::Sender<()>,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        let mut signalled = false;
        while let Ok(Some(line)) = lines.next_line().await {
            log::debug!("grid: {line}");
            if !signalled && line.contains(READY_MARKER) {
                signalled = true;
                let _ = ready.try_send(());
            }
        }
    });
}

async fn run_docker(args: &[&str]) -> Result<String> {
    log::debug!("docker {}", args.join(" "));
    let output = Command::new("docker").args(args).output().await?;
    if !output.status.success() {
        return Err(RigError::Grid(format!(
            "docker {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
