//! Tests for the grid layout rendering. Everything here runs without a
//! docker daemon; container lifecycle is exercised manually.

use tempfile::TempDir;
use webrig::grid::{chrome_image, Grid, GridConfig};
use webrig::RigError;

#[test]
fn test_chrome_image_tag_carries_the_version() {
    assert_eq!(chrome_image(119), "webrig-chrome_119.0");
}

#[test]
fn test_version_outside_supported_range_is_rejected() {
    let mut config = GridConfig::new("grid");
    config.chrome_version = 47;
    assert!(matches!(Grid::new(config), Err(RigError::Configuration(_))));

    let mut config = GridConfig::new("grid");
    config.chrome_version = 128;
    assert!(matches!(Grid::new(config), Err(RigError::Configuration(_))));

    let mut config = GridConfig::new("grid");
    config.chrome_version = 48;
    assert!(Grid::new(config).is_ok());
}

#[test]
fn test_rendered_dockerfile_pins_the_browser_image() {
    let mut config = GridConfig::new("grid");
    config.chrome_version = 119;
    let grid = Grid::new(config).expect("grid");

    let dockerfile = grid.render_dockerfile();
    assert!(dockerfile.contains("FROM selenoid/vnc:chrome_119.0"));
    assert!(!dockerfile.contains("{version}"));
}

#[test]
fn test_rendered_browsers_json_is_valid_and_versioned() {
    let mut config = GridConfig::new("grid");
    config.chrome_version = 119;
    let grid = Grid::new(config).expect("grid");

    let rendered = grid.render_browsers_json();
    let parsed: serde_json::Value = serde_json::from_str(&rendered).expect("valid JSON");
    assert_eq!(parsed["chrome"]["default"], "119.0");
    assert_eq!(
        parsed["chrome"]["versions"]["119.0"]["image"],
        "webrig-chrome_119.0:latest",
    );
}

#[test]
fn test_rendered_compose_uses_the_configured_network() {
    let mut config = GridConfig::new("grid");
    config.network = "isolated-net".to_string();
    let grid = Grid::new(config).expect("grid");

    let compose = grid.render_compose();
    assert!(compose.contains("- isolated-net"));
    assert!(compose.contains("isolated-net:"));
    assert!(!compose.contains("{network}"));
}

#[test]
fn test_write_layout_creates_the_working_tree() {
    let dir = TempDir::new().expect("tempdir");
    let grid = Grid::new(GridConfig::new(dir.path())).expect("grid");

    grid.write_layout().expect("layout");

    for subdir in ["target", "video", "logs"] {
        assert!(dir.path().join(subdir).is_dir(), "{subdir} directory");
    }
    assert!(dir.path().join("Dockerfile").is_file());
    assert!(dir.path().join("browsers.json").is_file());
    assert!(dir.path().join("docker-compose.yml").is_file());

    let browsers = std::fs::read_to_string(dir.path().join("browsers.json")).expect("read");
    serde_json::from_str::<serde_json::Value>(&browsers).expect("valid JSON on disk");
}
