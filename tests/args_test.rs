//! Tests for the option argument parser: known-flag extraction and
//! capability-gated application.

use serde_json::{json, Map};
use webrig::{apply_arguments, scan_known_flags, Browser, LaunchArg};

#[test]
fn test_scan_extracts_first_occurrence_only() {
    let arguments = vec![
        LaunchArg::flag("--no-first-run"),
        LaunchArg::flag("--user-agent=first-agent"),
        LaunchArg::flag("--user-agent=second-agent"),
        LaunchArg::flag("--window-size=1280,720"),
        LaunchArg::flag("--profile-directory=Profile 9"),
    ];

    let known = scan_known_flags(&arguments);
    assert_eq!(known.user_agent.as_deref(), Some("first-agent"));
    assert_eq!(known.window_size.as_deref(), Some("1280,720"));
    assert_eq!(known.profile_directory.as_deref(), Some("Profile 9"));
}

#[test]
fn test_scan_leaves_unknown_flags_alone() {
    let arguments = vec![
        LaunchArg::flag("--disable-sync"),
        LaunchArg::flag("--lang=en-US"),
    ];
    let known = scan_known_flags(&arguments);
    assert!(known.user_agent.is_none());
    assert!(known.window_size.is_none());
    assert!(known.profile_directory.is_none());
}

#[test]
fn test_apply_flags_and_experimental_to_chrome() {
    let mut experimental = Map::new();
    experimental.insert("excludeSwitches".to_string(), json!(["enable-automation"]));

    let arguments = vec![
        LaunchArg::flag("--disable-gpu"),
        LaunchArg::Experimental(experimental),
        LaunchArg::flag("--no-sandbox"),
    ];

    let options = apply_arguments(Browser::Chrome.new_options(), &arguments)
        .expect("chrome supports all addition kinds");
    assert_eq!(options.arguments(), ["--disable-gpu", "--no-sandbox"]);
    assert_eq!(options.experimental().len(), 1);
    assert_eq!(options.experimental()[0].0, "excludeSwitches");
}

#[test]
fn test_experimental_ignored_for_firefox_with_warning() {
    let mut experimental = Map::new();
    experimental.insert("useAutomationExtension".to_string(), json!(false));

    let arguments = vec![
        LaunchArg::flag("-headless"),
        LaunchArg::Experimental(experimental),
    ];

    let options =
        apply_arguments(Browser::Firefox.new_options(), &arguments).expect("firefox keeps flags");
    assert_eq!(options.arguments(), ["-headless"]);
    assert!(options.experimental().is_empty());
}

#[test]
fn test_unsupported_flag_degrades_without_error() {
    // Safari takes no launch arguments; the parser must absorb that and
    // keep going instead of raising.
    let arguments = vec![
        LaunchArg::flag("--window-size=800,600"),
        LaunchArg::flag("--lang=en-US"),
    ];
    let options =
        apply_arguments(Browser::Safari.new_options(), &arguments).expect("degrades, not fails");
    assert!(options.arguments().is_empty());
}
