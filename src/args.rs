//! Launch-argument model and the option argument parser.
//!
//! The parser has two jobs: a read-only scan that recovers semantically
//! known flags (user agent, window size, profile directory) from a raw
//! argument list, and an imperative pass that applies every argument to an
//! options object through its capability interface. Unsupported additions
//! degrade with a warning; they never abort a resolution.

use serde_json::{Map, Value};

use crate::options::BrowserOptions;

/// One raw launch argument: either a flag string (optionally `--name=value`)
/// or a map of experimental options (meaningful only for the Chromium
/// family).
#[derive(Debug, Clone)]
pub enum LaunchArg {
    Flag(String),
    Experimental(Map<String, Value>),
}

impl LaunchArg {
    pub fn flag(value: impl Into<String>) -> Self {
        LaunchArg::Flag(value.into())
    }
}

/// Known flags recovered by [`scan_known_flags`]. Each field holds the value
/// of the first matching occurrence, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownFlags {
    pub user_agent: Option<String>,
    pub window_size: Option<String>,
    pub profile_directory: Option<String>,
}

/// The `value` of a `--name=value` flag; the whole flag when it has no `=`.
pub(crate) fn flag_value(flag: &str) -> String {
    match flag.rsplit_once('=') {
        Some((_, value)) => value.to_string(),
        None => flag.to_string(),
    }
}

/// Inspect `arguments` for the first user-agent, window-size and
/// profile-directory flags without consuming or reordering the list.
/// Later stages append derived flags rather than rewriting existing ones.
pub fn scan_known_flags(arguments: &[LaunchArg]) -> KnownFlags {
    let mut known = KnownFlags::default();
    for argument in arguments {
        let LaunchArg::Flag(flag) = argument else {
            continue;
        };
        if known.user_agent.is_none() && flag.contains("user-agent") {
            known.user_agent = Some(flag_value(flag));
            continue;
        }
        if known.window_size.is_none() && flag.contains("window-size") {
            known.window_size = Some(flag_value(flag));
            continue;
        }
        if known.profile_directory.is_none() && flag.contains("profile-directory") {
            known.profile_directory = Some(flag_value(flag));
        }
    }
    known
}

/// Apply `arguments` to `options` through its capability interface.
///
/// The first rejected flag disables further plain-flag additions for this
/// call; likewise for experimental options. Experimental maps are ignored
/// (with a warning) for non-Chromium browsers. Returns `None` once both
/// addition kinds are disabled; callers must treat that as "retry with a
/// fresh, empty options object".
pub fn apply_arguments(
    mut options: BrowserOptions,
    arguments: &[LaunchArg],
) -> Option<BrowserOptions> {
    let browser = options.browser();
    let mut accept_flags = true;
    let mut accept_experimental = true;

    for argument in arguments {
        match argument {
            LaunchArg::Flag(flag) => {
                if !accept_flags {
                    continue;
                }
                if let Err(err) = options.try_add_argument(flag) {
                    log::warn!("{err}; dropping remaining plain flags");
                    accept_flags = false;
                }
            }
            LaunchArg::Experimental(entries) => {
                if !browser.is_chromium() {
                    log::warn!("experimental options are Chromium-only, ignored for '{browser}'");
                    continue;
                }
                if !accept_experimental {
                    continue;
                }
                for (name, value) in entries {
                    if let Err(err) = options.try_add_experimental(name, value.clone()) {
                        log::warn!("{err}; dropping remaining experimental options");
                        accept_experimental = false;
                        break;
                    }
                }
            }
        }
        if !accept_flags && !accept_experimental {
            return None;
        }
    }
    Some(options)
}
