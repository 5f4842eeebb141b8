//! Anti-detection patch for the local ChromeDriver binary.
//!
//! ChromeDriver injects JavaScript variables prefixed with `$cdc_` that
//! fingerprinting scripts look for. Scrubbing the prefix in the executable
//! removes the marker. Replacements are the same length as the pattern so
//! binary offsets stay valid (unlike a naive text rewrite).

use std::fs;
use std::path::Path;

use crate::error::Result;

/// Byte patterns scrubbed from the driver binary, with same-length
/// replacements.
const MARKERS: &[(&[u8], &[u8])] = &[(b"$cdc_", b"$xdu_")];

/// Patch the driver executable in place, keeping a `.bak` copy of the
/// original next to it. Safe to run repeatedly; a patched binary simply has
/// nothing left to replace.
pub fn remove_cdc(driver_path: &Path) -> Result<()> {
    let backup_path = driver_path.with_extension("bak");
    fs::copy(driver_path, &backup_path)?;

    let mut content = fs::read(driver_path)?;
    let mut patched = 0;
    for (needle, replacement) in MARKERS {
        patched += replace_bytes(&mut content, needle, replacement);
    }
    fs::write(driver_path, &content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(driver_path, fs::Permissions::from_mode(0o755))?;
    }

    if patched > 0 {
        log::info!(
            "Patched {} automation marker(s) in {}",
            patched,
            driver_path.display()
        );
    }
    Ok(())
}

fn replace_bytes(haystack: &mut [u8], needle: &[u8], replacement: &[u8]) -> usize {
    debug_assert_eq!(needle.len(), replacement.len());
    let mut count = 0;
    let mut index = 0;
    while index + needle.len() <= haystack.len() {
        if &haystack[index..index + needle.len()] == needle {
            haystack[index..index + needle.len()].copy_from_slice(replacement);
            index += needle.len();
            count += 1;
        } else {
            index += 1;
        }
    }
    count
}
