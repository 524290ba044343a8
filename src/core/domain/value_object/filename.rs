//! File name normalization for exported device configurations.

/// Turns a device name into something safe to use as a file name.
///
/// Spaces become underscores; anything other than ASCII letters, digits,
/// `_`, `-` and `.` is dropped.
pub fn normalize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect()
}
