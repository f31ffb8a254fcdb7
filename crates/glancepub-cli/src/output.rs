//! Formatted output helpers for CLI commands.

use glancepub_publish::unit::Unit;

/// Binary units above plain bytes, smallest first. GiB is the largest.
const SCALED_UNITS: [&str; 3] = ["KiB", "MiB", "GiB"];

/// Formats an image size for the publish summary, e.g. `"1.5 GiB"`.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    let mut scaled = bytes as f64;
    let mut unit = None;
    for next in SCALED_UNITS {
        if scaled < 1024.0 {
            break;
        }
        scaled /= 1024.0;
        unit = Some(next);
    }
    unit.map_or_else(|| format!("{bytes} B"), |unit| format!("{scaled:.1} {unit}"))
}

/// Sums the on-disk size of the units' storage files; unreadable files
/// count as zero.
#[must_use]
pub fn total_size(units: &[Unit]) -> u64 {
    units
        .iter()
        .filter_map(|u| std::fs::metadata(&u.storage_path).ok())
        .map(|m| m.len())
        .sum()
}
