//! Small formatting helpers.

const SIZE_UNITS: [&str; 7] = ["bytes", "KB", "MB", "GB", "TB", "PB", "EB"];

/// Human readable size in binary units, e.g. `1536` gives `"1.5 KB"`.
///
/// Counts under 1024 are printed as whole bytes. Larger values are rounded
/// to two decimals and always keep at least one decimal digit.
pub fn convert_size(size: i64) -> String {
    if size < 1024 {
        return format!("{} bytes", size);
    }

    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{:?} {}", rounded, SIZE_UNITS[unit])
}
