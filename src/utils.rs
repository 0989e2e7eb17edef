//! Common utility functions shared across the codebase.

/// Formats a percentage with one decimal.
///
/// ```
/// use modcov::utils::format_percent;
///
/// assert_eq!(format_percent(50.0), "50.0%");
/// assert_eq!(format_percent(200.0 / 3.0), "66.7%");
/// ```
pub fn format_percent(percent: f64) -> String {
    format!("{:.1}%", percent)
}

/// `1 module`, `2 modules`.
pub fn pluralize(count: usize, singular: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}s", count, singular)
    }
}
