//! Pure display helpers shared by the view models.

use chrono::{DateTime, Local, Utc};

/// Visual weight of a priority value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTone {
    /// Priority 8 and above.
    High,
    /// Priority 5 to 7.
    Medium,
    /// Below 5.
    Low,
}

/// Clamp a priority into the displayable 1-10 range.
#[must_use]
pub fn clamp_priority(priority: i64) -> u8 {
    u8::try_from(priority.clamp(1, 10)).unwrap_or(1)
}

/// Star count (`ceil(p / 2)`) and tone for a priority.
#[must_use]
pub fn priority_stars(priority: i64) -> (u8, PriorityTone) {
    let clamped = clamp_priority(priority);
    let tone = match clamped {
        8..=10 => PriorityTone::High,
        5..=7 => PriorityTone::Medium,
        _ => PriorityTone::Low,
    };
    (clamped.div_ceil(2), tone)
}

/// Format a ratio or percentage as `x.y%`.
///
/// Values above 1 are taken as percentages already; values at or below 1 are
/// ratios. Missing or non-finite values render as `0%`.
#[must_use]
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(value) if value.is_finite() => {
            let percent = if value > 1.0 { value } else { value * 100.0 };
            format!("{percent:.1}%")
        }
        _ => "0%".to_string(),
    }
}

/// Relative age such as `42s ago`, `5m ago`, `3h ago` or `2d ago`.
#[must_use]
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    match seconds {
        0..=59 => format!("{seconds}s ago"),
        60..=3_599 => format!("{}m ago", seconds / 60),
        3_600..=86_399 => format!("{}h ago", seconds / 3_600),
        _ => format!("{}d ago", seconds / 86_400),
    }
}

/// Width of a success-rate bar, capped at 100.
#[must_use]
pub fn success_bar_width(success_rate: f64) -> f64 {
    if success_rate.is_finite() {
        success_rate.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Local wall-clock `HH:MM:SS` for an RFC 3339 timestamp, `-` when absent.
#[must_use]
pub fn format_clock(timestamp: Option<&str>) -> String {
    timestamp
        .and_then(|text| DateTime::parse_from_rfc3339(text.trim()).ok())
        .map_or_else(
            || "-".to_string(),
            |parsed| parsed.with_timezone(&Local).format("%H:%M:%S").to_string(),
        )
}

/// Placeholder for blank text cells.
#[must_use]
pub fn or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(text: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(text)
            .expect("timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn percent_accepts_ratios_and_percentages() {
        assert_eq!(format_percent(Some(0.982)), "98.2%");
        assert_eq!(format_percent(Some(82.0)), "82.0%");
        assert_eq!(format_percent(Some(1.0)), "100.0%");
        assert_eq!(format_percent(Some(0.0)), "0.0%");
        assert_eq!(format_percent(None), "0%");
        assert_eq!(format_percent(Some(f64::NAN)), "0%");
    }

    #[test]
    fn stars_round_up_and_clamp() {
        assert_eq!(priority_stars(1), (1, PriorityTone::Low));
        assert_eq!(priority_stars(5), (3, PriorityTone::Medium));
        assert_eq!(priority_stars(8), (4, PriorityTone::High));
        assert_eq!(priority_stars(42), (5, PriorityTone::High));
        assert_eq!(priority_stars(-3), (1, PriorityTone::Low));
    }

    #[test]
    fn relative_time_buckets() {
        let now = at("2026-03-01T12:00:00Z");
        assert_eq!(format_relative(at("2026-03-01T11:59:18Z"), now), "42s ago");
        assert_eq!(format_relative(at("2026-03-01T11:55:00Z"), now), "5m ago");
        assert_eq!(format_relative(at("2026-03-01T09:00:00Z"), now), "3h ago");
        assert_eq!(format_relative(at("2026-02-27T12:00:00Z"), now), "2d ago");
        assert_eq!(format_relative(at("2026-03-01T12:00:30Z"), now), "0s ago");
    }

    #[test]
    fn bar_width_is_capped() {
        assert!((success_bar_width(140.0) - 100.0).abs() < f64::EPSILON);
        assert!((success_bar_width(-4.0)).abs() < f64::EPSILON);
        assert!((success_bar_width(62.5) - 62.5).abs() < f64::EPSILON);
    }

    #[test]
    fn clock_falls_back_to_dash() {
        assert_eq!(format_clock(None), "-");
        assert_eq!(format_clock(Some("not a time")), "-");
        assert_eq!(format_clock(Some("2026-03-01T10:00:05Z")).len(), 8);
        assert_eq!(or_dash("  "), "-");
        assert_eq!(or_dash("ipv4"), "ipv4");
    }
}
