//! Formatting Helpers
//!
//! Text renderings of timer values, workout durations and training volume.

/// Rest timer rendering, `M:SS`.
pub fn format_countdown(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Full screen timer rendering, `MM:SS`.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Stopwatch rendering, `H:MM:SS` once an hour has passed and `MM:SS` before.
pub fn format_long_time(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Workout length, `1h 5m` or `45m`.
pub fn format_workout_duration(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

/// Training volume, abbreviated to thousands from 1000 on.
pub fn format_volume(volume: f64, unit: &str) -> String {
    if volume >= 1000.0 {
        format!("{:.1}k {}", volume / 1000.0, unit)
    } else {
        format!("{} {}", volume.round(), unit)
    }
}
