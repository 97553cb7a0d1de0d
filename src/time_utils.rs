use anyhow::{Result, anyhow, Context};

// Duration utilities for the `hh:mm:ss` strings used in scan output
// and in the length bounds of the configuration.

/// Parse an `hh:mm:ss` duration to seconds
pub fn parse_duration(text: &str) -> Result<u64> {
    let parts: Vec<&str> = text.trim().split(':').collect();

    if parts.len() != 3 {
        return Err(anyhow!("Invalid duration format (expected hh:mm:ss): {}", text));
    }

    let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
    let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
    let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;

    if minutes >= 60 || seconds >= 60 {
        return Err(anyhow!("Invalid time components in duration: {}", text));
    }

    hours.checked_mul(3_600)
        .and_then(|total| total.checked_add(minutes * 60 + seconds))
        .ok_or_else(|| anyhow!("Duration out of range: {}", text))
}

/// Format seconds as `hh:mm:ss`
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
