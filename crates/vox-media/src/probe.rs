//! Media probing via ffprobe.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Probe the duration of a media file in seconds.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("ffprobe failed for {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let duration = parse_duration_output(&stdout)?;
    debug!("Probed {}: {:.3}s", path.display(), duration);
    Ok(duration)
}

fn parse_duration_output(stdout: &str) -> MediaResult<f64> {
    let trimmed = stdout.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| MediaError::InvalidDuration(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_output() {
        assert!((parse_duration_output("12.345\n").unwrap() - 12.345).abs() < 0.001);
        assert!((parse_duration_output("  60.0  ").unwrap() - 60.0).abs() < 0.001);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration_output("N/A").is_err());
        assert!(parse_duration_output("").is_err());
        assert!(parse_duration_output("-1.0").is_err());
        assert!(parse_duration_output("inf").is_err());
    }
}
