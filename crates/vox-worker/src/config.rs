//! Worker configuration.

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent jobs
    pub max_concurrent_jobs: usize,
    /// Maximum concurrent TTS requests within a single job
    pub max_tts_parallel: usize,
    /// Work directory for per-job temporary files
    pub work_dir: String,
    /// Clip start offset into the source video (seconds)
    pub clip_start_secs: f64,
    /// Upper bound on the clip duration (seconds)
    pub clip_max_duration_secs: f64,
    /// Frame sampling interval (seconds)
    pub frame_interval_secs: u32,
    /// Maximum frames sent to the vision service
    pub max_vision_frames: usize,
    /// Maximum transcript length kept for prompting (characters)
    pub max_transcript_chars: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 1,
            max_tts_parallel: 4,
            work_dir: "/tmp/voxover".to_string(),
            clip_start_secs: 0.0,
            clip_max_duration_secs: 60.0,
            frame_interval_secs: 5,
            max_vision_frames: 2,
            max_transcript_chars: 5000,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_jobs: env_parse("WORKER_MAX_JOBS", defaults.max_concurrent_jobs),
            max_tts_parallel: env_parse("WORKER_MAX_TTS_PARALLEL", defaults.max_tts_parallel),
            work_dir: std::env::var("WORKER_WORK_DIR").unwrap_or(defaults.work_dir),
            clip_start_secs: env_parse("WORKER_CLIP_START_SECS", defaults.clip_start_secs),
            clip_max_duration_secs: env_parse(
                "WORKER_CLIP_MAX_DURATION_SECS",
                defaults.clip_max_duration_secs,
            ),
            frame_interval_secs: env_parse(
                "WORKER_FRAME_INTERVAL_SECS",
                defaults.frame_interval_secs,
            ),
            max_vision_frames: env_parse("WORKER_MAX_VISION_FRAMES", defaults.max_vision_frames),
            max_transcript_chars: env_parse(
                "WORKER_MAX_TRANSCRIPT_CHARS",
                defaults.max_transcript_chars,
            ),
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.max_concurrent_jobs, 1);
        assert!((config.clip_max_duration_secs - 60.0).abs() < f64::EPSILON);
        assert_eq!(config.frame_interval_secs, 5);
        assert_eq!(config.max_vision_frames, 2);
        assert_eq!(config.max_transcript_chars, 5000);
    }
}
