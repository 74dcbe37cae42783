//! Canonical video identity resolution.
//!
//! Normalizes equivalent URL forms of the same source video to one stable
//! identifier used as the asset cache key. Unrecognized shapes yield `None`
//! and the job simply runs uncached.

use url::Url;

/// Resolve a source video URL to a canonical identifier.
///
/// Recognized forms:
/// - `youtube.com/watch?v=ID` (also `www.` and `m.` hosts) → `youtube_{ID}`
/// - `youtu.be/ID` → `youtube_{ID}`
/// - `youtube.com/embed/ID` → `youtube_{ID}`
/// - `youtube.com/shorts/ID` → `youtube_short_{ID}`
///
/// Pure and deterministic; never errors.
pub fn resolve_video_identity(video_url: &str) -> Option<String> {
    let url = Url::parse(video_url.trim()).ok()?;
    let host = url.host_str()?;

    let is_youtube = matches!(host, "youtube.com" | "www.youtube.com" | "m.youtube.com");

    if is_youtube && url.path() == "/watch" {
        let id = url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())?;
        return non_empty(id).map(|id| format!("youtube_{}", id));
    }

    if host == "youtu.be" {
        let id = url.path().trim_start_matches('/');
        return non_empty(id.to_string()).map(|id| format!("youtube_{}", id));
    }

    if is_youtube {
        if let Some(id) = last_path_segment(&url, "/shorts/") {
            return Some(format!("youtube_short_{}", id));
        }
        if let Some(id) = last_path_segment(&url, "/embed/") {
            return Some(format!("youtube_{}", id));
        }
    }

    None
}

fn last_path_segment(url: &Url, prefix: &str) -> Option<String> {
    if !url.path().starts_with(prefix) {
        return None;
    }
    let segment = url.path().rsplit('/').next()?;
    non_empty(segment.to_string())
}

fn non_empty(id: String) -> Option<String> {
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}
