//! Orchestrator tests against counting fakes of the service ports.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use vox_ai::{
    AiError, AiResult, ChatCompletion, ChatMessage, DescribeFrames, SpeechToText, TextToSpeech,
};
use vox_media::{MediaError, MediaResult};
use vox_models::{CachedVideoAsset, JobId, JobResultRefs, Persona, TtsVoice};
use vox_queue::GenerateVideoJob;
use vox_storage::{PublishConfig, StorageError, StorageResult};
use vox_supabase::DbResult;
use vox_worker::deps::{AssetCacheStore, JobStore, MediaToolkit, ObjectStore, PipelineContext};
use vox_worker::pipeline::process_job;
use vox_worker::WorkerConfig;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct FakeMedia {
    fail_acquire: bool,
    fail_merge: bool,
    probe_value: f64,
    acquire_calls: AtomicUsize,
    extract_calls: AtomicUsize,
    merged_buffers: Mutex<Vec<Vec<u8>>>,
    composed_durations: Mutex<Vec<f64>>,
}

impl Default for FakeMedia {
    fn default() -> Self {
        Self {
            fail_acquire: false,
            fail_merge: false,
            probe_value: 12.0,
            acquire_calls: AtomicUsize::new(0),
            extract_calls: AtomicUsize::new(0),
            merged_buffers: Mutex::new(Vec::new()),
            composed_durations: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MediaToolkit for FakeMedia {
    async fn acquire_clip(
        &self,
        _url: &str,
        output: &Path,
        _start_secs: f64,
        _max_duration_secs: f64,
    ) -> MediaResult<()> {
        self.acquire_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_acquire {
            return Err(MediaError::download_failed("yt-dlp exited with status 1"));
        }
        tokio::fs::write(output, b"clip").await?;
        Ok(())
    }

    async fn sample_frames(
        &self,
        _video: &Path,
        frames_dir: &Path,
        _interval_secs: u32,
    ) -> MediaResult<Vec<PathBuf>> {
        tokio::fs::create_dir_all(frames_dir).await?;
        let mut frames = Vec::new();
        for i in 1..=3u32 {
            let path = frames_dir.join(format!("frame_{:04}.jpg", i));
            tokio::fs::write(&path, vec![0xFF, 0xD8, i as u8]).await?;
            frames.push(path);
        }
        Ok(frames)
    }

    async fn extract_compressed_audio(&self, _video: &Path, output: &Path) -> MediaResult<()> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::write(output, b"mp3").await?;
        Ok(())
    }

    async fn merge_wav_buffers(
        &self,
        buffers: &[Vec<u8>],
        _scratch_dir: &Path,
        output: &Path,
    ) -> MediaResult<()> {
        if self.fail_merge {
            return Err(MediaError::ffmpeg_failed(
                "concat demuxer rejected mismatched formats",
                None,
                Some(1),
            ));
        }
        *self.merged_buffers.lock().unwrap() = buffers.to_vec();
        tokio::fs::write(output, buffers.concat()).await?;
        Ok(())
    }

    async fn probe_duration(&self, _path: &Path) -> MediaResult<f64> {
        Ok(self.probe_value)
    }

    async fn compose(
        &self,
        _video: &Path,
        _audio: &Path,
        output: &Path,
        duration_secs: f64,
    ) -> MediaResult<()> {
        self.composed_durations.lock().unwrap().push(duration_secs);
        tokio::fs::write(output, b"final").await?;
        Ok(())
    }
}

struct FakeStorage {
    cached_clip: Option<Vec<u8>>,
    fail_video_upload: bool,
    uploads: Mutex<Vec<String>>,
}

impl Default for FakeStorage {
    fn default() -> Self {
        Self {
            cached_clip: None,
            fail_video_upload: false,
            uploads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ObjectStore for FakeStorage {
    async fn upload_file(&self, _path: &Path, key: &str, _content_type: &str) -> StorageResult<()> {
        if self.fail_video_upload && key.ends_with("final_video.mp4") {
            return Err(StorageError::upload_failed("connection reset"));
        }
        self.uploads.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn upload_bytes(
        &self,
        _data: Vec<u8>,
        key: &str,
        _content_type: &str,
    ) -> StorageResult<()> {
        self.uploads.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn download_file(&self, key: &str, path: &Path) -> StorageResult<()> {
        match &self.cached_clip {
            Some(bytes) => {
                tokio::fs::write(path, bytes).await?;
                Ok(())
            }
            None => Err(StorageError::not_found(key)),
        }
    }

    async fn presign_get(&self, key: &str, _expires_in: Duration) -> StorageResult<String> {
        Ok(format!("https://signed.example/{}", key))
    }
}

#[derive(Default)]
struct FakeJobs {
    transitions: Mutex<Vec<String>>,
    completed: Mutex<Option<JobResultRefs>>,
    failed_message: Mutex<Option<String>>,
}

#[async_trait]
impl JobStore for FakeJobs {
    async fn mark_processing(&self, _job_id: &JobId) -> DbResult<()> {
        self.transitions.lock().unwrap().push("processing".into());
        Ok(())
    }

    async fn complete(&self, _job_id: &JobId, result: &JobResultRefs) -> DbResult<()> {
        self.transitions.lock().unwrap().push("completed".into());
        *self.completed.lock().unwrap() = Some(result.clone());
        Ok(())
    }

    async fn fail(&self, _job_id: &JobId, error_message: &str) -> DbResult<()> {
        self.transitions.lock().unwrap().push("failed".into());
        *self.failed_message.lock().unwrap() = Some(error_message.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct FakeCache {
    row: Mutex<Option<CachedVideoAsset>>,
    get_calls: AtomicUsize,
    insert_calls: AtomicUsize,
    touch_calls: AtomicUsize,
}

#[async_trait]
impl AssetCacheStore for FakeCache {
    async fn get(&self, _identifier: &str) -> DbResult<Option<CachedVideoAsset>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.row.lock().unwrap().clone())
    }

    async fn insert_if_absent(&self, asset: &CachedVideoAsset) -> DbResult<bool> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let mut row = self.row.lock().unwrap();
        if row.is_some() {
            return Ok(false);
        }
        *row = Some(asset.clone());
        Ok(true)
    }

    async fn touch_last_accessed(&self, _identifier: &str) -> DbResult<()> {
        self.touch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeAi {
    reply: String,
    fail_tts: bool,
    chat_calls: AtomicUsize,
    stt_calls: AtomicUsize,
    vision_calls: AtomicUsize,
    tts_calls: Mutex<Vec<(TtsVoice, String)>>,
}

impl FakeAi {
    fn with_reply(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail_tts: false,
            chat_calls: AtomicUsize::new(0),
            stt_calls: AtomicUsize::new(0),
            vision_calls: AtomicUsize::new(0),
            tts_calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatCompletion for FakeAi {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _max_tokens: u32,
        _temperature: f32,
    ) -> AiResult<String> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

#[async_trait]
impl DescribeFrames for FakeAi {
    async fn describe_frames(&self, _frames: &[Vec<u8>], _instruction: &str) -> AiResult<String> {
        self.vision_calls.fetch_add(1, Ordering::SeqCst);
        Ok("person waves, dog jumps".to_string())
    }
}

#[async_trait]
impl SpeechToText for FakeAi {
    async fn transcribe(&self, _audio: Vec<u8>, _file_name: &str) -> AiResult<String> {
        self.stt_calls.fetch_add(1, Ordering::SeqCst);
        Ok("someone is explaining something surprising".to_string())
    }
}

#[async_trait]
impl TextToSpeech for FakeAi {
    async fn synthesize(&self, voice: TtsVoice, text: &str, _speed: f32) -> AiResult<Vec<u8>> {
        self.tts_calls
            .lock()
            .unwrap()
            .push((voice, text.to_string()));
        if self.fail_tts {
            return Err(AiError::request_failed("tts backend unavailable"));
        }
        Ok(text.as_bytes().to_vec())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    ctx: PipelineContext,
    media: Arc<FakeMedia>,
    storage: Arc<FakeStorage>,
    jobs: Arc<FakeJobs>,
    cache: Arc<FakeCache>,
    ai: Arc<FakeAi>,
    work_dir: tempfile::TempDir,
}

fn harness(ai: FakeAi, media: FakeMedia, storage: FakeStorage, cache: FakeCache) -> Harness {
    let work_dir = tempfile::tempdir().unwrap();
    let config = WorkerConfig {
        work_dir: work_dir.path().to_string_lossy().into_owned(),
        ..WorkerConfig::default()
    };

    let media = Arc::new(media);
    let storage = Arc::new(storage);
    let jobs = Arc::new(FakeJobs::default());
    let cache = Arc::new(cache);
    let ai = Arc::new(ai);

    let ctx = PipelineContext {
        config,
        publish: PublishConfig {
            signed_url_ttl: Duration::from_secs(86_400),
            public_url_base: Some("https://pub.example.com".to_string()),
        },
        media: media.clone(),
        storage: storage.clone(),
        jobs: jobs.clone(),
        cache: cache.clone(),
        chat: ai.clone(),
        vision: ai.clone(),
        stt: ai.clone(),
        tts: ai.clone(),
    };

    Harness {
        ctx,
        media,
        storage,
        jobs,
        cache,
        ai,
        work_dir,
    }
}

const SCRIPT_REPLY: &str = "Alice: This is wild!\nBob: I can't believe it.\nAlice: Told you so.";

fn test_job() -> GenerateVideoJob {
    GenerateVideoJob::new(
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        vec![Persona::named("Alice"), Persona::named("Bob")],
    )
}

fn cached_row() -> CachedVideoAsset {
    let mut asset = CachedVideoAsset::new("youtube_dQw4w9WgXcQ");
    asset.audio_transcript = Some("cached transcript".to_string());
    asset.frame_descriptions = Some("cached description".to_string());
    asset.clipped_video_key =
        Some("video_cache/youtube_dQw4w9WgXcQ/source_clip.mp4".to_string());
    asset
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_run_completes_with_published_video() {
    let h = harness(
        FakeAi::with_reply(SCRIPT_REPLY),
        FakeMedia::default(),
        FakeStorage::default(),
        FakeCache::default(),
    );
    let job = test_job();

    process_job(&h.ctx, &job).await.unwrap();

    let transitions = h.jobs.transitions.lock().unwrap().clone();
    assert_eq!(transitions, vec!["processing", "completed"]);

    let result = h.jobs.completed.lock().unwrap().clone().unwrap();
    assert!(result.video_url.as_deref().unwrap().contains("final_video.mp4"));
    assert!(result.audio_url.is_some());
    assert!(result
        .thumbnail_url
        .as_deref()
        .unwrap()
        .starts_with("https://pub.example.com/thumbnails/"));
    assert_eq!(result.line_count, 3);
    assert!(result.status_message.contains("3 lines"));

    // One full-miss run populates the cache exactly once
    assert_eq!(h.cache.get_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.cache.insert_calls.load(Ordering::SeqCst), 1);
    let row = h.cache.row.lock().unwrap().clone().unwrap();
    assert_eq!(row.source_video_identifier, "youtube_dQw4w9WgXcQ");
    assert!(row.has_text_assets());
}

#[tokio::test]
async fn cache_hit_skips_acquisition_transcription_and_vision() {
    let cache = FakeCache::default();
    *cache.row.lock().unwrap() = Some(cached_row());

    let storage = FakeStorage {
        cached_clip: Some(b"cached clip bytes".to_vec()),
        ..FakeStorage::default()
    };

    let h = harness(
        FakeAi::with_reply(SCRIPT_REPLY),
        FakeMedia::default(),
        storage,
        cache,
    );
    let job = test_job();

    process_job(&h.ctx, &job).await.unwrap();

    // Expensive stages never ran
    assert_eq!(h.media.acquire_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.media.extract_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.ai.stt_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.ai.vision_calls.load(Ordering::SeqCst), 0);

    // One cache read, no second write, best-effort access bump
    assert_eq!(h.cache.get_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.cache.insert_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.cache.touch_calls.load(Ordering::SeqCst), 1);

    // The job still produced a full video from the cached clip
    let result = h.jobs.completed.lock().unwrap().clone().unwrap();
    assert!(result.video_url.is_some());
}

#[tokio::test]
async fn unavailable_cached_clip_falls_back_to_source() {
    let cache = FakeCache::default();
    *cache.row.lock().unwrap() = Some(cached_row());

    // No cached clip bytes: the storage fetch fails
    let h = harness(
        FakeAi::with_reply(SCRIPT_REPLY),
        FakeMedia::default(),
        FakeStorage::default(),
        cache,
    );
    let job = test_job();

    process_job(&h.ctx, &job).await.unwrap();

    // Source re-acquired, but cached text assets were still reused
    assert_eq!(h.media.acquire_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.ai.stt_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.ai.vision_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.cache.insert_calls.load(Ordering::SeqCst), 0);

    let result = h.jobs.completed.lock().unwrap().clone().unwrap();
    assert!(result.video_url.is_some());
    assert!(result.status_message.contains("cached clip unavailable"));
}

#[tokio::test]
async fn output_duration_tracks_merged_audio() {
    let media = FakeMedia {
        probe_value: 12.0,
        ..FakeMedia::default()
    };
    let h = harness(
        FakeAi::with_reply(SCRIPT_REPLY),
        media,
        FakeStorage::default(),
        FakeCache::default(),
    );
    let job = test_job();

    process_job(&h.ctx, &job).await.unwrap();

    let durations = h.media.composed_durations.lock().unwrap().clone();
    assert_eq!(durations, vec![12.0]);
}

#[tokio::test]
async fn lines_are_voiced_in_first_seen_order_and_merged_in_line_order() {
    let h = harness(
        FakeAi::with_reply(SCRIPT_REPLY),
        FakeMedia::default(),
        FakeStorage::default(),
        FakeCache::default(),
    );
    let job = test_job();

    process_job(&h.ctx, &job).await.unwrap();

    // Speakers seen as Alice, Bob, Alice map to palette[0], palette[1], palette[0]
    let voices: Vec<TtsVoice> = h
        .ai
        .tts_calls
        .lock()
        .unwrap()
        .iter()
        .map(|(voice, _)| *voice)
        .collect();
    assert_eq!(
        voices,
        vec![TtsVoice::Alloy, TtsVoice::Fable, TtsVoice::Alloy]
    );

    // The merge input preserves original line order
    let merged = h.media.merged_buffers.lock().unwrap().clone();
    let texts: Vec<String> = merged
        .iter()
        .map(|b| String::from_utf8(b.clone()).unwrap())
        .collect();
    assert_eq!(
        texts,
        vec!["This is wild!", "I can't believe it.", "Told you so."]
    );
}

#[tokio::test]
async fn empty_parse_completes_with_no_speakable_lines() {
    let h = harness(
        FakeAi::with_reply("I cannot write dialogue for this video."),
        FakeMedia::default(),
        FakeStorage::default(),
        FakeCache::default(),
    );
    let job = test_job();

    process_job(&h.ctx, &job).await.unwrap();

    let transitions = h.jobs.transitions.lock().unwrap().clone();
    assert_eq!(transitions, vec!["processing", "completed"]);

    let result = h.jobs.completed.lock().unwrap().clone().unwrap();
    assert_eq!(result.line_count, 0);
    assert!(result.video_url.is_none());
    assert!(result.status_message.contains("no speakable lines"));
    assert!(h.ai.tts_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn all_tts_failures_still_deliver_the_script() {
    let ai = FakeAi {
        fail_tts: true,
        ..FakeAi::with_reply(SCRIPT_REPLY)
    };
    let h = harness(
        ai,
        FakeMedia::default(),
        FakeStorage::default(),
        FakeCache::default(),
    );
    let job = test_job();

    process_job(&h.ctx, &job).await.unwrap();

    let result = h.jobs.completed.lock().unwrap().clone().unwrap();
    assert_eq!(result.line_count, 3);
    assert!(result.dialogue_text.contains("This is wild!"));
    assert!(result.video_url.is_none());
    assert!(result.audio_url.is_none());
    assert!(result.status_message.contains("no audio was produced"));
}

#[tokio::test]
async fn merge_failure_degrades_to_script_only() {
    let media = FakeMedia {
        fail_merge: true,
        ..FakeMedia::default()
    };
    let h = harness(
        FakeAi::with_reply(SCRIPT_REPLY),
        media,
        FakeStorage::default(),
        FakeCache::default(),
    );
    let job = test_job();

    process_job(&h.ctx, &job).await.unwrap();

    let result = h.jobs.completed.lock().unwrap().clone().unwrap();
    assert!(result.video_url.is_none());
    assert!(result.status_message.contains("audio merge failed"));
    assert_eq!(result.line_count, 3);
}

#[tokio::test]
async fn fatal_acquisition_error_fails_the_job() {
    let media = FakeMedia {
        fail_acquire: true,
        ..FakeMedia::default()
    };
    let h = harness(
        FakeAi::with_reply(SCRIPT_REPLY),
        media,
        FakeStorage::default(),
        FakeCache::default(),
    );
    let job = test_job();

    let result = process_job(&h.ctx, &job).await;
    assert!(result.is_err());

    let transitions = h.jobs.transitions.lock().unwrap().clone();
    assert_eq!(transitions, vec!["processing", "failed"]);

    let message = h.jobs.failed_message.lock().unwrap().clone().unwrap();
    assert!(message.contains("yt-dlp exited with status 1"));

    // Dialogue and synthesis never ran
    assert_eq!(h.ai.chat_calls.load(Ordering::SeqCst), 0);
    assert!(h.ai.tts_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn video_upload_failure_fails_the_job() {
    let storage = FakeStorage {
        fail_video_upload: true,
        ..FakeStorage::default()
    };
    let h = harness(
        FakeAi::with_reply(SCRIPT_REPLY),
        FakeMedia::default(),
        storage,
        FakeCache::default(),
    );
    let job = test_job();

    let result = process_job(&h.ctx, &job).await;
    assert!(result.is_err());

    let message = h.jobs.failed_message.lock().unwrap().clone().unwrap();
    assert!(message.contains("final video upload failed"));
}

#[tokio::test]
async fn workspace_is_released_on_success_and_failure() {
    // Success path
    let h = harness(
        FakeAi::with_reply(SCRIPT_REPLY),
        FakeMedia::default(),
        FakeStorage::default(),
        FakeCache::default(),
    );
    let job = test_job();
    process_job(&h.ctx, &job).await.unwrap();
    let mut entries = std::fs::read_dir(h.work_dir.path()).unwrap();
    assert!(entries.next().is_none(), "workspace must be removed");

    // Failure path
    let media = FakeMedia {
        fail_acquire: true,
        ..FakeMedia::default()
    };
    let h = harness(
        FakeAi::with_reply(SCRIPT_REPLY),
        media,
        FakeStorage::default(),
        FakeCache::default(),
    );
    let job = test_job();
    let _ = process_job(&h.ctx, &job).await;
    let mut entries = std::fs::read_dir(h.work_dir.path()).unwrap();
    assert!(
        entries.next().is_none(),
        "workspace must be removed on failure too"
    );
}

#[tokio::test]
async fn unrecognized_url_runs_uncached() {
    let h = harness(
        FakeAi::with_reply(SCRIPT_REPLY),
        FakeMedia::default(),
        FakeStorage::default(),
        FakeCache::default(),
    );
    let job = GenerateVideoJob::new(
        "https://example.com/video.mp4",
        vec![Persona::named("Alice")],
    );

    process_job(&h.ctx, &job).await.unwrap();

    // No identity, so neither cache read nor cache write happened
    assert_eq!(h.cache.get_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.cache.insert_calls.load(Ordering::SeqCst), 0);

    let result = h.jobs.completed.lock().unwrap().clone().unwrap();
    assert!(result.video_url.is_some());
}

#[tokio::test]
async fn cache_upload_keys_are_scoped_to_the_identifier() {
    let h = harness(
        FakeAi::with_reply(SCRIPT_REPLY),
        FakeMedia::default(),
        FakeStorage::default(),
        FakeCache::default(),
    );
    let job = test_job();

    process_job(&h.ctx, &job).await.unwrap();

    let uploads = h.storage.uploads.lock().unwrap().clone();
    assert!(uploads
        .iter()
        .any(|k| k == "video_cache/youtube_dQw4w9WgXcQ/source_clip.mp4"));
    assert!(uploads
        .iter()
        .any(|k| k.starts_with("video_cache/youtube_dQw4w9WgXcQ/frames/frame_")));
}
