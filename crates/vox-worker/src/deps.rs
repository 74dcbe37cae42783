//! Injectable service ports for the pipeline.
//!
//! All external collaborators are constructed once at process start and
//! passed into the orchestrator through [`PipelineContext`]. The pipeline
//! depends on these narrow traits rather than on concrete clients, so stage
//! sequencing can be exercised against counting fakes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use vox_ai::{ChatCompletion, DescribeFrames, OpenAiClient, SpeechToText, TextToSpeech};
use vox_media::MediaResult;
use vox_models::{CachedVideoAsset, JobId, JobResultRefs};
use vox_storage::{PublishConfig, R2Client, StorageResult};
use vox_supabase::{DbResult, SupabaseClient, VideoAssetCacheRepository, VideoJobRepository};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;

/// AV toolkit and media retrieval operations used by the pipeline.
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Retrieve the source video and produce a bounded-duration re-encoded clip.
    async fn acquire_clip(
        &self,
        url: &str,
        output: &Path,
        start_secs: f64,
        max_duration_secs: f64,
    ) -> MediaResult<()>;

    /// Sample frames at a fixed interval, returned chronologically.
    async fn sample_frames(
        &self,
        video: &Path,
        frames_dir: &Path,
        interval_secs: u32,
    ) -> MediaResult<Vec<PathBuf>>;

    /// Extract and compress the clip audio for transcription.
    async fn extract_compressed_audio(&self, video: &Path, output: &Path) -> MediaResult<()>;

    /// Concatenate per-line WAV buffers losslessly into one file.
    async fn merge_wav_buffers(
        &self,
        buffers: &[Vec<u8>],
        scratch_dir: &Path,
        output: &Path,
    ) -> MediaResult<()>;

    /// Probe a media file's duration in seconds.
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64>;

    /// Mux clip video with voiceover audio, trimmed to the given duration.
    async fn compose(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        duration_secs: f64,
    ) -> MediaResult<()>;
}

/// Live toolkit backed by FFmpeg/ffprobe/yt-dlp subprocesses.
#[derive(Debug, Default, Clone)]
pub struct FfmpegToolkit;

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn acquire_clip(
        &self,
        url: &str,
        output: &Path,
        start_secs: f64,
        max_duration_secs: f64,
    ) -> MediaResult<()> {
        vox_media::download_and_clip_video(url, output, start_secs, max_duration_secs).await
    }

    async fn sample_frames(
        &self,
        video: &Path,
        frames_dir: &Path,
        interval_secs: u32,
    ) -> MediaResult<Vec<PathBuf>> {
        vox_media::sample_frames(video, frames_dir, interval_secs).await
    }

    async fn extract_compressed_audio(&self, video: &Path, output: &Path) -> MediaResult<()> {
        vox_media::extract_compressed_audio(video, output).await
    }

    async fn merge_wav_buffers(
        &self,
        buffers: &[Vec<u8>],
        scratch_dir: &Path,
        output: &Path,
    ) -> MediaResult<()> {
        vox_media::merge_wav_buffers(buffers, scratch_dir, output).await
    }

    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        vox_media::probe_duration(path).await
    }

    async fn compose(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        duration_secs: f64,
    ) -> MediaResult<()> {
        vox_media::compose_video_with_audio(video, audio, output, duration_secs).await
    }
}

/// Object storage operations used by the pipeline.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()>;
    async fn upload_bytes(&self, data: Vec<u8>, key: &str, content_type: &str)
        -> StorageResult<()>;
    async fn download_file(&self, key: &str, path: &Path) -> StorageResult<()>;
    async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String>;
}

#[async_trait]
impl ObjectStore for R2Client {
    async fn upload_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        R2Client::upload_file(self, path, key, content_type).await
    }

    async fn upload_bytes(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        R2Client::upload_bytes(self, data, key, content_type).await
    }

    async fn download_file(&self, key: &str, path: &Path) -> StorageResult<()> {
        R2Client::download_file(self, key, path).await
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        R2Client::presign_get(self, key, expires_in).await
    }
}

/// Job record persistence used by the pipeline.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn mark_processing(&self, job_id: &JobId) -> DbResult<()>;
    async fn complete(&self, job_id: &JobId, result: &JobResultRefs) -> DbResult<()>;
    async fn fail(&self, job_id: &JobId, error_message: &str) -> DbResult<()>;
}

#[async_trait]
impl JobStore for VideoJobRepository {
    async fn mark_processing(&self, job_id: &JobId) -> DbResult<()> {
        VideoJobRepository::mark_processing(self, job_id).await
    }

    async fn complete(&self, job_id: &JobId, result: &JobResultRefs) -> DbResult<()> {
        VideoJobRepository::complete(self, job_id, result).await
    }

    async fn fail(&self, job_id: &JobId, error_message: &str) -> DbResult<()> {
        VideoJobRepository::fail(self, job_id, error_message).await
    }
}

/// Asset cache persistence used by the pipeline.
#[async_trait]
pub trait AssetCacheStore: Send + Sync {
    async fn get(&self, identifier: &str) -> DbResult<Option<CachedVideoAsset>>;
    async fn insert_if_absent(&self, asset: &CachedVideoAsset) -> DbResult<bool>;
    async fn touch_last_accessed(&self, identifier: &str) -> DbResult<()>;
}

#[async_trait]
impl AssetCacheStore for VideoAssetCacheRepository {
    async fn get(&self, identifier: &str) -> DbResult<Option<CachedVideoAsset>> {
        VideoAssetCacheRepository::get(self, identifier).await
    }

    async fn insert_if_absent(&self, asset: &CachedVideoAsset) -> DbResult<bool> {
        VideoAssetCacheRepository::insert_if_absent(self, asset).await
    }

    async fn touch_last_accessed(&self, identifier: &str) -> DbResult<()> {
        VideoAssetCacheRepository::touch_last_accessed(self, identifier).await
    }
}

/// Everything a pipeline run needs, constructed once at process start.
#[derive(Clone)]
pub struct PipelineContext {
    pub config: WorkerConfig,
    pub publish: PublishConfig,
    pub media: Arc<dyn MediaToolkit>,
    pub storage: Arc<dyn ObjectStore>,
    pub jobs: Arc<dyn JobStore>,
    pub cache: Arc<dyn AssetCacheStore>,
    pub chat: Arc<dyn ChatCompletion>,
    pub vision: Arc<dyn DescribeFrames>,
    pub stt: Arc<dyn SpeechToText>,
    pub tts: Arc<dyn TextToSpeech>,
}

impl PipelineContext {
    /// Build the live context from environment configuration.
    pub async fn from_env(config: WorkerConfig) -> WorkerResult<Self> {
        let storage = R2Client::from_env().await?;
        if let Err(e) = storage.check_connectivity().await {
            tracing::warn!("R2 connectivity check failed at startup: {}", e);
        }

        let supabase = SupabaseClient::from_env()?;
        let jobs = VideoJobRepository::new(supabase.clone());
        let cache = VideoAssetCacheRepository::new(supabase);

        let openai = Arc::new(OpenAiClient::from_env()?);

        Ok(Self {
            config,
            publish: PublishConfig::from_env(),
            media: Arc::new(FfmpegToolkit),
            storage: Arc::new(storage),
            jobs: Arc::new(jobs),
            cache: Arc::new(cache),
            chat: openai.clone(),
            vision: openai.clone(),
            stt: openai.clone(),
            tts: openai,
        })
    }
}
