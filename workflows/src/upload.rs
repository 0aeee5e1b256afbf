//! Two-stage upload pipeline.
//!
//! A content item references two blobs: a preview image and a media file.
//! [`UploadPipeline::create_or_update`] uploads whichever of them was
//! supplied, preview strictly before media, and then writes the whole record
//! to the document store exactly once. A failed stage aborts everything after
//! it, so the store never sees a record that points at a half-finished upload
//! or mixes locators from two attempts. Blobs a failed call already uploaded
//! are deleted again on a best-effort basis.

use crate::environment::ServiceEnvironment;
use coursehub_core::constants::CONTENT_ITEMS;
use coursehub_core::{
    ByteSource, ContentItem, Error, Locator, Result, Stage, StoredRecord, UploadResult,
};
use coursehub_runtime::metrics::UploadMetrics;
use futures::future::join_all;
use std::sync::atomic::{AtomicU8, Ordering};

/// One progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    /// Stage being uploaded ([`Stage::Preview`] or [`Stage::Media`]).
    pub stage: Stage,
    /// `bytes_sent * 100 / total`, truncated.
    pub percent: u8,
}

/// Receives progress reports before the terminal result.
pub type ProgressSink = dyn Fn(UploadProgress) + Send + Sync;

/// Sentinel for "nothing reported yet".
const NOT_REPORTED: u8 = u8::MAX;

/// Upload pipeline.
#[derive(Debug, Clone)]
pub struct UploadPipeline {
    env: ServiceEnvironment,
}

impl UploadPipeline {
    /// Create the pipeline.
    #[must_use]
    pub const fn new(env: ServiceEnvironment) -> Self {
        Self { env }
    }

    /// Upload the supplied artifacts and write the record.
    ///
    /// An empty `record.id` is replaced by a fresh id before anything else
    /// happens. A stage with no source keeps the record's current locator.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`]: inconsistent access code or an empty source
    /// - [`Error::PayloadTooLarge`]: a source exceeds the configured limit
    /// - [`Error::Remote`] with stage `preview`, `media` or `write-content`
    #[tracing::instrument(
        skip(self, record, preview, media, progress),
        fields(item_id = %record.id)
    )]
    pub async fn create_or_update(
        &self,
        mut record: ContentItem,
        preview: Option<&ByteSource>,
        media: Option<&ByteSource>,
        progress: &ProgressSink,
    ) -> Result<ContentItem> {
        if record.id.is_empty() {
            record.id = self.env.ids.next_id();
            tracing::Span::current().record("item_id", record.id.as_str());
        }

        if !record.access_code_consistent() {
            return Err(Error::validation(
                "access code",
                "must be present exactly when the item is private",
            ));
        }
        self.check_source(Stage::Preview, preview)?;
        self.check_source(Stage::Media, media)?;

        let mut fresh = Vec::new();
        if let Some(uploaded) = self
            .run_stage(Stage::Preview, &record.id, preview, progress)
            .await?
        {
            fresh.push(uploaded.locator.clone());
            record.preview_locator = Some(uploaded.locator);
        }
        match self
            .run_stage(Stage::Media, &record.id, media, progress)
            .await
        {
            Ok(Some(uploaded)) => {
                fresh.push(uploaded.locator.clone());
                record.media_locator = Some(uploaded.locator);
            }
            Ok(None) => {}
            Err(err) => {
                self.discard_all(&fresh).await;
                return Err(err);
            }
        }

        if let Err(err) = self.write(&record).await {
            self.discard_all(&fresh).await;
            return Err(err);
        }

        tracing::info!("Content item written");
        Ok(record)
    }

    async fn write(&self, record: &ContentItem) -> Result<()> {
        let fields = record.to_fields()?;
        self.env
            .documents
            .set(CONTENT_ITEMS, &record.id, fields)
            .await
            .map_err(|e| Error::remote(Stage::WriteContent, &e))
    }

    /// Blobs uploaded by a call that then failed are never referenced.
    async fn discard_all(&self, fresh: &[Locator]) {
        join_all(fresh.iter().map(|locator| discard(&self.env, locator))).await;
    }

    fn check_source(&self, stage: Stage, source: Option<&ByteSource>) -> Result<()> {
        let Some(source) = source else {
            return Ok(());
        };
        if source.is_empty() {
            return Err(Error::validation(stage_field(stage), "source is empty"));
        }
        let limit = self.env.config.upload.max_upload_bytes;
        if source.len() > limit {
            return Err(Error::PayloadTooLarge {
                stage,
                size: source.len(),
                limit,
            });
        }
        Ok(())
    }

    async fn run_stage(
        &self,
        stage: Stage,
        item_id: &str,
        source: Option<&ByteSource>,
        progress: &ProgressSink,
    ) -> Result<Option<UploadResult>> {
        let Some(source) = source else {
            tracing::debug!(stage = %stage, "No new source, keeping current locator");
            UploadMetrics::record_stage(stage.as_str(), "skipped");
            return Ok(None);
        };

        let path = format!("{}{item_id}_{}", self.prefix(stage), self.env.ids.next_id());
        let last = AtomicU8::new(NOT_REPORTED);
        let on_progress = |sent: u64, total: u64| {
            let percent = percent_of(sent, total);
            if last.swap(percent, Ordering::AcqRel) != percent {
                progress(UploadProgress { stage, percent });
            }
        };

        tracing::debug!(stage = %stage, path = %path, bytes = source.len(), "Uploading");
        match self.env.blobs.upload(&path, source, &on_progress).await {
            Ok(locator) => {
                UploadMetrics::record_stage(stage.as_str(), "success");
                Ok(Some(UploadResult {
                    locator,
                    size_bytes: source.len(),
                }))
            }
            Err(err) => {
                UploadMetrics::record_stage(stage.as_str(), "failure");
                tracing::warn!(stage = %stage, error = %err, "Upload failed, aborting pipeline");
                Err(Error::remote(stage, &err))
            }
        }
    }

    fn prefix(&self, stage: Stage) -> &str {
        match stage {
            Stage::Preview => &self.env.config.upload.preview_prefix,
            _ => &self.env.config.upload.media_prefix,
        }
    }
}

/// Best-effort removal of a blob that is no longer referenced.
pub(crate) async fn discard(env: &ServiceEnvironment, locator: &Locator) {
    if let Err(err) = env.blobs.delete(locator).await {
        tracing::warn!(locator = %locator, error = %err, "Could not delete blob");
    }
}

const fn stage_field(stage: Stage) -> &'static str {
    match stage {
        Stage::Preview => "preview",
        _ => "media",
    }
}

/// `sent * 100 / total`, truncated and clamped to 100.
fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = u128::from(sent.min(total)) * 100 / u128::from(total);
    u8::try_from(percent).unwrap_or(100)
}
