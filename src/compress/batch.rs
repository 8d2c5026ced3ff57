use super::data_uri::estimate_size;
use super::encoder::{ImageAsset, RasterEncoder};
use super::pipeline::{
    CompressionRequest, CompressionResult, compress_asset, compress_with_strategy,
};
use super::strategy::{CompressionStrategy, default_strategy};
use crate::errors::CompressError;
use crate::models::{AppData, FileEntry};
use crate::storage::RecordStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchOptions {
    pub request: CompressionRequest,
    pub min_size_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub candidates: usize,
    pub processed: usize,
    pub retried: usize,
    pub dropped: usize,
    /// Dropped images that could not be decoded and are now skipped.
    pub unreadable: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

impl BatchReport {
    pub fn bytes_saved(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// A stored image waiting for compression, copied out of the store so the
/// lock is not held while encoding.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub record_id: String,
    pub file_index: usize,
    pub name: String,
    pub data: String,
    pub size: u64,
}

pub fn needs_optimization(entry: &FileEntry, min_size_bytes: u64) -> bool {
    entry.is_image()
        && !entry.optimized
        && entry.optimize_error.is_none()
        && estimate_size(&entry.data) >= min_size_bytes
}

pub fn collect_candidates(data: &AppData, min_size_bytes: u64) -> Vec<Candidate> {
    data.records
        .iter()
        .flat_map(|record| {
            record
                .files
                .iter()
                .enumerate()
                .filter(|(_, entry)| needs_optimization(entry, min_size_bytes))
                .map(|(file_index, entry)| Candidate {
                    record_id: record.id.clone(),
                    file_index,
                    name: entry.name.clone(),
                    data: entry.data.clone(),
                    size: estimate_size(&entry.data),
                })
        })
        .collect()
}

/// Compresses every eligible image in the store, one at a time. Individual
/// failures are retried once with the default strategy and then dropped; the
/// batch itself never fails.
pub async fn run_batch(
    store: &RecordStore,
    encoder: Arc<dyn RasterEncoder>,
    options: &BatchOptions,
) -> BatchReport {
    let candidates = {
        let data = store.lock().await;
        collect_candidates(&data, options.min_size_bytes)
    };

    let mut report = BatchReport {
        candidates: candidates.len(),
        ..BatchReport::default()
    };
    if candidates.is_empty() {
        debug!("no images need optimization");
        return report;
    }
    info!(count = candidates.len(), "optimizing stored images");

    for candidate in candidates {
        let result = match compress_candidate(&encoder, &candidate, options.request, None).await {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    record = %candidate.record_id,
                    file = %candidate.name,
                    "compression failed, retrying with defaults: {err}"
                );
                report.retried += 1;
                let fallback = Some(default_strategy(options.request.target_kb));
                match compress_candidate(&encoder, &candidate, options.request, fallback).await {
                    Ok(result) => result,
                    Err(err) => {
                        error!(
                            record = %candidate.record_id,
                            file = %candidate.name,
                            "dropping image: {err}"
                        );
                        report.dropped += 1;
                        if matches!(err, CompressError::UnreadableFile(_))
                            && mark_unreadable(store, &candidate, &err).await
                        {
                            report.unreadable += 1;
                        }
                        continue;
                    }
                }
            }
        };

        let mut data = store.lock().await;
        let Some(entry) = current_entry_mut(&mut data, &candidate) else {
            continue;
        };

        let now = Utc::now();
        if result.size < candidate.size {
            entry.apply_result(&result, now);
        } else {
            let original = entry.original_size.unwrap_or(entry.size);
            entry.mark_optimized(original, now);
        }
        report.processed += 1;
        report.bytes_before += candidate.size;
        report.bytes_after += entry.size.min(candidate.size);
    }

    if report.processed > 0 || report.unreadable > 0 {
        if let Err(err) = store.persist().await {
            error!("failed to persist optimized images: {}", err.message);
        }
    }

    info!(
        processed = report.processed,
        dropped = report.dropped,
        unreadable = report.unreadable,
        saved = report.bytes_saved(),
        "optimization batch finished"
    );
    report
}

async fn compress_candidate(
    encoder: &Arc<dyn RasterEncoder>,
    candidate: &Candidate,
    request: CompressionRequest,
    strategy: Option<CompressionStrategy>,
) -> Result<CompressionResult, CompressError> {
    let encoder = Arc::clone(encoder);
    let data = candidate.data.clone();

    tokio::task::spawn_blocking(move || {
        let asset = ImageAsset::from_data_uri(&data)?;
        match strategy {
            Some(strategy) => compress_with_strategy(&asset, &request, &strategy, encoder.as_ref()),
            None => compress_asset(&asset, &request, encoder.as_ref()),
        }
    })
    .await
    .map_err(|err| CompressError::EncodeFailure(format!("worker failed: {err}")))?
}

/// Tags an image the decoder rejected so later batches leave it alone.
/// Returns false when the entry moved or changed since it was read.
async fn mark_unreadable(store: &RecordStore, candidate: &Candidate, err: &CompressError) -> bool {
    let mut data = store.lock().await;
    match current_entry_mut(&mut data, candidate) {
        Some(entry) => {
            entry.mark_unreadable(err.to_string());
            true
        }
        None => false,
    }
}

/// The stored entry for `candidate`, if it still holds the payload the batch
/// read.
fn current_entry_mut<'a>(
    data: &'a mut AppData,
    candidate: &Candidate,
) -> Option<&'a mut FileEntry> {
    let Some(entry) = data
        .records
        .iter_mut()
        .find(|record| record.id == candidate.record_id)
        .and_then(|record| record.files.get_mut(candidate.file_index))
    else {
        debug!(record = %candidate.record_id, "record vanished during batch");
        return None;
    };
    if entry.data != candidate.data {
        debug!(
            record = %candidate.record_id,
            file = %candidate.name,
            "image changed during batch"
        );
        return None;
    }
    Some(entry)
}
