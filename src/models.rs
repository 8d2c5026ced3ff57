use crate::compress::{CompressionRequest, CompressionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppData {
    #[serde(default)]
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// One attached file. `data` is always a base64 data URI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub data: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime: String,
    #[serde(default)]
    pub optimized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_size: Option<u64>,
    /// Percentage saved, e.g. `72.5`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
    /// Set when the optimizer could not read the image; such entries are
    /// left alone until their payload is replaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimize_error: Option<String>,
}

impl FileEntry {
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    /// Rewrites the entry in place with an accepted compression result.
    pub fn apply_result(&mut self, result: &CompressionResult, now: DateTime<Utc>) {
        let original = self.original_size.unwrap_or(self.size);
        self.data = result.data_uri.clone();
        self.size = result.size;
        self.mime = result.mime.to_string();
        self.mark_optimized(original, now);
    }

    /// Tags the entry without touching its payload.
    pub fn mark_optimized(&mut self, original: u64, now: DateTime<Utc>) {
        let ratio = if original == 0 {
            0.0
        } else {
            (1.0 - self.size as f64 / original as f64) * 100.0
        };
        self.optimized = true;
        self.optimized_at = Some(now);
        self.original_size = Some(original);
        self.compression_ratio = Some((ratio * 10.0).round() / 10.0);
        self.optimize_error = None;
    }

    pub fn mark_unreadable(&mut self, reason: impl Into<String>) {
        self.optimize_error = Some(reason.into());
    }
}

#[derive(Debug, Deserialize)]
pub struct NewRecordRequest {
    pub title: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub files: Vec<NewFile>,
}

#[derive(Debug, Deserialize)]
pub struct NewFile {
    pub name: String,
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct CompressPayload {
    pub data: String,
    #[serde(default)]
    pub request: Option<CompressionRequest>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressResponse {
    pub data: String,
    pub size: u64,
    pub width: u32,
    pub height: u32,
    pub quality: f32,
    pub original_size: u64,
    pub compression_ratio: f64,
    pub strategy: String,
    pub attempts: u32,
    pub within_budget: bool,
}

impl From<CompressionResult> for CompressResponse {
    fn from(result: CompressionResult) -> Self {
        Self {
            compression_ratio: result.compression_ratio(),
            within_budget: result.within_budget(),
            strategy: result.strategy.to_string(),
            data: result.data_uri,
            size: result.size,
            width: result.width,
            height: result.height,
            quality: result.quality,
            original_size: result.original_size,
            attempts: result.attempts,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub records: usize,
    pub files: usize,
    pub images: usize,
    pub optimized: usize,
    pub stored_bytes: u64,
    pub original_bytes: u64,
    pub saved_bytes: u64,
}
