use super::dimensions::plan_dimensions;
use super::encoder::{ImageAsset, OUTPUT_MIME, RasterEncoder};
use super::search::{DecaySchedule, SearchOutcome, SearchParams, SearchState, search_quality};
use super::strategy::{CompressionStrategy, StrategyKind, escalate, select_strategy};
use crate::errors::CompressError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompressionRequest {
    pub target_kb: u64,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub quality_floor: f32,
    pub quality_ceiling: f32,
    pub max_attempts: u32,
    pub resize: bool,
    pub adjust_quality: bool,
}

impl Default for CompressionRequest {
    fn default() -> Self {
        Self {
            target_kb: 100,
            max_width: None,
            max_height: None,
            quality_floor: 0.15,
            quality_ceiling: 0.92,
            max_attempts: 5,
            resize: true,
            adjust_quality: true,
        }
    }
}

impl CompressionRequest {
    pub fn with_target_kb(target_kb: u64) -> Self {
        Self {
            target_kb,
            ..Self::default()
        }
    }

    pub fn budget_bytes(&self) -> u64 {
        self.target_kb.saturating_mul(1024)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompressionResult {
    pub data_uri: String,
    pub mime: &'static str,
    pub size: u64,
    pub width: u32,
    pub height: u32,
    pub quality: f32,
    pub original_size: u64,
    pub budget_bytes: u64,
    pub strategy: StrategyKind,
    pub attempts: u32,
    pub state: SearchState,
}

impl CompressionResult {
    /// `1 - output / original`; negative when the output grew.
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        1.0 - self.size as f64 / self.original_size as f64
    }

    pub fn within_budget(&self) -> bool {
        self.size <= self.budget_bytes
    }
}

pub fn compress_data_uri(
    uri: &str,
    request: &CompressionRequest,
    encoder: &dyn RasterEncoder,
) -> Result<CompressionResult, CompressError> {
    let asset = ImageAsset::from_data_uri(uri)?;
    compress_asset(&asset, request, encoder)
}

pub fn compress_asset(
    asset: &ImageAsset,
    request: &CompressionRequest,
    encoder: &dyn RasterEncoder,
) -> Result<CompressionResult, CompressError> {
    let strategy = select_strategy(asset.width, asset.height, asset.size, request.target_kb);
    compress_with_strategy(asset, request, &strategy, encoder)
}

/// Runs the search for `strategy`, then at most one escalated encode if the
/// budget was missed. The smaller of the two results wins, and a failed
/// escalation falls back to the first pass.
pub fn compress_with_strategy(
    asset: &ImageAsset,
    request: &CompressionRequest,
    strategy: &CompressionStrategy,
    encoder: &dyn RasterEncoder,
) -> Result<CompressionResult, CompressError> {
    let budget = request.budget_bytes();
    let start = plan_dimensions(
        asset.width,
        asset.height,
        request.max_width.unwrap_or(strategy.max_width),
        request.max_height.unwrap_or(strategy.max_height),
        request.resize,
    );
    let params = SearchParams {
        budget_bytes: budget,
        quality: strategy.quality.min(request.quality_ceiling),
        quality_floor: request.quality_floor,
        max_attempts: request.max_attempts,
        adjust_quality: request.adjust_quality,
        schedule: DecaySchedule::default(),
    };

    let first = search_quality(encoder, asset.raster(), start, &params)?;
    debug!(
        strategy = %strategy.kind,
        attempts = first.attempts,
        size = first.encoded.size,
        budget,
        "first pass finished"
    );

    if first.within(budget) || !request.adjust_quality {
        return Ok(into_result(first, asset, budget, strategy.kind));
    }

    let second = escalate(strategy, &first);
    let dims = plan_dimensions(
        first.encoded.width,
        first.encoded.height,
        second.max_width,
        second.max_height,
        true,
    );
    let quality = second.quality.min(first.quality);
    let attempts = first.attempts + 1;
    // Whatever happens below, the first pass stays a valid best-effort answer.
    let fallback = |first: SearchOutcome| SearchOutcome {
        attempts,
        state: SearchState::Exhausted,
        ..first
    };

    let escalated = match encoder.encode(asset.raster(), dims, quality) {
        Ok(escalated) => escalated,
        Err(err) => {
            warn!(strategy = %strategy.kind, "escalation pass failed, keeping first pass: {err}");
            return Ok(into_result(fallback(first), asset, budget, strategy.kind));
        }
    };
    debug!(size = escalated.size, budget, "escalation pass finished");

    if escalated.size < first.encoded.size {
        let state = if escalated.size <= budget {
            SearchState::Accepted
        } else {
            SearchState::Exhausted
        };
        let outcome = SearchOutcome {
            encoded: escalated,
            quality,
            attempts,
            state,
        };
        Ok(into_result(outcome, asset, budget, second.kind))
    } else {
        Ok(into_result(fallback(first), asset, budget, strategy.kind))
    }
}

fn into_result(
    outcome: SearchOutcome,
    asset: &ImageAsset,
    budget_bytes: u64,
    strategy: StrategyKind,
) -> CompressionResult {
    CompressionResult {
        data_uri: outcome.encoded.data_uri,
        mime: OUTPUT_MIME,
        size: outcome.encoded.size,
        width: outcome.encoded.width,
        height: outcome.encoded.height,
        quality: outcome.quality,
        original_size: asset.size,
        budget_bytes,
        strategy,
        attempts: outcome.attempts,
        state: outcome.state,
    }
}
