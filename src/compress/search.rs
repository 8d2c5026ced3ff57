//! Bounded quality search.
//!
//! The loop re-encodes at geometrically decaying quality until the output
//! fits the budget. Quality never increases between attempts and the number
//! of attempts is capped, so the loop always terminates with a result.

use super::dimensions::Dimensions;
use super::encoder::{Encoded, RasterEncoder};
use crate::errors::CompressError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchState {
    Initial,
    Attempting,
    Accepted,
    Exhausted,
}

/// How quality and size decay after an over-budget attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecaySchedule {
    /// Quality multiplier when the overshoot is small.
    pub decay: f32,
    /// Quality multiplier when `size / budget` exceeds `large_overage`.
    pub steep_decay: f32,
    pub large_overage: f32,
    /// Dimension multiplier applied together with `steep_decay`.
    pub shrink: f32,
    /// Shrinking never takes the long side below this. Once a shrunk image
    /// cannot shrink again the search stops as exhausted.
    pub min_long_side: u32,
}

impl Default for DecaySchedule {
    fn default() -> Self {
        Self {
            decay: 0.85,
            steep_decay: 0.8,
            large_overage: 1.5,
            shrink: 0.8,
            min_long_side: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    pub budget_bytes: u64,
    pub quality: f32,
    pub quality_floor: f32,
    pub max_attempts: u32,
    pub adjust_quality: bool,
    pub schedule: DecaySchedule,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub encoded: Encoded,
    pub quality: f32,
    pub attempts: u32,
    pub state: SearchState,
}

impl SearchOutcome {
    pub fn within(&self, budget_bytes: u64) -> bool {
        self.encoded.size <= budget_bytes
    }
}

pub fn search_quality(
    encoder: &dyn RasterEncoder,
    raster: &DynamicImage,
    start: Dimensions,
    params: &SearchParams,
) -> Result<SearchOutcome, CompressError> {
    let floor = params.quality_floor.clamp(0.01, 1.0);
    let max_attempts = params.max_attempts.max(1);
    let schedule = params.schedule;

    let mut quality = params.quality.clamp(floor, 1.0);
    let mut dims = start;
    let mut attempts = 0;
    let mut state = SearchState::Initial;

    loop {
        debug_assert!(matches!(state, SearchState::Initial | SearchState::Attempting));
        state = SearchState::Attempting;

        let encoded = encoder.encode(raster, dims, quality)?;
        attempts += 1;
        debug!(
            attempt = attempts,
            quality,
            width = encoded.width,
            height = encoded.height,
            size = encoded.size,
            budget = params.budget_bytes,
            "quality search attempt"
        );

        let accepted = encoded.size <= params.budget_bytes
            || !params.adjust_quality
            || attempts >= max_attempts;
        let overage = encoded.size as f32 / params.budget_bytes.max(1) as f32;
        let mut next_dims = dims;

        if accepted {
            state = SearchState::Accepted;
        } else if quality <= floor {
            state = SearchState::Exhausted;
        } else if overage > schedule.large_overage {
            match dims.shrink(schedule.shrink, schedule.min_long_side) {
                Some(smaller) => next_dims = smaller,
                // shrinking already bottomed out at the minimum size
                None if dims != start => state = SearchState::Exhausted,
                None => {}
            }
        }

        if matches!(state, SearchState::Accepted | SearchState::Exhausted) {
            return Ok(SearchOutcome {
                encoded,
                quality,
                attempts,
                state,
            });
        }

        quality *= if overage > schedule.large_overage {
            schedule.steep_decay
        } else {
            schedule.decay
        };
        dims = next_dims;
        quality = quality.max(floor);
    }
}
