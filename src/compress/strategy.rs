use super::search::SearchOutcome;
use serde::Serialize;
use std::fmt;

pub const STARTING_QUALITY: f32 = 0.8;

const HUGE_SIZE_KB: u64 = 2000;
const HUGE_SIDE_PX: u32 = 2000;
const WIDE_ASPECT: f64 = 1.5;
const TALL_ASPECT: f64 = 0.7;

const ESCALATION_MAX_SIDE: u32 = 400;
const ESCALATION_SCALE: f32 = 0.8;
const ESCALATION_QUALITY_SCALE: f32 = 0.7;
const ESCALATION_QUALITY_FLOOR: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Aggressive,
    Wide,
    Tall,
    Balanced,
    Default,
    Escalated,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Aggressive => "aggressive",
            StrategyKind::Wide => "wide",
            StrategyKind::Tall => "tall",
            StrategyKind::Balanced => "balanced",
            StrategyKind::Default => "default",
            StrategyKind::Escalated => "escalated",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompressionStrategy {
    pub kind: StrategyKind,
    pub max_width: u32,
    pub max_height: u32,
    pub quality: f32,
    pub max_size_kb: u64,
}

impl CompressionStrategy {
    fn new(kind: StrategyKind, max_width: u32, max_height: u32, max_size_kb: u64) -> Self {
        Self {
            kind,
            max_width,
            max_height,
            quality: STARTING_QUALITY,
            max_size_kb,
        }
    }
}

/// Picks starting bounds from coarse metadata. First matching rule wins.
pub fn select_strategy(
    width: u32,
    height: u32,
    size_bytes: u64,
    target_kb: u64,
) -> CompressionStrategy {
    if size_bytes > HUGE_SIZE_KB * 1024 || width > HUGE_SIDE_PX || height > HUGE_SIDE_PX {
        return CompressionStrategy::new(StrategyKind::Aggressive, 500, 500, target_kb);
    }

    let aspect = width.max(1) as f64 / height.max(1) as f64;
    if aspect > WIDE_ASPECT {
        CompressionStrategy::new(StrategyKind::Wide, 600, 400, target_kb)
    } else if aspect < TALL_ASPECT {
        CompressionStrategy::new(StrategyKind::Tall, 400, 600, target_kb)
    } else {
        CompressionStrategy::new(StrategyKind::Balanced, 500, 500, target_kb)
    }
}

/// Metadata-independent fallback used when a first attempt fails.
pub fn default_strategy(target_kb: u64) -> CompressionStrategy {
    CompressionStrategy::new(StrategyKind::Default, 500, 500, target_kb)
}

/// The single second pass run when the first search missed its budget.
pub fn escalate(first: &CompressionStrategy, outcome: &SearchOutcome) -> CompressionStrategy {
    let scaled = |side: u32| {
        ((side as f32 * ESCALATION_SCALE).round() as u32).clamp(1, ESCALATION_MAX_SIDE)
    };

    CompressionStrategy {
        kind: StrategyKind::Escalated,
        max_width: scaled(outcome.encoded.width),
        max_height: scaled(outcome.encoded.height),
        quality: (outcome.quality * ESCALATION_QUALITY_SCALE).max(ESCALATION_QUALITY_FLOOR),
        max_size_kb: first.max_size_kb,
    }
}
