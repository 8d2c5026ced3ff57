//! Adaptive image compression: plan dimensions, pick a strategy, search for a
//! quality that fits the byte budget, and apply it across the record store.

pub mod batch;
pub mod data_uri;
pub mod dimensions;
pub mod encoder;
pub mod pipeline;
pub mod search;
pub mod strategy;

pub use batch::{BatchOptions, BatchReport, collect_candidates, run_batch};
pub use data_uri::{DataUri, encode_data_uri, estimate_size};
pub use dimensions::{Dimensions, plan_dimensions};
pub use encoder::{Encoded, ImageAsset, JpegEncoder, RasterEncoder};
pub use pipeline::{CompressionRequest, CompressionResult, compress_asset, compress_data_uri};
pub use search::{DecaySchedule, SearchOutcome, SearchState, search_quality};
pub use strategy::{
    CompressionStrategy, StrategyKind, default_strategy, escalate, select_strategy,
};
