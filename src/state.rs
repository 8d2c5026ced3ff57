use crate::compress::{BatchOptions, JpegEncoder, RasterEncoder};
use crate::config::OptimizerConfig;
use crate::notify::NotificationLog;
use crate::scheduler::OptimizeScheduler;
use crate::storage::RecordStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub scheduler: Arc<OptimizeScheduler>,
    pub encoder: Arc<dyn RasterEncoder>,
    pub notifications: NotificationLog,
    pub batch_options: BatchOptions,
}

impl AppState {
    pub fn new(store: RecordStore, optimizer: &OptimizerConfig) -> Self {
        Self {
            store,
            scheduler: Arc::new(OptimizeScheduler::new(optimizer.cooldown)),
            encoder: Arc::new(JpegEncoder),
            notifications: NotificationLog::default(),
            batch_options: optimizer.batch_options(),
        }
    }
}
