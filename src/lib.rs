pub mod app;
pub mod compress;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod scheduler;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod utils;

pub use app::router;
pub use config::AppConfig;
pub use state::AppState;
pub use storage::{RecordStore, load_data, resolve_data_path};
