use crate::errors::AppError;
use crate::models::AppData;
use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    fs,
    sync::{Mutex, MutexGuard},
};
use tracing::{error, info};

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/state.json"))
}

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<AppData>(&bytes) {
            Ok(data) => {
                info!(records = data.records.len(), "loaded data file");
                data
            }
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

/// The record document shared by the HTTP handlers and the optimizer.
#[derive(Clone)]
pub struct RecordStore {
    path: PathBuf,
    data: Arc<Mutex<AppData>>,
}

impl RecordStore {
    pub fn new(path: PathBuf, data: AppData) -> Self {
        Self {
            path,
            data: Arc::new(Mutex::new(data)),
        }
    }

    pub async fn open(path: PathBuf) -> Self {
        let data = load_data(&path).await;
        Self::new(path, data)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn lock(&self) -> MutexGuard<'_, AppData> {
        self.data.lock().await
    }

    /// Snapshot of the whole document.
    pub async fn get_data(&self) -> AppData {
        self.data.lock().await.clone()
    }

    pub async fn save_data(&self, data: AppData) -> Result<(), AppError> {
        let mut guard = self.data.lock().await;
        *guard = data;
        persist_data(&self.path, &guard).await
    }

    pub async fn persist(&self) -> Result<(), AppError> {
        let guard = self.data.lock().await;
        persist_data(&self.path, &guard).await
    }
}

#[cfg(test)]
pub(crate) fn temp_data_path(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("punch_journal_{tag}_{}_{nanos}.json", std::process::id()));
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use chrono::Utc;

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let data = load_data(&temp_data_path("missing")).await;
        assert!(data.records.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let path = temp_data_path("corrupt");
        fs::write(&path, b"{ not json").await.unwrap();
        assert_eq!(load_data(&path).await, AppData::default());
        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn save_then_reopen_round_trips() {
        let path = temp_data_path("roundtrip");
        let store = RecordStore::new(path.clone(), AppData::default());
        let mut data = store.get_data().await;
        data.records.push(Record {
            id: "rec-1".into(),
            title: "Morning run".into(),
            note: None,
            created_at: Utc::now(),
            files: Vec::new(),
        });
        store.save_data(data.clone()).await.unwrap();

        let reopened = RecordStore::open(path.clone()).await;
        assert_eq!(reopened.get_data().await, data);
        let _ = fs::remove_file(&path).await;
    }
}
