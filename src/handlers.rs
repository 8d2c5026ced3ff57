use crate::compress::{CompressionRequest, DataUri, compress_data_uri, estimate_size};
use crate::errors::AppError;
use crate::models::{
    CompressPayload, CompressResponse, FileEntry, NewRecordRequest, Record, StatsResponse,
};
use crate::notify::Notification;
use crate::scheduler::{RunOutcome, Trigger, run_optimization};
use crate::state::AppState;
use crate::stats::build_stats;
use crate::ui::render_index;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{Html, Redirect},
};
use chrono::Utc;
use tracing::info;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let stats = {
        let data = state.store.lock().await;
        build_stats(&data)
    };
    Html(render_index(&stats, &state.notifications.recent()))
}

pub async fn optimize_now(State(state): State<AppState>) -> Redirect {
    run_optimization(&state, Trigger::Manual).await;
    Redirect::to("/")
}

pub async fn optimize(State(state): State<AppState>) -> Json<RunOutcome> {
    Json(run_optimization(&state, Trigger::Manual).await)
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let data = state.store.lock().await;
    Json(build_stats(&data))
}

pub async fn get_records(State(state): State<AppState>) -> Json<Vec<Record>> {
    Json(state.store.get_data().await.records)
}

pub async fn get_notifications(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.notifications.recent())
}

pub async fn create_record(
    State(state): State<AppState>,
    Json(payload): Json<NewRecordRequest>,
) -> Result<(StatusCode, Json<Record>), AppError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }

    let mut files = Vec::with_capacity(payload.files.len());
    for file in payload.files {
        let mime = DataUri::parse(&file.data)
            .map_err(|err| AppError::bad_request(format!("{}: {err}", file.name)))?
            .mime
            .to_string();
        if !mime.starts_with("image/") {
            return Err(AppError::bad_request(format!(
                "{}: only images can be attached",
                file.name
            )));
        }
        files.push(FileEntry {
            size: estimate_size(&file.data),
            name: file.name,
            data: file.data,
            mime,
            optimized: false,
            optimized_at: None,
            original_size: None,
            compression_ratio: None,
            optimize_error: None,
        });
    }

    let record = {
        let mut data = state.store.lock().await;
        let record = Record {
            id: next_record_id(&data.records),
            title: title.to_string(),
            note: payload.note.filter(|note| !note.trim().is_empty()),
            created_at: Utc::now(),
            files,
        };
        data.records.push(record.clone());
        record
    };
    state.store.persist().await?;
    info!(id = %record.id, files = record.files.len(), "record created");

    if !record.files.is_empty() {
        let background = state.clone();
        tokio::spawn(async move {
            run_optimization(&background, Trigger::StorageChange).await;
        });
    }

    Ok((StatusCode::CREATED, Json(record)))
}

/// Compresses a single data URI without touching the store.
pub async fn compress(
    State(state): State<AppState>,
    Json(payload): Json<CompressPayload>,
) -> Result<Json<CompressResponse>, AppError> {
    let default_kb = state.batch_options.request.target_kb;
    let request = payload
        .request
        .unwrap_or_else(|| CompressionRequest::with_target_kb(default_kb));
    if request.target_kb == 0 {
        return Err(AppError::bad_request("targetKb must be positive"));
    }
    let valid_bounds = request.quality_floor > 0.0
        && request.quality_floor <= request.quality_ceiling
        && request.quality_ceiling <= 1.0;
    if !valid_bounds {
        return Err(AppError::bad_request("quality bounds must satisfy 0 < floor <= ceiling <= 1"));
    }

    let encoder = state.encoder.clone();
    let result = tokio::task::spawn_blocking(move || {
        compress_data_uri(&payload.data, &request, encoder.as_ref())
    })
    .await
    .map_err(AppError::internal)??;

    Ok(Json(result.into()))
}

fn next_record_id(records: &[Record]) -> String {
    let mut n = records.len() + 1;
    loop {
        let id = format!("rec-{n}");
        if records.iter().all(|record| record.id != id) {
            return id;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> Record {
        Record {
            id: id.into(),
            title: id.into(),
            note: None,
            created_at: Utc::now(),
            files: Vec::new(),
        }
    }

    #[test]
    fn record_ids_skip_taken_values() {
        assert_eq!(next_record_id(&[]), "rec-1");
        assert_eq!(next_record_id(&[record("rec-2")]), "rec-3");
        assert_eq!(next_record_id(&[record("rec-3"), record("rec-1")]), "rec-4");
        assert_eq!(next_record_id(&[record("rec-2"), record("x")]), "rec-3");
    }
}
