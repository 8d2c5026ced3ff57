use crate::models::{AppData, StatsResponse};

pub fn build_stats(data: &AppData) -> StatsResponse {
    let mut stats = StatsResponse {
        records: data.records.len(),
        ..StatsResponse::default()
    };

    for entry in data.records.iter().flat_map(|record| record.files.iter()) {
        stats.files += 1;
        stats.stored_bytes = stats.stored_bytes.saturating_add(entry.size);

        let original = entry.original_size.unwrap_or(entry.size);
        stats.original_bytes = stats.original_bytes.saturating_add(original);
        stats.saved_bytes = stats.saved_bytes.saturating_add(original.saturating_sub(entry.size));

        if entry.is_image() {
            stats.images += 1;
        }
        if entry.optimized {
            stats.optimized += 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileEntry, Record};
    use chrono::Utc;

    fn file(mime: &str, size: u64, original: Option<u64>) -> FileEntry {
        FileEntry {
            name: "f".into(),
            data: String::new(),
            size,
            mime: mime.into(),
            optimized: original.is_some(),
            optimized_at: original.map(|_| Utc::now()),
            original_size: original,
            compression_ratio: None,
            optimize_error: None,
        }
    }

    #[test]
    fn stats_sum_sizes_and_savings() {
        let data = AppData {
            records: vec![
                Record {
                    id: "a".into(),
                    title: "a".into(),
                    note: None,
                    created_at: Utc::now(),
                    files: vec![file("image/jpeg", 40, Some(100)), file("image/png", 50, None)],
                },
                Record {
                    id: "b".into(),
                    title: "b".into(),
                    note: Some("no files".into()),
                    created_at: Utc::now(),
                    files: vec![file("text/plain", 10, None)],
                },
            ],
        };

        let stats = build_stats(&data);
        assert_eq!(stats.records, 2);
        assert_eq!(stats.files, 3);
        assert_eq!(stats.images, 2);
        assert_eq!(stats.optimized, 1);
        assert_eq!(stats.stored_bytes, 100);
        assert_eq!(stats.original_bytes, 160);
        assert_eq!(stats.saved_bytes, 60);
    }

    #[test]
    fn empty_store_is_all_zero() {
        assert_eq!(build_stats(&AppData::default()), StatsResponse::default());
    }
}
