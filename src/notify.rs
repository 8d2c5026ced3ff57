use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};
use tracing::{info, warn};

const KEEP_LAST: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub at: DateTime<Utc>,
}

/// Fire-and-forget user notifications, kept in a small ring for the UI.
#[derive(Clone, Default)]
pub struct NotificationLog {
    entries: Arc<Mutex<VecDeque<Notification>>>,
}

impl NotificationLog {
    pub fn notify(&self, message: impl Into<String>, severity: Severity) {
        let message = message.into();
        match severity {
            Severity::Success => info!(%message, "notification"),
            Severity::Warning => warn!(%message, "notification"),
        }

        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        if entries.len() == KEEP_LAST {
            entries.pop_front();
        }
        entries.push_back(Notification {
            message,
            severity,
            at: Utc::now(),
        });
    }

    /// Newest first.
    pub fn recent(&self) -> Vec<Notification> {
        match self.entries.lock() {
            Ok(entries) => entries.iter().rev().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}
