//! Transient user notifications.
//!
//! Every notification carries the instant it was raised; readers ask for the
//! ones still visible at a given instant, and expired entries are pruned on
//! read.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

impl NotificationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Notifier {
    ttl: Duration,
    entries: Mutex<Vec<Notification>>,
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(NotificationLevel::Success, message.into(), Utc::now());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(NotificationLevel::Error, message.into(), Utc::now());
    }

    pub fn push(&self, level: NotificationLevel, message: String, raised_at: DateTime<Utc>) {
        match level {
            NotificationLevel::Success => tracing::info!(%message, "notification"),
            NotificationLevel::Error => tracing::warn!(%message, "notification"),
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(Notification {
                level,
                message,
                raised_at,
            });
        }
    }

    /// Notifications still on screen at `now`, oldest first.
    pub fn visible_at(&self, now: DateTime<Utc>) -> Vec<Notification> {
        let Ok(mut entries) = self.entries.lock() else {
            return Vec::new();
        };
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        entries.retain(|entry| now.signed_duration_since(entry.raised_at) < ttl);
        entries.clone()
    }

    /// Everything raised so far, regardless of expiry. Clears the queue.
    pub fn drain(&self) -> Vec<Notification> {
        match self.entries.lock() {
            Ok(mut entries) => std::mem::take(&mut *entries),
            Err(_) => Vec::new(),
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}
