//! Append-only log of forward results plus the derived views
//! (statistics, unique senders) the CLI and exports read.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use super::types::{ForwardResult, OriginType};

/// Counters over the result log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Earliest origin date among successful forwards.
    pub earliest: Option<DateTime<Utc>>,
    /// Latest origin date among successful forwards.
    pub latest: Option<DateTime<Utc>>,
}

/// One distinct original author with the number of forwarded messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SenderSummary {
    /// User/chat id, else username, else `"unknown"`.
    pub key: String,
    pub name: String,
    pub username: Option<String>,
    pub origin_type: OriginType,
    pub message_count: usize,
}

/// Results in append order. Presentation is newest first.
#[derive(Debug, Clone, Default)]
pub struct ResultLog {
    entries: Vec<ForwardResult>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from its persisted (newest first) form.
    pub fn from_newest_first(mut results: Vec<ForwardResult>) -> Self {
        results.reverse();
        Self { entries: results }
    }

    pub fn push(&mut self, result: ForwardResult) {
        self.entries.push(result);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in append order.
    pub fn iter(&self) -> impl Iterator<Item = &ForwardResult> {
        self.entries.iter()
    }

    pub fn newest_first(&self) -> Vec<ForwardResult> {
        self.entries.iter().rev().cloned().collect()
    }

    pub fn latest(&self) -> Option<&ForwardResult> {
        self.entries.last()
    }

    /// Successful entries, newest first.
    pub fn successes(&self) -> impl Iterator<Item = &ForwardResult> {
        self.entries.iter().rev().filter(|r| r.is_success())
    }

    pub fn stats(&self) -> LogStats {
        let mut stats = LogStats {
            total: self.entries.len(),
            ..Default::default()
        };
        for r in &self.entries {
            if !r.is_success() {
                stats.failed += 1;
                continue;
            }
            stats.successful += 1;
            if let Some(date) = r.origin_message_date {
                stats.earliest = Some(stats.earliest.map_or(date, |d| d.min(date)));
                stats.latest = Some(stats.latest.map_or(date, |d| d.max(date)));
            }
        }
        stats
    }

    /// Distinct senders of successful forwards, sorted by name.
    pub fn unique_senders(&self) -> Vec<SenderSummary> {
        let mut by_key: HashMap<String, SenderSummary> = HashMap::new();
        for r in self.entries.iter().filter(|r| r.is_success()) {
            let info = &r.sender_info;
            let key = info
                .user_id
                .map(|id| id.to_string())
                .or_else(|| info.username.clone().filter(|u| !u.is_empty()))
                .unwrap_or_else(|| "unknown".to_string());
            by_key
                .entry(key.clone())
                .or_insert_with(|| SenderSummary {
                    key,
                    name: info.display_name(),
                    username: info.username.clone(),
                    origin_type: info.origin_type,
                    message_count: 0,
                })
                .message_count += 1;
        }
        let mut senders: Vec<SenderSummary> = by_key.into_values().collect();
        senders.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.key.cmp(&b.key))
        });
        senders
    }
}
