//! In-memory, per-replica Violation Tally (§3).
//!
//! Not authoritative — moderation actions themselves are persisted via the
//! Ban Store / Message Log's Moderation Log writes. Reset on ban.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct Tally {
    pub count: u32,
    pub last_at: DateTime<Utc>,
    pub recent_reasons: Vec<String>,
}

pub struct ViolationTally {
    inner: RwLock<HashMap<String, Tally>>,
}

impl Default for ViolationTally {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl ViolationTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one flagged event for `user_id`, returning the new count.
    pub fn record(&self, user_id: &str, reason: &str) -> u32 {
        let mut map = self.inner.write().unwrap();
        let tally = map.entry(user_id.to_string()).or_insert_with(|| Tally {
            count: 0,
            last_at: Utc::now(),
            recent_reasons: Vec::new(),
        });
        tally.count += 1;
        tally.last_at = Utc::now();
        tally.recent_reasons.push(reason.to_string());
        if tally.recent_reasons.len() > 10 {
            tally.recent_reasons.remove(0);
        }
        tally.count
    }

    pub fn count(&self, user_id: &str) -> u32 {
        self.inner.read().unwrap().get(user_id).map(|t| t.count).unwrap_or(0)
    }

    /// Reset a user's tally, e.g. after a ban is applied.
    pub fn reset(&self, user_id: &str) {
        self.inner.write().unwrap().remove(user_id);
    }
}
