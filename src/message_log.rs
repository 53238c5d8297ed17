//! Message Log (C4, §4.4).
//!
//! Writes happen once, at allocation time (see `FingerprintAllocator::assign`);
//! this module covers the remaining read/mutate operations C4 must support.

use crate::error::RelayResult;
use crate::fingerprint::FingerprintAllocator;
use crate::models::{MessageRecord, ModerationAction};
use chrono::Utc;
use rusqlite::params;
use std::sync::Arc;

pub struct MessageLog {
    db: Arc<crate::db::Db>,
    allocator: Arc<FingerprintAllocator>,
}

impl MessageLog {
    pub fn new(db: Arc<crate::db::Db>, allocator: Arc<FingerprintAllocator>) -> Self {
        Self { db, allocator }
    }

    pub fn by_source_id(&self, source_message_id: &str) -> RelayResult<Option<MessageRecord>> {
        self.allocator.lookup_by_source_id(source_message_id)
    }

    pub fn by_cc_id(&self, cc_id: &str) -> RelayResult<Option<MessageRecord>> {
        self.allocator.lookup_by_cc_id(cc_id)
    }

    /// Update content in place for an edit (§4.10, §9: edit updates in place).
    pub fn update_content(&self, source_message_id: &str, new_content: &str) -> RelayResult<()> {
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "UPDATE crosschat_messages SET content = ?1 WHERE source_message_id = ?2",
            params![new_content, source_message_id],
        )?;
        Ok(())
    }

    /// Mark a Message Record deleted and append a Moderation Log Entry (§4.4, §4.10),
    /// recording `deleted_count` affected deliveries in the audit reason (§4.10: the
    /// log entry must include "the count of affected deliveries").
    pub fn mark_deleted(&self, cc_id: &str, deleted_by: &str, deleted_count: usize) -> RelayResult<bool> {
        let now = Utc::now().to_rfc3339();
        let conn = self.db.conn.lock().unwrap();
        let affected = conn.execute(
            "UPDATE crosschat_messages
             SET is_deleted = 1, deleted_at = ?1, deleted_by = ?2
             WHERE cc_id = ?3 AND is_deleted = 0",
            params![now, deleted_by, cc_id],
        )?;
        if affected > 0 {
            let id = uuid::Uuid::new_v4().to_string();
            let reason = format!("deleted_count={deleted_count}");
            conn.execute(
                "INSERT INTO moderation_logs (id, action, target_kind, target_id, moderator_id, reason, created_at)
                 VALUES (?1, 'delete', 'user', ?2, ?3, ?4, ?5)",
                params![id, cc_id, deleted_by, reason, now],
            )?;
        }
        Ok(affected > 0)
    }

    /// Count persisted Moderation Log Entries for `target_id` with the given action
    /// string (e.g. `"automod_warn"`) — the durable counterpart to the in-memory
    /// Violation Tally, queried fleet-wide since it lives in the shared store.
    pub fn count_action(&self, target_id: &str, action: &str) -> RelayResult<i64> {
        let conn = self.db.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM moderation_logs WHERE target_id = ?1 AND action = ?2",
            params![target_id, action],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn log_action(&self, action: ModerationAction, target_id: &str, moderator_id: Option<&str>, reason: &str) -> RelayResult<()> {
        let now = Utc::now().to_rfc3339();
        let id = uuid::Uuid::new_v4().to_string();
        let (action_str, target_kind) = match action {
            ModerationAction::ServerBan | ModerationAction::ServerUnban => (action_to_str(action), "server"),
            _ => (action_to_str(action), "user"),
        };
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO moderation_logs (id, action, target_kind, target_id, moderator_id, reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![id, action_str, target_kind, target_id, moderator_id, reason, now],
        )?;
        Ok(())
    }
}

fn action_to_str(action: ModerationAction) -> &'static str {
    match action {
        ModerationAction::Warn => "warn",
        ModerationAction::Ban => "ban",
        ModerationAction::Unban => "unban",
        ModerationAction::ServerBan => "serverban",
        ModerationAction::ServerUnban => "serverunban",
        ModerationAction::Delete => "delete",
        ModerationAction::AutomodDelete => "automod_delete",
        ModerationAction::AutomodWarn => "automod_warn",
    }
}
