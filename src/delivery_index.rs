//! Delivery Index (C5, §4.4).
//!
//! Maps CC-ID -> list of (target-channel, delivered-message-id). Written once
//! per successful send (§4.7); the authoritative success signal for a relay
//! event is this write completing, not the platform send returning (§9).

use crate::error::RelayResult;
use crate::models::DeliveryRecord;
use chrono::Utc;
use rusqlite::params;
use std::sync::Arc;

pub struct DeliveryIndex {
    db: Arc<crate::db::Db>,
}

impl DeliveryIndex {
    pub fn new(db: Arc<crate::db::Db>) -> Self {
        Self { db }
    }

    /// Record a successful delivery. `(cc_id, target_channel_id)` is unique;
    /// a duplicate insert (e.g. a retried send) is ignored rather than erroring.
    pub fn record(
        &self,
        cc_id: &str,
        target_channel_id: &str,
        delivered_message_id: &str,
        source_message_id: Option<&str>,
    ) -> RelayResult<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sent_messages (cc_id, target_channel_id, delivered_message_id, delivered_at, source_message_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(cc_id, target_channel_id) DO NOTHING",
            params![cc_id, target_channel_id, delivered_message_id, now, source_message_id],
        )?;
        Ok(())
    }

    pub fn for_cc_id(&self, cc_id: &str) -> RelayResult<Vec<DeliveryRecord>> {
        let conn = self.db.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT cc_id, target_channel_id, delivered_message_id, delivered_at, source_message_id
             FROM sent_messages WHERE cc_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![cc_id], |row| {
                Ok(DeliveryRecord {
                    cc_id: row.get(0)?,
                    target_channel_id: row.get(1)?,
                    delivered_message_id: row.get(2)?,
                    delivered_at: row.get(3)?,
                    source_message_id: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_for_cc_id(&self, cc_id: &str) -> RelayResult<usize> {
        Ok(self.for_cc_id(cc_id)?.len())
    }
}
