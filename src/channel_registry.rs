//! Channel Registry (C1, §4.1).
//!
//! Grounded on `db.rs`'s `Db` wrapper and on `routes/mod.rs`'s `PresenceTracker`
//! read-mostly `Arc<RwLock<HashMap<...>>>` cache shape, generalized here to a
//! TTL-refreshed set of active channel ids with immediate invalidation on write.

use crate::error::{RelayError, RelayResult};
use crate::models::ChannelEntry;
use rusqlite::{OptionalExtension, params};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

struct Cache {
    active_channel_ids: HashMap<String, String>, // channel_id -> server_id
    refreshed_at: Instant,
}

pub struct ChannelRegistry {
    db: Arc<crate::db::Db>,
    ttl: Duration,
    cache: RwLock<Cache>,
}

impl ChannelRegistry {
    pub fn new(db: Arc<crate::db::Db>, ttl_secs: u64) -> Self {
        let registry = Self {
            db,
            ttl: Duration::from_secs(ttl_secs),
            cache: RwLock::new(Cache {
                active_channel_ids: HashMap::new(),
                refreshed_at: Instant::now() - Duration::from_secs(ttl_secs + 1),
            }),
        };
        registry.refresh().ok();
        registry
    }

    fn refresh(&self) -> RelayResult<()> {
        let conn = self.db.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT channel_id, server_id FROM crosschat_channels WHERE active = 1",
        )?;
        let rows: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        let mut cache = self.cache.write().unwrap();
        cache.active_channel_ids = rows.into_iter().collect();
        cache.refreshed_at = Instant::now();
        Ok(())
    }

    fn maybe_refresh(&self) {
        let stale = {
            let cache = self.cache.read().unwrap();
            cache.refreshed_at.elapsed() >= self.ttl
        };
        if stale {
            self.refresh().ok();
        }
    }

    /// Enable relay for `server_id` on `channel_id`, enforcing the 5–10s slowmode
    /// policy (§4.1) and deactivating any channel the server previously had.
    pub fn enable(
        &self,
        server_id: &str,
        server_name: &str,
        channel_id: &str,
        channel_name: &str,
        slowmode_secs: u32,
    ) -> RelayResult<()> {
        if !(5..=10).contains(&slowmode_secs) {
            return Err(RelayError::Policy(format!(
                "slowmode must be 5-10s, got {slowmode_secs}"
            )));
        }

        let now = chrono::Utc::now().to_rfc3339();
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO crosschat_channels
                (server_id, channel_id, server_name, channel_name, active, created_at, updated_at, slowmode_secs)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5, ?6)
             ON CONFLICT(server_id) DO UPDATE SET
                channel_id = excluded.channel_id,
                server_name = excluded.server_name,
                channel_name = excluded.channel_name,
                active = 1,
                updated_at = excluded.updated_at,
                slowmode_secs = excluded.slowmode_secs",
            params![server_id, channel_id, server_name, channel_name, now, slowmode_secs],
        )?;
        drop(conn);

        self.refresh()?;
        Ok(())
    }

    /// Deactivate a channel, keeping its row for audit (§4.1).
    pub fn disable(&self, channel_id: &str) -> RelayResult<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "UPDATE crosschat_channels SET active = 0, updated_at = ?1 WHERE channel_id = ?2",
            params![now, channel_id],
        )?;
        drop(conn);

        self.refresh()?;
        Ok(())
    }

    /// O(1) membership check against the cached active set (§4.1 privacy invariant).
    pub fn is_relay_channel(&self, channel_id: &str) -> bool {
        self.maybe_refresh();
        self.cache.read().unwrap().active_channel_ids.contains_key(channel_id)
    }

    /// The full set of active channel ids — the hot-path lookup for fan-out targets.
    pub fn list_active(&self) -> Vec<String> {
        self.maybe_refresh();
        self.cache
            .read()
            .unwrap()
            .active_channel_ids
            .keys()
            .cloned()
            .collect()
    }

    pub fn get(&self, server_id: &str) -> RelayResult<Option<ChannelEntry>> {
        let conn = self.db.conn.lock().unwrap();
        let entry = conn
            .query_row(
                "SELECT server_id, channel_id, server_name, channel_name, active, created_at, updated_at
                 FROM crosschat_channels WHERE server_id = ?1",
                params![server_id],
                |row| {
                    Ok(ChannelEntry {
                        server_id: row.get(0)?,
                        channel_id: row.get(1)?,
                        server_name: row.get(2)?,
                        channel_name: row.get(3)?,
                        active: row.get::<_, i64>(4)? != 0,
                        created_at: row.get(5)?,
                        updated_at: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }
}
