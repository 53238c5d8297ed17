//! Ban Store (C2, §4.2).
//!
//! Grounded on `db.rs`'s migration idiom for the store, and on
//! `sid3xyz-slircd-ng/src/security/ban_cache.rs`'s `DashMap<String, CachedBan>`
//! with lazy `is_expired()` checking for the cache shape.

use crate::error::RelayResult;
use crate::models::ModerationAction;
use chrono::Utc;
use dashmap::DashMap;
use rusqlite::{OptionalExtension, params};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone, Copy)]
struct CachedVerdict {
    banned: bool,
    cached_at: Instant,
}

pub struct BanStore {
    db: Arc<crate::db::Db>,
    ttl: Duration,
    user_cache: DashMap<String, CachedVerdict>,
    server_cache: DashMap<String, CachedVerdict>,
}

impl BanStore {
    pub fn new(db: Arc<crate::db::Db>, ttl_secs: u64) -> Self {
        Self {
            db,
            ttl: Duration::from_secs(ttl_secs),
            user_cache: DashMap::new(),
            server_cache: DashMap::new(),
        }
    }

    fn log(&self, action: ModerationAction, target_id: &str, moderator_id: Option<&str>, reason: &str) -> RelayResult<()> {
        let now = Utc::now().to_rfc3339();
        let id = uuid::Uuid::new_v4().to_string();
        let target_kind = match action {
            ModerationAction::ServerBan | ModerationAction::ServerUnban => "server",
            _ => "user",
        };
        let action_str = action_to_str(action);
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO moderation_logs (id, action, target_kind, target_id, moderator_id, reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![id, action_str, target_kind, target_id, moderator_id, reason, now],
        )?;
        Ok(())
    }

    pub fn ban_user(&self, user_id: &str, reason: &str, moderator_id: &str, duration_mins: Option<i64>) -> RelayResult<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO banned_users (user_id, reason, moderator_id, duration_mins, banned_at, active)
             VALUES (?1, ?2, ?3, ?4, ?5, 1)
             ON CONFLICT(user_id) DO UPDATE SET
                reason = excluded.reason,
                moderator_id = excluded.moderator_id,
                duration_mins = excluded.duration_mins,
                banned_at = excluded.banned_at,
                active = 1",
            params![user_id, reason, moderator_id, duration_mins, now],
        )?;
        drop(conn);
        self.user_cache.remove(user_id);
        self.log(ModerationAction::Ban, user_id, Some(moderator_id), reason)?;
        Ok(())
    }

    pub fn unban_user(&self, user_id: &str, moderator_id: &str) -> RelayResult<()> {
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "UPDATE banned_users SET active = 0 WHERE user_id = ?1",
            params![user_id],
        )?;
        drop(conn);
        self.user_cache.remove(user_id);
        self.log(ModerationAction::Unban, user_id, Some(moderator_id), "")?;
        Ok(())
    }

    pub fn ban_server(&self, server_id: &str, reason: &str, moderator_id: &str) -> RelayResult<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO banned_servers (server_id, reason, moderator_id, banned_at, active)
             VALUES (?1, ?2, ?3, ?4, 1)
             ON CONFLICT(server_id) DO UPDATE SET
                reason = excluded.reason,
                moderator_id = excluded.moderator_id,
                banned_at = excluded.banned_at,
                active = 1",
            params![server_id, reason, moderator_id, now],
        )?;
        drop(conn);
        self.server_cache.remove(server_id);
        self.log(ModerationAction::ServerBan, server_id, Some(moderator_id), reason)?;
        Ok(())
    }

    pub fn unban_server(&self, server_id: &str, moderator_id: &str) -> RelayResult<()> {
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "UPDATE banned_servers SET active = 0 WHERE server_id = ?1",
            params![server_id],
        )?;
        drop(conn);
        self.server_cache.remove(server_id);
        self.log(ModerationAction::ServerUnban, server_id, Some(moderator_id), "")?;
        Ok(())
    }

    pub fn is_user_banned(&self, user_id: &str) -> RelayResult<bool> {
        if let Some(entry) = self.user_cache.get(user_id)
            && entry.cached_at.elapsed() < self.ttl
        {
            return Ok(entry.banned);
        }

        let conn = self.db.conn.lock().unwrap();
        let row: Option<(i64, Option<i64>, String)> = conn
            .query_row(
                "SELECT active, duration_mins, banned_at FROM banned_users WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        drop(conn);

        let banned = match row {
            None => false,
            Some((active, duration_mins, banned_at)) => {
                active != 0 && !has_expired(&banned_at, duration_mins)
            }
        };

        self.user_cache.insert(
            user_id.to_string(),
            CachedVerdict { banned, cached_at: Instant::now() },
        );
        Ok(banned)
    }

    pub fn is_server_banned(&self, server_id: &str) -> RelayResult<bool> {
        if let Some(entry) = self.server_cache.get(server_id)
            && entry.cached_at.elapsed() < self.ttl
        {
            return Ok(entry.banned);
        }

        let conn = self.db.conn.lock().unwrap();
        let banned: bool = conn
            .query_row(
                "SELECT active FROM banned_servers WHERE server_id = ?1",
                params![server_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .map(|active| active != 0)
            .unwrap_or(false);
        drop(conn);

        self.server_cache.insert(
            server_id.to_string(),
            CachedVerdict { banned, cached_at: Instant::now() },
        );
        Ok(banned)
    }
}

fn has_expired(banned_at: &str, duration_mins: Option<i64>) -> bool {
    let Some(mins) = duration_mins else { return false };
    let Ok(banned_at) = chrono::DateTime::parse_from_rfc3339(banned_at) else {
        return false;
    };
    let expires_at = banned_at + chrono::Duration::minutes(mins);
    Utc::now() >= expires_at
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
