//! Vote Record store and webhook signature verification (§3, §6, supplemented).
//!
//! The HTTP receiver itself is out of core scope (§1), but its contract —
//! verifying an HMAC-SHA256 signature against a shared secret and recording a
//! vote row — is real so the excluded receiver has something to call into.
//! HMAC verification is grounded directly on `webhooks.rs`'s signing code
//! (`Hmac<Sha256>::new_from_slice` / `hex::encode`), used here to verify
//! instead of sign.

use crate::error::RelayResult;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rusqlite::params;
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

pub struct VoteStore {
    db: Arc<crate::db::Db>,
}

impl VoteStore {
    pub fn new(db: Arc<crate::db::Db>) -> Self {
        Self { db }
    }

    pub fn record(&self, user_id: &str, bot_id: &str, vote_type: &str, is_weekend: bool) -> RelayResult<()> {
        let now = Utc::now();
        let month_key = now.format("%Y-%m").to_string();
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO votes (user_id, bot_id, vote_type, is_weekend, month_key, voted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![user_id, bot_id, vote_type, is_weekend, month_key, now.to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn count_for_month(&self, user_id: &str, month_key: &str) -> RelayResult<i64> {
        let conn = self.db.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM votes WHERE user_id = ?1 AND month_key = ?2",
            params![user_id, month_key],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// Verify a webhook body against an `X-Signature: sha256=<hex>` style header,
/// given the shared secret. Returns false (never panics) on a malformed header.
pub fn verify_signature(secret: &str, body: &[u8], signature_header: &str) -> bool {
    let Some(hex_sig) = signature_header.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
