//! Fingerprint Allocator (C3, §4.3).
//!
//! `assign` is idempotent and exactly-once fleet-wide: the uniqueness
//! constraints on `crosschat_messages(source_message_id)` and `(cc_id)` are
//! the coordination primitive (§5), not an in-process lock. Candidate
//! generation follows the teacher's `generate_admin_key()` free-function
//! idiom, but the format itself (base-36 timestamp + random suffix) comes
//! from §4.3 — CC-ID length is a tested invariant and is not negotiable
//! (see DESIGN.md's resolved-open-question note).

use crate::error::{RelayError, RelayResult};
use crate::models::{IngressMessage, MessageRecord};
use rand::Rng;
use rusqlite::{OptionalExtension, params};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub struct FingerprintAllocator {
    db: Arc<crate::db::Db>,
    max_retries: u32,
    /// Local fast-path cache: source_message_id -> cc_id. Populated on every
    /// successful assign or lookup; never authoritative on its own.
    local: Mutex<HashMap<String, String>>,
}

/// Six base-36 characters from the low digits of the current millisecond
/// timestamp, plus two random base-36 characters (§4.3 step 3).
fn generate_candidate(is_vip: bool) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let millis = chrono::Utc::now().timestamp_millis() as u64;
    let mut base = to_base36(millis % 36u64.pow(6), 6);
    let mut rng = rand::thread_rng();
    for _ in 0..2 {
        base.push(ALPHABET[rng.gen_range(0..ALPHABET.len())] as char);
    }
    if is_vip {
        format!("V{base}")
    } else {
        base
    }
}

fn to_base36(mut n: u64, width: usize) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut digits = Vec::with_capacity(width);
    if n == 0 {
        digits.push(b'0');
    }
    while n > 0 {
        digits.push(ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    while digits.len() < width {
        digits.push(b'0');
    }
    digits.reverse();
    String::from_utf8(digits).unwrap()
}

impl FingerprintAllocator {
    pub fn new(db: Arc<crate::db::Db>, max_retries: u32) -> Self {
        Self {
            db,
            max_retries,
            local: Mutex::new(HashMap::new()),
        }
    }

    /// Look up an existing Message Record by source-message-id, without allocating.
    pub fn lookup_by_source_id(&self, source_message_id: &str) -> RelayResult<Option<MessageRecord>> {
        let conn = self.db.conn.lock().unwrap();
        read_message_record(&conn, "source_message_id", source_message_id)
    }

    pub fn lookup_by_cc_id(&self, cc_id: &str) -> RelayResult<Option<MessageRecord>> {
        let conn = self.db.conn.lock().unwrap();
        read_message_record(&conn, "cc_id", cc_id)
    }

    /// Assign a CC-ID to `msg`, exactly once fleet-wide (§4.3 algorithm).
    ///
    /// Returns `(cc_id, freshly_allocated)`. `freshly_allocated` is false when
    /// another caller (in this process or another replica) already won the
    /// race for `source_message_id` — the orchestrator uses this to avoid
    /// re-delivering (§4.9 step 8: "the orchestrator still returns processed
    /// without re-delivering").
    pub fn assign(&self, msg: &IngressMessage, tag_level: u32, tag_name: &str, is_vip: bool) -> RelayResult<(String, bool)> {
        if let Some(cc_id) = self.local.lock().unwrap().get(&msg.source_message_id).cloned() {
            return Ok((cc_id, false));
        }

        if let Some(existing) = self.lookup_by_source_id(&msg.source_message_id)? {
            self.local
                .lock()
                .unwrap()
                .insert(msg.source_message_id.clone(), existing.cc_id.clone());
            return Ok((existing.cc_id, false));
        }

        for attempt in 0..self.max_retries {
            let cc_id = generate_candidate(is_vip);
            let conn = self.db.conn.lock().unwrap();
            let insert_result = conn.execute(
                "INSERT INTO crosschat_messages
                    (source_message_id, cc_id, source_user_id, source_user_display_name,
                     source_server_id, source_channel_id, content, tag_level, tag_name,
                     is_vip, created_at, is_deleted)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0)",
                params![
                    msg.source_message_id,
                    cc_id,
                    msg.source_user_id,
                    msg.source_user_display_name,
                    msg.source_server_id,
                    msg.source_channel_id,
                    msg.content,
                    tag_level,
                    tag_name,
                    is_vip,
                    msg.created_at,
                ],
            );
            drop(conn);

            match insert_result {
                Ok(_) => {
                    debug!(source_message_id = %msg.source_message_id, cc_id = %cc_id, "allocated cc-id");
                    self.local
                        .lock()
                        .unwrap()
                        .insert(msg.source_message_id.clone(), cc_id.clone());
                    return Ok((cc_id, true));
                }
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    // Someone else won the race. If it was on source_message_id,
                    // their row is authoritative; re-read and return it.
                    if let Some(existing) = self.lookup_by_source_id(&msg.source_message_id)? {
                        self.local
                            .lock()
                            .unwrap()
                            .insert(msg.source_message_id.clone(), existing.cc_id.clone());
                        return Ok((existing.cc_id, false));
                    }
                    // Otherwise the collision was on cc_id alone; regenerate and retry.
                    warn!(attempt, "cc-id collision, retrying");
                    continue;
                }
                Err(e) => return Err(RelayError::StoreUnavailable(e)),
            }
        }

        Err(RelayError::AllocatorExhausted(self.max_retries))
    }
}

fn read_message_record(
    conn: &rusqlite::Connection,
    key_column: &str,
    key_value: &str,
) -> RelayResult<Option<MessageRecord>> {
    let sql = format!(
        "SELECT source_message_id, cc_id, source_user_id, source_user_display_name,
                source_server_id, source_channel_id, content, tag_level, tag_name,
                is_vip, created_at, is_deleted, deleted_at, deleted_by
         FROM crosschat_messages WHERE {key_column} = ?1"
    );
    let record = conn
        .query_row(&sql, params![key_value], |row| {
            Ok(MessageRecord {
                source_message_id: row.get(0)?,
                cc_id: row.get(1)?,
                source_user_id: row.get(2)?,
                source_user_display_name: row.get(3)?,
                source_server_id: row.get(4)?,
                source_channel_id: row.get(5)?,
                content: row.get(6)?,
                tag_level: row.get(7)?,
                tag_name: row.get(8)?,
                is_vip: row.get::<_, i64>(9)? != 0,
                created_at: row.get(10)?,
                is_deleted: row.get::<_, i64>(11)? != 0,
                deleted_at: row.get(12)?,
                deleted_by: row.get(13)?,
            })
        })
        .optional()?;
    Ok(record)
}
