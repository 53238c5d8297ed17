use rusqlite::Connection;
use std::sync::Mutex;

/// Thin wrapper around a single SQLite connection, matching the teacher's
/// `Db { conn: Mutex<Connection> }` shape. Every component keeps an `Arc<Db>`.
pub struct Db {
    pub conn: Mutex<Connection>,
}

impl Db {
    pub fn new(path: &str) -> Self {
        let conn = Connection::open(path).expect("failed to open database");
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .expect("failed to set pragmas");
        let db = Db {
            conn: Mutex::new(conn),
        };
        db.migrate();
        db
    }

    #[cfg(test)]
    pub fn open_temp(path: &std::path::Path) -> Self {
        Db::new(path.to_str().expect("temp db path must be utf8"))
    }

    fn migrate(&self) {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS crosschat_channels (
                server_id TEXT PRIMARY KEY,
                channel_id TEXT NOT NULL,
                server_name TEXT NOT NULL DEFAULT '',
                channel_name TEXT NOT NULL DEFAULT '',
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_channels_channel_id
                ON crosschat_channels(channel_id);",
        )
        .expect("failed to create crosschat_channels");

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS banned_users (
                user_id TEXT PRIMARY KEY,
                reason TEXT NOT NULL,
                moderator_id TEXT NOT NULL,
                duration_mins INTEGER,
                banned_at TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1
            );",
        )
        .expect("failed to create banned_users");

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS banned_servers (
                server_id TEXT PRIMARY KEY,
                reason TEXT NOT NULL,
                moderator_id TEXT NOT NULL,
                banned_at TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1
            );",
        )
        .expect("failed to create banned_servers");

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS crosschat_messages (
                source_message_id TEXT PRIMARY KEY,
                cc_id TEXT NOT NULL UNIQUE,
                source_user_id TEXT NOT NULL,
                source_user_display_name TEXT NOT NULL,
                source_server_id TEXT NOT NULL,
                source_channel_id TEXT NOT NULL,
                content TEXT NOT NULL,
                tag_level INTEGER NOT NULL DEFAULT 0,
                tag_name TEXT NOT NULL DEFAULT '',
                is_vip INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                deleted_at TEXT,
                deleted_by TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_messages_cc_id ON crosschat_messages(cc_id);",
        )
        .expect("failed to create crosschat_messages");

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sent_messages (
                cc_id TEXT NOT NULL,
                target_channel_id TEXT NOT NULL,
                delivered_message_id TEXT NOT NULL,
                delivered_at TEXT NOT NULL,
                source_message_id TEXT,
                PRIMARY KEY (cc_id, target_channel_id)
            );
            CREATE INDEX IF NOT EXISTS idx_sent_cc_id ON sent_messages(cc_id);",
        )
        .expect("failed to create sent_messages");

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS automod_whitelist (
                kind TEXT NOT NULL,
                identifier TEXT NOT NULL,
                added_at TEXT NOT NULL,
                added_by TEXT NOT NULL,
                PRIMARY KEY (kind, identifier)
            );",
        )
        .expect("failed to create automod_whitelist");

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS partner_servers (
                server_id TEXT PRIMARY KEY,
                server_name TEXT NOT NULL,
                boost_delay_ms INTEGER NOT NULL DEFAULT 750,
                partnered_at TEXT NOT NULL,
                partnered_by TEXT NOT NULL
            );",
        )
        .expect("failed to create partner_servers");

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS moderation_logs (
                id TEXT PRIMARY KEY,
                action TEXT NOT NULL,
                target_kind TEXT NOT NULL,
                target_id TEXT NOT NULL,
                moderator_id TEXT,
                reason TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_modlog_target ON moderation_logs(target_id);",
        )
        .expect("failed to create moderation_logs");

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS guild_info (
                server_id TEXT PRIMARY KEY,
                server_name TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .expect("failed to create guild_info");

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS votes (
                user_id TEXT NOT NULL,
                bot_id TEXT NOT NULL,
                vote_type TEXT NOT NULL,
                is_weekend INTEGER NOT NULL DEFAULT 0,
                month_key TEXT NOT NULL,
                voted_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_votes_user_month ON votes(user_id, month_key);",
        )
        .expect("failed to create votes");

        // Idempotent schema evolution, same `.ok()`-swallowed-ALTER idiom as the teacher:
        // a column that already exists just fails the ALTER silently.
        conn.execute_batch("ALTER TABLE crosschat_channels ADD COLUMN slowmode_secs INTEGER;")
            .ok();
    }
}
