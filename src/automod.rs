//! Automod Pipeline (C6, §4.5).
//!
//! Pattern categories and the per-pattern TTL-cache-key convention are
//! grounded directly on `auto_moderation.py`'s `profanity_patterns` /
//! `phone_patterns` / `address_patterns` / `link_patterns` / `invite_patterns`
//! lists and its `cache_key = f"{category}_pattern_{i}"` compiled-regex cache.
//! The verdict shape follows `sid3xyz-slircd-ng/src/security/spam.rs`'s
//! tagged-enum `SpamVerdict` rather than the source's loose `{'action': ...}` dict.

use crate::error::RelayResult;
use dashmap::DashMap;
use regex::Regex;
use rusqlite::params;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    Spam,
    Duplicate,
    ExcessiveCaps,
    UnauthorizedLink,
    DiscordInvite,
    Profanity,
    PhoneNumber,
    Address,
}

impl Reason {
    /// The category name used in a "generic community notice" (§4.5) — never
    /// names the user, only categorises.
    pub fn notice_category(&self) -> &'static str {
        match self {
            Reason::Spam => "Spam",
            Reason::Duplicate => "Duplicate",
            Reason::ExcessiveCaps => "Caps",
            Reason::UnauthorizedLink => "Unauthorized Links",
            Reason::DiscordInvite => "Invite Sharing",
            Reason::Profanity => "Inappropriate Content",
            Reason::PhoneNumber => "Guidelines",
            Reason::Address => "Guidelines",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Delete(Reason),
    Warn(Reason),
}

struct CachedPattern {
    regex: Option<Regex>,
    compiled_at: Instant,
}

pub struct AutomodConfig {
    pub spam_threshold: usize,
    pub duplicate_threshold: usize,
    pub caps_threshold_pct: f64,
    pub link_filter: bool,
    pub invite_filter: bool,
    pub cache_ttl_secs: u64,
}

/// Regex-backed content filter with a 15-minute (configurable) TTL compile
/// cache and a whitelist bypass. The whitelist is read-through/write-through
/// against `automod_whitelist` the same way `ChannelRegistry`/`BanStore`
/// cache their stores: loaded once at construction, refreshed on every write.
pub struct AutomodPipeline {
    db: Arc<crate::db::Db>,
    config: AutomodConfig,
    regex_cache: DashMap<String, CachedPattern>,
    whitelist_users: DashMap<String, ()>,
    whitelist_roles: DashMap<String, ()>,
    recent_messages: Mutex<std::collections::HashMap<String, Vec<Instant>>>,
    recent_duplicates: Mutex<std::collections::HashMap<String, Vec<Instant>>>,
}

impl AutomodPipeline {
    pub fn new(db: Arc<crate::db::Db>, config: AutomodConfig) -> Arc<Self> {
        let pipeline = Arc::new(Self {
            db,
            config,
            regex_cache: DashMap::new(),
            whitelist_users: DashMap::new(),
            whitelist_roles: DashMap::new(),
            recent_messages: Mutex::new(std::collections::HashMap::new()),
            recent_duplicates: Mutex::new(std::collections::HashMap::new()),
        });
        pipeline.load_whitelist().ok();
        pipeline
    }

    fn load_whitelist(&self) -> RelayResult<()> {
        let conn = self.db.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT kind, identifier FROM automod_whitelist")?;
        let rows: Vec<(String, String)> =
            stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?.collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        for (kind, identifier) in rows {
            match kind.as_str() {
                "user" => self.whitelist_users.insert(identifier, ()),
                "role" => self.whitelist_roles.insert(identifier, ()),
                _ => None,
            };
        }
        Ok(())
    }

    fn persist_whitelist_entry(&self, kind: &str, identifier: &str) -> RelayResult<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO automod_whitelist (kind, identifier, added_at, added_by)
             VALUES (?1, ?2, ?3, 'automod')
             ON CONFLICT(kind, identifier) DO NOTHING",
            params![kind, identifier, now],
        )?;
        Ok(())
    }

    /// Whitelist a user, persisting to `automod_whitelist` so the entry
    /// survives a process restart (§3 Automod Whitelist Entry).
    pub fn whitelist_user(&self, user_id: &str) -> RelayResult<()> {
        self.persist_whitelist_entry("user", user_id)?;
        self.whitelist_users.insert(user_id.to_string(), ());
        Ok(())
    }

    /// Whitelist a role, persisting to `automod_whitelist`.
    pub fn whitelist_role(&self, role_id: &str) -> RelayResult<()> {
        self.persist_whitelist_entry("role", role_id)?;
        self.whitelist_roles.insert(role_id.to_string(), ());
        Ok(())
    }

    pub fn is_whitelisted(&self, user_id: &str, role_ids: &[String]) -> bool {
        self.whitelist_users.contains_key(user_id)
            || role_ids.iter().any(|r| self.whitelist_roles.contains_key(r))
    }

    /// Invalidate every cached compiled pattern in `category` (§4.5: "any
    /// rule-set update invalidates all compiled patterns of the affected category").
    pub fn invalidate_category(&self, category: &str) {
        self.regex_cache.retain(|key, _| !key.starts_with(category));
    }

    fn cached_regex(&self, cache_key: &str, pattern: &str) -> Option<Regex> {
        if let Some(entry) = self.regex_cache.get(cache_key)
            && entry.compiled_at.elapsed() < Duration::from_secs(self.config.cache_ttl_secs)
        {
            return entry.regex.clone();
        }
        let compiled = Regex::new(&format!("(?i){pattern}")).ok();
        self.regex_cache.insert(
            cache_key.to_string(),
            CachedPattern { regex: compiled.clone(), compiled_at: Instant::now() },
        );
        compiled
    }

    fn matches_any(&self, content: &str, category: &str, patterns: &[&str]) -> bool {
        for (i, pattern) in patterns.iter().enumerate() {
            let key = format!("{category}:{i}");
            if let Some(re) = self.cached_regex(&key, pattern)
                && re.is_match(content)
            {
                return true;
            }
        }
        false
    }

    fn check_spam(&self, user_id: &str) -> Option<Reason> {
        let now = Instant::now();
        let mut map = self.recent_messages.lock().unwrap();
        let entry = map.entry(user_id.to_string()).or_default();
        entry.push(now);
        entry.retain(|t| now.duration_since(*t) < Duration::from_secs(10));
        if entry.len() > self.config.spam_threshold {
            Some(Reason::Spam)
        } else {
            None
        }
    }

    fn check_duplicate(&self, user_id: &str, content_lower: &str) -> Option<Reason> {
        if content_lower.is_empty() {
            return None;
        }
        let key = format!("{user_id}:{content_lower}");
        let now = Instant::now();
        let mut map = self.recent_duplicates.lock().unwrap();
        let entry = map.entry(key).or_default();
        entry.push(now);
        entry.retain(|t| now.duration_since(*t) < Duration::from_secs(60));
        if entry.len() >= self.config.duplicate_threshold {
            Some(Reason::Duplicate)
        } else {
            None
        }
    }

    fn check_caps(content: &str, threshold_pct: f64) -> Option<Reason> {
        if content.chars().count() < 10 {
            return None;
        }
        let total = content.chars().count() as f64;
        let upper = content.chars().filter(|c| c.is_uppercase()).count() as f64;
        if (upper / total) * 100.0 > threshold_pct {
            Some(Reason::ExcessiveCaps)
        } else {
            None
        }
    }

    /// Run the 9-step short-circuiting pipeline (§4.5). `role_ids` is the
    /// author's role set, checked against the whitelist.
    pub fn evaluate(&self, user_id: &str, content: &str, role_ids: &[String]) -> Verdict {
        if self.is_whitelisted(user_id, role_ids) {
            return Verdict::Allow;
        }

        if self.check_spam(user_id).is_some() {
            debug!(user_id, "automod: spam");
            return Verdict::Delete(Reason::Spam);
        }

        let lower = content.to_lowercase();
        if self.check_duplicate(user_id, &lower).is_some() {
            debug!(user_id, "automod: duplicate");
            return Verdict::Delete(Reason::Duplicate);
        }

        if let Some(reason) = Self::check_caps(content, self.config.caps_threshold_pct) {
            debug!(user_id, "automod: excessive caps");
            return Verdict::Delete(reason);
        }

        if self.config.link_filter && self.matches_any(&lower, "link", LINK_PATTERNS) {
            debug!(user_id, "automod: unauthorized link");
            return Verdict::Delete(Reason::UnauthorizedLink);
        }

        if self.config.invite_filter && self.matches_any(&lower, "invite", INVITE_PATTERNS) {
            debug!(user_id, "automod: discord invite");
            return Verdict::Delete(Reason::DiscordInvite);
        }

        if self.matches_any(&lower, "profanity", PROFANITY_PATTERNS) {
            debug!(user_id, "automod: profanity");
            return Verdict::Delete(Reason::Profanity);
        }

        if self.matches_any(&lower, "phone", PHONE_PATTERNS) {
            debug!(user_id, "automod: phone number");
            return Verdict::Delete(Reason::PhoneNumber);
        }

        if self.matches_any(&lower, "address", ADDRESS_PATTERNS) {
            debug!(user_id, "automod: address");
            return Verdict::Delete(Reason::Address);
        }

        Verdict::Allow
    }
}

const LINK_PATTERNS: &[&str] = &[
    r"http[s]?://(?:[a-zA-Z]|[0-9]|[$\-_@.&+]|[!*\\(\\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+",
    r"www\.(?:[a-zA-Z]|[0-9]|[$\-_@.&+]|[!*\\(\\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+",
];

const INVITE_PATTERNS: &[&str] = &[
    r"discord\.gg[\\/][a-zA-Z0-9]+",
    r"discordapp\.com/invite[\\/][a-zA-Z0-9]+",
    r"discord\.com/invite[\\/][a-zA-Z0-9]+",
];

const PHONE_PATTERNS: &[&str] = &[
    r"\b\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b",
    r"\(\d{3}\)\s?\d{3}[-.\s]?\d{4}",
    r"\+\d{1,3}[-.\s]?\d{3,4}[-.\s]?\d{3,4}[-.\s]?\d{3,4}",
    r"\b\d{10,15}\b",
    r"\d{3}\s?\d{3}\s?\d{4}",
    r"\b1[-.\s]?\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b",
];

const ADDRESS_PATTERNS: &[&str] = &[
    r"\b\d+\s+[A-Za-z\s]+(street|st|avenue|ave|road|rd|drive|dr|lane|ln|boulevard|blvd|court|ct|place|pl|way|circle|cir)\b",
    r"\b\d+\s+[A-Za-z\s]+(street|st|avenue|ave|road|rd|drive|dr|lane|ln|boulevard|blvd|court|ct|place|pl|way|circle|cir)\s*#?\d*\b",
    r"\b(apt|apartment|unit|suite|ste)\s*#?\d+\b",
    r"\b#\d+\b",
    r"\b\d{5}(-\d{4})?\b",
    r"\b[A-Za-z\s]+,\s*[A-Z]{2}\s*\d{5}\b",
    r"\b(po|p\.o\.)\s*box\s*\d+\b",
    r"\b(live\s+at|address\s+is|my\s+house|home\s+address)\s+\d+\b",
    r"\b\d+\s+(main|north|south|east|west|n|s|e|w)\s+[A-Za-z\s]+(street|st|avenue|ave|road|rd)\b",
];

/// Leetspeak-tolerant profanity patterns, ported verbatim from the upstream
/// self-hosted moderation manager's `profanity_patterns` list.
const PROFANITY_PATTERNS: &[&str] = &[
    r"^[a@][s\$][s\$]$",
    r"[a@][s\$][s\$]h[o0][l1][e3][s\$]?",
    r"b[a@][s\$][t\+][a@]rd",
    r"b[e3][a@][s\$][t\+][i1][a@]?[l1]([i1][t\+]y)?",
    r"b[e3][a@][s\$][t\+][i1][l1][i1][t\+]y",
    r"b[e3][s\$][t\+][i1][a@][l1]([i1][t\+]y)?",
    r"b[i1][t\+]ch[s\$]?",
    r"b[i1][t\+]ch[e3]r[s\$]?",
    r"b[i1][t\+]ch[e3][s\$]",
    r"b[i1][t\+]ch[i1]ng?",
    r"b[l1][o0]wj[o0]b[s\$]?",
    r"c[l1][i1][t\+]",
    r"^(c|k|ck|q)[o0](c|k|ck|q)[s\$]?$",
    r"(c|k|ck|q)[o0](c|k|ck|q)[s\$]u",
    r"(c|k|ck|q)[o0](c|k|ck|q)[s\$]u(c|k|ck|q)[e3]d",
    r"(c|k|ck|q)[o0](c|k|ck|q)[s\$]u(c|k|ck|q)[e3]r",
    r"(c|k|ck|q)[o0](c|k|ck|q)[s\$]u(c|k|ck|q)[i1]ng",
    r"(c|k|ck|q)[o0](c|k|ck|q)[s\$]u(c|k|ck|q)[s\$]",
    r"^cum[s\$]?$",
    r"cumm??[e3]r",
    r"cumm?[i1]ngcock",
    r"(c|k|ck|q)um[s\$]h[o0][t\+]",
    r"(c|k|ck|q)un[i1][l1][i1]ngu[s\$]",
    r"(c|k|ck|q)un[i1][l1][l1][i1]ngu[s\$]",
    r"(c|k|ck|q)unn[i1][l1][i1]ngu[s\$]",
    r"(c|k|ck|q)un[t\+][s\$]?",
    r"(c|k|ck|q)un[t\+][l1][i1](c|k|ck|q)",
    r"(c|k|ck|q)un[t\+][l1][i1](c|k|ck|q)[e3]r",
    r"(c|k|ck|q)un[t\+][l1][i1](c|k|ck|q)[i1]ng",
    r"cyb[e3]r(ph|f)u(c|k|ck|q)",
    r"d[a@]mn",
    r"d[i1]ck",
    r"d[i1][l1]d[o0]",
    r"d[i1][l1]d[o0][s\$]",
    r"d[i1]n(c|k|ck|q)",
    r"d[i1]n(c|k|ck|q)[s\$]",
    r"[e3]j[a@]cu[l1]",
    r"(ph|f)[a@]g[s\$]?",
    r"(ph|f)[a@]gg[i1]ng",
    r"(ph|f)[a@]gg?[o0][t\+][s\$]?",
    r"(ph|f)[a@]gg[s\$]",
    r"(ph|f)[e3][l1][l1]?[a@][t\+][i1][o0]",
    r"(ph|f)u(c|k|ck|q)",
    r"(ph|f)u(c|k|ck|q)[s\$]?",
    r"g[a@]ngb[a@]ng[s\$]?",
    r"g[a@]ngb[a@]ng[e3]d",
    r"g[a@]y",
    r"h[o0]m?m[o0]",
    r"h[o0]rny",
    r"j[a@](c|k|ck|q)\-?[o0](ph|f)(ph|f)?",
    r"j[e3]rk\-?[o0](ph|f)(ph|f)?",
    r"j[i1][s\$z][s\$z]?m?",
    r"[ck][o0]ndum[s\$]?",
    r"mast(e|ur)b(8|ait|ate)",
    r"n+[i1]+[gq]+[e3]*r+[s\$]*",
    r"[o0]rg[a@][s\$][i1]m[s\$]?",
    r"[o0]rg[a@][s\$]m[s\$]?",
    r"p[e3]nn?[i1][s\$]",
    r"p[i1][s\$][s\$]",
    r"p[i1][s\$][s\$][o0](ph|f)(ph|f)",
    r"p[o0]rn",
    r"p[o0]rn[o0][s\$]?",
    r"p[o0]rn[o0]gr[a@]phy",
    r"pr[i1]ck[s\$]?",
    r"pu[s\$][s\$][i1][e3][s\$]",
    r"pu[s\$][s\$]y[s\$]?",
    r"[s\$][e3]x",
    r"[s\$]h[i1][t\+][s\$]?",
    r"[s\$][l1]u[t\+][s\$]?",
    r"[s\$]mu[t\+][s\$]?",
    r"[s\$]punk[s\$]?",
    r"[t\+]w[a@][t\+][s\$]?",
];
