// Shared test harness: a temp-file-backed `Relay` plus an in-memory `Gateway`
// recorder. Adapted from the teacher's `TestClient` RAII temp-db cleanup
// idiom (tests/integration/common.rs in the original), generalized from a
// Rocket `Client` wrapper to a `Relay` wrapper since there's no HTTP client
// to dispatch through anymore.

use async_trait::async_trait;
use crosschat::config::Config;
use crosschat::embed::RenderedEmbed;
use crosschat::gateway::{Gateway, ReactionKind};
use crosschat::models::{Attachment, IngressMessage};
use crosschat::Relay;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct SentEmbed {
    pub channel_id: String,
    pub description: String,
    pub footer: String,
}

#[derive(Default)]
struct Recorded {
    sent: Vec<SentEmbed>,
    edited: Vec<(String, String, String)>, // channel, message_id, new_description
    deleted: Vec<(String, String)>,
    reactions: Vec<(String, String, ReactionKind)>,
    dms: Vec<(String, String)>,
    next_message_id: u64,
}

/// Records every outbound call instead of touching a real chat platform.
pub struct MockGateway {
    state: Mutex<Recorded>,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { state: Mutex::new(Recorded::default()) })
    }

    pub fn sent(&self) -> Vec<SentEmbed> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn edited(&self) -> Vec<(String, String, String)> {
        self.state.lock().unwrap().edited.clone()
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn reactions_for(&self, message_id: &str) -> Vec<ReactionKind> {
        self.state
            .lock()
            .unwrap()
            .reactions
            .iter()
            .filter(|(_, m, _)| m == message_id)
            .map(|(_, _, k)| *k)
            .collect()
    }

    pub fn dms(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().dms.clone()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn send_embed(
        &self,
        channel_id: &str,
        embed: &RenderedEmbed,
        _attachments: &[Attachment],
    ) -> Result<String, String> {
        let mut state = self.state.lock().unwrap();
        state.next_message_id += 1;
        let id = format!("m{}", state.next_message_id);
        state.sent.push(SentEmbed {
            channel_id: channel_id.to_string(),
            description: embed.description.clone(),
            footer: embed.footer.clone(),
        });
        Ok(id)
    }

    async fn edit_embed(&self, channel_id: &str, message_id: &str, embed: &RenderedEmbed) -> Result<(), String> {
        self.state
            .lock()
            .unwrap()
            .edited
            .push((channel_id.to_string(), message_id.to_string(), embed.description.clone()));
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), String> {
        self.state.lock().unwrap().deleted.push((channel_id.to_string(), message_id.to_string()));
        Ok(())
    }

    async fn react(&self, channel_id: &str, message_id: &str, kind: ReactionKind) -> Result<(), String> {
        self.state
            .lock()
            .unwrap()
            .reactions
            .push((channel_id.to_string(), message_id.to_string(), kind));
        Ok(())
    }

    async fn clear_reaction(&self, _channel_id: &str, _message_id: &str, _kind: ReactionKind) -> Result<(), String> {
        Ok(())
    }

    async fn delete_source(&self, channel_id: &str, message_id: &str) -> Result<(), String> {
        self.state.lock().unwrap().deleted.push((channel_id.to_string(), message_id.to_string()));
        Ok(())
    }

    async fn dm_user(&self, user_id: &str, content: &str) -> Result<(), String> {
        self.state.lock().unwrap().dms.push((user_id.to_string(), content.to_string()));
        Ok(())
    }
}

/// Wraps a `Relay` backed by a temp directory holding the SQLite file (and
/// its WAL/SHM siblings); the whole directory is removed on drop, the same
/// cleanup intent as the teacher's `TestClient::drop`, generalized from a
/// manually-named `/tmp` file to a `tempfile::TempDir`.
pub struct TestRelay {
    pub relay: Relay,
    pub gateway: Arc<MockGateway>,
    pub store_path: String,
    _dir: tempfile::TempDir,
}

impl std::ops::Deref for TestRelay {
    type Target = Relay;
    fn deref(&self) -> &Relay {
        &self.relay
    }
}

pub fn test_relay() -> TestRelay {
    test_relay_with(|_| {})
}

pub fn test_relay_with(configure: impl FnOnce(&mut Config)) -> TestRelay {
    let dir = tempfile::tempdir().expect("create temp dir for test db");
    let db_path = dir.path().join("crosschat.db").to_str().unwrap().to_string();
    let mut config = Config { store_path: db_path.clone(), ..Config::default() };
    configure(&mut config);

    let gateway = MockGateway::new();
    let relay = Relay::new(&config, gateway.clone());
    TestRelay { relay, gateway, store_path: db_path, _dir: dir }
}

/// Build a second, independent `Relay` (its own orchestrator, its own
/// per-channel locks) pointed at the same SQLite file as `t` — simulating a
/// second fleet replica sharing one store, so the allocator's
/// insert-and-catch-conflict path is what coordinates the two, not any
/// in-process lock.
pub fn second_replica(t: &TestRelay) -> (Relay, Arc<MockGateway>) {
    let config = Config { store_path: t.store_path.clone(), ..Config::default() };
    let gateway = MockGateway::new();
    let relay = Relay::new(&config, gateway.clone());
    (relay, gateway)
}

/// Build a minimal, valid ingress event for a given user/channel/content.
pub fn ingress(
    source_message_id: &str,
    user_id: &str,
    server_id: &str,
    channel_id: &str,
    content: &str,
) -> IngressMessage {
    IngressMessage {
        source_message_id: source_message_id.to_string(),
        source_user_id: user_id.to_string(),
        source_user_display_name: format!("user-{user_id}"),
        author_avatar_url: None,
        author_is_bot: false,
        in_server: true,
        source_server_id: server_id.to_string(),
        source_server_name: format!("server-{server_id}"),
        source_channel_id: channel_id.to_string(),
        source_channel_name: format!("chan-{channel_id}"),
        content: content.to_string(),
        author_role_ids: Vec::new(),
        attachments: Vec::new(),
        created_at: chrono::Utc::now().to_rfc3339(),
    }
}

pub fn role_ids(roles: &[&str]) -> Vec<String> {
    roles.iter().map(|r| r.to_string()).collect()
}
