//! Decides whether an inbound message gets an AI reply.
//!
//! Evaluation order, first match wins:
//! 1. authored by the bot itself -> ignore
//! 2. legacy prefix command -> handled by the caller, routing continues
//! 3. bot mentioned -> reply
//! 4. channel is active -> reply
//! 5. otherwise ignore

use std::sync::Arc;

use crate::ai::Completer;
use crate::channels::ActivationStore;

/// Platform-neutral view of a message event
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub author_id: u64,
    pub author_display_name: String,
    pub content: String,
    pub channel_id: u64,
    pub mentions: Vec<u64>,
}

impl InboundMessage {
    pub fn mentions_user(&self, user_id: u64) -> bool {
        self.mentions.contains(&user_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyReason {
    Mention,
    ActiveChannel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Ignore,
    Reply(ReplyReason),
}

/// Whether `content` is a legacy text command for the given prefix.
/// Leading whitespace is ignored, matching `parse_legacy_command`.
pub fn is_legacy_command(content: &str, prefix: &str) -> bool {
    !prefix.is_empty()
        && content
            .trim_start()
            .strip_prefix(prefix)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_alphanumeric())
}

pub struct MessageRouter {
    store: Arc<ActivationStore>,
    completer: Arc<dyn Completer>,
}

impl MessageRouter {
    pub fn new(store: Arc<ActivationStore>, completer: Arc<dyn Completer>) -> Self {
        Self { store, completer }
    }

    /// Pure routing decision, no side effects
    pub fn decide(&self, message: &InboundMessage, bot_id: u64) -> RouteDecision {
        if message.author_id == bot_id {
            return RouteDecision::Ignore;
        }
        if message.mentions_user(bot_id) {
            return RouteDecision::Reply(ReplyReason::Mention);
        }
        if self.store.contains(message.channel_id) {
            return RouteDecision::Reply(ReplyReason::ActiveChannel);
        }
        RouteDecision::Ignore
    }

    /// Produce the reply for a message already routed to `Reply(reason)`.
    /// Does not consult the store again.
    pub async fn respond(&self, message: &InboundMessage, reason: ReplyReason) -> String {
        log::debug!(
            "[Router] Replying to {} in channel {} ({:?})",
            message.author_display_name,
            message.channel_id,
            reason
        );
        self.completer
            .complete(&message.content, &message.author_display_name)
            .await
    }

    /// Route a message and, if it qualifies, produce the reply text.
    /// The completer is called at most once per message.
    pub async fn handle(&self, message: &InboundMessage, bot_id: u64) -> Option<String> {
        match self.decide(message, bot_id) {
            RouteDecision::Ignore => None,
            RouteDecision::Reply(reason) => Some(self.respond(message, reason).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tempfile::tempdir;

    const BOT_ID: u64 = 999;

    /// Records every call and echoes the requester back
    #[derive(Default)]
    struct RecordingCompleter {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Completer for RecordingCompleter {
        async fn complete(&self, text: &str, requester_name: &str) -> String {
            self.calls
                .lock()
                .push((text.to_string(), requester_name.to_string()));
            format!("reply to {}", requester_name)
        }
    }

    fn message(author_id: u64, channel_id: u64, mentions: Vec<u64>) -> InboundMessage {
        InboundMessage {
            author_id,
            author_display_name: "Ada".to_string(),
            content: "hello".to_string(),
            channel_id,
            mentions,
        }
    }

    fn setup(active: &[u64]) -> (tempfile::TempDir, Arc<RecordingCompleter>, MessageRouter) {
        let dir = tempdir().unwrap();
        let store = Arc::new(ActivationStore::load(dir.path().join("active_channels.json")));
        for id in active {
            store.add(*id).unwrap();
        }
        let completer = Arc::new(RecordingCompleter::default());
        let router = MessageRouter::new(store, completer.clone());
        (dir, completer, router)
    }

    #[test]
    fn test_legacy_command_detection() {
        assert!(is_legacy_command("!help", "!"));
        assert!(is_legacy_command("!channel list", "!"));
        assert!(!is_legacy_command("! hello", "!"));
        assert!(!is_legacy_command("!", "!"));
        assert!(!is_legacy_command("hello !help", "!"));
        assert!(!is_legacy_command("!help", ""));
        assert!(is_legacy_command("  !help", "!"));
        assert!(is_legacy_command("\t!channel list", "!"));
    }

    #[test]
    fn test_legacy_detection_agrees_with_parser() {
        for content in ["!help", "  !help", "\n!channel list", "! help", "hello", "!"] {
            assert_eq!(
                is_legacy_command(content, "!"),
                crate::commands::parse_legacy_command(content, "!").is_some(),
                "disagreement on {:?}",
                content
            );
        }
    }

    #[tokio::test]
    async fn test_self_authored_never_replies() {
        let (_dir, completer, router) = setup(&[100]);
        let msg = message(BOT_ID, 100, vec![BOT_ID]);

        assert_eq!(router.decide(&msg, BOT_ID), RouteDecision::Ignore);
        assert_eq!(router.handle(&msg, BOT_ID).await, None);
        assert!(completer.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_mention_takes_priority_over_active_channel() {
        let (_dir, completer, router) = setup(&[100]);
        let msg = message(1, 100, vec![BOT_ID]);

        assert_eq!(
            router.decide(&msg, BOT_ID),
            RouteDecision::Reply(ReplyReason::Mention)
        );
        assert!(router.handle(&msg, BOT_ID).await.is_some());
        assert_eq!(completer.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_active_channel_reply_uses_display_name() {
        let (_dir, completer, router) = setup(&[100]);
        let msg = message(1, 100, vec![]);

        assert_eq!(router.handle(&msg, BOT_ID).await, Some("reply to Ada".to_string()));
        let calls = completer.calls.lock();
        assert_eq!(calls.as_slice(), &[("hello".to_string(), "Ada".to_string())]);
    }

    #[tokio::test]
    async fn test_mention_in_inactive_channel_replies() {
        let (_dir, completer, router) = setup(&[]);
        let msg = message(1, 200, vec![42, BOT_ID]);

        assert!(router.handle(&msg, BOT_ID).await.is_some());
        assert_eq!(completer.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_no_match_ignored() {
        let (_dir, completer, router) = setup(&[100]);
        let msg = message(1, 200, vec![42]);

        assert_eq!(router.handle(&msg, BOT_ID).await, None);
        assert!(completer.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_respond_skips_store_lookup() {
        let (_dir, completer, router) = setup(&[100]);
        let msg = message(1, 100, vec![]);

        let RouteDecision::Reply(reason) = router.decide(&msg, BOT_ID) else {
            panic!("active channel should route to a reply");
        };
        // Deactivated after routing: the decision already made still stands.
        router.store.remove(100).unwrap();

        assert_eq!(router.respond(&msg, reason).await, "reply to Ada");
        assert_eq!(completer.calls.lock().len(), 1);
    }
}
