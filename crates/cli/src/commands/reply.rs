use std::sync::Arc;

use valbot_core::domain::preference::UserId;
use valbot_store::InMemoryPreferenceStore;
use valbot_whatsapp::commands::CommandRouter;

use super::{CommandResult, TranscriptEntry};

pub const DEFAULT_SENDER: &str = "whatsapp:+10000000000";

/// Replays `messages` in order for one sender. The final reply is the
/// message; every exchange is kept in the transcript.
pub fn run(sender: &str, messages: &[String]) -> CommandResult {
    if messages.iter().all(|message| message.trim().is_empty()) {
        return CommandResult::failure(
            "reply",
            "usage",
            "provide a message or at least one --script line",
            2,
        );
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "reply",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let transcript = runtime.block_on(replay(sender, messages));
    let last = transcript.last().map(|entry| entry.reply.clone()).unwrap_or_default();

    if transcript.len() == 1 {
        return CommandResult::success("reply", last);
    }
    CommandResult::with_transcript("reply", last, transcript)
}

async fn replay(sender: &str, messages: &[String]) -> Vec<TranscriptEntry> {
    let router = CommandRouter::new(Arc::new(InMemoryPreferenceStore::new()));
    let user_id = UserId::from(sender);

    let mut transcript = Vec::with_capacity(messages.len());
    for input in messages.iter().filter(|message| !message.trim().is_empty()) {
        let reply = router.reply(&user_id, input).await;
        transcript.push(TranscriptEntry { input: input.clone(), reply });
    }
    transcript
}
