use std::collections::HashMap;
use std::sync::Mutex;

use rig::completion::Message;

#[derive(Default)]
struct Thread {
    messages: Vec<Message>,
    turns: usize,
}

/// In-process conversation checkpoints, one history per thread id.
///
/// Nothing is written to disk; history lasts as long as the process.
#[derive(Default)]
pub struct ConversationMemory {
    threads: Mutex<HashMap<String, Thread>>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prior messages of `thread_id`, oldest first, tool exchanges included.
    pub fn history(&self, thread_id: &str) -> Vec<Message> {
        self.lock()
            .get(thread_id)
            .map(|t| t.messages.clone())
            .unwrap_or_default()
    }

    /// Record one completed turn: every message from the user's prompt to the final answer.
    pub fn append_exchange(&self, thread_id: &str, exchange: Vec<Message>) {
        let mut threads = self.lock();
        let thread = threads.entry(thread_id.to_string()).or_default();
        thread.messages.extend(exchange);
        thread.turns += 1;
    }

    pub fn turns(&self, thread_id: &str) -> usize {
        self.lock().get(thread_id).map_or(0, |t| t.turns)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Thread>> {
        // A poisoned lock only means another caller panicked mid-push; the map is still usable.
        self.threads.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub fn user_message(content: &str) -> Message {
    Message {
        role: "user".to_string(),
        content: content.to_string(),
    }
}

pub fn assistant_message(content: &str) -> Message {
    Message {
        role: "assistant".to_string(),
        content: content.to_string(),
    }
}
