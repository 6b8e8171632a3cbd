use super::types::ChatMessage;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;

/// Default number of entries the chat log keeps
pub const DEFAULT_HISTORY_LIMIT: usize = 11;

/// Rolling chat log shared between the controller and renderers
#[derive(Debug, Clone)]
pub struct ChatLog {
    messages: Arc<RwLock<VecDeque<ChatMessage>>>,
    limit: usize,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            messages: Arc::new(RwLock::new(VecDeque::with_capacity(limit))),
            limit,
        }
    }

    /// Append a message, dropping the oldest entries first so the log never
    /// exceeds its limit
    pub fn add(&self, message: ChatMessage) {
        let mut messages = self.messages.write();
        while messages.len() >= self.limit {
            messages.pop_front();
        }
        messages.push_back(message);
    }

    pub fn get_all(&self) -> Vec<ChatMessage> {
        self.messages.read().iter().cloned().collect()
    }

    /// The last `count` messages, oldest first
    pub fn recent(&self, count: usize) -> Vec<ChatMessage> {
        let messages = self.messages.read();
        let skip = messages.len().saturating_sub(count);
        messages.iter().skip(skip).cloned().collect()
    }

    pub fn last(&self) -> Option<ChatMessage> {
        self.messages.read().back().cloned()
    }

    pub fn clear(&self) {
        self.messages.write().clear();
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_bounded() {
        let log = ChatLog::new();
        for i in 0..30 {
            log.add(ChatMessage::bot(format!("msg {}", i)));
        }
        assert_eq!(log.len(), DEFAULT_HISTORY_LIMIT);
        assert_eq!(log.get_all()[0].text, "msg 19");
        assert_eq!(log.last().unwrap().text, "msg 29");
    }

    #[test]
    fn test_recent_returns_tail_in_order() {
        let log = ChatLog::new();
        for i in 0..10 {
            log.add(ChatMessage::user(format!("{}", i)));
        }
        let recent: Vec<String> = log.recent(8).into_iter().map(|m| m.text).collect();
        assert_eq!(recent, vec!["2", "3", "4", "5", "6", "7", "8", "9"]);
        assert_eq!(log.recent(50).len(), 10);
    }

    #[test]
    fn test_clones_share_messages() {
        let log = ChatLog::with_limit(3);
        let reader = log.clone();
        log.add(ChatMessage::bot("hi"));
        assert_eq!(reader.len(), 1);
        assert!(reader.last().unwrap().is_bot());
    }

    #[test]
    fn test_time_label_format() {
        let msg = ChatMessage::bot("x");
        let label = msg.time_label();
        assert_eq!(label.len(), 8);
        assert_eq!(label.matches(':').count(), 2);
    }
}
