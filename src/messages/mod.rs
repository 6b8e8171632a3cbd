pub mod storage;
pub mod types;

pub use storage::{ChatLog, DEFAULT_HISTORY_LIMIT};
pub use types::{ChatMessage, Sender};
