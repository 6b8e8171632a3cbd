pub mod storage;
pub mod store;
pub mod types;

pub use storage::{DurableStorage, FileStorage, MemoryStorage};
pub use store::{ListingStore, DEFAULT_STORAGE_KEY};
pub use types::{Gig, GigForm};
