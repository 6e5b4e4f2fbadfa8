pub mod conformance;
mod error;
mod memory;
mod record;
mod traits;

pub use error::StorageError;
pub use memory::{MemoryStore, StoryTemplate};
pub use record::{
    CanProceedRecord, CompletionAck, CompletionSubmission, RemainingRequests, StoreOperation, TodayStatus,
};
pub use traits::StoryStore;
