pub mod manager;
pub mod memory;
pub mod models;
pub mod repository;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::InMemoryFeedbackStore;
pub use repository::FeedbackRepository;
pub use store::{FeedbackStore, StoreError};
