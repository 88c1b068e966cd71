pub mod feedback;
pub mod model;
pub mod user_directory;

pub use feedback::{FeedbackError, FeedbackFilter, FeedbackListing, FeedbackService, RetrievalPlan};
pub use model::{AnthropicClient, ModelClient, ModelError};
pub use user_directory::{DirectoryError, NewUser, PgUserDirectory, UserDirectory};
