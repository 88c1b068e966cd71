pub mod read;
pub mod review;
pub mod submit;

// Re-export handler functions for use in routing
pub use read::read_feedback;
pub use review::review_feedback;
pub use submit::submit_feedback;

use serde::{Deserialize, Serialize};

/// Success body shared by the write endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct FeedbackAck {
    pub message: String,
    pub feedback_id: String,
}
