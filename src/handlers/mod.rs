// handlers/mod.rs - HTTP entry points
//
// Every handler resolves an IdentityContext first (never rejecting the
// request), then hands off to the feedback service or the model client.
// CORS headers are attached per route in app::router.
pub mod conversation;
pub mod feedback;
pub mod health;
pub mod utils;

pub use conversation::conversation;
pub use feedback::{read_feedback, review_feedback, submit_feedback};
pub use health::health;
