pub mod feedback;
pub mod user;

pub use feedback::FeedbackRow;
pub use user::DirectoryUser;
