pub mod cors;
pub mod identity;

pub use cors::with_cors;
pub use identity::IdentityContext;
