pub mod site;
pub mod users;
