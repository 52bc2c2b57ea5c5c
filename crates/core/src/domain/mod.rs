pub mod catalog;
pub mod conversation;
pub mod profile;
pub mod recommendation;
