pub mod env;
pub mod slug;
