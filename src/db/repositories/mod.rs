pub mod bookmark;
pub mod settings;
pub mod token;
pub mod user;
