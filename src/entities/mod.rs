pub mod prelude;

pub mod api_tokens;
pub mod bookmarks;
pub mod system_settings;
pub mod users;
