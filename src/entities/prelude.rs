pub use super::api_tokens::Entity as ApiTokens;
pub use super::bookmarks::Entity as Bookmarks;
pub use super::system_settings::Entity as SystemSettings;
pub use super::users::Entity as Users;
