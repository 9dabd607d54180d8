pub mod identity;
pub mod policy;

pub use identity::{AuthMode, Principal};
