//! Shared constants and URL helpers.

pub mod constants;
pub mod url_utils;

pub use constants::CHROME_USER_AGENT;
pub use url_utils::{domain_of, join_path, same_domain};
