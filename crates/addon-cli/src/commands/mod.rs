//! Command implementations for addon-cli

pub mod get;
pub mod list;
pub mod remove;
pub mod search;

pub use get::run_get;
pub use list::{run_list, run_list_installed};
pub use remove::run_remove;
pub use search::run_search;

/// Provider topic every add-on repository carries.
pub const ADDON_TOPIC: &str = "ddev-get";

/// Organization publishing the officially maintained add-ons.
pub const OFFICIAL_ORG: &str = "ddev";
