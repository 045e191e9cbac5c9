pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use app::App;
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{FilePreferenceStore, HttpPriceApi, MemoryPreferenceStore};
pub use config::Settings;
pub use core::listing::{ListingFeed, ListingFilters};
pub use core::moderation::ModerationQueue;
pub use core::submission::SubmissionForm;
pub use utils::error::{PriceBoardError, Result};
