pub mod currency;
pub mod listing;
pub mod location;
pub mod moderation;
pub mod submission;

pub use crate::domain::model::{EntryId, Listing, ListingQuery, NewEntry};
pub use crate::domain::ports::{ConfigProvider, PreferenceStore, PriceApi};
pub use crate::utils::error::Result;
