use crate::domain::model::{
    Category, Conversion, ConversionRequest, Country, Currency, EntryId, HealthStatus, Listing,
    ListingQuery, Location, NewEntry,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Local key/value persistence for user preferences (selected currency, cached location).
pub trait PreferenceStore: Send + Sync {
    fn read(&self, key: &str) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;
    fn write(&self, key: &str, data: &[u8]) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn auth_token(&self) -> Option<&str>;
    fn page_size(&self) -> usize;
    fn data_dir(&self) -> &Path;
}

/// The remote marketplace API.
#[async_trait]
pub trait PriceApi: Send + Sync {
    async fn list_entries(&self, query: &ListingQuery) -> Result<Vec<Listing>>;
    async fn get_entry(&self, id: &EntryId) -> Result<Listing>;
    async fn create_entry(&self, entry: &NewEntry) -> Result<Listing>;
    async fn update_entry(&self, id: &EntryId, entry: &NewEntry) -> Result<Listing>;
    async fn delete_entry(&self, id: &EntryId) -> Result<()>;

    async fn pending_entries(&self) -> Result<Vec<Listing>>;
    async fn approve_entry(&self, id: &EntryId) -> Result<()>;
    /// Rejection removes the submission; there is no separate reject endpoint.
    async fn reject_entry(&self, id: &EntryId) -> Result<()> {
        self.delete_entry(id).await
    }

    async fn categories(&self) -> Result<Vec<Category>>;
    async fn create_category(&self, name: &str) -> Result<Category>;
    async fn currencies(&self) -> Result<Vec<Currency>>;
    async fn convert_currency(&self, request: &ConversionRequest) -> Result<Conversion>;
    async fn location(&self) -> Result<Location>;
    async fn countries(&self) -> Result<Vec<Country>>;
    async fn health(&self) -> Result<HealthStatus>;
}
