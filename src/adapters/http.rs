use crate::domain::model::{
    ApiEnvelope, ApiErrorBody, Category, Conversion, ConversionRequest, Country, Currency,
    EntryId, HealthStatus, Listing, ListingQuery, Location, NewEntry,
};
use crate::domain::ports::{ConfigProvider, PriceApi};
use crate::utils::error::{PriceBoardError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5001/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// REST client for the marketplace API.
#[derive(Debug, Clone)]
pub struct HttpPriceApi {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpPriceApi {
    pub fn new(base_url: &str, timeout: Duration, auth_token: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: auth_token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(
            config.api_base_url(),
            config.request_timeout(),
            config.auth_token().map(str::to_string),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        tracing::debug!("📡 {} {}", method, url);

        let request = self.client.request(method, url);
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends the request and turns non-2xx responses into `ApiStatus` errors.
    async fn send(&self, request: RequestBuilder, path: &str) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::error!("❌ API error on {}: {}", path, e);
            PriceBoardError::HttpError(e)
        })?;

        let status = response.status();
        tracing::debug!("📡 {} -> {}", path, status);
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let server_message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.error.or(b.message))
            .filter(|m| !m.trim().is_empty());

        tracing::error!(
            "❌ API error on {}: {} {}",
            path,
            status.as_u16(),
            server_message.as_deref().unwrap_or(status.canonical_reason().unwrap_or(""))
        );
        Err(PriceBoardError::ApiStatus {
            status: status.as_u16(),
            server_message,
        })
    }

    async fn fetch_data<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<Option<T>> {
        let response = self.send(request, path).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        let envelope: ApiEnvelope<T> = serde_json::from_slice(&bytes)?;
        Ok(envelope.data)
    }

    async fn require_data<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T> {
        self.fetch_data(request, path)
            .await?
            .ok_or_else(|| PriceBoardError::EmptyResponse {
                path: path.to_string(),
            })
    }

    async fn fetch_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let request = self.request(Method::GET, path);
        Ok(self.fetch_data(request, path).await?.unwrap_or_default())
    }
}

#[async_trait]
impl PriceApi for HttpPriceApi {
    async fn list_entries(&self, query: &ListingQuery) -> Result<Vec<Listing>> {
        let path = "/entries";
        let request = self.request(Method::GET, path).query(&query.to_pairs());
        let listings: Vec<Listing> = self.fetch_data(request, path).await?.unwrap_or_default();
        tracing::debug!(
            "📥 Fetched {} entries at offset {}",
            listings.len(),
            query.offset
        );
        Ok(listings)
    }

    async fn get_entry(&self, id: &EntryId) -> Result<Listing> {
        let path = format!("/entries/{}", id);
        let request = self.request(Method::GET, &path);
        self.require_data(request, &path).await
    }

    async fn create_entry(&self, entry: &NewEntry) -> Result<Listing> {
        let path = "/entries";
        let request = self.request(Method::POST, path).json(entry);
        self.require_data(request, path).await
    }

    async fn update_entry(&self, id: &EntryId, entry: &NewEntry) -> Result<Listing> {
        let path = format!("/entries/{}", id);
        let request = self.request(Method::PUT, &path).json(entry);
        self.require_data(request, &path).await
    }

    async fn delete_entry(&self, id: &EntryId) -> Result<()> {
        let path = format!("/entries/{}", id);
        self.send(self.request(Method::DELETE, &path), &path).await?;
        Ok(())
    }

    async fn pending_entries(&self) -> Result<Vec<Listing>> {
        self.fetch_list("/admin/entries/pending").await
    }

    async fn approve_entry(&self, id: &EntryId) -> Result<()> {
        let path = format!("/admin/entries/{}/approve", id);
        self.send(self.request(Method::POST, &path), &path).await?;
        Ok(())
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        self.fetch_list("/categories").await
    }

    async fn create_category(&self, name: &str) -> Result<Category> {
        let path = "/categories";
        let request = self
            .request(Method::POST, path)
            .json(&serde_json::json!({ "name": name }));
        self.require_data(request, path).await
    }

    async fn currencies(&self) -> Result<Vec<Currency>> {
        self.fetch_list("/currencies").await
    }

    async fn convert_currency(&self, request: &ConversionRequest) -> Result<Conversion> {
        let path = "/currencies/convert";
        let builder = self.request(Method::POST, path).json(request);
        self.require_data(builder, path).await
    }

    async fn location(&self) -> Result<Location> {
        let path = "/location";
        self.require_data(self.request(Method::GET, path), path).await
    }

    async fn countries(&self) -> Result<Vec<Country>> {
        self.fetch_list("/countries").await
    }

    async fn health(&self) -> Result<HealthStatus> {
        let path = "/health";
        let response = self.send(self.request(Method::GET, path), path).await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining_trims_slashes() {
        let api = HttpPriceApi::new("http://localhost:5001/api/", DEFAULT_TIMEOUT, None).unwrap();
        assert_eq!(api.base_url(), "http://localhost:5001/api");
        assert_eq!(api.url("/entries"), "http://localhost:5001/api/entries");
        assert_eq!(api.url("entries/7"), "http://localhost:5001/api/entries/7");
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let api = HttpPriceApi::new(DEFAULT_API_URL, DEFAULT_TIMEOUT, Some("  ".to_string()))
            .unwrap();
        assert!(api.auth_token.is_none());
    }
}
