use crate::domain::model::{EntryType, Listing, ListingQuery, SortKey};
use crate::domain::ports::PriceApi;
use crate::utils::error::Result;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_MIN_PRICE: f64 = 0.0;
pub const DEFAULT_MAX_PRICE: f64 = 1000.0;

/// Filter set of the browse view. Empty strings mean "all".
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFilters {
    pub entry_type: Option<EntryType>,
    pub category: String,
    pub country: String,
    pub city: String,
    pub min_price: f64,
    pub max_price: f64,
    pub sort: SortKey,
}

impl Default for ListingFilters {
    fn default() -> Self {
        Self {
            entry_type: None,
            category: String::new(),
            country: String::new(),
            city: String::new(),
            min_price: DEFAULT_MIN_PRICE,
            max_price: DEFAULT_MAX_PRICE,
            sort: SortKey::Newest,
        }
    }
}

impl ListingFilters {
    pub fn has_active_filters(&self) -> bool {
        *self != Self::default()
    }

    /// Swaps an inverted price range back into order.
    pub fn normalized(mut self) -> Self {
        if self.min_price > self.max_price {
            std::mem::swap(&mut self.min_price, &mut self.max_price);
        }
        self
    }

    /// Short labels for the filters that differ from their defaults.
    pub fn active_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        if let Some(entry_type) = self.entry_type {
            labels.push(format!("type: {}", entry_type));
        }
        for (name, value) in [
            ("category", &self.category),
            ("country", &self.country),
            ("city", &self.city),
        ] {
            if !value.trim().is_empty() {
                labels.push(format!("{}: {}", name, value.trim()));
            }
        }
        if self.min_price != DEFAULT_MIN_PRICE || self.max_price != DEFAULT_MAX_PRICE {
            labels.push(format!("price: {}-{}", self.min_price, self.max_price));
        }
        if self.sort != SortKey::Newest {
            labels.push(format!("sort: {}", self.sort.as_str()));
        }
        labels
    }

    fn non_empty(value: &str) -> Option<String> {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Idle,
    Loading,
    LoadingMore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// Search or filter change: the page replaces everything loaded so far.
    Replace,
    /// "Load more": the page is appended.
    Append,
}

/// Ticket for one in-flight page fetch. Hand it back to [`ListingFeed::complete`].
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    generation: u64,
    mode: PageMode,
    query: ListingQuery,
}

impl PageRequest {
    pub fn query(&self) -> &ListingQuery {
        &self.query
    }

    pub fn mode(&self) -> PageMode {
        self.mode
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Applied { received: usize },
    /// A newer search/filter request superseded this one; the page was dropped.
    Stale,
    Failed,
}

/// State of the browse view: search term, filters, loaded listings and paging offset.
#[derive(Debug, Clone)]
pub struct ListingFeed {
    page_size: usize,
    currency: Option<String>,
    search: String,
    filters: ListingFilters,
    listings: Vec<Listing>,
    offset: usize,
    has_more: bool,
    error: Option<String>,
    phase: FeedPhase,
    generation: u64,
}

impl Default for ListingFeed {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ListingFeed {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            currency: None,
            search: String::new(),
            filters: ListingFilters::default(),
            listings: Vec::new(),
            offset: 0,
            has_more: true,
            error: None,
            phase: FeedPhase::Idle,
            generation: 0,
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Initial search and filters, applied by the next refresh.
    pub fn with_criteria(mut self, search: &str, filters: ListingFilters) -> Self {
        self.search = search.trim().to_string();
        self.filters = filters.normalized();
        self
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filters(&self) -> &ListingFilters {
        &self.filters
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    fn query_at(&self, offset: usize) -> ListingQuery {
        let filters = &self.filters;
        ListingQuery {
            limit: self.page_size,
            offset,
            currency: self.currency.clone(),
            search: ListingFilters::non_empty(&self.search),
            entry_type: filters.entry_type,
            category: ListingFilters::non_empty(&filters.category),
            country: ListingFilters::non_empty(&filters.country),
            city: ListingFilters::non_empty(&filters.city),
            min_price: (filters.min_price != DEFAULT_MIN_PRICE).then_some(filters.min_price),
            max_price: (filters.max_price != DEFAULT_MAX_PRICE).then_some(filters.max_price),
            sort: (filters.sort != SortKey::Newest).then_some(filters.sort),
        }
    }

    /// Starts a fresh first page. Everything loaded so far is dropped and any
    /// request still in flight becomes stale.
    pub fn begin_refresh(&mut self) -> PageRequest {
        self.generation += 1;
        self.listings.clear();
        self.offset = 0;
        self.error = None;
        self.phase = FeedPhase::Loading;

        PageRequest {
            generation: self.generation,
            mode: PageMode::Replace,
            query: self.query_at(0),
        }
    }

    pub fn begin_search(&mut self, term: &str) -> PageRequest {
        self.search = term.trim().to_string();
        self.begin_refresh()
    }

    pub fn begin_filters(&mut self, filters: ListingFilters) -> PageRequest {
        self.filters = filters.normalized();
        self.begin_refresh()
    }

    pub fn begin_clear_filters(&mut self) -> PageRequest {
        self.begin_filters(ListingFilters::default())
    }

    /// Prices are requested in this currency from now on; reloads the first page.
    pub fn begin_currency_change(&mut self, currency: impl Into<String>) -> PageRequest {
        self.currency = Some(currency.into());
        self.begin_refresh()
    }

    /// `None` when there is nothing more to load or a page is already on its way.
    pub fn begin_load_more(&mut self) -> Option<PageRequest> {
        if !self.has_more || self.phase != FeedPhase::Idle {
            return None;
        }
        self.phase = FeedPhase::LoadingMore;

        Some(PageRequest {
            generation: self.generation,
            mode: PageMode::Append,
            query: self.query_at(self.offset),
        })
    }

    pub fn complete(&mut self, request: PageRequest, result: Result<Vec<Listing>>) -> PageOutcome {
        if request.generation != self.generation {
            tracing::debug!(
                "🔶 Dropping stale page (generation {} < {})",
                request.generation,
                self.generation
            );
            return PageOutcome::Stale;
        }
        self.phase = FeedPhase::Idle;

        match result {
            Ok(page) => {
                let received = page.len();
                match request.mode {
                    PageMode::Replace => {
                        self.listings = page;
                        self.offset = received;
                    }
                    PageMode::Append => {
                        self.listings.extend(page);
                        self.offset += received;
                    }
                }
                // 只能從頁面是否裝滿來推測還有沒有下一頁
                self.has_more = received == self.page_size;
                tracing::debug!(
                    "📥 Page applied: {} received, offset now {}, has_more={}",
                    received,
                    self.offset,
                    self.has_more
                );
                PageOutcome::Applied { received }
            }
            Err(e) => {
                tracing::error!("❌ Error fetching entries: {}", e);
                self.error = Some(e.user_friendly_message());
                PageOutcome::Failed
            }
        }
    }

    async fn run<A: PriceApi + ?Sized>(&mut self, api: &A, request: PageRequest) -> PageOutcome {
        let result = api.list_entries(request.query()).await;
        self.complete(request, result)
    }

    pub async fn refresh<A: PriceApi + ?Sized>(&mut self, api: &A) -> PageOutcome {
        let request = self.begin_refresh();
        self.run(api, request).await
    }

    pub async fn retry<A: PriceApi + ?Sized>(&mut self, api: &A) -> PageOutcome {
        self.refresh(api).await
    }

    pub async fn apply_search<A: PriceApi + ?Sized>(&mut self, api: &A, term: &str) -> PageOutcome {
        let request = self.begin_search(term);
        self.run(api, request).await
    }

    pub async fn apply_filters<A: PriceApi + ?Sized>(
        &mut self,
        api: &A,
        filters: ListingFilters,
    ) -> PageOutcome {
        let request = self.begin_filters(filters);
        self.run(api, request).await
    }

    pub async fn clear_filters<A: PriceApi + ?Sized>(&mut self, api: &A) -> PageOutcome {
        let request = self.begin_clear_filters();
        self.run(api, request).await
    }

    pub async fn load_more<A: PriceApi + ?Sized>(&mut self, api: &A) -> Option<PageOutcome> {
        let request = self.begin_load_more()?;
        Some(self.run(api, request).await)
    }
}
