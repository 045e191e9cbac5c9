use crate::app::render;
use crate::config::cli::{BrowseArgs, OutputFormat, SubmitArgs};
use crate::config::settings::Settings;
use crate::core::currency::CurrencyPreferences;
use crate::core::listing::{ListingFeed, PageOutcome};
use crate::core::location::{LocationResolver, LocationSource};
use crate::core::moderation::ModerationQueue;
use crate::core::submission::{FormField, SubmissionForm, SubmitOutcome};
use crate::domain::model::{ConversionRequest, Country, EntryId, Location};
use crate::domain::ports::{PreferenceStore, PriceApi};
use crate::utils::debounce::{next_settled_until, SEARCH_DEBOUNCE};
use crate::utils::error::{PriceBoardError, Result};
use crate::utils::format::{category_icon, country_flag, format_price};
use crate::utils::validation::{is_currency_code, validate_non_empty_string, Validate};
use chrono::Utc;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

/// Runs CLI commands against an API and a preference store.
pub struct App<A: PriceApi, S: PreferenceStore + Clone> {
    api: A,
    store: S,
    settings: Settings,
    currency_override: Option<String>,
}

impl<A: PriceApi, S: PreferenceStore + Clone> App<A, S> {
    pub fn new(api: A, store: S, settings: Settings) -> Self {
        Self {
            api,
            store,
            settings,
            currency_override: None,
        }
    }

    pub fn with_currency_override(mut self, currency: Option<String>) -> Self {
        self.currency_override = currency;
        self
    }

    fn preferences(&self) -> CurrencyPreferences<S> {
        CurrencyPreferences::new(self.store.clone()).with_default(&self.settings.default_currency)
    }

    /// `--currency` if given, else the saved selection, else the configured default.
    async fn display_currency(&self) -> String {
        if let Some(code) = &self.currency_override {
            return code.clone();
        }
        let mut preferences = self.preferences();
        preferences.restore_selection().await;
        preferences.selected().to_string()
    }

    async fn countries_for_flags(&self) -> Vec<Country> {
        self.api.countries().await.unwrap_or_else(|e| {
            tracing::warn!("🔶 Country list unavailable, flags disabled: {}", e);
            Vec::new()
        })
    }

    async fn fetch_first_page(&self, feed: &mut ListingFeed) -> Result<()> {
        let request = feed.begin_refresh();
        let page = self.api.list_entries(request.query()).await?;
        feed.complete(request, Ok(page));
        Ok(())
    }

    async fn fetch_next_page(&self, feed: &mut ListingFeed) -> Result<bool> {
        let Some(request) = feed.begin_load_more() else {
            return Ok(false);
        };
        let page = self.api.list_entries(request.query()).await?;
        Ok(matches!(feed.complete(request, Ok(page)), PageOutcome::Applied { .. }))
    }

    fn new_feed(&self, args: &BrowseArgs, currency: String) -> ListingFeed {
        ListingFeed::new(self.settings.page_size)
            .with_currency(currency)
            .with_criteria(args.search.as_deref().unwrap_or_default(), args.filters())
    }

    pub async fn browse<W: Write>(&self, args: &BrowseArgs, out: &mut W) -> Result<()> {
        args.validate()?;
        let currency = self.display_currency().await;
        let mut feed = self.new_feed(args, currency);

        self.fetch_first_page(&mut feed).await?;
        for _ in 1..args.pages {
            if !self.fetch_next_page(&mut feed).await? {
                break;
            }
        }

        match args.format {
            OutputFormat::Json => render::write_json(out, feed.listings()),
            OutputFormat::Csv => render::write_csv(out, feed.listings()),
            OutputFormat::Table => {
                let labels = feed.filters().active_labels();
                if feed.is_empty() {
                    writeln!(out, "No prices found.")?;
                    if feed.filters().has_active_filters() || !feed.search().is_empty() {
                        writeln!(out, "Try adjusting your search or filters.")?;
                    }
                    return Ok(());
                }
                let countries = self.countries_for_flags().await;
                render::write_cards(out, feed.listings(), &countries, Utc::now())?;
                writeln!(
                    out,
                    "{}",
                    render::feed_summary(feed.listings().len(), feed.has_more(), &labels)
                )?;
                Ok(())
            }
        }
    }

    /// Line-driven browse. Plain lines are search terms, debounced. Lines starting
    /// with `:` are commands (`:more`, `:retry`, `:clear`, `:currency XXX`, `:quit`)
    /// and run at once, after any search term typed before them.
    pub async fn watch<R, W>(&self, args: &BrowseArgs, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: Write,
    {
        args.validate()?;
        let currency = self.display_currency().await;
        let mut feed = self.new_feed(args, currency);
        let countries = self.countries_for_flags().await;

        let (tx, mut rx) = mpsc::channel::<String>(32);
        let reader = tokio::spawn(async move {
            let mut lines = input.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        feed.refresh(&self.api).await;
        self.show_feed(&feed, &countries, out)?;

        let is_command = |line: &String| line.trim_start().starts_with(':');
        while let Some(settled) =
            next_settled_until(&mut rx, SEARCH_DEBOUNCE, is_command).await
        {
            if let Some(term) = settled.last {
                let outcome = feed.apply_search(&self.api, &term).await;
                tracing::debug!("🔎 search '{}': {:?}", term.trim(), outcome);
                self.show_feed(&feed, &countries, out)?;
                feed.dismiss_error();
            }

            let Some(command) = settled.interrupt else {
                continue;
            };
            let outcome = match command.trim() {
                ":quit" | ":q" => break,
                ":more" => match feed.load_more(&self.api).await {
                    Some(outcome) => outcome,
                    None => {
                        writeln!(out, "Nothing more to load.")?;
                        continue;
                    }
                },
                ":retry" => feed.retry(&self.api).await,
                ":clear" => feed.clear_filters(&self.api).await,
                command if command.starts_with(":currency ") => {
                    let code = command
                        .trim_start_matches(":currency ")
                        .trim()
                        .to_ascii_uppercase();
                    if !is_currency_code(&code) {
                        writeln!(out, "'{}' is not a currency code.", code)?;
                        continue;
                    }
                    let request = feed.begin_currency_change(code);
                    let result = self.api.list_entries(request.query()).await;
                    feed.complete(request, result)
                }
                other => {
                    writeln!(
                        out,
                        "Unknown command '{}'. Try :more, :retry, :clear, :currency XXX or :quit.",
                        other
                    )?;
                    continue;
                }
            };
            tracing::debug!("🔎 {}: {:?}", command.trim(), outcome);
            self.show_feed(&feed, &countries, out)?;
            feed.dismiss_error();
        }

        reader.abort();
        Ok(())
    }

    fn show_feed<W: Write>(
        &self,
        feed: &ListingFeed,
        countries: &[Country],
        out: &mut W,
    ) -> Result<()> {
        if let Some(error) = feed.error() {
            writeln!(out, "❌ {} (type :retry to try again)", error)?;
            return Ok(());
        }
        if feed.is_empty() {
            writeln!(out, "No prices found.")?;
            return Ok(());
        }
        render::write_cards(out, feed.listings(), countries, Utc::now())?;
        writeln!(
            out,
            "{}",
            render::feed_summary(
                feed.listings().len(),
                feed.has_more(),
                &feed.filters().active_labels()
            )
        )?;
        Ok(())
    }

    pub async fn submit<W: Write>(&self, args: &SubmitArgs, out: &mut W) -> Result<()> {
        let mut preferences = self.preferences();
        preferences.load(&self.api).await;
        let selected = self
            .currency_override
            .clone()
            .unwrap_or_else(|| preferences.selected().to_string());

        let mut form = SubmissionForm::new(selected.clone());
        // 幣別清單載入失敗時只檢查格式
        if preferences.error().is_none() {
            let codes = preferences.currencies().iter().map(|c| c.code.clone());
            form = form.with_known_currencies(codes);
        }

        form.set_field(FormField::Name, &args.name);
        form.entry_type = args.entry_type;
        form.set_field(FormField::Category, &args.category);
        form.set_field(FormField::Price, &args.price);
        form.set_field(FormField::Vendor, &args.vendor);
        form.set_field(FormField::Country, args.country.as_deref().unwrap_or_default());
        form.set_field(FormField::City, args.city.as_deref().unwrap_or_default());
        form.set_field(FormField::Link, args.link.as_deref().unwrap_or_default());

        if form.country.trim().is_empty() || form.city.trim().is_empty() {
            let mut resolver = LocationResolver::new(self.store.clone());
            let (location, _) = resolver.resolve(&self.api).await;
            form.apply_location(&location, &selected);
        }

        match form.submit(&self.api).await {
            SubmitOutcome::Invalid(errors) => {
                writeln!(out, "Please fix the following:\n{}", render::field_errors(&errors))?;
                Err(PriceBoardError::validation(format!(
                    "{} field(s) need attention",
                    errors.len()
                )))
            }
            SubmitOutcome::Submitted {
                entry,
                redirect_after,
            } => {
                writeln!(out, "✅ Thanks! Your submission is pending review.")?;
                writeln!(out, "{}", render::listing_card(&entry, &[], Utc::now()))?;
                if !args.no_wait {
                    tokio::time::sleep(redirect_after).await;
                }
                Ok(())
            }
            SubmitOutcome::Failed { message } => Err(PriceBoardError::SubmissionFailed { message }),
        }
    }

    async fn load_queue(&self) -> Result<ModerationQueue> {
        if self.settings.auth_token.is_none() {
            tracing::warn!("🔶 No auth token configured; admin endpoints may refuse the request");
        }
        let mut queue = ModerationQueue::new();
        let entries = self.api.pending_entries().await?;
        queue.set_pending(Ok(entries));
        Ok(queue)
    }

    pub async fn pending<W: Write>(&self, out: &mut W) -> Result<()> {
        let queue = self.load_queue().await?;
        if queue.pending().is_empty() {
            writeln!(out, "No submissions waiting for review.")?;
        } else {
            render::write_cards(out, queue.pending(), &[], Utc::now())?;
        }
        writeln!(out, "{}", render::stats_line(&queue.stats()))?;
        Ok(())
    }

    pub async fn approve<W: Write>(&self, id: &str, out: &mut W) -> Result<()> {
        let mut queue = self.load_queue().await?;
        let id = EntryId::new(id);
        queue.approve(&self.api, &id).await?;
        writeln!(out, "✅ Entry {} approved", id)?;
        writeln!(out, "{}", render::stats_line(&queue.stats()))?;
        Ok(())
    }

    pub async fn reject<W: Write>(&self, id: &str, out: &mut W) -> Result<()> {
        let mut queue = self.load_queue().await?;
        let id = EntryId::new(id);
        queue.reject(&self.api, &id).await?;
        writeln!(out, "🗑️ Entry {} rejected", id)?;
        writeln!(out, "{}", render::stats_line(&queue.stats()))?;
        Ok(())
    }

    pub async fn show<W: Write>(&self, id: &str, out: &mut W) -> Result<()> {
        let entry = self.api.get_entry(&EntryId::new(id)).await?;
        let countries = self.countries_for_flags().await;
        writeln!(out, "{}", render::listing_card(&entry, &countries, Utc::now()))?;
        Ok(())
    }

    pub async fn categories<W: Write>(&self, add: Option<&str>, out: &mut W) -> Result<()> {
        if let Some(name) = add {
            let name = name.trim();
            validate_non_empty_string("category", name)?;
            let created = self.api.create_category(name).await?;
            writeln!(out, "✅ Category '{}' created (id {})", created.name, created.id)?;
            return Ok(());
        }
        for category in self.api.categories().await? {
            writeln!(out, "{} {}", category_icon(&category.name), category.name)?;
        }
        Ok(())
    }

    pub async fn countries<W: Write>(&self, out: &mut W) -> Result<()> {
        for country in self.api.countries().await? {
            writeln!(
                out,
                "{} {} ({})",
                country_flag(&country.code),
                country.name,
                country.code
            )?;
        }
        Ok(())
    }

    pub async fn currencies<W: Write>(&self, set: Option<&str>, out: &mut W) -> Result<()> {
        let mut preferences = self.preferences();
        preferences.load(&self.api).await;
        if let Some(error) = preferences.error() {
            writeln!(out, "🔶 {} (showing the built-in list)", error)?;
        }
        if let Some(code) = set {
            preferences.select(code).await?;
        }

        for currency in preferences.currencies() {
            writeln!(out, "{}", render::currency_line(currency, preferences.selected()))?;
        }
        Ok(())
    }

    /// Prints `amount` in both currencies. A failed conversion is an error, never
    /// the unconverted amount under the target symbol.
    pub async fn convert<W: Write>(
        &self,
        amount: f64,
        from: &str,
        to: Option<&str>,
        out: &mut W,
    ) -> Result<()> {
        let from = from.trim().to_ascii_uppercase();
        let to = match to {
            Some(code) => code.trim().to_ascii_uppercase(),
            None => self.display_currency().await,
        };

        let converted = if from == to {
            amount
        } else {
            let request = ConversionRequest {
                amount,
                from_currency: from.clone(),
                to_currency: to.clone(),
            };
            match self.api.convert_currency(&request).await {
                Ok(conversion) => conversion.converted_amount,
                Err(e) => {
                    writeln!(
                        out,
                        "{} = ? {} (conversion unavailable)",
                        format_price(amount, &from),
                        to
                    )?;
                    return Err(e);
                }
            }
        };

        writeln!(
            out,
            "{} = {}",
            format_price(amount, &from),
            format_price(converted, &to)
        )?;
        Ok(())
    }

    pub async fn location<W: Write>(&self, refresh: bool, out: &mut W) -> Result<()> {
        let mut resolver = LocationResolver::new(self.store.clone());
        let (location, source) = resolver.resolve_at(&self.api, Utc::now(), refresh).await;

        writeln!(out, "{}", render::location_line(&location))?;
        match source {
            LocationSource::Cache => writeln!(out, "(cached)")?,
            LocationSource::Remote => {}
            LocationSource::Fallback => writeln!(
                out,
                "🔶 {} (using the default location)",
                resolver.error().unwrap_or("Location unavailable")
            )?,
        }
        Ok(())
    }

    pub async fn set_location<W: Write>(&self, location: &Location, out: &mut W) -> Result<()> {
        let mut resolver = LocationResolver::new(self.store.clone());
        resolver.update_location(location).await?;
        writeln!(out, "📍 Location set to {}", render::location_line(location))?;
        Ok(())
    }

    pub async fn health<W: Write>(&self, out: &mut W) -> Result<()> {
        let health = self.api.health().await?;
        writeln!(out, "Status: {}", health.status.as_deref().unwrap_or("unknown"))?;
        if !health.details.is_empty() {
            render::write_json(out, &health.details)?;
        }
        Ok(())
    }
}
