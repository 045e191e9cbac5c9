use crate::domain::model::{EntryId, Listing};
use crate::domain::ports::PriceApi;
use crate::utils::error::{PriceBoardError, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Approve,
    Reject,
}

impl ModerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Reject => "rejected",
        }
    }
}

/// Counters for the current admin session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModerationStats {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

/// Pending submissions awaiting review, with at most one action in flight per entry.
#[derive(Debug, Clone, Default)]
pub struct ModerationQueue {
    pending: Vec<Listing>,
    in_flight: HashMap<EntryId, ModerationAction>,
    error: Option<String>,
    loading: bool,
    stats: ModerationStats,
}

impl ModerationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[Listing] {
        &self.pending
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn stats(&self) -> ModerationStats {
        ModerationStats {
            pending: self.pending.len(),
            ..self.stats
        }
    }

    pub fn action_for(&self, id: &EntryId) -> Option<ModerationAction> {
        self.in_flight.get(id).copied()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn set_pending(&mut self, result: Result<Vec<Listing>>) {
        self.loading = false;
        match result {
            Ok(entries) => {
                tracing::info!("🗂️ {} pending submission(s) to review", entries.len());
                self.pending = entries;
            }
            Err(e) => {
                tracing::error!("❌ Error fetching pending entries: {}", e);
                self.error = Some(e.user_friendly_message());
            }
        }
    }

    pub async fn load<A: PriceApi + ?Sized>(&mut self, api: &A) {
        self.loading = true;
        self.error = None;
        let result = api.pending_entries().await;
        self.set_pending(result);
    }

    /// Marks the entry busy. Fails if it is unknown or already has an action running.
    pub fn begin_action(&mut self, id: &EntryId, action: ModerationAction) -> Result<()> {
        if !self.pending.iter().any(|e| &e.id == id) {
            return Err(PriceBoardError::UnknownEntry { id: id.to_string() });
        }
        if self.in_flight.contains_key(id) {
            return Err(PriceBoardError::ActionInFlight { id: id.to_string() });
        }
        self.in_flight.insert(id.clone(), action);
        Ok(())
    }

    /// Applies the remote result: on success the entry leaves the pending list.
    pub fn finish_action(&mut self, id: &EntryId, result: Result<()>) -> Result<()> {
        let action = self.in_flight.remove(id);

        match result {
            Ok(()) => {
                self.pending.retain(|e| &e.id != id);
                match action {
                    Some(ModerationAction::Approve) => self.stats.approved += 1,
                    Some(ModerationAction::Reject) => self.stats.rejected += 1,
                    None => {}
                }
                tracing::info!(
                    "✅ Entry {} {}",
                    id,
                    action.map(|a| a.past_tense()).unwrap_or("processed")
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    "❌ Error trying to {} entry {}: {}",
                    action.map(|a| a.as_str()).unwrap_or("moderate"),
                    id,
                    e
                );
                self.error = Some(e.user_friendly_message());
                Err(e)
            }
        }
    }

    async fn run<A: PriceApi + ?Sized>(
        &mut self,
        api: &A,
        id: &EntryId,
        action: ModerationAction,
    ) -> Result<()> {
        self.begin_action(id, action)?;
        let result = match action {
            ModerationAction::Approve => api.approve_entry(id).await,
            ModerationAction::Reject => api.reject_entry(id).await,
        };
        self.finish_action(id, result)
    }

    pub async fn approve<A: PriceApi + ?Sized>(&mut self, api: &A, id: &EntryId) -> Result<()> {
        self.run(api, id, ModerationAction::Approve).await
    }

    pub async fn reject<A: PriceApi + ?Sized>(&mut self, api: &A, id: &EntryId) -> Result<()> {
        self.run(api, id, ModerationAction::Reject).await
    }
}
