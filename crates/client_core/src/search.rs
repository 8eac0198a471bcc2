//! Debounced remote lookups for keyword and town pickers.
//!
//! Every query issued against a [`SearchSource`] takes a ticket. Only the
//! holder of the newest ticket may publish results; anything that finishes
//! after a newer query was issued is dropped, regardless of completion order.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use shared::domain::{Keyword, Town};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};

use crate::{
    api::CampaignApi,
    error::{ApiError, ApiResult},
};

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: i64,
    pub label: String,
}

pub trait SearchLabel {
    fn search_hit(&self) -> SearchHit;
}

impl SearchLabel for Keyword {
    fn search_hit(&self) -> SearchHit {
        SearchHit {
            id: self.id.0,
            label: self.keyword_text.clone(),
        }
    }
}

impl SearchLabel for Town {
    fn search_hit(&self) -> SearchHit {
        let label = match self.postal_code.as_deref() {
            Some(postal) if !postal.trim().is_empty() => format!("{} ({postal})", self.town_name),
            _ => self.town_name.clone(),
        };
        SearchHit {
            id: self.id.0,
            label,
        }
    }
}

pub fn project<T: SearchLabel>(items: &[T]) -> Vec<SearchHit> {
    items.iter().map(SearchLabel::search_hit).collect()
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn lookup(&self, query: &str) -> ApiResult<Vec<SearchHit>>;
}

pub struct KeywordLookup {
    api: Arc<dyn CampaignApi>,
}

impl KeywordLookup {
    pub fn new(api: Arc<dyn CampaignApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SearchProvider for KeywordLookup {
    async fn lookup(&self, query: &str) -> ApiResult<Vec<SearchHit>> {
        let keywords = self.api.search_keywords(query).await?;
        Ok(project(&keywords))
    }
}

pub struct TownLookup {
    api: Arc<dyn CampaignApi>,
}

impl TownLookup {
    pub fn new(api: Arc<dyn CampaignApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SearchProvider for TownLookup {
    async fn lookup(&self, query: &str) -> ApiResult<Vec<SearchHit>> {
        let towns = self.api.search_towns(query).await?;
        Ok(project(&towns))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Results(Vec<SearchHit>),
    /// A newer query was issued before this one could publish.
    Superseded,
    Failed(ApiError),
}

#[derive(Default)]
struct SearchState {
    latest_ticket: u64,
    query: String,
    pending: Option<JoinHandle<()>>,
}

pub struct SearchSource {
    provider: Arc<dyn SearchProvider>,
    debounce: Duration,
    state: Mutex<SearchState>,
    /// Latest issued ticket; a running lookup is dropped as soon as it moves.
    latest: watch::Sender<u64>,
    results: watch::Sender<Vec<SearchHit>>,
}

impl SearchSource {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        let (results, _) = watch::channel(Vec::new());
        let (latest, _) = watch::channel(0);
        Self {
            provider,
            debounce: DEFAULT_SEARCH_DEBOUNCE,
            state: Mutex::new(SearchState::default()),
            latest,
            results,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    fn state(&self) -> MutexGuard<'_, SearchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn issue(&self, query: &str) -> u64 {
        let mut state = self.state();
        state.latest_ticket += 1;
        state.query = query.to_string();
        self.latest.send_replace(state.latest_ticket);
        state.latest_ticket
    }

    /// Runs one debounced lookup and resolves once it has either published
    /// its results or lost to a newer query. Nothing is sent until the
    /// returned future is polled, and a lookup still in flight when a newer
    /// query is issued is dropped, so at most one request runs at a time.
    pub async fn search(&self, query: &str) -> SearchOutcome {
        let ticket = self.issue(query);
        self.run(ticket, query).await
    }

    /// Fire-and-forget variant for keystroke handlers. The previous pending
    /// lookup, if any, is aborted so at most one request is in flight.
    pub fn input(self: &Arc<Self>, query: impl Into<String>) {
        let query = query.into();
        let ticket = self.issue(&query);
        let source = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let _ = source.run(ticket, &query).await;
        });
        if let Some(previous) = self.state().pending.replace(handle) {
            previous.abort();
        }
    }

    /// Invalidates every outstanding lookup without issuing a new one.
    pub fn cancel(&self) {
        let mut state = self.state();
        state.latest_ticket += 1;
        self.latest.send_replace(state.latest_ticket);
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
    }

    async fn run(&self, ticket: u64, query: &str) -> SearchOutcome {
        let mut latest = self.latest.subscribe();
        let superseded = async move {
            let _ = latest.wait_for(|current| *current != ticket).await;
        };
        tokio::pin!(superseded);

        tokio::select! {
            _ = tokio::time::sleep(self.debounce) => {}
            _ = &mut superseded => {
                debug!(query, "search superseded during debounce");
                return SearchOutcome::Superseded;
            }
        }

        let result = tokio::select! {
            result = self.provider.lookup(query) => result,
            _ = &mut superseded => {
                debug!(query, "dropping superseded search request");
                return SearchOutcome::Superseded;
            }
        };

        let state = self.state();
        if state.latest_ticket != ticket {
            debug!(query, "discarding stale search response");
            return SearchOutcome::Superseded;
        }
        match result {
            Ok(hits) => {
                self.results.send_replace(hits.clone());
                SearchOutcome::Results(hits)
            }
            Err(err) => {
                warn!(query, error = %err, "search lookup failed");
                SearchOutcome::Failed(err)
            }
        }
    }

    pub fn results(&self) -> Vec<SearchHit> {
        self.results.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<SearchHit>> {
        self.results.subscribe()
    }

    pub fn current_query(&self) -> String {
        self.state().query.clone()
    }
}

type ChangeHandler = Box<dyn Fn(&BTreeSet<i64>) + Send + Sync>;

/// Value of a multi-select bound to a search source.
///
/// Ids may be selected before their labels are known (for example when an
/// existing campaign is opened before the keyword catalog arrives); those
/// stay pending until [`Selection::reconcile`] sees them.
#[derive(Default)]
pub struct Selection {
    value: BTreeSet<i64>,
    labels: BTreeMap<i64, String>,
    on_change: Option<ChangeHandler>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_change(mut self, handler: impl Fn(&BTreeSet<i64>) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Box::new(handler));
        self
    }

    pub fn value(&self) -> &BTreeSet<i64> {
        &self.value
    }

    /// Replaces the value from outside. Does not notify.
    pub fn set_value(&mut self, ids: impl IntoIterator<Item = i64>) {
        self.value = ids.into_iter().collect();
    }

    pub fn select(&mut self, hit: SearchHit) {
        self.labels.insert(hit.id, hit.label);
        if self.value.insert(hit.id) {
            self.notify();
        }
    }

    pub fn deselect(&mut self, id: i64) {
        if self.value.remove(&id) {
            self.notify();
        }
    }

    pub fn reconcile(&mut self, catalog: &[SearchHit]) {
        for hit in catalog {
            if self.value.contains(&hit.id) {
                self.labels.insert(hit.id, hit.label.clone());
            }
        }
    }

    pub fn label(&self, id: i64) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    pub fn entries(&self) -> Vec<(i64, Option<&str>)> {
        self.value.iter().map(|id| (*id, self.label(*id))).collect()
    }

    pub fn pending(&self) -> Vec<i64> {
        self.value
            .iter()
            .copied()
            .filter(|id| !self.labels.contains_key(id))
            .collect()
    }

    fn notify(&self) {
        if let Some(handler) = &self.on_change {
            handler(&self.value);
        }
    }
}

#[cfg(test)]
#[path = "tests/search_tests.rs"]
mod tests;
