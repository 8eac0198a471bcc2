//! Create/edit form for a single campaign.
//!
//! The form is either in create mode or editing one campaign. State lives
//! behind a single async mutex that is never held across a backend call, so
//! the draft stays editable while a submission is in flight.

use std::{collections::BTreeSet, sync::Arc};

use shared::{
    domain::{Campaign, CampaignId, CampaignStatus, Keyword, KeywordId, Town, TownId},
    error::FieldErrors,
    protocol::CampaignPayload,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    api::CampaignApi,
    error::{ApiError, ApiResult},
    locale::{format_amount, parse_amount, parse_radius, AmountError},
    search::{project, Selection},
};

pub const FIELD_CAMPAIGN_NAME: &str = "campaignName";
pub const FIELD_BID_AMOUNT: &str = "bidAmount";
pub const FIELD_CAMPAIGN_FUND: &str = "campaignFund";
pub const FIELD_TOWN_ID: &str = "townId";
pub const FIELD_RADIUS: &str = "radius";

#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Create,
    Edit(Campaign),
}

impl FormMode {
    pub fn target_id(&self) -> Option<CampaignId> {
        match self {
            Self::Create => None,
            Self::Edit(campaign) => Some(campaign.id),
        }
    }
}

/// In-progress campaign with amounts kept as typed text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormDraft {
    pub campaign_name: String,
    pub bid_amount: String,
    pub campaign_fund: String,
    pub status: CampaignStatus,
    pub town_id: Option<TownId>,
    pub radius: String,
    pub keyword_ids: BTreeSet<KeywordId>,
}

impl FormDraft {
    pub fn from_campaign(campaign: &Campaign) -> Self {
        Self {
            campaign_name: campaign.campaign_name.clone(),
            bid_amount: format_amount(campaign.bid_amount),
            campaign_fund: format_amount(campaign.campaign_fund),
            status: campaign.status,
            town_id: campaign.effective_town_id(),
            radius: campaign.radius.to_string(),
            keyword_ids: campaign.effective_keyword_ids(),
        }
    }

    /// Checks the draft and converts it to a request body. Every invalid
    /// field gets exactly one message.
    pub fn validate(&self) -> Result<CampaignPayload, FieldErrors> {
        let mut errors = FieldErrors::new();

        let campaign_name = self.campaign_name.trim();
        if campaign_name.is_empty() {
            errors.insert(
                FIELD_CAMPAIGN_NAME.into(),
                "Campaign name is mandatory".into(),
            );
        }

        let bid_amount = parse_amount(&self.bid_amount)
            .map_err(|err| {
                errors.insert(FIELD_BID_AMOUNT.into(), amount_message("Bid amount", err));
            })
            .ok();
        let campaign_fund = parse_amount(&self.campaign_fund)
            .map_err(|err| {
                errors.insert(
                    FIELD_CAMPAIGN_FUND.into(),
                    amount_message("Campaign fund", err),
                );
            })
            .ok();

        if self.town_id.is_none() {
            errors.insert(FIELD_TOWN_ID.into(), "Town is mandatory".into());
        }

        let radius = parse_radius(&self.radius)
            .map_err(|err| {
                let message = match err {
                    AmountError::Empty => "Radius is mandatory",
                    AmountError::NotANumber => "Radius must be a whole number of kilometers",
                    AmountError::NotPositive => "Minimum radius is 1 km",
                };
                errors.insert(FIELD_RADIUS.into(), message.into());
            })
            .ok();

        match (bid_amount, campaign_fund, self.town_id, radius) {
            (Some(bid_amount), Some(campaign_fund), Some(town_id), Some(radius))
                if errors.is_empty() =>
            {
                Ok(CampaignPayload {
                    campaign_name: campaign_name.to_string(),
                    bid_amount,
                    campaign_fund,
                    status: self.status,
                    town_id,
                    radius,
                    keyword_ids: self.keyword_ids.clone(),
                })
            }
            _ => Err(errors),
        }
    }
}

fn amount_message(label: &str, err: AmountError) -> String {
    match err {
        AmountError::Empty => format!("{label} is mandatory"),
        AmountError::NotANumber => format!("{label} must be a number"),
        AmountError::NotPositive => format!("{label} must be greater than zero"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Created,
    Updated,
    Deleted(CampaignId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Saved {
        campaign: Campaign,
        mutation: Mutation,
    },
    /// Blocked before any request; errors come from local checks.
    Invalid(FieldErrors),
    /// The server refused the request; errors are the server's.
    Rejected(FieldErrors),
    Failed(String),
    /// A submission is already running.
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormSnapshot {
    pub mode: FormMode,
    pub draft: FormDraft,
    pub errors: FieldErrors,
    pub submitting: bool,
    pub failure: Option<String>,
    pub towns: Vec<Town>,
    pub keywords: Vec<Keyword>,
    pub catalog_warnings: Vec<String>,
}

impl FormSnapshot {
    pub fn town_resolved(&self) -> bool {
        self.draft
            .town_id
            .is_some_and(|id| self.towns.iter().any(|town| town.id == id))
    }

    /// Selected keywords with their labels, `None` while not in the catalog.
    pub fn keyword_selection(&self) -> Vec<(KeywordId, Option<String>)> {
        let mut selection = Selection::new();
        selection.set_value(self.draft.keyword_ids.iter().map(|id| id.0));
        selection.reconcile(&project(&self.keywords));
        selection
            .entries()
            .into_iter()
            .map(|(id, label)| (KeywordId(id), label.map(str::to_string)))
            .collect()
    }

    pub fn unresolved_keywords(&self) -> Vec<KeywordId> {
        self.keyword_selection()
            .into_iter()
            .filter_map(|(id, label)| label.is_none().then_some(id))
            .collect()
    }
}

struct FormState {
    mode: FormMode,
    draft: FormDraft,
    errors: FieldErrors,
    submitting: bool,
    failure: Option<String>,
    towns: Vec<Town>,
    keywords: Vec<Keyword>,
    catalog_ticket: u64,
    catalog_warnings: Vec<String>,
}

pub struct CampaignForm {
    api: Arc<dyn CampaignApi>,
    inner: Mutex<FormState>,
}

impl CampaignForm {
    pub fn new(api: Arc<dyn CampaignApi>) -> Self {
        Self {
            api,
            inner: Mutex::new(FormState {
                mode: FormMode::Create,
                draft: FormDraft::default(),
                errors: FieldErrors::new(),
                submitting: false,
                failure: None,
                towns: Vec::new(),
                keywords: Vec::new(),
                catalog_ticket: 0,
                catalog_warnings: Vec::new(),
            }),
        }
    }

    pub async fn snapshot(&self) -> FormSnapshot {
        let guard = self.inner.lock().await;
        FormSnapshot {
            mode: guard.mode.clone(),
            draft: guard.draft.clone(),
            errors: guard.errors.clone(),
            submitting: guard.submitting,
            failure: guard.failure.clone(),
            towns: guard.towns.clone(),
            keywords: guard.keywords.clone(),
            catalog_warnings: guard.catalog_warnings.clone(),
        }
    }

    pub async fn mode(&self) -> FormMode {
        self.inner.lock().await.mode.clone()
    }

    pub async fn draft(&self) -> FormDraft {
        self.inner.lock().await.draft.clone()
    }

    pub async fn errors(&self) -> FieldErrors {
        self.inner.lock().await.errors.clone()
    }

    pub async fn is_submitting(&self) -> bool {
        self.inner.lock().await.submitting
    }

    pub async fn load_for_edit(&self, campaign: Campaign) {
        let mut guard = self.inner.lock().await;
        debug!(campaign_id = %campaign.id, "form entering edit mode");
        guard.draft = FormDraft::from_campaign(&campaign);
        guard.mode = FormMode::Edit(campaign);
        guard.errors.clear();
        guard.failure = None;
    }

    pub async fn reset_to_create(&self) {
        let mut guard = self.inner.lock().await;
        debug!("form reset to create mode");
        guard.mode = FormMode::Create;
        guard.draft = FormDraft::default();
        guard.errors.clear();
        guard.failure = None;
    }

    pub async fn update_draft(&self, edit: impl FnOnce(&mut FormDraft)) {
        let mut guard = self.inner.lock().await;
        edit(&mut guard.draft);
    }

    pub async fn set_keyword_ids(&self, ids: impl IntoIterator<Item = KeywordId>) {
        let mut guard = self.inner.lock().await;
        guard.draft.keyword_ids = ids.into_iter().collect();
    }

    /// Fetches the town and keyword catalogs concurrently. Each catalog is
    /// applied as soon as its own response arrives; a failed fetch leaves that
    /// catalog empty and records a warning.
    pub async fn reload_catalogs(&self) {
        let ticket = {
            let mut guard = self.inner.lock().await;
            guard.catalog_ticket += 1;
            guard.catalog_warnings.clear();
            guard.catalog_ticket
        };

        let towns = async {
            let result = self.api.get_towns().await;
            self.apply_catalog(ticket, "towns", result, |state, towns| state.towns = towns)
                .await;
        };
        let keywords = async {
            let result = self.api.get_keywords().await;
            self.apply_catalog(ticket, "keywords", result, |state, keywords| {
                state.keywords = keywords
            })
            .await;
        };
        futures::join!(towns, keywords);
    }

    async fn apply_catalog<T>(
        &self,
        ticket: u64,
        catalog: &str,
        result: ApiResult<Vec<T>>,
        store: impl FnOnce(&mut FormState, Vec<T>),
    ) {
        let mut guard = self.inner.lock().await;
        if guard.catalog_ticket != ticket {
            debug!(catalog, "discarding catalog from superseded load");
            return;
        }
        match result {
            Ok(items) => store(&mut *guard, items),
            Err(err) => {
                warn!(catalog, error = %err, "catalog unavailable, leaving it empty");
                guard
                    .catalog_warnings
                    .push(format!("Failed to load {catalog}: {err}"));
                store(&mut *guard, Vec::new());
            }
        }
    }

    /// Validates and sends the draft. Create mode posts a new campaign and
    /// clears the draft on success; edit mode updates the campaign being
    /// edited and leaves mode changes to the caller.
    pub async fn submit(&self) -> SubmitOutcome {
        let (payload, target) = {
            let mut guard = self.inner.lock().await;
            if guard.submitting {
                return SubmitOutcome::Busy;
            }
            guard.errors.clear();
            guard.failure = None;

            match guard.draft.validate() {
                Ok(payload) => {
                    guard.submitting = true;
                    (payload, guard.mode.target_id())
                }
                Err(errors) => {
                    debug!(fields = ?errors.keys().collect::<Vec<_>>(), "draft failed local validation");
                    guard.errors = errors.clone();
                    return SubmitOutcome::Invalid(errors);
                }
            }
        };

        let result = match target {
            Some(id) => self
                .api
                .update_campaign(id, &payload)
                .await
                .map(|campaign| (campaign, Mutation::Updated)),
            None => self
                .api
                .create_campaign(&payload)
                .await
                .map(|campaign| (campaign, Mutation::Created)),
        };

        let mut guard = self.inner.lock().await;
        guard.submitting = false;
        match result {
            Ok((campaign, mutation)) => {
                if mutation == Mutation::Created && matches!(guard.mode, FormMode::Create) {
                    guard.draft = FormDraft::default();
                }
                SubmitOutcome::Saved { campaign, mutation }
            }
            Err(ApiError::Validation { fields, .. }) if !fields.is_empty() => {
                guard.errors = fields.clone();
                SubmitOutcome::Rejected(fields)
            }
            Err(err) => {
                warn!(error = %err, "campaign submission failed");
                let message = format!("Failed to save campaign: {err}");
                guard.failure = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
