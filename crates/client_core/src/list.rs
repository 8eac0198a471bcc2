use std::sync::Arc;

use shared::domain::{Campaign, CampaignId};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::{api::CampaignApi, error::ApiError};

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this campaign?";
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load campaigns";

/// Asks the user to approve a destructive action.
pub trait Confirmation: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirmation for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignRow {
    pub id: CampaignId,
    pub name: String,
    pub bid_amount: String,
    pub campaign_fund: String,
    pub status: String,
    pub town: String,
    pub radius: String,
}

impl From<&Campaign> for CampaignRow {
    fn from(campaign: &Campaign) -> Self {
        Self {
            id: campaign.id,
            name: campaign.campaign_name.clone(),
            bid_amount: format!("${}", campaign.bid_amount),
            campaign_fund: format!("${}", campaign.campaign_fund),
            status: campaign.status.to_string(),
            town: campaign.display_town_name().unwrap_or_default().to_string(),
            radius: format!("{} km", campaign.radius),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Cancelled,
    Deleted(CampaignId),
    Failed(ApiError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot {
    pub campaigns: Vec<Campaign>,
    pub loading: bool,
    pub error: Option<String>,
}

struct ListState {
    campaigns: Vec<Campaign>,
    loading: bool,
    error: Option<String>,
}

pub struct CampaignList {
    api: Arc<dyn CampaignApi>,
    inner: Mutex<ListState>,
}

impl CampaignList {
    pub fn new(api: Arc<dyn CampaignApi>) -> Self {
        Self {
            api,
            inner: Mutex::new(ListState {
                campaigns: Vec::new(),
                loading: true,
                error: None,
            }),
        }
    }

    /// Full, unpaginated read of the campaign collection.
    pub async fn reload(&self) {
        self.inner.lock().await.loading = true;

        let result = self.api.get_campaigns().await;

        let mut guard = self.inner.lock().await;
        guard.loading = false;
        match result {
            Ok(campaigns) => {
                debug!(count = campaigns.len(), "campaign list loaded");
                guard.campaigns = campaigns;
                guard.error = None;
            }
            Err(err) => {
                error!(error = %err, "failed to load campaigns");
                guard.campaigns.clear();
                guard.error = Some(LOAD_FAILED_MESSAGE.to_string());
            }
        }
    }

    pub async fn snapshot(&self) -> ListSnapshot {
        let guard = self.inner.lock().await;
        ListSnapshot {
            campaigns: guard.campaigns.clone(),
            loading: guard.loading,
            error: guard.error.clone(),
        }
    }

    pub async fn rows(&self) -> Vec<CampaignRow> {
        let guard = self.inner.lock().await;
        guard.campaigns.iter().map(CampaignRow::from).collect()
    }

    pub async fn find(&self, id: CampaignId) -> Option<Campaign> {
        let guard = self.inner.lock().await;
        guard.campaigns.iter().find(|c| c.id == id).cloned()
    }

    /// Deletes after explicit confirmation. The list itself is left as is;
    /// refreshing after a successful delete is the caller's job.
    pub async fn delete(&self, id: CampaignId, confirmation: &dyn Confirmation) -> DeleteOutcome {
        if !confirmation.confirm(DELETE_PROMPT) {
            debug!(campaign_id = %id, "delete cancelled");
            return DeleteOutcome::Cancelled;
        }

        match self.api.delete_campaign(id).await {
            Ok(()) => {
                info!(campaign_id = %id, "campaign deleted");
                DeleteOutcome::Deleted(id)
            }
            Err(err) => {
                error!(campaign_id = %id, error = %err, "failed to delete campaign");
                DeleteOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/list_tests.rs"]
mod tests;
