//! Root of the campaign screen.
//!
//! Owns the edit target and the generation counter. A successful create,
//! update, or delete bumps the generation, which reloads the list, the
//! balance, and the form catalogs. Components never touch each other's
//! state; everything goes through here.

use std::sync::Arc;

use shared::domain::{Campaign, CampaignId};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

use crate::{
    api::CampaignApi,
    balance::AccountBalance,
    form::{CampaignForm, Mutation, SubmitOutcome},
    list::{CampaignList, Confirmation, DeleteOutcome},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    GenerationChanged(u64),
    EditTargetChanged(Option<CampaignId>),
}

#[derive(Default)]
struct CoordinatorState {
    generation: u64,
    edit_target: Option<CampaignId>,
}

pub struct Coordinator {
    form: CampaignForm,
    list: CampaignList,
    balance: AccountBalance,
    inner: Mutex<CoordinatorState>,
    events: broadcast::Sender<CoordinatorEvent>,
}

impl Coordinator {
    pub fn new(api: Arc<dyn CampaignApi>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            form: CampaignForm::new(Arc::clone(&api)),
            list: CampaignList::new(Arc::clone(&api)),
            balance: AccountBalance::new(api),
            inner: Mutex::new(CoordinatorState::default()),
            events,
        }
    }

    pub fn form(&self) -> &CampaignForm {
        &self.form
    }

    pub fn list(&self) -> &CampaignList {
        &self.list
    }

    pub fn balance(&self) -> &AccountBalance {
        &self.balance
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events.subscribe()
    }

    pub async fn generation(&self) -> u64 {
        self.inner.lock().await.generation
    }

    pub async fn edit_target(&self) -> Option<CampaignId> {
        self.inner.lock().await.edit_target
    }

    /// Initial load of every component.
    pub async fn mount(&self) {
        futures::join!(
            self.list.reload(),
            self.balance.reload(),
            self.form.reload_catalogs()
        );
    }

    /// Switches the form to edit `campaign`. The generation is left alone.
    pub async fn select_for_edit(&self, campaign: Campaign) {
        let id = campaign.id;
        self.set_edit_target(Some(id)).await;
        self.form.load_for_edit(campaign).await;
        self.form.reload_catalogs().await;
    }

    /// Looks `id` up in the loaded list and edits it. Returns `false` when
    /// the list has no such row.
    pub async fn edit_campaign(&self, id: CampaignId) -> bool {
        match self.list.find(id).await {
            Some(campaign) => {
                self.select_for_edit(campaign).await;
                true
            }
            None => {
                debug!(campaign_id = %id, "edit requested for campaign not in list");
                false
            }
        }
    }

    pub async fn cancel_edit(&self) {
        if self.edit_target().await.is_none() {
            return;
        }
        self.set_edit_target(None).await;
        self.form.reset_to_create().await;
        self.form.reload_catalogs().await;
    }

    pub async fn submit_form(&self) -> SubmitOutcome {
        let outcome = self.form.submit().await;
        if let SubmitOutcome::Saved { mutation, .. } = &outcome {
            self.advance_generation(*mutation).await;
        }
        outcome
    }

    pub async fn delete_campaign(
        &self,
        id: CampaignId,
        confirmation: &dyn Confirmation,
    ) -> DeleteOutcome {
        let outcome = self.list.delete(id, confirmation).await;
        if let DeleteOutcome::Deleted(id) = outcome {
            self.advance_generation(Mutation::Deleted(id)).await;
        }
        outcome
    }

    async fn advance_generation(&self, mutation: Mutation) {
        let (generation, reset_form) = {
            let mut guard = self.inner.lock().await;
            guard.generation += 1;
            let reset_form = match mutation {
                Mutation::Created | Mutation::Updated => true,
                Mutation::Deleted(id) => guard.edit_target == Some(id),
            };
            (guard.generation, reset_form)
        };
        info!(generation, ?mutation, "campaign data changed");
        let _ = self
            .events
            .send(CoordinatorEvent::GenerationChanged(generation));

        if reset_form {
            self.set_edit_target(None).await;
            self.form.reset_to_create().await;
        }

        futures::join!(
            self.list.reload(),
            self.balance.reload(),
            self.form.reload_catalogs()
        );
    }

    async fn set_edit_target(&self, target: Option<CampaignId>) {
        let changed = {
            let mut guard = self.inner.lock().await;
            let changed = guard.edit_target != target;
            guard.edit_target = target;
            changed
        };
        if changed {
            let _ = self.events.send(CoordinatorEvent::EditTargetChanged(target));
        }
    }
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
