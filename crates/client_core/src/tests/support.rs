//! Recording in-memory backend shared by the controller tests.

use std::{
    collections::{BTreeSet, HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::{
    domain::{Campaign, CampaignId, CampaignStatus, Keyword, KeywordId, Town, TownId},
    error::FieldErrors,
    protocol::CampaignPayload,
};
use tokio::sync::Mutex;

use crate::{
    api::CampaignApi,
    error::{ApiError, ApiResult},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Balance,
    Towns,
    SearchTowns(String),
    Keywords,
    SearchKeywords(String),
    Campaigns,
    Campaign(CampaignId),
    Create(CampaignPayload),
    Update(CampaignId, CampaignPayload),
    Delete(CampaignId),
}

#[derive(Default)]
pub struct FakeBackend {
    pub balance: Decimal,
    pub towns: Vec<Town>,
    pub keywords: Vec<Keyword>,
    pub campaigns: Vec<Campaign>,
    pub next_id: i64,
    pub balance_error: Option<ApiError>,
    pub towns_error: Option<ApiError>,
    pub keywords_error: Option<ApiError>,
    pub campaigns_error: Option<ApiError>,
    pub delete_error: Option<ApiError>,
    pub submit_errors: VecDeque<ApiError>,
    pub submit_delay: Option<Duration>,
    pub search_delays: HashMap<String, Duration>,
    /// Per-call delays for `get_towns`, consumed in order.
    pub towns_delays: VecDeque<Duration>,
}

pub struct FakeCampaignApi {
    backend: Mutex<FakeBackend>,
    calls: Mutex<Vec<Call>>,
}

pub fn town(id: i64, name: &str, postal: &str) -> Town {
    Town {
        id: TownId(id),
        town_name: name.to_string(),
        postal_code: Some(postal.to_string()),
    }
}

pub fn keyword(id: i64, text: &str) -> Keyword {
    Keyword {
        id: KeywordId(id),
        keyword_text: text.to_string(),
    }
}

pub fn field_errors(entries: &[(&str, &str)]) -> FieldErrors {
    entries
        .iter()
        .map(|(field, message)| (field.to_string(), message.to_string()))
        .collect()
}

pub fn stored_campaign(id: i64, name: &str, town_id: i64, radius: u32) -> Campaign {
    Campaign {
        id: CampaignId(id),
        campaign_name: name.to_string(),
        bid_amount: dec!(2.5),
        campaign_fund: dec!(100),
        status: CampaignStatus::On,
        town_id: Some(TownId(town_id)),
        town_name: None,
        town: None,
        radius,
        keyword_ids: BTreeSet::from([KeywordId(1), KeywordId(2)]),
        keyword_texts: BTreeSet::new(),
        keywords: None,
        created_at: None,
        updated_at: None,
    }
}

impl FakeCampaignApi {
    pub fn seeded() -> Arc<Self> {
        Arc::new(Self {
            backend: Mutex::new(FakeBackend {
                balance: dec!(1000),
                towns: vec![
                    town(1, "Warsaw", "00-001"),
                    town(2, "Gdansk", "80-001"),
                    town(3, "Krakow", "30-001"),
                ],
                keywords: vec![
                    keyword(1, "pizza"),
                    keyword(2, "food"),
                    keyword(3, "delivery"),
                ],
                next_id: 1,
                ..FakeBackend::default()
            }),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub async fn configure(&self, edit: impl FnOnce(&mut FakeBackend)) {
        edit(&mut *self.backend.lock().await);
    }

    pub async fn insert_campaign(&self, mut campaign: Campaign) {
        let mut backend = self.backend.lock().await;
        campaign.town_name = campaign
            .effective_town_id()
            .and_then(|id| backend.towns.iter().find(|t| t.id == id))
            .map(|t| t.town_name.clone());
        backend.next_id = backend.next_id.max(campaign.id.0 + 1);
        backend.campaigns.push(campaign);
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub async fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().await.iter().filter(|c| matches(c)).count()
    }

    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    async fn record(&self, call: Call) {
        self.calls.lock().await.push(call);
    }

    fn materialize(backend: &FakeBackend, id: CampaignId, payload: &CampaignPayload) -> Campaign {
        let town = backend.towns.iter().find(|t| t.id == payload.town_id);
        Campaign {
            id,
            campaign_name: payload.campaign_name.clone(),
            bid_amount: payload.bid_amount,
            campaign_fund: payload.campaign_fund,
            status: payload.status,
            town_id: Some(payload.town_id),
            town_name: town.map(|t| t.town_name.clone()),
            town: None,
            radius: payload.radius,
            keyword_ids: payload.keyword_ids.clone(),
            keyword_texts: backend
                .keywords
                .iter()
                .filter(|k| payload.keyword_ids.contains(&k.id))
                .map(|k| k.keyword_text.clone())
                .collect(),
            keywords: None,
            created_at: None,
            updated_at: None,
        }
    }

    async fn submit_gate(&self) -> ApiResult<()> {
        let delay = self.backend.lock().await.submit_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.backend.lock().await.submit_errors.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CampaignApi for FakeCampaignApi {
    async fn get_account_balance(&self) -> ApiResult<Decimal> {
        self.record(Call::Balance).await;
        let backend = self.backend.lock().await;
        match &backend.balance_error {
            Some(err) => Err(err.clone()),
            None => Ok(backend.balance),
        }
    }

    async fn get_towns(&self) -> ApiResult<Vec<Town>> {
        self.record(Call::Towns).await;
        let (response, delay) = {
            let mut backend = self.backend.lock().await;
            let response = match &backend.towns_error {
                Some(err) => Err(err.clone()),
                None => Ok(backend.towns.clone()),
            };
            (response, backend.towns_delays.pop_front())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        response
    }

    async fn search_towns(&self, query: &str) -> ApiResult<Vec<Town>> {
        self.record(Call::SearchTowns(query.to_string())).await;
        let backend = self.backend.lock().await;
        let needle = query.to_lowercase();
        Ok(backend
            .towns
            .iter()
            .filter(|t| t.town_name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn get_keywords(&self) -> ApiResult<Vec<Keyword>> {
        self.record(Call::Keywords).await;
        let backend = self.backend.lock().await;
        match &backend.keywords_error {
            Some(err) => Err(err.clone()),
            None => Ok(backend.keywords.clone()),
        }
    }

    async fn search_keywords(&self, query: &str) -> ApiResult<Vec<Keyword>> {
        self.record(Call::SearchKeywords(query.to_string())).await;
        let delay = self.backend.lock().await.search_delays.get(query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let backend = self.backend.lock().await;
        let needle = query.to_lowercase();
        Ok(backend
            .keywords
            .iter()
            .filter(|k| k.keyword_text.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn get_campaigns(&self) -> ApiResult<Vec<Campaign>> {
        self.record(Call::Campaigns).await;
        let backend = self.backend.lock().await;
        match &backend.campaigns_error {
            Some(err) => Err(err.clone()),
            None => Ok(backend.campaigns.clone()),
        }
    }

    async fn get_campaign(&self, id: CampaignId) -> ApiResult<Campaign> {
        self.record(Call::Campaign(id)).await;
        let backend = self.backend.lock().await;
        backend
            .campaigns
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("campaign {id}"),
            })
    }

    async fn create_campaign(&self, payload: &CampaignPayload) -> ApiResult<Campaign> {
        self.record(Call::Create(payload.clone())).await;
        self.submit_gate().await?;
        let mut backend = self.backend.lock().await;
        let id = CampaignId(backend.next_id);
        backend.next_id += 1;
        let campaign = Self::materialize(&backend, id, payload);
        backend.balance -= payload.campaign_fund;
        backend.campaigns.push(campaign.clone());
        Ok(campaign)
    }

    async fn update_campaign(
        &self,
        id: CampaignId,
        payload: &CampaignPayload,
    ) -> ApiResult<Campaign> {
        self.record(Call::Update(id, payload.clone())).await;
        self.submit_gate().await?;
        let mut backend = self.backend.lock().await;
        let campaign = Self::materialize(&backend, id, payload);
        let slot = backend
            .campaigns
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("campaign {id}"),
            })?;
        *slot = campaign.clone();
        Ok(campaign)
    }

    async fn delete_campaign(&self, id: CampaignId) -> ApiResult<()> {
        self.record(Call::Delete(id)).await;
        let mut backend = self.backend.lock().await;
        if let Some(err) = &backend.delete_error {
            return Err(err.clone());
        }
        let before = backend.campaigns.len();
        backend.campaigns.retain(|c| c.id != id);
        if backend.campaigns.len() == before {
            return Err(ApiError::NotFound {
                resource: format!("campaign {id}"),
            });
        }
        Ok(())
    }
}
