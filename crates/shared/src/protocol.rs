use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{CampaignStatus, KeywordId, TownId};

/// Success envelope wrapped around every backend payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalancePayload {
    #[serde(default, alias = "account_name", skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    pub balance: Decimal,
}

/// Body sent on create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPayload {
    pub campaign_name: String,
    pub bid_amount: Decimal,
    pub campaign_fund: Decimal,
    pub status: CampaignStatus,
    pub town_id: TownId,
    pub radius: u32,
    pub keyword_ids: BTreeSet<KeywordId>,
}
