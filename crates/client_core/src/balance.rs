use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::error;

use crate::api::CampaignApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceState {
    Loading,
    /// The last read failed; nothing to show.
    Empty,
    Loaded(Decimal),
}

/// Read-only view of the account balance. Refreshed only through
/// [`AccountBalance::reload`], never on its own.
pub struct AccountBalance {
    api: Arc<dyn CampaignApi>,
    state: Mutex<BalanceState>,
}

impl AccountBalance {
    pub fn new(api: Arc<dyn CampaignApi>) -> Self {
        Self {
            api,
            state: Mutex::new(BalanceState::Loading),
        }
    }

    pub async fn reload(&self) {
        *self.state.lock().await = BalanceState::Loading;
        let next = match self.api.get_account_balance().await {
            Ok(balance) => BalanceState::Loaded(balance),
            Err(err) => {
                error!(error = %err, "failed to fetch account balance");
                BalanceState::Empty
            }
        };
        *self.state.lock().await = next;
    }

    pub async fn state(&self) -> BalanceState {
        *self.state.lock().await
    }
}

#[cfg(test)]
#[path = "tests/balance_tests.rs"]
mod tests;
