//! Client-side state for the campaign manager: a typed backend client and
//! the controllers that keep the campaign list, the create/edit form, and
//! the balance view consistent with the server.

pub mod api;
pub mod balance;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod form;
pub mod list;
pub mod locale;
pub mod search;

pub use api::{CampaignApi, HttpCampaignApi};
pub use balance::{AccountBalance, BalanceState};
pub use coordinator::{Coordinator, CoordinatorEvent};
pub use error::{ApiError, ApiResult};
pub use form::{CampaignForm, FormDraft, FormMode, FormSnapshot, Mutation, SubmitOutcome};
pub use list::{CampaignList, CampaignRow, Confirmation, DeleteOutcome};
pub use search::{KeywordLookup, SearchHit, SearchOutcome, SearchSource, Selection, TownLookup};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
