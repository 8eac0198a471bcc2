use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_settings, normalize_base_url, ClientSettings},
    search::{project, SearchProvider},
    AccountBalance, BalanceState, CampaignApi, CampaignList, Confirmation, Coordinator,
    DeleteOutcome, FormDraft, HttpCampaignApi, KeywordLookup, SearchHit, SearchOutcome,
    SearchSource, SubmitOutcome, TownLookup,
};
use dialoguer::Confirm;
use shared::domain::{Campaign, CampaignId, CampaignStatus, KeywordId, TownId};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(name = "campaign-console", about = "Manage advertising campaigns")]
struct Args {
    /// Backend base URL, e.g. http://localhost:8080/api
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the account balance.
    Balance,
    /// List every campaign.
    List,
    /// Show one campaign in full.
    Show { id: i64 },
    /// List towns, or search them by name.
    Towns {
        #[arg(long)]
        search: Option<String>,
    },
    /// List keywords, or search them by text.
    Keywords {
        #[arg(long)]
        search: Option<String>,
    },
    /// Create a campaign.
    Create(CampaignFields),
    /// Change fields of an existing campaign; omitted fields keep their value.
    Edit {
        id: i64,
        #[command(flatten)]
        fields: CampaignFields,
    },
    /// Delete a campaign after confirmation.
    Delete {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(clap::Args, Debug)]
struct CampaignFields {
    #[arg(long)]
    name: Option<String>,
    /// Bid amount, `,` or `.` as separator.
    #[arg(long)]
    bid: Option<String>,
    #[arg(long)]
    fund: Option<String>,
    /// ON or OFF.
    #[arg(long)]
    status: Option<CampaignStatus>,
    #[arg(long)]
    town: Option<i64>,
    /// Radius in km.
    #[arg(long)]
    radius: Option<String>,
    /// Keyword id; repeat to select several.
    #[arg(long = "keyword")]
    keywords: Vec<i64>,
    /// Drop the current keywords before adding `--keyword` ones.
    #[arg(long)]
    clear_keywords: bool,
}

impl CampaignFields {
    fn apply(self, draft: &mut FormDraft) {
        if let Some(name) = self.name {
            draft.campaign_name = name;
        }
        if let Some(bid) = self.bid {
            draft.bid_amount = bid;
        }
        if let Some(fund) = self.fund {
            draft.campaign_fund = fund;
        }
        if let Some(status) = self.status {
            draft.status = status;
        }
        if let Some(town) = self.town {
            draft.town_id = Some(TownId(town));
        }
        if let Some(radius) = self.radius {
            draft.radius = radius;
        }
        if self.clear_keywords {
            draft.keyword_ids.clear();
        }
        draft
            .keyword_ids
            .extend(self.keywords.into_iter().map(KeywordId));
    }
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn prompt_delete(prompt: &str) -> bool {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or_else(|err| {
            warn!(error = %err, "confirmation prompt failed, treating as no");
            false
        })
}

fn assume_yes(_prompt: &str) -> bool {
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings();
    if let Some(url) = args.api_url.as_deref() {
        settings.api_base_url = normalize_base_url(url);
    }
    init_logging(&settings.log_filter);
    debug!(api = %settings.api_base_url, "campaign backend selected");

    let api: Arc<dyn CampaignApi> = Arc::new(
        HttpCampaignApi::from_settings(&settings).context("invalid backend configuration")?,
    );

    match args.command {
        Command::Balance => show_balance(&AccountBalance::new(api)).await,
        Command::List => list_campaigns(api).await,
        Command::Show { id } => {
            let campaign = api
                .get_campaign(CampaignId(id))
                .await
                .with_context(|| format!("failed to load campaign #{id}"))?;
            render::print_campaign(&campaign);
            Ok(())
        }
        Command::Towns { search } => {
            let provider: Arc<dyn SearchProvider> = Arc::new(TownLookup::new(Arc::clone(&api)));
            let hits = match search {
                Some(query) => run_search(provider, &settings, &query).await?,
                None => project(&api.get_towns().await.context("failed to load towns")?),
            };
            render::print_hits(&hits, "No towns found");
            Ok(())
        }
        Command::Keywords { search } => {
            let provider: Arc<dyn SearchProvider> =
                Arc::new(KeywordLookup::new(Arc::clone(&api)));
            let hits = match search {
                Some(query) => run_search(provider, &settings, &query).await?,
                None => project(&api.get_keywords().await.context("failed to load keywords")?),
            };
            render::print_hits(&hits, "No keywords found");
            Ok(())
        }
        Command::Create(fields) => {
            let coordinator = Coordinator::new(api);
            coordinator.mount().await;
            coordinator
                .form()
                .update_draft(|draft| fields.apply(draft))
                .await;
            let campaign = submit(&coordinator).await?;
            println!("Created campaign #{} \"{}\"", campaign.id, campaign.campaign_name);
            show_balance(coordinator.balance()).await
        }
        Command::Edit { id, fields } => {
            let id = CampaignId(id);
            let coordinator = Coordinator::new(Arc::clone(&api));
            coordinator.mount().await;
            if !coordinator.edit_campaign(id).await {
                let campaign = api
                    .get_campaign(id)
                    .await
                    .with_context(|| format!("failed to load campaign #{id}"))?;
                coordinator.select_for_edit(campaign).await;
            }
            coordinator
                .form()
                .update_draft(|draft| fields.apply(draft))
                .await;
            let campaign = submit(&coordinator).await?;
            println!("Updated campaign #{}", campaign.id);
            render::print_campaign(&campaign);
            Ok(())
        }
        Command::Delete { id, yes } => {
            let coordinator = Coordinator::new(api);
            coordinator.mount().await;
            let confirmation: &dyn Confirmation = if yes { &assume_yes } else { &prompt_delete };
            match coordinator.delete_campaign(CampaignId(id), confirmation).await {
                DeleteOutcome::Cancelled => {
                    println!("Delete cancelled");
                    Ok(())
                }
                DeleteOutcome::Deleted(id) => {
                    println!("Deleted campaign #{id}");
                    show_balance(coordinator.balance()).await
                }
                DeleteOutcome::Failed(err) => bail!("failed to delete campaign: {err}"),
            }
        }
    }
}

async fn show_balance(balance: &AccountBalance) -> Result<()> {
    if balance.state().await == BalanceState::Loading {
        balance.reload().await;
    }
    match balance.state().await {
        BalanceState::Loaded(amount) => {
            println!("Balance: ${amount}");
            Ok(())
        }
        _ => bail!("account balance is unavailable"),
    }
}

async fn list_campaigns(api: Arc<dyn CampaignApi>) -> Result<()> {
    let list = CampaignList::new(api);
    list.reload().await;
    if let Some(message) = list.snapshot().await.error {
        bail!(message);
    }
    render::print_rows(&list.rows().await);
    Ok(())
}

async fn run_search(
    provider: Arc<dyn SearchProvider>,
    settings: &ClientSettings,
    query: &str,
) -> Result<Vec<SearchHit>> {
    let source = SearchSource::new(provider).with_debounce(settings.search_debounce());
    match source.search(query).await {
        SearchOutcome::Results(hits) => Ok(hits),
        SearchOutcome::Failed(err) => bail!("search failed: {err}"),
        SearchOutcome::Superseded => Ok(Vec::new()),
    }
}

async fn submit(coordinator: &Coordinator) -> Result<Campaign> {
    let form = coordinator.form().snapshot().await;
    for warning in &form.catalog_warnings {
        eprintln!("warning: {warning}");
    }
    if form.draft.town_id.is_some() && !form.towns.is_empty() && !form.town_resolved() {
        eprintln!("warning: selected town is not in the town catalog");
    }
    for id in form.unresolved_keywords() {
        if !form.keywords.is_empty() {
            eprintln!("warning: keyword {id} is not in the keyword catalog");
        }
    }

    match coordinator.submit_form().await {
        SubmitOutcome::Saved { campaign, .. } => Ok(campaign),
        SubmitOutcome::Invalid(errors) | SubmitOutcome::Rejected(errors) => {
            for (field, message) in &errors {
                eprintln!("  {field}: {message}");
            }
            bail!("campaign was not saved")
        }
        SubmitOutcome::Failed(message) => bail!(message),
        SubmitOutcome::Busy => bail!("a submission is already in progress"),
    }
}
