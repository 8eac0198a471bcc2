use client_core::{locale::format_amount, CampaignRow, SearchHit};
use shared::domain::Campaign;

pub fn print_rows(rows: &[CampaignRow]) {
    if rows.is_empty() {
        println!("No campaigns yet");
        return;
    }
    println!(
        "{:>5}  {:<28} {:>10} {:>12}  {:<6} {:<18} {:>8}",
        "ID", "NAME", "BID", "FUND", "STATUS", "TOWN", "RADIUS"
    );
    for row in rows {
        println!(
            "{:>5}  {:<28} {:>10} {:>12}  {:<6} {:<18} {:>8}",
            row.id.to_string(),
            row.name,
            row.bid_amount,
            row.campaign_fund,
            row.status,
            row.town,
            row.radius
        );
    }
}

pub fn print_hits(hits: &[SearchHit], empty: &str) {
    if hits.is_empty() {
        println!("{empty}");
        return;
    }
    for hit in hits {
        println!("{:>5}  {}", hit.id, hit.label);
    }
}

pub fn print_campaign(campaign: &Campaign) {
    println!("Campaign #{}", campaign.id);
    println!("  name:     {}", campaign.campaign_name);
    println!("  bid:      {}", format_amount(campaign.bid_amount));
    println!("  fund:     {}", format_amount(campaign.campaign_fund));
    println!("  status:   {}", campaign.status);
    match (campaign.effective_town_id(), campaign.display_town_name()) {
        (Some(id), Some(name)) => println!("  town:     {name} (#{id})"),
        (Some(id), None) => println!("  town:     #{id}"),
        _ => println!("  town:     -"),
    }
    println!("  radius:   {} km", campaign.radius);

    let ids = campaign.effective_keyword_ids();
    let texts: Vec<String> = match &campaign.keywords {
        Some(keywords) if !keywords.is_empty() => {
            keywords.iter().map(|k| k.keyword_text.clone()).collect()
        }
        _ => campaign.keyword_texts.iter().cloned().collect(),
    };
    if texts.is_empty() {
        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        println!("  keywords: {}", ids.join(", "));
    } else {
        println!("  keywords: {}", texts.join(", "));
    }
    if let Some(created) = campaign.created_at {
        println!("  created:  {created}");
    }
    if let Some(updated) = campaign.updated_at {
        println!("  updated:  {updated}");
    }
}
