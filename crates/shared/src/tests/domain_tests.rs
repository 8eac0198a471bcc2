use super::*;
use rust_decimal_macros::dec;
use serde_json::json;

#[test]
fn campaign_reads_flattened_backend_shape() {
    let campaign: Campaign = serde_json::from_value(json!({
        "id": 4,
        "campaignName": "Pizza Promo",
        "bidAmount": 2.5,
        "campaignFund": 100.0,
        "status": "ON",
        "townId": 3,
        "townName": "Krakow",
        "radius": 5,
        "keywordIds": [2, 1],
        "keywordTexts": ["pizza", "food"],
        "createdAt": "2024-03-01T10:15:30"
    }))
    .expect("decode campaign");

    assert_eq!(campaign.id, CampaignId(4));
    assert_eq!(campaign.bid_amount, dec!(2.5));
    assert_eq!(campaign.campaign_fund, dec!(100));
    assert_eq!(campaign.status, CampaignStatus::On);
    assert_eq!(campaign.effective_town_id(), Some(TownId(3)));
    assert_eq!(campaign.display_town_name(), Some("Krakow"));
    assert_eq!(
        campaign.effective_keyword_ids(),
        BTreeSet::from([KeywordId(1), KeywordId(2)])
    );
    assert!(campaign.created_at.is_some());
}

#[test]
fn embedded_town_and_keywords_take_precedence() {
    let campaign: Campaign = serde_json::from_value(json!({
        "id": 9,
        "campaignName": "Embedded",
        "bidAmount": 1,
        "campaignFund": 10,
        "status": "OFF",
        "townId": 1,
        "town": { "id": 7, "townName": "Gdansk", "postalCode": "80-001" },
        "radius": 12,
        "keywords": [{ "id": 5, "keywordText": "sea" }]
    }))
    .expect("decode campaign");

    assert_eq!(campaign.effective_town_id(), Some(TownId(7)));
    assert_eq!(campaign.display_town_name(), Some("Gdansk"));
    assert_eq!(
        campaign.effective_keyword_ids(),
        BTreeSet::from([KeywordId(5)])
    );
}

#[test]
fn keyword_label_accepts_search_aliases() {
    let from_text: Keyword =
        serde_json::from_value(json!({ "id": 1, "text": "pizza" })).expect("text alias");
    let from_name: Keyword =
        serde_json::from_value(json!({ "id": 2, "name": "pasta" })).expect("name alias");

    assert_eq!(from_text.keyword_text, "pizza");
    assert_eq!(from_name.keyword_text, "pasta");
    assert!(serde_json::from_value::<Keyword>(json!({ "id": 3 })).is_err());
}

#[test]
fn keyword_with_several_label_fields_takes_the_first_present() {
    let both: Keyword =
        serde_json::from_value(json!({ "id": 1, "keywordText": "pizza", "text": "pizza!" }))
            .expect("keywordText and text");
    let typeahead: Keyword =
        serde_json::from_value(json!({ "id": 2, "text": "pasta", "name": "Pasta" }))
            .expect("text and name");
    let labelled: Keyword =
        serde_json::from_value(json!({ "id": 3, "label": "sushi", "text": "Sushi" }))
            .expect("label and text");

    assert_eq!(both.keyword_text, "pizza");
    assert_eq!(typeahead.keyword_text, "Pasta");
    assert_eq!(labelled.keyword_text, "Sushi");
}

#[test]
fn town_label_fields_may_coexist() {
    let town: Town = serde_json::from_value(json!({
        "id": 3,
        "townName": "Krakow",
        "name": "Kraków",
        "label": "Krakow (30-001)",
        "postalCode": "30-001"
    }))
    .expect("all label fields");
    let named: Town =
        serde_json::from_value(json!({ "id": 4, "name": "Sopot", "label": "Sopot" }))
            .expect("name and label");

    assert_eq!(town.town_name, "Krakow");
    assert_eq!(town.postal_code.as_deref(), Some("30-001"));
    assert_eq!(named.town_name, "Sopot");
    assert_eq!(named.postal_code, None);
    assert!(serde_json::from_value::<Town>(json!({ "id": 5, "postalCode": "00-001" })).is_err());
}

#[test]
fn catalog_keeps_items_with_mixed_label_shapes() {
    let keywords: Vec<Keyword> = serde_json::from_value(json!([
        { "id": 1, "keywordText": "pizza" },
        { "id": 2, "text": "food", "name": "Food" },
        { "id": 3, "label": "delivery" }
    ]))
    .expect("mixed catalog");

    let labels: Vec<_> = keywords.iter().map(|k| k.keyword_text.as_str()).collect();
    assert_eq!(labels, vec!["pizza", "Food", "delivery"]);
}

#[test]
fn status_parses_case_insensitively_and_serializes_uppercase() {
    assert_eq!("on".parse::<CampaignStatus>().expect("on"), CampaignStatus::On);
    assert_eq!(" OFF ".parse::<CampaignStatus>().expect("off"), CampaignStatus::Off);
    assert!("paused".parse::<CampaignStatus>().is_err());
    assert_eq!(
        serde_json::to_value(CampaignStatus::Off).expect("encode"),
        json!("OFF")
    );
}
