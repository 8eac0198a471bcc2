use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(CampaignId);
id_newtype!(TownId);
id_newtype!(KeywordId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CampaignStatus {
    #[default]
    On,
    Off,
}

impl CampaignStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown campaign status '{0}', expected ON or OFF")]
pub struct ParseStatusError(String);

impl FromStr for CampaignStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ON" => Ok(Self::On),
            "OFF" => Ok(Self::Off),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("{0} has none of the label fields {1}")]
pub struct MissingLabelError(&'static str, &'static str);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TownRecord")]
pub struct Town {
    pub id: TownId,
    pub town_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// Town as any upstream may send it; several label fields can coexist.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TownRecord {
    id: TownId,
    town_name: Option<String>,
    name: Option<String>,
    label: Option<String>,
    #[serde(default)]
    postal_code: Option<String>,
}

impl TryFrom<TownRecord> for Town {
    type Error = MissingLabelError;

    fn try_from(record: TownRecord) -> Result<Self, Self::Error> {
        let town_name = record
            .town_name
            .or(record.name)
            .or(record.label)
            .ok_or(MissingLabelError("town", "townName, name, label"))?;
        Ok(Self {
            id: record.id,
            town_name,
            postal_code: record.postal_code,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "KeywordRecord")]
pub struct Keyword {
    pub id: KeywordId,
    pub keyword_text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeywordRecord {
    id: KeywordId,
    keyword_text: Option<String>,
    name: Option<String>,
    text: Option<String>,
    label: Option<String>,
}

impl TryFrom<KeywordRecord> for Keyword {
    type Error = MissingLabelError;

    fn try_from(record: KeywordRecord) -> Result<Self, Self::Error> {
        let keyword_text = record
            .keyword_text
            .or(record.name)
            .or(record.text)
            .or(record.label)
            .ok_or(MissingLabelError("keyword", "keywordText, name, text, label"))?;
        Ok(Self {
            id: record.id,
            keyword_text,
        })
    }
}

/// A campaign as the backend reports it.
///
/// The backend flattens the town into `townId`/`townName` and the keywords
/// into `keywordIds`/`keywordTexts`, but embedded `town` and `keywords`
/// objects are accepted as well. Use [`Campaign::effective_town_id`] and
/// [`Campaign::effective_keyword_ids`] rather than reading the raw fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: CampaignId,
    pub campaign_name: String,
    pub bid_amount: Decimal,
    pub campaign_fund: Decimal,
    pub status: CampaignStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub town_id: Option<TownId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub town_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub town: Option<Town>,
    pub radius: u32,
    #[serde(default)]
    pub keyword_ids: BTreeSet<KeywordId>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub keyword_texts: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<Keyword>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Campaign {
    pub fn effective_town_id(&self) -> Option<TownId> {
        self.town
            .as_ref()
            .map(|town| town.id)
            .or(self.town_id)
    }

    pub fn effective_keyword_ids(&self) -> BTreeSet<KeywordId> {
        match &self.keywords {
            Some(keywords) if !keywords.is_empty() => {
                keywords.iter().map(|keyword| keyword.id).collect()
            }
            _ => self.keyword_ids.clone(),
        }
    }

    pub fn display_town_name(&self) -> Option<&str> {
        self.town_name
            .as_deref()
            .or_else(|| self.town.as_ref().map(|town| town.town_name.as_str()))
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
