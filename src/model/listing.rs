use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of listing attached to an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListingType {
    /// Active for-sale listing
    Sale,
    /// Active for-rent listing
    Rent,
    /// Past transaction the agent was part of
    Past,
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sale => "SALE",
            Self::Rent => "RENT",
            Self::Past => "PAST",
        };
        f.write_str(s)
    }
}

/// Postal address of a listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state_or_province: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

/// An active listing or past transaction
///
/// `listing_type` is always assigned by the enricher, never read from the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub listing_type: ListingType,
    pub zpid: String,
    pub address: Option<Address>,
    pub price: Option<f64>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub home_type: Option<String>,
    pub sold_date: Option<String>,
    pub represented: Option<String>,
}

/// Accepts a listing id that arrives either as a JSON number or a non-empty string
pub(crate) fn listing_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        other => Err(de::Error::custom(format!("invalid listing id: {}", other))),
    }
}

/// Accepts a price as a JSON number or as display text such as `"$1,250,000"`
///
/// Text that does not reduce to a number (e.g. "Contact agent") yields None.
pub(crate) fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
                .collect();
            Ok(cleaned.parse::<f64>().ok())
        }
        Some(other) => Err(de::Error::custom(format!("invalid price: {}", other))),
    }
}
