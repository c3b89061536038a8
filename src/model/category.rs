use serde::{Deserialize, Serialize};
use std::fmt;

/// Agent specialty used by the listing source to segment its result pages
///
/// The set is fixed; configuration may only narrow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    BuyersAgent,
    ListingAgent,
    Relocation,
    ShortSale,
    Foreclosure,
    Consulting,
}

impl Category {
    /// Returns every category in harvest order
    pub fn all() -> Vec<Self> {
        vec![
            Self::BuyersAgent,
            Self::ListingAgent,
            Self::Relocation,
            Self::ShortSale,
            Self::Foreclosure,
            Self::Consulting,
        ]
    }

    /// Value of the `specialties` query parameter for this category
    pub fn query_value(&self) -> &'static str {
        match self {
            Self::BuyersAgent => "BuyersAgent",
            Self::ListingAgent => "ListingAgent",
            Self::Relocation => "Relocation",
            Self::ShortSale => "ShortSale",
            Self::Foreclosure => "Foreclosure",
            Self::Consulting => "Consulting",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value())
    }
}
