use crate::model::{Category, ListingRecord};
use serde::{Deserialize, Serialize};

/// An agent as discovered on a listing page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Identity key within a harvest run
    pub full_name: String,

    /// Opaque identifier assigned by the listing source
    pub encoded_zuid: Option<String>,

    pub business_name: Option<String>,

    /// Primary phone number shown on the listing card
    pub phone_number: Option<String>,

    pub location: Option<String>,

    /// Relative link to the agent's profile page
    pub profile_link: Option<String>,

    pub review_rating: Option<f64>,

    pub review_count: Option<u32>,

    /// Categories the agent was listed under, first-seen first
    pub categories: Vec<Category>,

    /// 1-based position on the page the agent was first seen on
    pub rank: u32,

    /// 1-based index of that page
    pub page: u32,
}

impl SummaryRecord {
    /// Key used to collapse duplicates within a run
    pub fn identity_key(&self) -> &str {
        &self.full_name
    }

    /// Records that the agent was also listed under `category`
    pub fn add_category(&mut self, category: Category) {
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
    }

    /// Key the agent is stored under across regions
    ///
    /// Names are only unique within one run, so the source identifier wins
    /// when there is one.
    pub fn storage_key(&self) -> &str {
        self.encoded_zuid
            .as_deref()
            .filter(|zuid| !zuid.trim().is_empty())
            .unwrap_or(&self.full_name)
    }
}

/// Additional contact numbers from the profile page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Phones {
    #[serde(default)]
    pub cell: Option<String>,
    #[serde(default)]
    pub business: Option<String>,
    #[serde(default)]
    pub brokerage: Option<String>,
}

impl Phones {
    pub fn is_empty(&self) -> bool {
        self.cell.is_none() && self.business.is_none() && self.brokerage.is_none()
    }
}

/// An external site referenced from the agent's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Website {
    pub url: String,
    pub text: Option<String>,
}

/// A summary record plus everything the profile page contributed
///
/// Written once by the enricher and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub summary: SummaryRecord,

    pub phones: Option<Phones>,

    pub email: Option<String>,

    #[serde(default)]
    pub for_sale: Vec<ListingRecord>,

    #[serde(default)]
    pub for_rent: Vec<ListingRecord>,

    #[serde(default)]
    pub past_sales: Vec<ListingRecord>,

    #[serde(default)]
    pub websites: Vec<Website>,
}

impl EnrichedRecord {
    /// Wraps a summary record with every optional field left empty
    pub fn unenriched(summary: SummaryRecord) -> Self {
        Self {
            summary,
            phones: None,
            email: None,
            for_sale: Vec::new(),
            for_rent: Vec::new(),
            past_sales: Vec::new(),
            websites: Vec::new(),
        }
    }

    pub fn full_name(&self) -> &str {
        &self.summary.full_name
    }

    pub fn storage_key(&self) -> &str {
        self.summary.storage_key()
    }

    /// Returns true if any detail-page field was filled in
    pub fn has_details(&self) -> bool {
        self.phones.is_some()
            || self.email.is_some()
            || !self.for_sale.is_empty()
            || !self.for_rent.is_empty()
            || !self.past_sales.is_empty()
            || !self.websites.is_empty()
    }
}
