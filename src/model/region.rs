use serde::{Deserialize, Serialize};
use std::fmt;

/// A city + state pair, the unit a harvest runs for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub city: String,
    pub state: String,
}

impl Region {
    /// Creates a region, trimming surrounding whitespace from both parts
    pub fn new(city: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            city: city.into().trim().to_string(),
            state: state.into().trim().to_string(),
        }
    }

    /// Returns the path segment the listing source uses for this region
    ///
    /// `Region::new("San Antonio", "TX")` becomes `san-antonio-tx`.
    pub fn slug(&self) -> String {
        let city = self
            .city
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();
        format!("{}-{}", city, self.state.to_lowercase())
    }

    /// Returns the upper-cased `(city, state)` pair used as the persistence key
    pub fn storage_key(&self) -> (String, String) {
        (self.city.to_uppercase(), self.state.to_uppercase())
    }

    /// Returns a file-name friendly stem for exports
    pub fn file_stem(&self) -> String {
        self.slug()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.state.to_uppercase())
    }
}
