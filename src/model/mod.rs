//! Data model for a harvest
//!
//! # Components
//!
//! - `Region`: the city + state unit a harvest runs for
//! - `Category`: the fixed set of agent specialties used to segment pagination
//! - `SummaryRecord` / `EnrichedRecord`: an agent as discovered, then as enriched
//! - `ListingRecord`: an active sale/rental listing or a past transaction
//! - `JobStatus` / `HarvestJob`: the persisted status of a region's harvest

mod category;
mod job;
pub(crate) mod listing;
mod record;
mod region;

pub use category::Category;
pub use job::{HarvestJob, JobState, JobStatus};
pub use listing::{Address, ListingRecord, ListingType};
pub use record::{EnrichedRecord, Phones, SummaryRecord, Website};
pub use region::Region;
