//! Identity deduplication of discovered agents

use crate::model::SummaryRecord;
use std::collections::HashMap;

/// Collapses records sharing an identity key, keeping the first occurrence
///
/// Categories of later duplicates are merged into the kept record, so an
/// agent listed under several specialties keeps all of them. Input order is
/// preserved for the survivors.
pub fn dedup_by_identity(records: Vec<SummaryRecord>) -> Vec<SummaryRecord> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<SummaryRecord> = Vec::with_capacity(records.len());

    for record in records {
        match seen.get(record.identity_key()) {
            Some(&index) => {
                for category in record.categories {
                    unique[index].add_category(category);
                }
            }
            None => {
                seen.insert(record.identity_key().to_string(), unique.len());
                unique.push(record);
            }
        }
    }

    unique
}
