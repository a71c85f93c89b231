use std::collections::BTreeMap;

use serde::Serialize;

use super::DiaryEntry;

/// Bucket used for entries whose author is missing.
const UNKNOWN_AUTHOR: &str = "(unknown)";

/// Per-author and per-hour posting counts over a list of diary entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiarySummary {
    pub total: usize,
    pub by_author: BTreeMap<String, usize>,
    /// author -> hour -> count. Entries without an hour are not bucketed here.
    pub by_hour: BTreeMap<String, BTreeMap<u32, usize>>,
    pub total_by_hour: BTreeMap<u32, usize>,
}

impl DiarySummary {
    pub fn from_entries(entries: &[DiaryEntry]) -> Self {
        let mut summary = Self {
            total: entries.len(),
            ..Self::default()
        };

        for entry in entries {
            let author = entry.author().unwrap_or(UNKNOWN_AUTHOR).to_string();
            *summary.by_author.entry(author.clone()).or_default() += 1;

            if let Some(hour) = entry.hour() {
                *summary
                    .by_hour
                    .entry(author)
                    .or_default()
                    .entry(hour)
                    .or_default() += 1;
                *summary.total_by_hour.entry(hour).or_default() += 1;
            }
        }

        summary
    }

    /// Hour with the most posts; the earliest hour wins ties.
    pub fn peak_hour(&self) -> Option<u32> {
        self.total_by_hour
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(hour, _)| *hour)
    }
}
