//! Accumulation of pages into a duplicate-free list.

use crate::site::{SiteSummary, StableKey};
use std::collections::HashSet;

/// How many entries of a page were kept and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    pub kept: usize,
    pub duplicates: usize,
}

/// Ordered sites plus the set of their keys.
///
/// Every mutation goes through [`SiteList::replace`] or [`SiteList::append`],
/// so no two entries ever share a [`StableKey`].
#[derive(Debug, Clone, Default)]
pub struct SiteList {
    items: Vec<SiteSummary>,
    keys: HashSet<StableKey>,
}

impl SiteList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[SiteSummary] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.keys.clear();
    }

    /// Discard everything and start over from a first page. Repeats within
    /// the page keep their first occurrence.
    pub fn replace(&mut self, page: Vec<SiteSummary>) -> MergeOutcome {
        self.clear();
        self.append(page)
    }

    /// Append the entries of `page` whose key is not present yet, in page
    /// order.
    pub fn append(&mut self, page: Vec<SiteSummary>) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        self.items.reserve(page.len());
        for site in page {
            if self.keys.insert(site.stable_key()) {
                self.items.push(site);
                outcome.kept += 1;
            } else {
                outcome.duplicates += 1;
            }
        }
        outcome
    }
}

/// Whether another page is worth requesting after a merge.
///
/// All three end-of-data signals apply: an empty page, the accumulated count
/// reaching the reported total, and a short page.
pub fn can_load_more(page_len: usize, accumulated: usize, total_count: u32, page_size: u32) -> bool {
    page_len > 0 && accumulated < total_count as usize && page_len == page_size as usize
}
