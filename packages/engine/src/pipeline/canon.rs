//! Canonicalization and near-duplicate collapsing.
//!
//! Every listing gets a stable fingerprint over (normalized name, 3-day
//! date bucket, ~1 km venue cell, normalized provider). Listings sharing a
//! fingerprint form a duplicate group with one canonical representative.
//! An incoming listing whose fingerprint is new is still folded into an
//! existing group when it differs only by a name typo or a date inside the
//! same few days, so two sources describing one real-world event collapse
//! to a single catalog entry.

use chrono::{DateTime, Datelike, Utc};

use crate::types::{CanonHash, CanonicalListing};

/// Width of the date bucket in the fingerprint.
pub const DATE_BUCKET_DAYS: i64 = 3;

/// Maximum edit distance at which two names count as the same activity.
pub const NAME_TYPO_DISTANCE: usize = 2;

/// The normalized inputs a fingerprint is computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct FingerprintParts {
    pub name: String,
    pub epoch_day: i64,
    pub cell: String,
    pub provider: String,
}

impl FingerprintParts {
    pub fn new(name: &str, start: DateTime<Utc>, cell: &str, provider: &str) -> Self {
        Self {
            name: normalize_name(name),
            epoch_day: i64::from(start.date_naive().num_days_from_ce()),
            cell: cell.to_string(),
            provider: normalize_name(provider),
        }
    }

    pub fn date_bucket(&self) -> i64 {
        self.epoch_day.div_euclid(DATE_BUCKET_DAYS)
    }

    pub fn hash(&self) -> CanonHash {
        CanonHash::from_parts(&self.name, self.date_bucket(), &self.cell, &self.provider)
    }
}

/// Lowercase, strip punctuation, collapse whitespace.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a listing with `incoming` parts describes the same real-world
/// activity as an existing group with `group` parts, despite a fingerprint
/// mismatch from a typo or a bucket-straddling date.
pub fn is_near_duplicate(incoming: &FingerprintParts, group: &FingerprintParts) -> bool {
    incoming.cell == group.cell
        && incoming.provider == group.provider
        && (incoming.epoch_day - group.epoch_day).abs() <= DATE_BUCKET_DAYS
        && levenshtein(&incoming.name, &group.name) <= NAME_TYPO_DISTANCE
}

/// Classic two-row Levenshtein edit distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// The most common spelling among a group's names. Ties resolve to the
/// lexicographically smallest so the answer is order-independent.
pub fn modal_name<'a>(names: impl Iterator<Item = &'a str>) -> Option<String> {
    use std::collections::HashMap;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }

    counts
        .into_iter()
        .max_by(|(name_a, count_a), (name_b, count_b)| {
            count_a.cmp(count_b).then(name_b.cmp(name_a))
        })
        .map(|(name, _)| name.to_string())
}

/// Pick the canonical representative of a duplicate group.
///
/// Order of preference: longest non-empty description, then smallest edit
/// distance to the group's most common name spelling, then earliest
/// `last_verified`. A final comparison on source URL and item id makes the
/// choice deterministic regardless of member order.
pub fn choose_representative(members: &[CanonicalListing]) -> Option<usize> {
    if members.is_empty() {
        return None;
    }

    let modal = modal_name(members.iter().map(|m| m.name.as_str()))?;
    let modal_lower = modal.to_lowercase();

    (0..members.len()).min_by_key(|&i| {
        let m = &members[i];
        (
            std::cmp::Reverse(m.description.trim().len()),
            levenshtein(&m.name.to_lowercase(), &modal_lower),
            m.last_verified.timestamp_millis(),
            m.source_url.clone(),
            m.source_item_id.clone(),
        )
    })
}
