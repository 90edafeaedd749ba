//! Scan-and-filter queries.
//!
//! The world state has no secondary indexes, so every view is rebuilt by
//! scanning the whole keyspace in key order, decoding each value, and
//! keeping the records that satisfy a predicate. One undecodable value fails
//! the whole query.
//!
//! The predicates are plain functions so they can be tested, and reused by
//! an index-backed implementation, on their own.

use std::collections::BTreeSet;

use crate::asset::Asset;

use super::{decode_asset, AssignmentContract, ContractResult};

/// `InstructorID == user && Owner == user && ClassID == class`: records the
/// instructor authored and has not handed out.
#[must_use]
pub fn is_unassigned_for(asset: &Asset, user: &str, class: &str) -> bool {
    asset.instructor_id == user && asset.owner == user && asset.class_id == class
}

/// `InstructorID == user`, or the ID ends with `user`: the user teaches or
/// is enrolled in the record's class.
#[must_use]
pub fn is_class_member(asset: &Asset, user: &str) -> bool {
    asset.instructor_id == user || asset.id_has_suffix(user)
}

/// `Owner == user && ClassID == class`: work the user currently holds.
#[must_use]
pub fn is_open_assignment(asset: &Asset, user: &str, class: &str) -> bool {
    asset.owner == user && asset.class_id == class
}

/// ID ends with `user`, `Owner != user`, `ClassID == class`: the student's
/// records that have moved on to someone else, i.e. handed in.
#[must_use]
pub fn is_submitted_by(asset: &Asset, user: &str, class: &str) -> bool {
    asset.id_has_suffix(user) && asset.owner != user && asset.class_id == class
}

impl AssignmentContract {
    /// Decode every record in key order, keeping those matching `keep`.
    fn scan<F>(&self, mut keep: F) -> ContractResult<Vec<Asset>>
    where
        F: FnMut(&Asset) -> bool,
    {
        let entries = self.state.get_state_by_range("", "")?;
        let scanned = entries.len();

        let mut matched = Vec::new();
        for (key, bytes) in entries {
            // An empty value is an absent record, as in `asset_exists`.
            if bytes.is_empty() {
                continue;
            }
            let asset = decode_asset(&key, &bytes)?;
            if keep(&asset) {
                matched.push(asset);
            }
        }

        tracing::trace!(scanned, matched = matched.len(), "keyspace scan");
        Ok(matched)
    }

    /// Records `user` authored in `class` and still holds.
    pub fn get_all_assets(&self, user: &str, class: &str) -> ContractResult<Vec<Asset>> {
        self.scan(|a| is_unassigned_for(a, user, class))
    }

    /// Distinct classes `user` teaches or (by ID suffix) is enrolled in,
    /// sorted.
    pub fn get_all_classes(&self, user: &str) -> ContractResult<Vec<String>> {
        let classes: BTreeSet<String> = self
            .scan(|a| is_class_member(a, user))?
            .into_iter()
            .map(|a| a.class_id)
            .collect();
        Ok(classes.into_iter().collect())
    }

    /// Records in `class` currently owned by `user`.
    pub fn get_all_assignments(&self, user: &str, class: &str) -> ContractResult<Vec<Asset>> {
        self.scan(|a| is_open_assignment(a, user, class))
    }

    /// Records in `class` whose ID ends with `user` and that `user` no
    /// longer owns.
    pub fn get_submitted_assignments(
        &self,
        user: &str,
        class: &str,
    ) -> ContractResult<Vec<Asset>> {
        self.scan(|a| is_submitted_by(a, user, class))
    }
}
