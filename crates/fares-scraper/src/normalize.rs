//! Backend-agnostic filtering of candidate offers.
//!
//! Applied to the candidates of one response at a time, in this order:
//!
//! 1. a key already seen in this response is a repeat (backends list the
//!    same flight under several categories) and is dropped;
//! 2. an offer touching a station that appears nowhere in the route catalog
//!    is dropped (backends volunteer nearby airports);
//! 3. anything else is accepted and its key remembered.
//!
//! Nothing here is an error; rejected candidates are counted and logged at
//! debug level by the caller.

use std::collections::{BTreeSet, HashSet};

use fares_core::{CanonicalOffer, RouteCatalog};

use crate::adapter::OfferKey;

#[derive(Debug, Clone)]
pub struct OfferNormalizer {
    stations: BTreeSet<String>,
}

impl OfferNormalizer {
    #[must_use]
    pub fn new(stations: BTreeSet<String>) -> Self {
        Self { stations }
    }

    /// Normalizer accepting every station named anywhere in `catalog`.
    #[must_use]
    pub fn for_catalog(catalog: &RouteCatalog) -> Self {
        Self::new(catalog.stations().clone())
    }

    /// Decides whether `candidate` survives, registering `key` in
    /// `already_seen` when it does.
    pub fn accept(
        &self,
        candidate: &CanonicalOffer,
        key: &OfferKey,
        already_seen: &mut HashSet<OfferKey>,
    ) -> bool {
        if already_seen.contains(key) {
            tracing::debug!(key = %key, "dropping repeated offer");
            return false;
        }
        if !self.stations.contains(&candidate.source)
            || !self.stations.contains(&candidate.destination)
        {
            tracing::debug!(
                key = %key,
                source = %candidate.source,
                destination = %candidate.destination,
                "dropping offer for station outside the catalog"
            );
            return false;
        }
        already_seen.insert(key.clone());
        true
    }

    /// Filters one response's candidates, keeping their order.
    #[must_use]
    pub fn accept_all(&self, candidates: Vec<(OfferKey, CanonicalOffer)>) -> Vec<CanonicalOffer> {
        let mut already_seen = HashSet::with_capacity(candidates.len());
        candidates
            .into_iter()
            .filter_map(|(key, offer)| {
                self.accept(&offer, &key, &mut already_seen).then_some(offer)
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
