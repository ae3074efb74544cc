//! Place resolver: orchestrates the fallback chain.
//!
//! Chain: continent table -> country gazetteer -> remote AI -> not found.
//! The remote stage runs last, never earlier, and is skipped entirely in
//! offline mode.

use crate::collab::{RemoteError, RemotePlace, RemoteResolver};
use crate::gazetteer::{find_region, ContinentRegion, Gazetteer, Place};
use serde::Serialize;

/// Outcome of the resolution chain.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// Continent-scale area: camera move only.
    Region(&'static ContinentRegion),
    /// A gazetteer country.
    Country(Place),
    /// Something the static stages do not know; resolved remotely.
    Remote(RemotePlace),
    NotFound,
}

/// The resolver with its static datasets and offline switch.
pub struct PlaceResolver {
    gazetteer: Gazetteer,
    offline: bool,
}

impl PlaceResolver {
    pub fn new(gazetteer: Gazetteer) -> Self {
        Self { gazetteer, offline: false }
    }

    /// Set offline mode: the remote stage is skipped.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn gazetteer(&self) -> &Gazetteer {
        &self.gazetteer
    }

    /// Static stages only. `None` means neither table matched.
    pub fn resolve_static(&self, query: &str) -> Option<Resolution> {
        // 1. Continent / region table
        if let Some(region) = find_region(query) {
            return Some(Resolution::Region(region));
        }

        // 2. Country gazetteer
        if let Some(place) = self.gazetteer.find(query) {
            return Some(Resolution::Country(place.clone()));
        }

        None
    }

    /// Full chain. `query` should already be normalized.
    pub fn resolve(
        &self,
        query: &str,
        remote: &dyn RemoteResolver,
    ) -> Result<Resolution, RemoteError> {
        if let Some(resolution) = self.resolve_static(query) {
            return Ok(resolution);
        }

        // 3. Remote AI, last and only if allowed
        if self.offline {
            return Ok(Resolution::NotFound);
        }
        match remote.resolve_place(query)? {
            Some(place) => Ok(Resolution::Remote(place)),
            None => Ok(Resolution::NotFound),
        }
    }
}
