//! Route catalog: the station pairs each backend is asked about.
//!
//! The routes file maps a backend name to a list of `{source, destination}`
//! objects. YAML and JSON are both accepted (JSON parses as YAML):
//!
//! ```yaml
//! RyanAir:
//!   - source: GVA
//!     destination: OTP
//! WizzAir:
//!   - { source: LTN, destination: OTP }
//! ```
//!
//! Validation happens here, at the boundary. Bad entries are logged and
//! skipped so one typo does not take the whole backend offline; the crawl
//! core only ever sees a clean [`RouteCatalog`].

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::company::Company;
use crate::ConfigError;

/// A directed airport pair. `source != destination` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Route {
    source: String,
    destination: String,
}

impl Route {
    /// Builds a route from two station codes, normalising them to upper case.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStation`] if either code is not three
    /// ASCII letters, or [`ConfigError::IdenticalPair`] for a self-pair.
    pub fn new(source: &str, destination: &str) -> Result<Self, ConfigError> {
        let source = normalize_station(source)?;
        let destination = normalize_station(destination)?;
        if source == destination {
            return Err(ConfigError::IdenticalPair(source));
        }
        Ok(Self {
            source,
            destination,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// The same pair flown the other way.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            source: self.destination.clone(),
            destination: self.source.clone(),
        }
    }

    /// Direction-agnostic identity, used to drop `(a,b)` when `(b,a)` was
    /// already listed.
    fn unordered_key(&self) -> (String, String) {
        if self.source <= self.destination {
            (self.source.clone(), self.destination.clone())
        } else {
            (self.destination.clone(), self.source.clone())
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.source, self.destination)
    }
}

fn normalize_station(code: &str) -> Result<String, ConfigError> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
        Ok(code)
    } else {
        Err(ConfigError::InvalidStation(code))
    }
}

/// Immutable set of routes for one backend, plus every station they touch.
#[derive(Debug, Clone, Default)]
pub struct RouteCatalog {
    routes: Vec<Route>,
    stations: BTreeSet<String>,
}

impl RouteCatalog {
    /// Builds a catalog, keeping first occurrences and dropping any pair
    /// (in either direction) already present.
    #[must_use]
    pub fn new(routes: impl IntoIterator<Item = Route>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        for route in routes {
            if seen.insert(route.unordered_key()) {
                kept.push(route);
            } else {
                tracing::warn!(route = %route, "duplicate pair found; skipping");
            }
        }

        let stations = kept
            .iter()
            .flat_map(|r| [r.source.clone(), r.destination.clone()])
            .collect();

        Self {
            routes: kept,
            stations,
        }
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// All station codes appearing anywhere in the catalog.
    #[must_use]
    pub fn stations(&self) -> &BTreeSet<String> {
        &self.stations
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }
}

#[derive(Debug, Deserialize)]
struct RouteEntry {
    source: String,
    destination: String,
}

/// Loads every backend's catalog from `path`, logging and swallowing
/// file-level failures.
///
/// A missing or unparseable file yields an empty map: the run then proceeds
/// with zero scheduled windows and the caller decides how loudly to fail.
#[must_use]
pub fn load_catalogs(path: &Path) -> HashMap<Company, RouteCatalog> {
    match load_routes_file(path) {
        Ok(catalogs) => catalogs,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "could not load route catalog");
            HashMap::new()
        }
    }
}

/// Reads and parses the routes file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::RoutesFileIo`] if the file cannot be read, or
/// [`ConfigError::RoutesFileParse`] if it is not a mapping of backend name
/// to entries.
pub fn load_routes_file(path: &Path) -> Result<HashMap<Company, RouteCatalog>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RoutesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_catalogs(&content)
}

/// Parses routes-file content into per-backend catalogs.
///
/// # Errors
///
/// Returns [`ConfigError::RoutesFileParse`] if the document is not a mapping.
pub fn parse_catalogs(content: &str) -> Result<HashMap<Company, RouteCatalog>, ConfigError> {
    let document: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(content)?;
    let mut catalogs = HashMap::new();

    for (backend, entries) in document {
        let company = match backend.parse::<Company>() {
            Ok(c) => c,
            Err(reason) => {
                tracing::warn!(backend = %backend, %reason, "ignoring routes for unknown backend");
                continue;
            }
        };

        let serde_yaml::Value::Sequence(entries) = entries else {
            tracing::error!(
                company = %company,
                "routes must be a list of {{source, destination}} objects"
            );
            continue;
        };

        let routes = entries.into_iter().filter_map(|entry| {
            let raw = format!("{entry:?}");
            let parsed = serde_yaml::from_value::<RouteEntry>(entry)
                .map_err(|e| {
                    tracing::error!(
                        company = %company,
                        entry = %raw,
                        error = %e,
                        "not a valid route object"
                    );
                })
                .ok()?;
            match Route::new(&parsed.source, &parsed.destination) {
                Ok(route) => Some(route),
                Err(ConfigError::IdenticalPair(station)) => {
                    tracing::warn!(
                        company = %company,
                        station = %station,
                        "identical pair found; skipping"
                    );
                    None
                }
                Err(e) => {
                    tracing::error!(company = %company, error = %e, "skipping route");
                    None
                }
            }
        });

        catalogs.insert(company, RouteCatalog::new(routes.collect::<Vec<_>>()));
    }

    Ok(catalogs)
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
