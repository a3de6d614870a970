//! Read-only country directory keyed by dial code.

use crate::error::CountryError;
use crate::phone::DialCode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Dataset shipped with the crate: `[{"name", "dial_code", "code"}, ...]`.
const BUNDLED_DATASET: &str = include_str!("../data/country_codes.json");

/// A seeded country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: u64,
    pub dial_code: String,
    pub name: String,
    /// ISO 3166-1 alpha-2 region code, used to pick between countries
    /// sharing a dial code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// One entry of a country dataset, before ids are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CountrySeed {
    pub name: String,
    pub dial_code: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl CountrySeed {
    /// Parse the dataset bundled with the crate.
    pub fn bundled() -> Result<Vec<CountrySeed>, CountryError> {
        Self::parse(BUNDLED_DATASET)
    }

    /// Parse a JSON dataset.
    pub fn parse(json: &str) -> Result<Vec<CountrySeed>, CountryError> {
        let seeds: Vec<CountrySeed> = serde_json::from_str(json)?;
        if let Some(bad) = seeds
            .iter()
            .find(|s| s.name.trim().is_empty() || s.dial_code.trim().is_empty())
        {
            return Err(CountryError::Dataset(format!(
                "entry without name or dial code: {:?}",
                bad
            )));
        }
        Ok(seeds)
    }

    /// Read and parse a dataset file.
    pub fn load(path: &Path) -> Result<Vec<CountrySeed>, CountryError> {
        let json = std::fs::read_to_string(path)?;
        let seeds = Self::parse(&json)?;
        info!("Loaded {} countries from {:?}", seeds.len(), path);
        Ok(seeds)
    }
}

/// Outcome of resolving a dial code against the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountryLookup {
    Found(u64),
    NotFound,
}

/// Countries ordered by id. Built once at startup and never mutated.
#[derive(Debug, Clone, Default)]
pub struct CountryDirectory {
    countries: Vec<Country>,
}

impl CountryDirectory {
    /// Build a directory from dataset entries, assigning ids 1..=n in order.
    pub fn seed(entries: impl IntoIterator<Item = CountrySeed>) -> Self {
        let countries: Vec<Country> = entries
            .into_iter()
            .zip(1u64..)
            .map(|(seed, id)| Country {
                id,
                dial_code: seed.dial_code.trim().to_string(),
                name: seed.name.trim().to_string(),
                code: seed.code.map(|c| c.trim().to_ascii_uppercase()),
            })
            .collect();

        info!("Seeded country directory with {} countries", countries.len());
        Self { countries }
    }

    /// Rebuild a directory from previously stored records.
    pub fn from_records(mut countries: Vec<Country>) -> Self {
        countries.sort_by_key(|c| c.id);
        countries.dedup_by_key(|c| c.id);
        Self { countries }
    }

    /// All countries in id order.
    pub fn all(&self) -> &[Country] {
        &self.countries
    }

    pub fn get(&self, id: u64) -> Option<&Country> {
        self.countries
            .binary_search_by_key(&id, |c| c.id)
            .ok()
            .map(|i| &self.countries[i])
    }

    pub fn contains(&self, id: u64) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    fn with_dial_code<'a>(&'a self, dial_code: &'a str) -> impl Iterator<Item = &'a Country> {
        self.countries.iter().filter(move |c| c.dial_code == dial_code)
    }

    /// Id of the country with exactly this dial code.
    ///
    /// When several countries share the code, the lowest id wins.
    pub fn find_id_by_dial_code(&self, dial_code: &str) -> Result<u64, CountryError> {
        self.with_dial_code(dial_code)
            .map(|c| c.id)
            .next()
            .ok_or_else(|| CountryError::NotFound(dial_code.to_string()))
    }

    /// Resolve a dial code to a country.
    ///
    /// Among countries sharing the dial code, the one whose region matches
    /// the phone number's region wins. Next comes a country of that region
    /// stored under a longer code within the same calling code, such as
    /// "+1242" for a Bahamas number. Otherwise the lowest id with the dial
    /// code.
    pub fn lookup(&self, dial: &DialCode) -> CountryLookup {
        let in_region = |c: &&Country| c.code.as_deref().is_some_and(|code| dial.is_region(code));

        let found = self
            .with_dial_code(&dial.code)
            .find(in_region)
            .or_else(|| {
                self.countries
                    .iter()
                    .filter(|c| c.dial_code.starts_with(dial.code.as_str()))
                    .find(in_region)
            })
            .or_else(|| self.with_dial_code(&dial.code).next());

        match found {
            Some(country) => {
                debug!(dial_code = %dial.code, country_id = country.id, "Resolved country");
                CountryLookup::Found(country.id)
            }
            None => {
                debug!(dial_code = %dial.code, "No country for dial code");
                CountryLookup::NotFound
            }
        }
    }
}
