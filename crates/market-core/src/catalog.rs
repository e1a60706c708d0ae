//! Fixed table of tradable futures contracts.
//!
//! The table is plain data: it ships embedded in the crate and can be
//! replaced at startup by a JSON file with the same shape.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::{MarketError, MarketResult};

const BUILTIN_CATALOG: &str = include_str!("../data/futures.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    Energy,
    Metals,
    Indices,
    Bonds,
    Grains,
    Softs,
    #[default]
    Other,
}

impl Sector {
    pub fn name(&self) -> &'static str {
        match self {
            Sector::Energy => "Energy",
            Sector::Metals => "Metals",
            Sector::Indices => "Indices",
            Sector::Bonds => "Bonds",
            Sector::Grains => "Grains",
            Sector::Softs => "Softs",
            Sector::Other => "Other",
        }
    }
}

/// A catalog entry. Identity is the exchange ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    #[serde(rename = "ticker")]
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "topics")]
    pub default_topics: String,
    #[serde(default)]
    pub sector: Sector,
}

impl Instrument {
    /// Picker label, e.g. `Gold (GC=F)`
    pub fn label(&self) -> String {
        format!("{} ({})", self.display_name, self.id)
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    instruments: Vec<Instrument>,
}

impl Catalog {
    /// The 20 contracts bundled with the crate.
    pub fn builtin() -> MarketResult<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(json: &str) -> MarketResult<Self> {
        let instruments: Vec<Instrument> = serde_json::from_str(json)
            .map_err(|e| MarketError::InvalidData(format!("catalog: {}", e)))?;
        Self::new(instruments)
    }

    pub fn from_path(path: impl AsRef<Path>) -> MarketResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            MarketError::InvalidData(format!("catalog {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn new(instruments: Vec<Instrument>) -> MarketResult<Self> {
        if instruments.is_empty() {
            return Err(MarketError::InvalidData("catalog is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for instrument in &instruments {
            if instrument.id.trim().is_empty() {
                return Err(MarketError::InvalidData(format!(
                    "catalog entry '{}' has an empty ticker",
                    instrument.display_name
                )));
            }
            if !seen.insert(instrument.id.as_str()) {
                return Err(MarketError::InvalidData(format!(
                    "duplicate ticker in catalog: {}",
                    instrument.id
                )));
            }
        }

        Ok(Self { instruments })
    }

    pub fn get(&self, id: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.instruments.iter().position(|i| i.id == id)
    }

    /// Startup default. A catalog is never empty.
    pub fn first(&self) -> &Instrument {
        &self.instruments[0]
    }

    pub fn get_index(&self, index: usize) -> Option<&Instrument> {
        self.instruments.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Entries grouped by sector, sectors in first-appearance order.
    pub fn by_sector(&self) -> Vec<(Sector, Vec<&Instrument>)> {
        let mut groups: Vec<(Sector, Vec<&Instrument>)> = Vec::new();
        for instrument in &self.instruments {
            match groups.iter_mut().find(|(s, _)| *s == instrument.sector) {
                Some((_, members)) => members.push(instrument),
                None => groups.push((instrument.sector, vec![instrument])),
            }
        }
        groups
    }
}
