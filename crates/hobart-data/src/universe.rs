//! The fixed, ordered set of instruments analysed in a run.
//!
//! Index order is the canonical node order: every per-window vector and
//! matrix downstream is indexed by position in the [`Universe`].

use crate::error::{DataError, Result};
use crate::sector::Sector;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A single instrument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    /// Instrument name (ticker).
    pub name: String,

    /// Sector the instrument belongs to.
    pub sector: Sector,
}

impl Instrument {
    /// Create a new instrument.
    pub fn new(name: impl Into<String>, sector: Sector) -> Self {
        Self {
            name: name.into(),
            sector,
        }
    }
}

/// Ordered, duplicate-free instrument list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    instruments: Vec<Instrument>,
}

impl Universe {
    /// Build a universe, rejecting empty lists and duplicate names.
    pub fn new(instruments: Vec<Instrument>) -> Result<Self> {
        if instruments.is_empty() {
            return Err(DataError::EmptyUniverse);
        }

        let mut seen = HashSet::with_capacity(instruments.len());
        for instrument in &instruments {
            if !seen.insert(instrument.name.as_str()) {
                return Err(DataError::DuplicateInstrument(instrument.name.clone()));
            }
        }

        Ok(Self { instruments })
    }

    /// Number of instruments.
    pub const fn len(&self) -> usize {
        self.instruments.len()
    }

    /// Always false for a constructed universe.
    pub const fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Instruments in canonical order.
    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Instrument at `index`.
    pub fn get(&self, index: usize) -> Option<&Instrument> {
        self.instruments.get(index)
    }

    /// Instrument names in canonical order.
    pub fn names(&self) -> Vec<&str> {
        self.instruments.iter().map(|i| i.name.as_str()).collect()
    }

    /// Position of an instrument by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.instruments.iter().position(|i| i.name == name)
    }

    /// Sector of the instrument at `index`.
    pub fn sector_of(&self, index: usize) -> Option<Sector> {
        self.instruments.get(index).map(|i| i.sector)
    }

    /// Member indices grouped by sector, sectors in their natural order.
    pub fn sector_members(&self) -> BTreeMap<Sector, Vec<usize>> {
        let mut members: BTreeMap<Sector, Vec<usize>> = BTreeMap::new();
        for (idx, instrument) in self.instruments.iter().enumerate() {
            members.entry(instrument.sector).or_default().push(idx);
        }
        members
    }

    /// Distinct sectors present in the universe.
    pub fn sectors(&self) -> Vec<Sector> {
        self.sector_members().into_keys().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Universe {
        Universe::new(vec![
            Instrument::new("AAPL", Sector::Technology),
            Instrument::new("XOM", Sector::Energy),
            Instrument::new("MSFT", Sector::Technology),
        ])
        .unwrap()
    }

    #[test]
    fn test_universe_order_preserved() {
        let universe = sample();
        assert_eq!(universe.names(), vec!["AAPL", "XOM", "MSFT"]);
        assert_eq!(universe.index_of("MSFT"), Some(2));
        assert_eq!(universe.sector_of(1), Some(Sector::Energy));
    }

    #[test]
    fn test_sector_members() {
        let members = sample().sector_members();
        assert_eq!(members.len(), 2);
        assert_eq!(members[&Sector::Technology], vec![0, 2]);
        assert_eq!(members[&Sector::Energy], vec![1]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = Universe::new(vec![
            Instrument::new("AAPL", Sector::Technology),
            Instrument::new("AAPL", Sector::Energy),
        ])
        .unwrap_err();
        assert!(matches!(err, DataError::DuplicateInstrument(_)));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(
            Universe::new(Vec::new()),
            Err(DataError::EmptyUniverse)
        ));
    }
}
