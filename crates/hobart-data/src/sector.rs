//! Sector classification carried by every instrument.

use crate::error::DataError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sector labels recognised in input tables (11 sectors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    /// Technology
    Technology,

    /// Communication Services
    CommunicationServices,

    /// Real Estate
    RealEstate,

    /// Basic Materials
    BasicMaterials,

    /// Energy
    Energy,

    /// Financial Services
    FinancialServices,

    /// Utilities
    Utilities,

    /// Industrials
    Industrials,

    /// Consumer Cyclical
    ConsumerCyclical,

    /// Healthcare
    Healthcare,

    /// Consumer Defensive
    ConsumerDefensive,
}

impl Sector {
    /// Returns all sectors.
    pub fn all() -> Vec<Self> {
        vec![
            Self::Technology,
            Self::CommunicationServices,
            Self::RealEstate,
            Self::BasicMaterials,
            Self::Energy,
            Self::FinancialServices,
            Self::Utilities,
            Self::Industrials,
            Self::ConsumerCyclical,
            Self::Healthcare,
            Self::ConsumerDefensive,
        ]
    }

    /// Returns the label used in input tables.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Technology => "technology",
            Self::CommunicationServices => "communication_services",
            Self::RealEstate => "real_estate",
            Self::BasicMaterials => "basic_materials",
            Self::Energy => "energy",
            Self::FinancialServices => "financial_services",
            Self::Utilities => "utilities",
            Self::Industrials => "industrials",
            Self::ConsumerCyclical => "consumer_cyclical",
            Self::Healthcare => "healthcare",
            Self::ConsumerDefensive => "consumer_defensive",
        }
    }

    /// Returns the name used in reports.
    ///
    /// Technology and communication services are reported together.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Technology | Self::CommunicationServices => "Technology + Communication Services",
            Self::RealEstate => "Real Estate",
            Self::BasicMaterials => "Basic Materials",
            Self::Energy => "Energy",
            Self::FinancialServices => "Financials",
            Self::Utilities => "Utilities",
            Self::Industrials => "Industrials",
            Self::ConsumerCyclical => "Consumer Cyclical",
            Self::Healthcare => "Healthcare",
            Self::ConsumerDefensive => "Consumer Defensive",
        }
    }

    /// Parse a sector from its table label.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::all().into_iter().find(|s| s.label() == label)
    }
}

impl FromStr for Sector {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| DataError::UnknownSector(s.to_string()))
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
