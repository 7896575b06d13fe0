#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod returns;
pub mod sector;
pub mod universe;

pub use error::{DataError, Result};
pub use loader::{MarketData, PriceTableLoader};
pub use returns::ReturnMatrix;
pub use sector::Sector;
pub use universe::{Instrument, Universe};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
