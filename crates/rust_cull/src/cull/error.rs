//! Cull subsystem errors

use thiserror::Error;

use super::BinIndex;
use crate::config::ConfigError;

/// Errors raised while registering bins or binning objects
#[derive(Error, Debug)]
pub enum CullError {
    /// A state names a bin that is not registered
    #[error("No bin named '{0}' is registered")]
    UnknownBin(String),

    /// The manager could not produce a bin for a resolved index
    #[error("Bin manager has no bin for index {0}")]
    MissingBin(BinIndex),

    /// A bin with this name already exists
    #[error("A bin named '{0}' is already registered")]
    DuplicateBin(String),

    /// A registry operation referenced an index that is not registered
    #[error("Bin index {0} is not registered")]
    InvalidBinIndex(BinIndex),

    /// The bin table failed validation
    #[error("Invalid bin configuration: {0}")]
    InvalidConfig(String),

    /// The bin table could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CullError {
    /// True for errors that mean drawable content would be lost
    ///
    /// These indicate a broken bin table or a bad state upstream. The frame
    /// that hit one is abandoned.
    pub const fn is_contract_violation(&self) -> bool {
        matches!(self, Self::UnknownBin(_) | Self::MissingBin(_))
    }
}
