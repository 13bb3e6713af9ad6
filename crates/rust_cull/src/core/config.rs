//! # Cull Bin Configuration
//!
//! The table of render bins a renderer registers at start-up. Each entry
//! names a bin, picks its sort policy and gives it a sort value that places
//! it in the global draw order (lower values draw first).
//!
//! ```toml
//! [[bins]]
//! name = "opaque"
//! bin_type = "state_sorted"
//! sort = 20
//! ```

use std::collections::HashSet;

use serde::{Serialize, Deserialize};

use crate::config::Config;
use crate::cull::BinType;

/// One registered bin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinDefinition {
    /// Unique bin name, referenced by `CullBinAttrib`
    pub name: String,
    /// Sort and draw policy
    pub bin_type: BinType,
    /// Position in the global draw order, ascending
    pub sort: i32,
    /// Inactive bins are culled into but never drawn
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl BinDefinition {
    /// Create an active bin definition
    pub fn new(name: impl Into<String>, bin_type: BinType, sort: i32) -> Self {
        Self {
            name: name.into(),
            bin_type,
            sort,
            active: true,
        }
    }

    /// Set whether the bin is drawn
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// Complete bin table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CullBinConfig {
    /// Bins in registration order; registration order is not draw order
    pub bins: Vec<BinDefinition>,
}

impl CullBinConfig {
    /// Name of the bin objects land in when they carry no explicit bin
    pub const OPAQUE_BIN: &'static str = "opaque";
    /// Name of the default bin for alpha-blended objects
    pub const TRANSPARENT_BIN: &'static str = "transparent";

    /// An empty table
    pub fn empty() -> Self {
        Self { bins: Vec::new() }
    }

    /// Append a bin definition
    #[must_use]
    pub fn with_bin(mut self, bin: BinDefinition) -> Self {
        self.bins.push(bin);
        self
    }

    /// Validate the table
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for bin in &self.bins {
            if bin.name.is_empty() {
                return Err("Bin name cannot be empty".to_string());
            }
            if !seen.insert(bin.name.as_str()) {
                return Err(format!("Bin '{}' is defined more than once", bin.name));
            }
        }
        Ok(())
    }
}

impl Default for CullBinConfig {
    fn default() -> Self {
        Self::empty()
            .with_bin(BinDefinition::new("background", BinType::Fixed, 10))
            .with_bin(BinDefinition::new(Self::OPAQUE_BIN, BinType::StateSorted, 20))
            .with_bin(BinDefinition::new(Self::TRANSPARENT_BIN, BinType::BackToFront, 30))
            .with_bin(BinDefinition::new("fixed", BinType::Fixed, 40))
            .with_bin(BinDefinition::new("unsorted", BinType::Unsorted, 50))
    }
}

impl Config for CullBinConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;

    #[test]
    fn test_default_table() {
        let config = CullBinConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bins.len(), 5);
        assert!(config.bins.iter().any(|b| b.name == CullBinConfig::OPAQUE_BIN));
        assert!(config.bins.iter().any(|b| b.name == CullBinConfig::TRANSPARENT_BIN));
    }

    #[test]
    fn test_parse_toml() {
        let text = r#"
            [[bins]]
            name = "opaque"
            bin_type = "state_sorted"
            sort = 20

            [[bins]]
            name = "hud"
            bin_type = "fixed"
            sort = 100
            active = false
        "#;

        let config = CullBinConfig::parse(text, ConfigFormat::Toml).unwrap();
        assert_eq!(config.bins.len(), 2);
        assert_eq!(config.bins[0], BinDefinition::new("opaque", BinType::StateSorted, 20));
        assert_eq!(config.bins[1].bin_type, BinType::Fixed);
        assert!(!config.bins[1].active);
    }

    #[test]
    fn test_parse_ron() {
        let text = r#"(
            bins: [
                (name: "transparent", bin_type: back_to_front, sort: 30),
                (name: "decals", bin_type: front_to_back, sort: 25),
            ],
        )"#;

        let config = CullBinConfig::parse(text, ConfigFormat::Ron).unwrap();
        assert_eq!(config.bins[0].bin_type, BinType::BackToFront);
        assert_eq!(config.bins[1].bin_type, BinType::FrontToBack);
        assert!(config.bins[1].active);
    }

    #[test]
    fn test_toml_render_and_parse_preserve_table() {
        let config = CullBinConfig::default();
        let text = config.render(ConfigFormat::Toml).unwrap();
        assert_eq!(CullBinConfig::parse(&text, ConfigFormat::Toml).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let config = CullBinConfig::empty()
            .with_bin(BinDefinition::new("opaque", BinType::StateSorted, 20))
            .with_bin(BinDefinition::new("opaque", BinType::Unsorted, 30));
        assert!(config.validate().is_err());

        let config = CullBinConfig::empty().with_bin(BinDefinition::new("", BinType::Unsorted, 0));
        assert!(config.validate().is_err());
    }
}
