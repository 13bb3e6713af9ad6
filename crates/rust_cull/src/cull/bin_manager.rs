//! # Cull Bin Manager
//!
//! Registry of every render bin known to the renderer. It maps bin names to
//! stable indices, remembers each bin's policy and sort value, and owns the
//! global draw order that every `CullResult` follows.
//!
//! Indices are never reused: removing a bin leaves a hole so that indices
//! cached in live results can never alias a different bin.
//!
//! The manager is shared between pipeline stages as a [`SharedBinManager`].
//! Cull and draw take read locks; changing the registry takes the write lock.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{BinIndex, BinType, CullBin, CullError};
use crate::core::config::{BinDefinition, CullBinConfig};
use crate::render::context::RenderContext;
use crate::render::state::RenderState;

/// Bin manager handle shared by the cull and draw stages
pub type SharedBinManager = Arc<RwLock<CullBinManager>>;

#[derive(Debug, Clone)]
struct BinRecord {
    name: Arc<str>,
    bin_type: BinType,
    sort: i32,
    active: bool,
}

/// Registry of bins and their global draw order
#[derive(Debug, Default)]
pub struct CullBinManager {
    bins: Vec<Option<BinRecord>>,
    names: FxHashMap<Arc<str>, BinIndex>,
    draw_order: Vec<BinIndex>,
}

impl CullBinManager {
    /// Create a manager with no bins
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager with the stock bin table
    pub fn with_default_bins() -> Self {
        Self::from_config(&CullBinConfig::default()).unwrap_or_default()
    }

    /// Create a manager from a bin table
    pub fn from_config(config: &CullBinConfig) -> Result<Self, CullError> {
        config.validate().map_err(CullError::InvalidConfig)?;

        let mut manager = Self::new();
        for definition in &config.bins {
            manager.register(definition);
        }
        manager.rebuild_draw_order();
        log::debug!("Registered {} cull bins", manager.get_num_bins());
        Ok(manager)
    }

    /// Wrap for sharing between pipeline stages
    pub fn into_shared(self) -> SharedBinManager {
        Arc::new(RwLock::new(self))
    }

    /// Register a new bin
    pub fn add_bin(&mut self, name: &str, bin_type: BinType, sort: i32) -> Result<BinIndex, CullError> {
        if name.is_empty() {
            return Err(CullError::InvalidConfig("Bin name cannot be empty".to_string()));
        }
        if self.names.contains_key(name) {
            return Err(CullError::DuplicateBin(name.to_string()));
        }

        let index = self.register(&BinDefinition::new(name, bin_type, sort));
        self.rebuild_draw_order();
        log::debug!("Added cull bin '{name}' ({bin_type:?}, sort {sort}) at index {index}");
        Ok(index)
    }

    /// Make an extra name resolve to an existing bin
    ///
    /// Lets a renderer without a separate pass for some default bin fold it
    /// into another one, e.g. drawing "transparent" objects in "opaque".
    pub fn alias_bin(&mut self, alias: &str, index: BinIndex) -> Result<(), CullError> {
        if !self.is_registered(index) {
            return Err(CullError::InvalidBinIndex(index));
        }
        if alias.is_empty() {
            return Err(CullError::InvalidConfig("Bin name cannot be empty".to_string()));
        }
        if self.names.contains_key(alias) {
            return Err(CullError::DuplicateBin(alias.to_string()));
        }
        self.names.insert(Arc::from(alias), index);
        Ok(())
    }

    /// Unregister a bin and every name that resolves to it
    ///
    /// The index stays reserved. Results that still hold a bin for it skip it
    /// at draw time and drop it in `make_next`.
    pub fn remove_bin(&mut self, index: BinIndex) -> Result<(), CullError> {
        let record = self
            .bins
            .get_mut(index.0)
            .and_then(Option::take)
            .ok_or(CullError::InvalidBinIndex(index))?;

        self.names.retain(|_, bound| *bound != index);
        self.rebuild_draw_order();
        log::debug!("Removed cull bin '{}' at index {index}", record.name);
        Ok(())
    }

    /// Index of the named bin
    pub fn find_bin(&self, name: &str) -> Option<BinIndex> {
        self.names.get(name).copied()
    }

    /// True if the index names a currently registered bin
    pub fn is_registered(&self, index: BinIndex) -> bool {
        self.record(index).is_some()
    }

    /// Number of registered bins
    pub fn get_num_bins(&self) -> usize {
        self.draw_order.len()
    }

    /// Bin index at position `n` of the global draw order
    pub fn get_bin(&self, n: usize) -> Option<BinIndex> {
        self.draw_order.get(n).copied()
    }

    /// All registered bin indices in draw order
    pub fn draw_order(&self) -> &[BinIndex] {
        &self.draw_order
    }

    /// Name of a registered bin
    pub fn bin_name(&self, index: BinIndex) -> Option<&str> {
        self.record(index).map(|record| &*record.name)
    }

    /// Policy of a registered bin
    pub fn bin_type(&self, index: BinIndex) -> Option<BinType> {
        self.record(index).map(|record| record.bin_type)
    }

    /// Sort value of a registered bin
    pub fn bin_sort(&self, index: BinIndex) -> Option<i32> {
        self.record(index).map(|record| record.sort)
    }

    /// Move a bin within the draw order
    pub fn set_bin_sort(&mut self, index: BinIndex, sort: i32) -> Result<(), CullError> {
        self.record_mut(index)?.sort = sort;
        self.rebuild_draw_order();
        Ok(())
    }

    /// True if a registered bin is drawn
    pub fn is_bin_active(&self, index: BinIndex) -> bool {
        self.record(index).is_some_and(|record| record.active)
    }

    /// Enable or disable drawing of a bin
    ///
    /// Objects are still culled into inactive bins.
    pub fn set_bin_active(&mut self, index: BinIndex, active: bool) -> Result<(), CullError> {
        self.record_mut(index)?.active = active;
        Ok(())
    }

    /// Index of the bin a state draws in
    pub fn bin_index_for(&self, state: &RenderState) -> Result<BinIndex, CullError> {
        let name = state.bin_name();
        self.find_bin(name)
            .ok_or_else(|| CullError::UnknownBin(name.to_string()))
    }

    /// Build an empty bin of the configured policy for a registered index
    ///
    /// Returns `None` when the index is not registered.
    pub fn make_new_bin(&self, index: BinIndex, context: Arc<dyn RenderContext>) -> Option<CullBin> {
        let record = self.record(index)?;
        log::debug!("Creating {:?} bin '{}' for index {index}", record.bin_type, record.name);
        Some(CullBin::new(index, Arc::clone(&record.name), record.bin_type, context))
    }

    fn register(&mut self, definition: &BinDefinition) -> BinIndex {
        let index = BinIndex(self.bins.len());
        let name: Arc<str> = Arc::from(definition.name.as_str());
        self.bins.push(Some(BinRecord {
            name: Arc::clone(&name),
            bin_type: definition.bin_type,
            sort: definition.sort,
            active: definition.active,
        }));
        self.names.insert(name, index);
        index
    }

    fn record(&self, index: BinIndex) -> Option<&BinRecord> {
        self.bins.get(index.0).and_then(Option::as_ref)
    }

    fn record_mut(&mut self, index: BinIndex) -> Result<&mut BinRecord, CullError> {
        self.bins
            .get_mut(index.0)
            .and_then(Option::as_mut)
            .ok_or(CullError::InvalidBinIndex(index))
    }

    fn rebuild_draw_order(&mut self) {
        let mut order: Vec<(i32, BinIndex)> = self
            .bins
            .iter()
            .enumerate()
            .filter_map(|(i, record)| record.as_ref().map(|record| (record.sort, BinIndex(i))))
            .collect();
        order.sort_unstable();
        self.draw_order = order.into_iter().map(|(_, index)| index).collect();
    }
}
