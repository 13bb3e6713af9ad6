//! # Cull Result
//!
//! The per-frame collection of bins. Traversal feeds it objects one at a
//! time; once culling is finished it sorts every bin, draws them in the
//! manager's global order, and hands the next frame a fresh result that
//! already knows which bins exist.
//!
//! ## Transparency handling
//!
//! - **Binary** transparency becomes an opaque alpha test (`alpha == 1`).
//! - **Dual** transparency splits the object: the fully opaque texels draw
//!   with the opaque geometry, the rest draws blended in the transparent bin.
//!   An explicit bin on the state disables the split.

use std::sync::{Arc, LazyLock};

use super::{BinIndex, CullBin, CullBinManager, CullError, CullableObject, SharedBinManager};
use crate::render::context::RenderContext;
use crate::render::state::{
    AlphaTestAttrib, AlphaTestMode, RenderAttrib, RenderState, TransparencyAttrib, TransparencyMode,
};

/// Applied on top of `Binary` states: opaque texels only, no blending
static BINARY_STATE: LazyLock<Arc<RenderState>> = LazyLock::new(|| {
    opaque_alpha_state(AlphaTestMode::Equal, TransparencyMode::None)
});

/// Applied to the blended copy of a `Dual` object
static DUAL_TRANSPARENT_STATE: LazyLock<Arc<RenderState>> = LazyLock::new(|| {
    opaque_alpha_state(AlphaTestMode::Less, TransparencyMode::Alpha)
});

/// Applied to the opaque copy of a `Dual` object
static DUAL_OPAQUE_STATE: LazyLock<Arc<RenderState>> = LazyLock::new(|| {
    opaque_alpha_state(AlphaTestMode::Equal, TransparencyMode::None)
});

fn opaque_alpha_state(test: AlphaTestMode, transparency: TransparencyMode) -> Arc<RenderState> {
    RenderState::make(
        [
            RenderAttrib::AlphaTest(AlphaTestAttrib::new(test, 1.0)),
            RenderAttrib::Transparency(TransparencyAttrib::new(transparency)),
        ],
        RenderState::MAX_PRIORITY,
    )
}

/// Totals reported by [`CullResult::draw`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Bins that drew at least one object
    pub bins_drawn: usize,
    /// Objects drawn across all bins
    pub objects_drawn: usize,
}

/// Bins of one frame
pub struct CullResult {
    context: Arc<dyn RenderContext>,
    manager: SharedBinManager,
    bins: Vec<Option<CullBin>>,
}

impl CullResult {
    /// Create an empty result bound to a render context
    pub fn new(context: Arc<dyn RenderContext>, manager: SharedBinManager) -> Self {
        Self {
            context,
            manager,
            bins: Vec::new(),
        }
    }

    /// Render context every bin of this result draws through
    pub fn context(&self) -> &Arc<dyn RenderContext> {
        &self.context
    }

    /// Number of bin slots, including empty ones
    pub fn num_bin_slots(&self) -> usize {
        self.bins.len()
    }

    /// Bin at `index`, if this result has one
    pub fn bin(&self, index: BinIndex) -> Option<&CullBin> {
        self.bins.get(index.0).and_then(Option::as_ref)
    }

    /// Total objects waiting in all bins
    pub fn object_count(&self) -> usize {
        self.bins.iter().flatten().map(CullBin::len).sum()
    }

    /// Route an object into its bin, taking ownership
    ///
    /// Fails when the object's state resolves to a bin the manager does not
    /// know. That is a contract violation; the caller should abandon the
    /// frame rather than continue with content missing.
    pub fn add_object(&mut self, mut object: CullableObject) -> Result<(), CullError> {
        let registry = Arc::clone(&self.manager);
        let manager = registry.read();
        let state = Arc::clone(&object.state);

        match state.transparency_mode() {
            TransparencyMode::Binary => {
                object.state = state.compose(&BINARY_STATE);
            }
            TransparencyMode::Dual if !state.has_explicit_bin() => {
                let mut transparent_part = object.clone();
                transparent_part.state = state.compose(&DUAL_TRANSPARENT_STATE);
                object.state = state.compose(&DUAL_OPAQUE_STATE);

                // Both halves resolve before either is stored.
                self.prepare_bin(&manager, &transparent_part.state)?;
                self.prepare_bin(&manager, &object.state)?;
                self.route(&manager, transparent_part)?;
            }
            _ => {}
        }

        self.route(&manager, object)
    }

    /// Sort every bin for drawing
    ///
    /// Call once per frame, after the last `add_object` and before `draw`.
    pub fn finish_cull(&mut self) {
        for bin in self.bins.iter_mut().flatten() {
            bin.finish_cull();
        }
    }

    /// Draw all bins in the manager's global order
    ///
    /// Bins the manager does not order (removed bins) are never drawn, and
    /// inactive bins are skipped.
    pub fn draw(&mut self) -> DrawStats {
        let order: Vec<BinIndex> = {
            let manager = self.manager.read();
            manager
                .draw_order()
                .iter()
                .copied()
                .filter(|&index| manager.is_bin_active(index))
                .collect()
        };

        let mut stats = DrawStats::default();
        for index in order {
            if let Some(Some(bin)) = self.bins.get_mut(index.0) {
                let drawn = bin.draw();
                if drawn > 0 {
                    stats.bins_drawn += 1;
                    stats.objects_drawn += drawn;
                }
            }
        }
        log::trace!("Drew {} objects in {} bins", stats.objects_drawn, stats.bins_drawn);
        stats
    }

    /// Fresh result for the next frame
    ///
    /// Keeps the bin layout of this result: empty slots stay empty, every bin
    /// is replaced by its own `make_next`. Bins that have since been removed
    /// from the manager are dropped.
    #[must_use]
    pub fn make_next(&self) -> Self {
        let manager = self.manager.read();
        let bins = self
            .bins
            .iter()
            .map(|slot| {
                slot.as_ref()
                    .filter(|bin| manager.is_registered(bin.index()))
                    .map(CullBin::make_next)
            })
            .collect();

        Self {
            context: Arc::clone(&self.context),
            manager: Arc::clone(&self.manager),
            bins,
        }
    }

    /// Forget the bin at `index`
    ///
    /// Called when the bin is unregistered while this result is alive. Any
    /// objects still waiting in it are released undrawn.
    pub fn bin_removed(&mut self, index: BinIndex) {
        if let Some(bin) = self.bins.get_mut(index.0).and_then(Option::take) {
            if !bin.is_empty() {
                log::warn!(
                    "Bin '{}' removed with {} undrawn objects",
                    bin.name(),
                    bin.len()
                );
            }
        }
    }

    fn route(&mut self, manager: &CullBinManager, object: CullableObject) -> Result<(), CullError> {
        let index = manager.bin_index_for(&object.state)?;
        log::trace!("Routing {:?} to bin {index}", object.geom);
        self.bin_mut(manager, index)?.add_object(object);
        Ok(())
    }

    fn prepare_bin(&mut self, manager: &CullBinManager, state: &RenderState) -> Result<BinIndex, CullError> {
        let index = manager.bin_index_for(state)?;
        self.bin_mut(manager, index)?;
        Ok(index)
    }

    fn bin_mut(&mut self, manager: &CullBinManager, index: BinIndex) -> Result<&mut CullBin, CullError> {
        let slot = index.0;
        if self.bins.get(slot).map_or(true, Option::is_none) {
            let bin = manager
                .make_new_bin(index, Arc::clone(&self.context))
                .ok_or(CullError::MissingBin(index))?;
            if slot >= self.bins.len() {
                self.bins.resize_with(slot + 1, || None);
            }
            self.bins[slot] = Some(bin);
        }
        self.bins[slot].as_mut().ok_or(CullError::MissingBin(index))
    }
}

impl std::fmt::Debug for CullResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CullResult")
            .field("bins", &self.bins)
            .finish_non_exhaustive()
    }
}
