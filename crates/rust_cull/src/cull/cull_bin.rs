//! # Cull Bins
//!
//! A bin collects the objects of one frame that share a draw policy and
//! draws them, in its policy's order, when the frame's result is drawn.
//!
//! ## Policies
//!
//! - **Unsorted**: insertion order
//! - **StateSorted**: objects with identical render states drawn together
//! - **BackToFront**: farthest first, for alpha blending
//! - **FrontToBack**: nearest first, for early depth rejection
//! - **Fixed**: ascending per-object draw order from the bin attribute
//!
//! Every sort is stable, so objects with equal keys keep their insertion
//! order and do not flicker from frame to frame.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::CullableObject;
use crate::render::context::RenderContext;

/// Position of a bin in the manager's registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BinIndex(pub usize);

impl fmt::Display for BinIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sort and draw policy of a bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinType {
    /// Draw in insertion order
    Unsorted,
    /// Group identical render states
    StateSorted,
    /// Farthest object first
    BackToFront,
    /// Nearest object first
    FrontToBack,
    /// Ascending explicit draw order
    Fixed,
}

impl BinType {
    const fn sorts_by_distance(self) -> bool {
        matches!(self, Self::BackToFront | Self::FrontToBack)
    }
}

#[derive(Debug)]
struct BinEntry {
    object: CullableObject,
    distance: f32,
}

/// Objects of one bin for one frame
pub struct CullBin {
    index: BinIndex,
    name: Arc<str>,
    bin_type: BinType,
    context: Arc<dyn RenderContext>,
    entries: Vec<BinEntry>,
    depth_total: f64,
    depth_samples: usize,
    depth_hint: Option<f32>,
}

impl CullBin {
    /// Create an empty bin bound to a render context
    pub fn new(
        index: BinIndex,
        name: Arc<str>,
        bin_type: BinType,
        context: Arc<dyn RenderContext>,
    ) -> Self {
        Self {
            index,
            name,
            bin_type,
            context,
            entries: Vec::new(),
            depth_total: 0.0,
            depth_samples: 0,
            depth_hint: None,
        }
    }

    /// Registry index
    pub const fn index(&self) -> BinIndex {
        self.index
    }

    /// Bin name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Policy
    pub const fn bin_type(&self) -> BinType {
        self.bin_type
    }

    /// Objects waiting to be drawn
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is waiting to be drawn
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Objects in current order
    pub fn objects(&self) -> impl Iterator<Item = &CullableObject> {
        self.entries.iter().map(|entry| &entry.object)
    }

    /// Average camera distance of the previous frame's objects
    ///
    /// Only depth-sorted bins track this.
    pub const fn depth_hint(&self) -> Option<f32> {
        self.depth_hint
    }

    /// Take ownership of an object
    pub fn add_object(&mut self, object: CullableObject) {
        let distance = if self.bin_type.sorts_by_distance() {
            let distance = self.context.compute_distance_to(&object.world_center());
            self.depth_total += f64::from(distance);
            self.depth_samples += 1;
            distance
        } else {
            0.0
        };
        self.entries.push(BinEntry { object, distance });
    }

    /// Put the objects in draw order
    pub fn finish_cull(&mut self) {
        match self.bin_type {
            BinType::Unsorted => {}
            BinType::StateSorted => {
                self.entries.sort_by_cached_key(|entry| entry.object.state.sort_key());
            }
            BinType::BackToFront => {
                self.entries.sort_by(|a, b| b.distance.total_cmp(&a.distance));
            }
            BinType::FrontToBack => {
                self.entries.sort_by(|a, b| a.distance.total_cmp(&b.distance));
            }
            BinType::Fixed => {
                self.entries.sort_by_key(|entry| entry.object.state.draw_order());
            }
        }
    }

    /// Draw every object through the context and release them
    ///
    /// Returns the number of objects drawn.
    pub fn draw(&mut self) -> usize {
        if self.entries.is_empty() {
            return 0;
        }

        let count = self.entries.len();
        self.context.begin_bin(&self.name);
        for entry in self.entries.drain(..) {
            self.context.draw_object(&entry.object);
        }
        self.context.end_bin(&self.name);
        count
    }

    /// Empty bin of the same identity for the next frame
    #[must_use]
    pub fn make_next(&self) -> Self {
        let mut next = Self::new(
            self.index,
            Arc::clone(&self.name),
            self.bin_type,
            Arc::clone(&self.context),
        );
        if self.bin_type.sorts_by_distance() {
            next.depth_hint = self.average_depth().or(self.depth_hint);
        }
        next
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn average_depth(&self) -> Option<f32> {
        (self.depth_samples > 0).then(|| (self.depth_total / self.depth_samples as f64) as f32)
    }
}

impl fmt::Debug for CullBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CullBin")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("bin_type", &self.bin_type)
            .field("objects", &self.entries.len())
            .field("depth_hint", &self.depth_hint)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cull::GeomKey;
    use crate::foundation::math::{Mat4, Vec3};
    use crate::render::context::RecordingContext;
    use crate::render::state::{CullBinAttrib, RenderState, TextureId};
    use approx::assert_relative_eq;
    use slotmap::SlotMap;

    struct Fixture {
        context: Arc<RecordingContext>,
        geoms: SlotMap<GeomKey, &'static str>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                context: Arc::new(RecordingContext::new()),
                geoms: SlotMap::with_key(),
            }
        }

        fn bin(&self, bin_type: BinType) -> CullBin {
            CullBin::new(BinIndex(0), Arc::from("test"), bin_type, self.context.clone())
        }

        fn object_at(&mut self, name: &'static str, depth: f32, state: Arc<RenderState>) -> CullableObject {
            let geom = self.geoms.insert(name);
            CullableObject::new(geom, state, Mat4::new_translation(&Vec3::new(0.0, 0.0, -depth)))
        }

        fn drawn_names(&self) -> Vec<&'static str> {
            self.context
                .take_calls()
                .iter()
                .map(|call| self.geoms[call.geom])
                .collect()
        }
    }

    #[test]
    fn test_unsorted_keeps_insertion_order() {
        let mut fx = Fixture::new();
        let mut bin = fx.bin(BinType::Unsorted);
        for (name, depth) in [("a", 5.0), ("b", 1.0), ("c", 3.0)] {
            let object = fx.object_at(name, depth, RenderState::empty());
            bin.add_object(object);
        }

        bin.finish_cull();
        assert_eq!(bin.draw(), 3);
        assert_eq!(fx.drawn_names(), vec!["a", "b", "c"]);
        assert!(bin.is_empty());
    }

    #[test]
    fn test_back_to_front_is_stable() {
        let mut fx = Fixture::new();
        let mut bin = fx.bin(BinType::BackToFront);
        for (name, depth) in [("near", 1.0), ("tie_a", 4.0), ("far", 9.0), ("tie_b", 4.0)] {
            let object = fx.object_at(name, depth, RenderState::empty());
            bin.add_object(object);
        }

        bin.finish_cull();
        bin.draw();
        assert_eq!(fx.drawn_names(), vec!["far", "tie_a", "tie_b", "near"]);
    }

    #[test]
    fn test_front_to_back() {
        let mut fx = Fixture::new();
        let mut bin = fx.bin(BinType::FrontToBack);
        for (name, depth) in [("mid", 3.0), ("far", 8.0), ("near", 0.5)] {
            let object = fx.object_at(name, depth, RenderState::empty());
            bin.add_object(object);
        }

        bin.finish_cull();
        bin.draw();
        assert_eq!(fx.drawn_names(), vec!["near", "mid", "far"]);
    }

    #[test]
    fn test_fixed_uses_draw_order() {
        let mut fx = Fixture::new();
        let mut bin = fx.bin(BinType::Fixed);
        let order = |n: i32| RenderState::new().with(CullBinAttrib::new("fixed", n)).into_shared();
        for (name, n) in [("third", 3), ("first", -1), ("second_a", 2), ("second_b", 2)] {
            let object = fx.object_at(name, 1.0, order(n));
            bin.add_object(object);
        }

        bin.finish_cull();
        bin.draw();
        assert_eq!(fx.drawn_names(), vec!["first", "second_a", "second_b", "third"]);
    }

    #[test]
    fn test_state_sorted_groups_identical_states() {
        let mut fx = Fixture::new();
        let mut bin = fx.bin(BinType::StateSorted);
        let tex = |id: u32| RenderState::new().with(TextureId(id)).into_shared();
        for (name, id) in [("a1", 1), ("b1", 2), ("a2", 1), ("b2", 2), ("a3", 1)] {
            let object = fx.object_at(name, 1.0, tex(id));
            bin.add_object(object);
        }

        bin.finish_cull();
        let keys: Vec<u64> = bin.objects().map(|object| object.state.sort_key()).collect();
        let mut groups = keys;
        groups.dedup();
        assert_eq!(groups.len(), 2);

        bin.draw();
        let names = fx.drawn_names();
        let a_positions: Vec<usize> = names
            .iter()
            .enumerate()
            .filter(|(_, name)| name.starts_with('a'))
            .map(|(i, _)| i)
            .collect();
        assert!(a_positions == vec![0, 1, 2] || a_positions == vec![2, 3, 4]);
        let a_names: Vec<&str> = names.iter().copied().filter(|name| name.starts_with('a')).collect();
        assert_eq!(a_names, vec!["a1", "a2", "a3"]);
    }

    #[test]
    fn test_make_next_carries_depth_hint_only() {
        let mut fx = Fixture::new();
        let mut bin = fx.bin(BinType::BackToFront);
        for depth in [2.0, 4.0] {
            let object = fx.object_at("x", depth, RenderState::empty());
            bin.add_object(object);
        }

        let next = bin.make_next();
        assert!(next.is_empty());
        assert_eq!(next.index(), bin.index());
        assert_eq!(next.name(), "test");
        assert_eq!(next.bin_type(), BinType::BackToFront);
        assert_relative_eq!(next.depth_hint().unwrap(), 3.0);

        // An empty frame keeps the previous hint.
        let after_empty = next.make_next();
        assert_relative_eq!(after_empty.depth_hint().unwrap(), 3.0);

        let mut unsorted = fx.bin(BinType::Unsorted);
        let object = fx.object_at("y", 2.0, RenderState::empty());
        unsorted.add_object(object);
        assert_eq!(unsorted.make_next().depth_hint(), None);
    }

    #[test]
    fn test_empty_bin_draws_nothing() {
        let fx = Fixture::new();
        let mut bin = fx.bin(BinType::StateSorted);
        bin.finish_cull();
        assert_eq!(bin.draw(), 0);
        assert_eq!(fx.context.call_count(), 0);
    }
}
