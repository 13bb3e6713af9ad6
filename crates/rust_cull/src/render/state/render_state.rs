//! Immutable, composable render state
//!
//! A `RenderState` is a set of attributes with at most one attribute per
//! `AttribKind`. States are shared by `Arc` and never mutated after
//! construction; composing two states produces a third.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;

use super::attrib::{
    AlphaTestAttrib, AttribKind, CullBinAttrib, RenderAttrib, TransparencyAttrib, TransparencyMode,
};
use crate::core::config::CullBinConfig;

#[derive(Debug, Clone, PartialEq)]
struct AttribEntry {
    attrib: RenderAttrib,
    priority: i32,
}

/// Immutable bag of render attributes keyed by kind
///
/// Identity is structural: two states holding the same attributes at the same
/// priorities compare equal and produce the same `sort_key`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderState {
    attribs: BTreeMap<AttribKind, AttribEntry>,
}

impl RenderState {
    /// Highest override priority; `with_priority` clamps to it
    pub const MAX_PRIORITY: i32 = 1_000_000_000;

    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared empty state
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Build a shared state from attributes, all at the same priority
    pub fn make<I>(attribs: I, priority: i32) -> Arc<Self>
    where
        I: IntoIterator<Item = RenderAttrib>,
    {
        let state = attribs
            .into_iter()
            .fold(Self::new(), |state, attrib| state.with_priority(attrib, priority));
        Arc::new(state)
    }

    /// Add or replace an attribute at priority 0
    #[must_use]
    pub fn with(self, attrib: impl Into<RenderAttrib>) -> Self {
        self.with_priority(attrib, 0)
    }

    /// Add or replace an attribute at the given override priority
    ///
    /// Priorities above `MAX_PRIORITY` are clamped to it.
    #[must_use]
    pub fn with_priority(mut self, attrib: impl Into<RenderAttrib>, priority: i32) -> Self {
        let attrib = attrib.into();
        let priority = priority.min(Self::MAX_PRIORITY);
        self.attribs.insert(attrib.kind(), AttribEntry { attrib, priority });
        self
    }

    /// Wrap for sharing
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// True if no attributes are set
    pub fn is_empty(&self) -> bool {
        self.attribs.is_empty()
    }

    /// Number of attributes set
    pub fn len(&self) -> usize {
        self.attribs.len()
    }

    /// Attribute of the given kind
    pub fn get(&self, kind: AttribKind) -> Option<&RenderAttrib> {
        self.attribs.get(&kind).map(|entry| &entry.attrib)
    }

    /// Override priority of the given kind
    pub fn priority(&self, kind: AttribKind) -> Option<i32> {
        self.attribs.get(&kind).map(|entry| entry.priority)
    }

    /// Alpha test attribute, if any
    pub fn alpha_test(&self) -> Option<&AlphaTestAttrib> {
        match self.get(AttribKind::AlphaTest) {
            Some(RenderAttrib::AlphaTest(attrib)) => Some(attrib),
            _ => None,
        }
    }

    /// Transparency attribute, if any
    pub fn transparency(&self) -> Option<&TransparencyAttrib> {
        match self.get(AttribKind::Transparency) {
            Some(RenderAttrib::Transparency(attrib)) => Some(attrib),
            _ => None,
        }
    }

    /// Transparency mode; a missing attribute reads as `None`
    pub fn transparency_mode(&self) -> TransparencyMode {
        self.transparency().map_or(TransparencyMode::None, TransparencyAttrib::mode)
    }

    /// Bin attribute, if any
    pub fn bin(&self) -> Option<&CullBinAttrib> {
        match self.get(AttribKind::CullBin) {
            Some(RenderAttrib::CullBin(attrib)) => Some(attrib),
            _ => None,
        }
    }

    /// True if a bin attribute names a bin
    pub fn has_explicit_bin(&self) -> bool {
        self.bin().is_some_and(|bin| !bin.bin_name().is_empty())
    }

    /// Name of the bin this state draws in
    ///
    /// Without an explicit bin, alpha and dual transparency go to the
    /// transparent bin and everything else to the opaque bin.
    pub fn bin_name(&self) -> &str {
        match self.bin() {
            Some(bin) if !bin.bin_name().is_empty() => bin.bin_name(),
            _ => match self.transparency_mode() {
                TransparencyMode::Alpha | TransparencyMode::Dual => CullBinConfig::TRANSPARENT_BIN,
                _ => CullBinConfig::OPAQUE_BIN,
            },
        }
    }

    /// Per-object draw order from the bin attribute, 0 if unset
    pub fn draw_order(&self) -> i32 {
        self.bin().map_or(0, CullBinAttrib::draw_order)
    }

    /// Compose `other` on top of this state
    ///
    /// Attributes in `other` replace attributes of the same kind unless the
    /// existing attribute has a strictly higher priority.
    pub fn compose(self: &Arc<Self>, other: &Arc<Self>) -> Arc<Self> {
        if other.is_empty() {
            return Arc::clone(self);
        }
        if self.is_empty() {
            return Arc::clone(other);
        }

        let mut attribs = self.attribs.clone();
        for (kind, entry) in &other.attribs {
            match attribs.get(kind) {
                Some(existing) if existing.priority > entry.priority => {}
                _ => {
                    attribs.insert(*kind, entry.clone());
                }
            }
        }
        Arc::new(Self { attribs })
    }

    /// Structural hash used to group identical states
    pub fn sort_key(&self) -> u64 {
        let mut hasher = FxHasher::default();
        for (kind, entry) in &self.attribs {
            kind.hash(&mut hasher);
            entry.attrib.hash(&mut hasher);
            entry.priority.hash(&mut hasher);
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::state::attrib::{AlphaTestMode, TextureId};

    fn alpha(mode: AlphaTestMode, reference: f32) -> AlphaTestAttrib {
        AlphaTestAttrib::new(mode, reference)
    }

    #[test]
    fn test_compose_overrides_matching_kinds() {
        let base = RenderState::new()
            .with(alpha(AlphaTestMode::Greater, 0.5))
            .with(TextureId(7))
            .into_shared();
        let over = RenderState::new().with(alpha(AlphaTestMode::Less, 0.25)).into_shared();

        let composed = base.compose(&over);
        assert_eq!(composed.alpha_test().unwrap().mode(), AlphaTestMode::Less);
        assert_eq!(composed.get(AttribKind::Texture), Some(&RenderAttrib::Texture(TextureId(7))));
        assert_eq!(composed.len(), 2);
    }

    #[test]
    fn test_compose_respects_higher_priority() {
        let base = RenderState::new()
            .with_priority(TransparencyAttrib::new(TransparencyMode::Alpha), 10)
            .into_shared();
        let low = RenderState::new()
            .with_priority(TransparencyAttrib::new(TransparencyMode::None), 5)
            .into_shared();
        let equal = RenderState::new()
            .with_priority(TransparencyAttrib::new(TransparencyMode::Binary), 10)
            .into_shared();

        assert_eq!(base.compose(&low).transparency_mode(), TransparencyMode::Alpha);
        assert_eq!(base.compose(&equal).transparency_mode(), TransparencyMode::Binary);
    }

    #[test]
    fn test_priority_clamps_to_max() {
        let base = RenderState::new()
            .with_priority(TransparencyAttrib::new(TransparencyMode::Binary), i32::MAX)
            .into_shared();
        assert_eq!(base.priority(AttribKind::Transparency), Some(RenderState::MAX_PRIORITY));

        let top = RenderState::make(
            [RenderAttrib::Transparency(TransparencyAttrib::new(TransparencyMode::None))],
            RenderState::MAX_PRIORITY,
        );
        assert_eq!(base.compose(&top).transparency_mode(), TransparencyMode::None);
    }

    #[test]
    fn test_compose_with_empty_shares() {
        let base = RenderState::new().with(TextureId(1)).into_shared();
        let empty = RenderState::empty();
        assert!(Arc::ptr_eq(&base.compose(&empty), &base));
        assert!(Arc::ptr_eq(&empty.compose(&base), &base));
    }

    #[test]
    fn test_default_bin_names() {
        assert_eq!(RenderState::new().bin_name(), "opaque");

        for (mode, expected) in [
            (TransparencyMode::Alpha, "transparent"),
            (TransparencyMode::Dual, "transparent"),
            (TransparencyMode::Binary, "opaque"),
            (TransparencyMode::Multisample, "opaque"),
        ] {
            let state = RenderState::new().with(TransparencyAttrib::new(mode));
            assert_eq!(state.bin_name(), expected, "{mode:?}");
        }
    }

    #[test]
    fn test_explicit_bin_name() {
        let state = RenderState::new()
            .with(TransparencyAttrib::new(TransparencyMode::Alpha))
            .with(CullBinAttrib::new("fixed", 3));
        assert!(state.has_explicit_bin());
        assert_eq!(state.bin_name(), "fixed");
        assert_eq!(state.draw_order(), 3);

        let unnamed = RenderState::new().with(CullBinAttrib::new("", 4));
        assert!(!unnamed.has_explicit_bin());
        assert_eq!(unnamed.bin_name(), "opaque");
        assert_eq!(unnamed.draw_order(), 4);
    }

    #[test]
    fn test_sort_key_is_structural() {
        let a = RenderState::new().with(TextureId(2)).with(RenderAttrib::DepthWrite(true));
        let b = RenderState::new().with(RenderAttrib::DepthWrite(true)).with(TextureId(2));
        let c = RenderState::new().with(TextureId(3)).with(RenderAttrib::DepthWrite(true));

        assert_eq!(a, b);
        assert_eq!(a.sort_key(), b.sort_key());
        assert_ne!(a.sort_key(), c.sort_key());
    }
}
