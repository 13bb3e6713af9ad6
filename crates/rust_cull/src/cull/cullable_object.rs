//! Drawable records handed from traversal to the bins
//!
//! A `CullableObject` is the per-frame rendering data the traversal extracts
//! for one visible geometry. It is moved into exactly one bin and released
//! once that bin has drawn it.

use std::sync::Arc;

use crate::foundation::math::{Mat4, Point3};
use crate::render::state::RenderState;

slotmap::new_key_type! {
    /// Handle into the caller's geometry pool
    pub struct GeomKey;
}

/// One visible geometry with its resolved state and transform
#[derive(Debug, Clone)]
pub struct CullableObject {
    /// Geometry to draw
    pub geom: GeomKey,

    /// Fully composed render state; classification may replace it
    pub state: Arc<RenderState>,

    /// Local-to-world transform
    pub transform: Mat4,

    /// Center of the geometry's bounds in local space
    pub bounds_center: Point3,
}

impl CullableObject {
    /// Create an object whose bounds are centered on its local origin
    pub fn new(geom: GeomKey, state: Arc<RenderState>, transform: Mat4) -> Self {
        Self {
            geom,
            state,
            transform,
            bounds_center: Point3::origin(),
        }
    }

    /// Set the local bounds center
    #[must_use]
    pub fn with_bounds_center(mut self, center: Point3) -> Self {
        self.bounds_center = center;
        self
    }

    /// Bounds center in world space
    pub fn world_center(&self) -> Point3 {
        self.transform.transform_point(&self.bounds_center)
    }
}
