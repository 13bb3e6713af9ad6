//! Render context abstraction
//!
//! Bins never talk to a GPU API directly. They are bound to a `RenderContext`
//! when created and hand every object to it at draw time. The context also
//! owns the camera, so depth-sorted bins ask it for distances.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::cull::{CullableObject, GeomKey};
use crate::foundation::math::{self, Mat4, Point3, Vec3};
use crate::render::state::RenderState;

/// Backend interface used by cull bins
///
/// Implementations must be shareable across the cull and draw stages of the
/// frame pipeline.
pub trait RenderContext: Send + Sync {
    /// Camera-space depth of a world-space point
    fn compute_distance_to(&self, point: &Point3) -> f32;

    /// Called before a bin issues its draws
    fn begin_bin(&self, _bin_name: &str) {}

    /// Issue the draw for one object
    fn draw_object(&self, object: &CullableObject);

    /// Called after a bin has issued all of its draws
    fn end_bin(&self, _bin_name: &str) {}
}

/// One recorded draw
#[derive(Debug, Clone)]
pub struct DrawCall {
    /// Bin that issued the draw
    pub bin: String,
    /// Geometry drawn
    pub geom: GeomKey,
    /// State the geometry was drawn with
    pub state: Arc<RenderState>,
}

#[derive(Debug, Default)]
struct Recording {
    current_bin: Option<String>,
    calls: Vec<DrawCall>,
}

/// Headless context that records every draw in order
#[derive(Debug)]
pub struct RecordingContext {
    view: Mat4,
    recording: Mutex<Recording>,
}

impl RecordingContext {
    /// Context with an identity camera looking down -Z
    pub fn new() -> Self {
        Self::with_view(Mat4::identity())
    }

    /// Context with an explicit world-to-camera matrix
    pub fn with_view(view: Mat4) -> Self {
        Self {
            view,
            recording: Mutex::new(Recording::default()),
        }
    }

    /// Context with a camera at `eye` looking at `target`
    pub fn looking_from(eye: Point3, target: Point3) -> Self {
        Self::with_view(math::look_at(eye, target, Vec3::y()))
    }

    /// Number of draws recorded so far
    pub fn call_count(&self) -> usize {
        self.recording.lock().calls.len()
    }

    /// Remove and return all recorded draws
    pub fn take_calls(&self) -> Vec<DrawCall> {
        std::mem::take(&mut self.recording.lock().calls)
    }
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext for RecordingContext {
    fn compute_distance_to(&self, point: &Point3) -> f32 {
        math::view_depth(&self.view, point)
    }

    fn begin_bin(&self, bin_name: &str) {
        self.recording.lock().current_bin = Some(bin_name.to_string());
    }

    fn draw_object(&self, object: &CullableObject) {
        let mut recording = self.recording.lock();
        let bin = recording.current_bin.clone().unwrap_or_default();
        log::trace!("draw {:?} in bin {bin:?}", object.geom);
        recording.calls.push(DrawCall {
            bin,
            geom: object.geom,
            state: Arc::clone(&object.state),
        });
    }

    fn end_bin(&self, _bin_name: &str) {
        self.recording.lock().current_bin = None;
    }
}
