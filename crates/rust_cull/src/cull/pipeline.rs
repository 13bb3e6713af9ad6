//! # Frame Pipeline
//!
//! Drives the cull → draw sequence across frames. Culling frame N+1 only
//! needs the result seeded by frame N's `make_next`, so the culled frame N
//! can be drawn on another thread while the next cull runs.
//!
//! ```text
//! cull N   ──► CulledFrame N ──► draw N (any thread)
//!   │
//!   └─ make_next ──► cull N+1 ──► CulledFrame N+1 ──► draw N+1
//! ```

use std::sync::Arc;

use super::{BinIndex, CullBinManager, CullError, CullResult, DrawStats, SharedBinManager};
use crate::core::config::CullBinConfig;
use crate::render::context::RenderContext;

/// A finished cull, ready to draw
#[derive(Debug)]
pub struct CulledFrame {
    frame_number: u64,
    result: CullResult,
}

impl CulledFrame {
    /// Frame counter, starting at 0
    pub const fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// The sorted bins of this frame
    pub const fn result(&self) -> &CullResult {
        &self.result
    }

    /// Draw the frame and release its objects
    pub fn draw(mut self) -> DrawStats {
        let stats = self.result.draw();
        log::debug!(
            "Frame {}: drew {} objects in {} bins",
            self.frame_number,
            stats.objects_drawn,
            stats.bins_drawn
        );
        stats
    }
}

/// Owner of the bin registry and the result seeded for the next frame
pub struct FramePipeline {
    manager: SharedBinManager,
    context: Arc<dyn RenderContext>,
    pending: Option<CullResult>,
    frame_number: u64,
}

impl FramePipeline {
    /// Create a pipeline over an existing registry
    pub fn new(manager: SharedBinManager, context: Arc<dyn RenderContext>) -> Self {
        log::info!("Frame pipeline initialized with {} bins", manager.read().get_num_bins());
        Self {
            manager,
            context,
            pending: None,
            frame_number: 0,
        }
    }

    /// Create a pipeline and its registry from a bin table
    pub fn from_config(config: &CullBinConfig, context: Arc<dyn RenderContext>) -> Result<Self, CullError> {
        let manager = CullBinManager::from_config(config)?.into_shared();
        Ok(Self::new(manager, context))
    }

    /// Shared bin registry
    pub const fn manager(&self) -> &SharedBinManager {
        &self.manager
    }

    /// Number of frames culled so far
    pub const fn frames_culled(&self) -> u64 {
        self.frame_number
    }

    /// Result the next `cull_frame` will fill, if one has been seeded
    pub const fn pending(&self) -> Option<&CullResult> {
        self.pending.as_ref()
    }

    /// Cull one frame
    ///
    /// `traverse` feeds the frame's visible objects into the result. On
    /// success the result is finished, the next frame's result is seeded from
    /// it, and the finished frame is returned for drawing. On failure the
    /// partial frame is discarded and the next frame starts fresh.
    pub fn cull_frame<F>(&mut self, traverse: F) -> Result<CulledFrame, CullError>
    where
        F: FnOnce(&mut CullResult) -> Result<(), CullError>,
    {
        let mut result = self
            .pending
            .take()
            .unwrap_or_else(|| CullResult::new(Arc::clone(&self.context), Arc::clone(&self.manager)));

        if let Err(err) = traverse(&mut result) {
            log::error!("Cull of frame {} abandoned: {err}", self.frame_number);
            return Err(err);
        }

        result.finish_cull();
        self.pending = Some(result.make_next());

        let frame = CulledFrame {
            frame_number: self.frame_number,
            result,
        };
        self.frame_number += 1;
        Ok(frame)
    }

    /// Unregister a bin and drop it from the seeded result
    ///
    /// Frames already handed out for drawing skip the bin on their own.
    pub fn remove_bin(&mut self, index: BinIndex) -> Result<(), CullError> {
        self.manager.write().remove_bin(index)?;
        if let Some(pending) = self.pending.as_mut() {
            pending.bin_removed(index);
        }
        Ok(())
    }

    /// Tear the pipeline down, releasing the seeded result
    pub fn shutdown(mut self) {
        self.pending = None;
        log::info!("Frame pipeline shut down after {} frames", self.frame_number);
    }
}

impl std::fmt::Debug for FramePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramePipeline")
            .field("frame_number", &self.frame_number)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cull::{CullableObject, GeomKey};
    use crate::foundation::math::Mat4;
    use crate::render::context::RecordingContext;
    use crate::render::state::{CullBinAttrib, RenderState, TransparencyAttrib, TransparencyMode};
    use slotmap::SlotMap;

    fn pipeline() -> (FramePipeline, Arc<RecordingContext>) {
        let context = Arc::new(RecordingContext::new());
        let pipeline = FramePipeline::from_config(&CullBinConfig::default(), context.clone()).unwrap();
        (pipeline, context)
    }

    fn object(geoms: &mut SlotMap<GeomKey, ()>, state: RenderState) -> CullableObject {
        CullableObject::new(geoms.insert(()), state.into_shared(), Mat4::identity())
    }

    #[test]
    fn test_frames_are_numbered_and_seeded() {
        let (mut pipeline, context) = pipeline();
        let mut geoms = SlotMap::with_key();
        assert!(pipeline.pending().is_none());

        let alpha = RenderState::new().with(TransparencyAttrib::new(TransparencyMode::Alpha));
        let frame = pipeline
            .cull_frame(|result| result.add_object(object(&mut geoms, alpha)))
            .unwrap();
        assert_eq!(frame.frame_number(), 0);
        assert_eq!(frame.result().object_count(), 1);

        let transparent = pipeline.manager().read().find_bin("transparent").unwrap();
        let pending = pipeline.pending().unwrap();
        assert!(pending.bin(transparent).is_some_and(|bin| bin.is_empty()));

        let next = pipeline.cull_frame(|_| Ok(())).unwrap();
        assert_eq!(next.frame_number(), 1);
        assert_eq!(pipeline.frames_culled(), 2);

        assert_eq!(frame.draw().objects_drawn, 1);
        assert_eq!(next.draw().objects_drawn, 0);
        assert_eq!(context.call_count(), 1);
    }

    #[test]
    fn test_draw_on_other_thread_while_culling() {
        let (mut pipeline, context) = pipeline();
        let mut geoms = SlotMap::with_key();

        let first = pipeline
            .cull_frame(|result| result.add_object(object(&mut geoms, RenderState::new())))
            .unwrap();

        std::thread::scope(|scope| {
            let drawing = scope.spawn(move || first.draw());
            let second = pipeline
                .cull_frame(|result| {
                    result.add_object(object(&mut geoms, RenderState::new()))?;
                    result.add_object(object(&mut geoms, RenderState::new()))
                })
                .unwrap();
            assert_eq!(drawing.join().unwrap().objects_drawn, 1);
            assert_eq!(second.draw().objects_drawn, 2);
        });

        assert_eq!(context.call_count(), 3);
    }

    #[test]
    fn test_failed_cull_resets_pending() {
        let (mut pipeline, _context) = pipeline();
        let mut geoms = SlotMap::with_key();

        pipeline.cull_frame(|_| Ok(())).unwrap();
        assert!(pipeline.pending().is_some());

        let bad = RenderState::new().with(CullBinAttrib::new("missing", 0));
        let err = pipeline
            .cull_frame(|result| result.add_object(object(&mut geoms, bad)))
            .unwrap_err();
        assert!(err.is_contract_violation());
        assert!(pipeline.pending().is_none());
        assert_eq!(pipeline.frames_culled(), 1);
    }

    #[test]
    fn test_remove_bin_updates_pending_and_in_flight() {
        let (mut pipeline, context) = pipeline();
        let mut geoms = SlotMap::with_key();
        let alpha = RenderState::new().with(TransparencyAttrib::new(TransparencyMode::Alpha));

        let in_flight = pipeline
            .cull_frame(|result| {
                result.add_object(object(&mut geoms, alpha))?;
                result.add_object(object(&mut geoms, RenderState::new()))
            })
            .unwrap();

        let transparent = pipeline.manager().read().find_bin("transparent").unwrap();
        pipeline.remove_bin(transparent).unwrap();
        assert!(pipeline.pending().unwrap().bin(transparent).is_none());

        assert_eq!(in_flight.draw().objects_drawn, 1);
        assert!(context.take_calls().iter().all(|call| call.bin == "opaque"));

        assert!(pipeline.remove_bin(transparent).is_err());
        pipeline.shutdown();
    }
}
