//! # Rust Cull
//!
//! The per-frame cull-and-bin core of a real-time 3D renderer.
//!
//! Scene traversal hands every visible object to a [`CullResult`], which
//! classifies it by transparency mode, splits dual-transparent objects into
//! an opaque and a blended part, and routes each part into the render bin
//! named by its state. Bins sort their objects by policy and draw them
//! through a [`RenderContext`] in the order kept by the [`CullBinManager`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rust_cull::prelude::*;
//!
//! fn main() -> Result<(), CullError> {
//!     let context = Arc::new(RecordingContext::new());
//!     let mut pipeline = FramePipeline::from_config(&CullBinConfig::default(), context)?;
//!
//!     let frame = pipeline.cull_frame(|_result| {
//!         // Feed visible objects with _result.add_object(...)
//!         Ok(())
//!     })?;
//!     let stats = frame.draw();
//!     println!("drew {} objects", stats.objects_drawn);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod config;
pub mod core;
pub mod cull;
pub mod foundation;
pub mod render;

pub use cull::{
    BinIndex, BinType, CullBin, CullBinManager, CullError, CullResult, CullableObject, DrawStats,
    FramePipeline, SharedBinManager,
};
pub use render::{RecordingContext, RenderContext, RenderState};

/// Common imports for renderer integrations
pub mod prelude {
    pub use crate::{
        core::config::{BinDefinition, CullBinConfig},
        config::Config,
        cull::{
            BinIndex, BinType, CulledFrame, CullBin, CullBinManager, CullError, CullResult,
            CullableObject, DrawStats, FramePipeline, GeomKey, SharedBinManager,
        },
        foundation::math::{Mat4, Point3, Vec3},
        render::{
            state::{
                AlphaTestAttrib, AlphaTestMode, CullBinAttrib, RenderAttrib, TextureId,
                TransparencyAttrib, TransparencyMode,
            },
            RecordingContext, RenderContext, RenderState,
        },
    };
}
