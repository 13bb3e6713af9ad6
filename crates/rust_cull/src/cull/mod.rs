//! Cull-and-bin subsystem
//!
//! Organizes the already-visible objects of a frame into render bins and
//! emits them in the global bin order.
//!
//! ## Architecture
//!
//! ```text
//! Traversal ──add_object──► CullResult ──► CullBin (per bin index)
//!                               │               ▲
//!                               │               │ make_new_bin
//!                               └──────► CullBinManager (shared registry)
//! ```
//!
//! - **CullResult** classifies objects by transparency and routes them
//! - **CullBin** holds one bin's objects and sorts them by its policy
//! - **CullBinManager** owns bin identities and the global draw order
//! - **FramePipeline** seeds each frame from the previous one

mod bin_manager;
mod cull_bin;
mod cull_result;
mod cullable_object;
mod error;
mod pipeline;

pub use bin_manager::{CullBinManager, SharedBinManager};
pub use cull_bin::{BinIndex, BinType, CullBin};
pub use cull_result::{CullResult, DrawStats};
pub use cullable_object::{CullableObject, GeomKey};
pub use error::CullError;
pub use pipeline::{CulledFrame, FramePipeline};
