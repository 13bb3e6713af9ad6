//! Rendering-side collaborators of the cull subsystem
//!
//! - **state**: immutable render states and the attributes they carry
//! - **context**: the backend interface bins draw through

pub mod context;
pub mod state;

pub use context::{DrawCall, RecordingContext, RenderContext};
pub use state::RenderState;
