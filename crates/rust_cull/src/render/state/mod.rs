//! Render state and attributes consumed by the cull subsystem

pub mod attrib;
mod render_state;

pub use attrib::{
    AlphaTestAttrib, AlphaTestMode, AttribKind, CullBinAttrib, RenderAttrib, TextureId,
    TransparencyAttrib, TransparencyMode,
};
pub use render_state::RenderState;
