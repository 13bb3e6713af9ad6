//! Render attributes
//!
//! Each attribute kind occupies one slot in a `RenderState`. Only the kinds
//! the cull subsystem reads carry real semantics here; the rest are opaque
//! payload that travels with the state to the backend.

use std::hash::{Hash, Hasher};

/// Attribute slot identifier, one per attribute kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttribKind {
    /// Alpha test comparison
    AlphaTest,
    /// Transparency mode
    Transparency,
    /// Explicit bin assignment
    CullBin,
    /// Depth buffer writes
    DepthWrite,
    /// Bound texture
    Texture,
}

/// Comparison used by the alpha test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlphaTestMode {
    /// Alpha test disabled
    None,
    /// Never pass
    Never,
    /// Pass when alpha < reference
    Less,
    /// Pass when alpha == reference
    Equal,
    /// Pass when alpha <= reference
    LessEqual,
    /// Pass when alpha > reference
    Greater,
    /// Pass when alpha != reference
    NotEqual,
    /// Pass when alpha >= reference
    GreaterEqual,
    /// Always pass
    Always,
}

/// Alpha test attribute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaTestAttrib {
    mode: AlphaTestMode,
    reference: f32,
}

impl AlphaTestAttrib {
    /// Create an alpha test; the reference is clamped to `[0, 1]`
    pub fn new(mode: AlphaTestMode, reference: f32) -> Self {
        Self {
            mode,
            reference: reference.clamp(0.0, 1.0),
        }
    }

    /// Comparison mode
    pub fn mode(&self) -> AlphaTestMode {
        self.mode
    }

    /// Reference alpha value
    pub fn reference(&self) -> f32 {
        self.reference
    }
}

impl Hash for AlphaTestAttrib {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mode.hash(state);
        self.reference.to_bits().hash(state);
    }
}

/// How translucent geometry is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransparencyMode {
    /// Opaque
    #[default]
    None,
    /// Alpha blended, drawn back to front
    Alpha,
    /// Alpha to coverage
    Multisample,
    /// Alpha to coverage, mask only
    MultisampleMask,
    /// Fully opaque or fully transparent texels, done with an alpha test
    Binary,
    /// Opaque parts drawn with the opaque geometry, blended parts drawn later
    Dual,
}

/// Transparency attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransparencyAttrib {
    mode: TransparencyMode,
}

impl TransparencyAttrib {
    /// Create a transparency attribute
    pub const fn new(mode: TransparencyMode) -> Self {
        Self { mode }
    }

    /// Transparency mode
    pub const fn mode(&self) -> TransparencyMode {
        self.mode
    }
}

/// Explicit bin assignment
///
/// An empty name means "no explicit bin": the state falls back to the default
/// bin for its transparency mode but still carries the draw order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CullBinAttrib {
    bin_name: String,
    draw_order: i32,
}

impl CullBinAttrib {
    /// Assign to the named bin
    pub fn new(bin_name: impl Into<String>, draw_order: i32) -> Self {
        Self {
            bin_name: bin_name.into(),
            draw_order,
        }
    }

    /// Target bin name, possibly empty
    pub fn bin_name(&self) -> &str {
        &self.bin_name
    }

    /// Per-object draw order for fixed bins
    pub const fn draw_order(&self) -> i32 {
        self.draw_order
    }
}

/// Opaque texture reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Any render attribute
#[derive(Debug, Clone, PartialEq)]
pub enum RenderAttrib {
    /// Alpha test
    AlphaTest(AlphaTestAttrib),
    /// Transparency
    Transparency(TransparencyAttrib),
    /// Bin assignment
    CullBin(CullBinAttrib),
    /// Depth writes on/off
    DepthWrite(bool),
    /// Texture binding
    Texture(TextureId),
}

impl RenderAttrib {
    /// Slot this attribute occupies
    pub const fn kind(&self) -> AttribKind {
        match self {
            Self::AlphaTest(_) => AttribKind::AlphaTest,
            Self::Transparency(_) => AttribKind::Transparency,
            Self::CullBin(_) => AttribKind::CullBin,
            Self::DepthWrite(_) => AttribKind::DepthWrite,
            Self::Texture(_) => AttribKind::Texture,
        }
    }
}

impl Hash for RenderAttrib {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Self::AlphaTest(a) => a.hash(state),
            Self::Transparency(t) => t.hash(state),
            Self::CullBin(b) => b.hash(state),
            Self::DepthWrite(w) => w.hash(state),
            Self::Texture(t) => t.hash(state),
        }
    }
}

impl From<AlphaTestAttrib> for RenderAttrib {
    fn from(attrib: AlphaTestAttrib) -> Self {
        Self::AlphaTest(attrib)
    }
}

impl From<TransparencyAttrib> for RenderAttrib {
    fn from(attrib: TransparencyAttrib) -> Self {
        Self::Transparency(attrib)
    }
}

impl From<CullBinAttrib> for RenderAttrib {
    fn from(attrib: CullBinAttrib) -> Self {
        Self::CullBin(attrib)
    }
}

impl From<TextureId> for RenderAttrib {
    fn from(texture: TextureId) -> Self {
        Self::Texture(texture)
    }
}
