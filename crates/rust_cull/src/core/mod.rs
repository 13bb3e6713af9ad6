//! # Core Module
//!
//! Shared configuration types used by the cull subsystem and the
//! applications that drive it.

pub mod config;

pub use config::{BinDefinition, CullBinConfig};
