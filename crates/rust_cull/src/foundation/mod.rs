//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types for transforms and camera-space distances
//! - Logging utilities

pub mod math;
pub mod logging;
