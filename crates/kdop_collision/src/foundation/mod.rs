//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types and affine helpers
//! - Handle based collections
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod logging;
