//! Feature normalization, fusion into style scores, and classification.
//!
//! This module provides:
//! - Range and batch min-max normalization of style features
//! - The fixed category fusion table
//! - Nearest-prototype label classification

pub mod classification;
pub mod fusion;
pub mod normalization;

// Re-export main types
pub use classification::{classify, dominant_dimension, prototype, prototype_distance};
pub use fusion::{Contribution, FusionBreakdown, SignalCategory, StyleFusion};
pub use normalization::{min_max_normalize, ColumnRange, FeatureNormalizer, NEUTRAL_NORMALIZED};
