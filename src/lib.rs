//! # Scrivener-RS: Writing-Style Analysis and Alignment Engine
//!
//! Turns raw text into a quantitative style profile, compares profiles, and
//! drives a controlled, reviewable LLM rewrite toward a target profile:
//!
//! - **Quantitative Analysis**: lexical, syntactic and punctuation statistics
//! - **Semantic Units**: LLM extraction of concepts, entities and charged words
//! - **Semantic Space**: cached unit embeddings, similarity and clustering
//! - **Behaviour Analysis**: cluster coherence, association novelty, sentiment
//! - **Style Profiles**: fused scores on six dimensions and a categorical label
//! - **Style Transfer**: direct, gradual and selective rewrites as reviewable changes
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        API Layer                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Core Engine  │  Detectors    │  Transfer   │  Providers    │
//! │               │               │  & Review   │               │
//! │ • Profile     │ • Quantitative│ • Compare   │ • Gemini      │
//! │ • Fusion      │ • Units       │ • Rewrite   │ • FastEmbed   │
//! │ • Pipeline    │ • Space       │ • Diff      │ • Guards      │
//! │ • Config      │ • Behaviour   │ • Sessions  │               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use scrivener_rs::providers::{GeminiClient, GeminiConfig, HashingEmbedder};
//! use scrivener_rs::{ScrivenerConfig, StyleEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let llm = Arc::new(GeminiClient::new(GeminiConfig::from_env()?));
//!     let embedder = Arc::new(HashingEmbedder::default());
//!     let engine = StyleEngine::new(ScrivenerConfig::default(), llm, embedder)?;
//!
//!     let analysis = engine.analyze_style("今天天气真好！", "note").await?;
//!     println!("{}", analysis.profile.label());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "mimalloc")]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

// Core data model, scoring and pipeline
pub mod core {
    //! Core style model, scoring algorithms and the analysis pipeline.

    pub mod config;
    pub mod errors;
    pub mod featureset;
    pub mod pipeline;
    pub mod profile;
    pub mod provenance;
    pub mod scoring;
}

// Feature extractors and analyzers
pub mod detectors {
    //! Style feature extractors and semantic analyzers.

    pub mod behavior;
    pub mod quantitative;
    pub mod semantic_space;
    pub mod semantic_units;
    pub mod style_judgment;
}

// Language-model and embedding capabilities
pub mod providers;

// Comparison and rewriting
pub mod transfer;

// Review sessions
pub mod review;

// Public API and engine interface
pub mod api {
    //! High-level API and engine interface.

    pub mod engine;
    pub mod results;
}

// Re-export primary types for convenience
pub use api::engine::StyleEngine;
pub use api::results::{EngineCacheStats, StyleComparison, TransferSession};
pub use core::config::ScrivenerConfig;
pub use core::errors::{Result, ResultExt, ScrivenerError};
pub use core::pipeline::StyleAnalysis;
pub use core::profile::{StyleDimension, StyleLabel, StyleProfile, StyleScores};
pub use review::Decision;
pub use transfer::{ChangeStatus, ComparisonMethod, StyleChange, TransferStrategy};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build-time feature detection
pub mod features {
    //! Runtime feature detection.

    /// Check if parallel processing is enabled
    pub const fn has_parallel() -> bool {
        cfg!(feature = "parallel")
    }

    /// Check if the mimalloc allocator is compiled in
    pub const fn has_mimalloc() -> bool {
        cfg!(feature = "mimalloc")
    }
}
