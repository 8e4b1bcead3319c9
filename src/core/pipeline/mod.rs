//! Style Analysis Pipeline Module
//!
//! Orchestrates one analysis run from raw text to a [`StyleProfile`].
//!
//! ## Pipeline Stages
//!
//! 1. **Quantitative extraction**: lexical and syntactic statistics
//! 2. **Unit identification** and **direct style judgment**, concurrently
//! 3. **Semantic mapping**: unit vectorization and clustering
//! 4. **Behaviour analysis**: coherence, novelty and sentiment
//! 5. **Fusion**: category signals combined into six style scores
//!
//! [`StyleProfile`]: crate::core::profile::StyleProfile

pub use pipeline_executor::{AnalysisPipeline, STAGE_VECTORIZE};
pub use pipeline_results::{PipelineStatistics, StyleAnalysis};

mod pipeline_executor;
mod pipeline_results;
