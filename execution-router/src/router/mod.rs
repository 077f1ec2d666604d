//! Query routing: complexity analysis, keyword matching, and the hybrid
//! execution-mode decision.
//!
//! ## Module Structure
//!
//! - `complexity` - Structural complexity scoring for queries
//! - `keyword_matcher` - Static keyword-to-document matching
//! - `personas` - Ordered persona selection rule tables
//! - `hybrid` - The hybrid router combining all of the above

pub mod complexity;
pub mod hybrid;
pub mod keyword_matcher;
pub mod personas;

pub use complexity::ComplexityAnalyzer;
pub use hybrid::HybridRouter;
pub use keyword_matcher::KeywordMatcher;
