//! Pattern-triggered actions
//!
//! Each action is the consequence of one definition kind matching: it
//! reads the working memory, derives new propositions, and records their
//! provenance in the derivation graph.

pub mod combiner;
pub mod low_level;
pub mod sequential;
pub mod slice;

pub use combiner::ContextCombinerAction;
pub use low_level::LowLevelAbstractionAction;
pub use sequential::SequentialPatternAction;
pub use slice::SliceAction;
