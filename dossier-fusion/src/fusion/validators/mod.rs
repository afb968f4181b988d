// Validators - derived assessments over a fused profile
//
// Run after fusion; they read the assembled entity and never change what
// fusion selected.

pub mod completeness;
pub mod risk;

pub use completeness::CompletenessScorer;
pub use risk::assess_risk;
