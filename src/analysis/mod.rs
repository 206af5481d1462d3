//! The guard-inference engine.
//!
//! Pure, syntax-tree-level data-flow: [`evaluator`] derives what a boolean
//! guard proves about the wrapper, [`termination`] and [`patterns`] classify
//! exits and match arms, and [`walker`] threads the per-access state through
//! a function body to a verdict. No shared state crosses invocations; one
//! walk per access, freely parallelizable.

pub mod evaluator;
pub mod outcome;
pub mod patterns;
pub mod termination;
pub mod walker;

pub use evaluator::{GuardError, GuardEvaluator};
pub use outcome::CheckOutcome;
pub use patterns::classify_pattern;
pub use termination::is_terminating;
pub use walker::{analyze_body, BodyWalker, WalkerState};
