//! resultguard: a static-analysis lint for Result-like wrapper types.
//!
//! The wrapper protocol is a struct exposing two mutually exclusive boolean
//! flags (`is_success`, `is_failure`) and a `value` accessor that is only
//! valid on the success path. This crate parses Rust source with `syn` and
//! flags every value access that is not provably guarded by a prior flag
//! check along the reachable control paths of its function body.
//!
//! The core lives in [`analysis`]: a pure, syntax-level data-flow walk that
//! evaluates guard expressions into check outcomes and threads a small state
//! value through the body in document order. The surrounding layers
//! ([`analyzers`], [`io`], [`commands`]) locate access sites, fan analyses
//! out per file, and render reports.

pub mod analysis;
pub mod analyzers;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod io;

pub use crate::analysis::{analyze_body, BodyWalker, CheckOutcome, GuardError, WalkerState};
pub use crate::analyzers::{AnalyzeError, FileAnalyzer};
pub use crate::config::{ResultProtocol, ResultguardConfig};
pub use crate::core::{AnalysisReport, FileReport, Finding, Severity, RULE_ID, RULE_MESSAGE};
pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};
pub use crate::io::walker::FileWalker;
