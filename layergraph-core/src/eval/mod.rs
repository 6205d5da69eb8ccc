//! Evaluation
//!
//! Evaluators resolve values against a compiled graph. They are short-lived:
//! one per set of initial bindings, discarded after use.
//!
//! # Modes
//!
//! - Lazy: nothing runs until a value is asked for with
//!   [`Evaluator::get`]. Failures surface only for what was asked.
//! - Strict: [`Evaluator::compute_all`] sweeps every layer beyond the inputs
//!   and stops at the first unresolved node.
//! - Best effort: [`Evaluator::compute_all_possible`] sweeps the same layers
//!   and silently skips what cannot be computed.

mod arguments;
mod evaluator;

pub use arguments::Arguments;
pub use evaluator::Evaluator;
