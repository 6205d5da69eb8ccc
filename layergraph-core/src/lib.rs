//! Layergraph Core
//!
//! This crate compiles graphs of named functions and evaluates them on demand.
//! It implements:
//!
//! - Declarative registration of functions with named parameters and defaults
//! - Cycle detection via strongly connected components
//! - Topological layering of every node
//! - Lazy, strict and best-effort evaluation with memoization
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Registration, cycle detection, layering and the compiled graph
//! - `eval`: Per-invocation evaluators and the arguments passed to functions
//! - `error`: The error taxonomy shared by both
//!
//! # Example
//!
//! ```rust
//! use layergraph_core::GraphBuilder;
//!
//! let mut graph = GraphBuilder::new();
//! graph.register("a", &["x", "y"], [], |args| 2 * args["x"])?;
//! graph.register("b", &["y"], [], |args| 2 * args["y"])?;
//! graph.register("c", &["a", "b"], [], |args| args["a"] + args["b"])?;
//! graph.register("d", &["y", "b"], [], |args| args["y"] + args["b"])?;
//!
//! let compiled = graph.compile()?;
//!
//! // `x` is missing, so `a` and `c` cannot be computed.
//! let mut result = compiled.lazily_evaluate([("y", 3)])?;
//! let computed: Vec<(&str, &i64)> = result.successfully_computed().collect();
//! assert_eq!(computed, vec![("b", &6), ("d", &9)]);
//! # Ok::<(), layergraph_core::GraphError>(())
//! ```

pub mod error;
pub mod eval;
pub mod graph;

pub use error::{ComputeError, Cycles, GraphError, Result};
pub use eval::{Arguments, Evaluator};
pub use graph::{CompiledGraph, FunctionSpec, GraphBuilder, Layers, NodeKind};
