//! Dependency Graph
//!
//! This module builds and compiles the graph of named functions.
//!
//! # Overview
//!
//! The dependency graph is a directed acyclic graph (DAG) where:
//!
//! - Nodes are registered functions or raw inputs, sharing one namespace
//! - Edges point from a function to each name it takes as a parameter
//!
//! A name that is referenced but never registered is a raw input. Its value
//! comes from the caller's bindings or from a registered default.
//!
//! # Lifecycle
//!
//! 1. [`GraphBuilder`] accumulates functions and defaults. Registration only
//!    checks name and default uniqueness.
//! 2. [`GraphBuilder::compile`] runs the component finder over the edges,
//!    rejects cycles, computes the layering and returns a [`CompiledGraph`].
//! 3. The compiled graph is immutable and spawns evaluators.

mod builder;
mod compiled;
mod node;
mod scc;
mod scheduler;

pub use builder::GraphBuilder;
pub use compiled::CompiledGraph;
pub use node::{Function, FunctionSpec, NodeKind, Parameters};
pub use scc::{strongly_connected_components, Component};
pub use scheduler::{assign_layers, Layers};
