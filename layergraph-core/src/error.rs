//! Errors
//!
//! Every failure the graph can report lives in [`GraphError`]. Build-time
//! kinds (duplicate names, duplicate defaults, empty graph, cycles) are
//! structural and always reach the caller. At evaluation time only
//! [`GraphError::UnresolvedDependency`] is recoverable: a registered default
//! rescues it, and the best-effort sweeps swallow it per node.

use std::fmt;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = GraphError> = std::result::Result<T, E>;

/// All errors produced while building, compiling or evaluating a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A function with this name was already registered.
    #[error("the function `{0}` has already been declared")]
    DuplicateName(String),

    /// A default for this parameter name already exists somewhere in the graph.
    #[error("the default value for `{0}` has already been specified")]
    DuplicateDefault(String),

    /// A parameter list names the same parameter twice.
    #[error("function `{function}` declares parameter `{parameter}` more than once")]
    DuplicateParameter { function: String, parameter: String },

    /// A default was supplied for a name that is not a parameter of the function.
    #[error("function `{function}` has no parameter `{parameter}` to take a default")]
    UnknownDefault { function: String, parameter: String },

    /// `compile` was called before anything was registered.
    #[error("there are no functions to compile")]
    EmptyGraph,

    /// The dependency edges contain at least one cycle.
    #[error("{0}")]
    CyclicDependency(Cycles),

    /// An initial binding names something other than a layer-0 node.
    #[error("redundant argument `{0}`")]
    UnknownInput(String),

    /// A layering lists the same node in more than one layer.
    #[error("node `{0}` appears in more than one layer")]
    DuplicateNode(String),

    /// The name is not a node of the graph.
    #[error("no name `{0}` in the graph")]
    UnknownName(String),

    /// The node cannot be computed with the current bindings.
    #[error("no value for `{0}`")]
    UnresolvedDependency(String),
}

impl GraphError {
    /// Whether this error can be absorbed during evaluation.
    ///
    /// Only unresolved dependencies are recoverable; everything else is a
    /// structural misuse of the graph.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GraphError::UnresolvedDependency(_))
    }
}

/// The cyclic components found while compiling.
///
/// Each component is a sorted list of member names. A single-member
/// component appears here only when the function depends on itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycles(Vec<Vec<String>>);

impl Cycles {
    pub(crate) fn new(mut components: Vec<Vec<String>>) -> Self {
        for component in &mut components {
            component.sort();
        }
        components.sort();
        Self(components)
    }

    /// The offending components.
    pub fn components(&self) -> &[Vec<String>] {
        &self.0
    }

    /// Number of distinct cycles.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether some component contains exactly these members, in any order.
    pub fn contains_component<S: AsRef<str>>(&self, members: &[S]) -> bool {
        let mut wanted: Vec<&str> = members.iter().map(AsRef::as_ref).collect();
        wanted.sort_unstable();
        self.0
            .iter()
            .any(|component| component.iter().map(String::as_str).eq(wanted.iter().copied()))
    }
}

impl fmt::Display for Cycles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cyclic dependencies between functions:")?;
        for component in &self.0 {
            write!(f, "\n{}", component.join(" <-> "))?;
        }
        Ok(())
    }
}

/// Failure reported by a fallible host callable.
///
/// The evaluator treats it like an unresolvable dependency of the node the
/// callable computes; the message is kept for logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ComputeError(String);

impl ComputeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}
