//! Graph Nodes
//!
//! This module defines what lives in the dependency graph: raw inputs and
//! registered functions. Inputs exist only because some function names them
//! as a parameter; functions carry their declared parameters and the host
//! callable that computes them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::ComputeError;
use crate::eval::Arguments;

/// Ordered parameter names of a function.
pub type Parameters = SmallVec<[String; 4]>;

/// The kind of node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A raw input. Referenced as a parameter but never registered.
    /// Its value comes from an initial binding or a registered default.
    Input,

    /// A registered function. Computed from its dependencies on demand.
    Function,
}

/// A function's declared shape: its name and ordered parameters.
///
/// Each parameter is also a dependency edge `name -> parameter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpec {
    name: String,
    parameters: Parameters,
}

impl FunctionSpec {
    pub(crate) fn new(name: String, parameters: Parameters) -> Self {
        Self { name, parameters }
    }

    /// Name of the function, which is also its node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters in declaration order.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Names this function depends on.
    ///
    /// Parameter names are unique, so this is the parameter list viewed as a set.
    pub fn depends_on(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(String::as_str)
    }

    pub fn depends_on_name(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p == name)
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

/// Host computation invoked with named arguments.
pub(crate) type Callable<V> =
    Arc<dyn Fn(&Arguments<'_, V>) -> Result<V, ComputeError> + Send + Sync>;

/// A registered function: its spec plus the callable that computes it.
///
/// Cloning shares the callable; callables are immutable once registered.
pub struct Function<V> {
    spec: FunctionSpec,
    callable: Callable<V>,
}

impl<V> Function<V> {
    pub(crate) fn new(spec: FunctionSpec, callable: Callable<V>) -> Self {
        Self { spec, callable }
    }

    pub fn spec(&self) -> &FunctionSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// Run the callable with fully resolved arguments.
    pub(crate) fn call(&self, arguments: &Arguments<'_, V>) -> Result<V, ComputeError> {
        (self.callable)(arguments)
    }
}

impl<V> Clone for Function<V> {
    fn clone(&self) -> Self {
        Self {
            spec: self.spec.clone(),
            callable: Arc::clone(&self.callable),
        }
    }
}

impl<V> fmt::Debug for Function<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.spec.name)
            .field("parameters", &self.spec.parameters)
            .finish()
    }
}
