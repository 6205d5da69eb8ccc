//! Graph Builder
//!
//! The builder is the mutable half of the graph. Functions accumulate here
//! with their parameter lists and defaults; nothing is checked for cycles
//! until [`GraphBuilder::compile`] runs the component finder over the
//! dependency edges and freezes a [`CompiledGraph`].
//!
//! Defaults are global: they are keyed by parameter name, not by function,
//! so two functions that share a parameter name cannot both declare a
//! default for it. A default also applies when the parameter names another
//! function, in which case it rescues that function if it cannot be computed.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info_span, warn};

use super::compiled::CompiledGraph;
use super::node::{Callable, Function, FunctionSpec, Parameters};
use super::scc::strongly_connected_components;
use super::scheduler::assign_layers;
use crate::error::{ComputeError, Cycles, GraphError, Result};
use crate::eval::Arguments;

/// Mutable registry of named functions.
///
/// # Example
///
/// ```rust
/// use layergraph_core::GraphBuilder;
///
/// let mut graph = GraphBuilder::new();
/// graph.register("a", &["x"], [("x", 2)], |args| args["x"] * args["x"])?;
/// graph.register("b", &["a"], [], |args| args["a"] * args["a"])?;
///
/// let compiled = graph.compile()?;
/// assert_eq!(compiled.evaluate([])?.get("b")?, 16);
/// assert_eq!(compiled.evaluate([("x", 3)])?.get("b")?, 81);
/// # Ok::<(), layergraph_core::GraphError>(())
/// ```
pub struct GraphBuilder<V> {
    /// Label used in tracing spans.
    label: Option<String>,

    /// Registered functions, in registration order.
    functions: IndexMap<String, Function<V>>,

    /// Default values keyed by parameter name, shared across all functions.
    defaults: IndexMap<String, V>,
}

impl<V> GraphBuilder<V> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            label: None,
            functions: IndexMap::new(),
            defaults: IndexMap::new(),
        }
    }

    /// Create an empty builder whose tracing spans carry `label`.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::new()
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Register an infallible function.
    ///
    /// `parameters` lists the names the function reads, in order. Each one is
    /// either another registered function or a raw input. `defaults` maps a
    /// subset of those parameters to fallback values.
    pub fn register<'p, F>(
        &mut self,
        name: impl Into<String>,
        parameters: &[&str],
        defaults: impl IntoIterator<Item = (&'p str, V)>,
        function: F,
    ) -> Result<()>
    where
        F: Fn(&Arguments<'_, V>) -> V + Send + Sync + 'static,
        V: 'static,
    {
        let callable: Callable<V> =
            Arc::new(move |args: &Arguments<'_, V>| Ok::<V, ComputeError>(function(args)));
        self.insert(name.into(), parameters, defaults, callable)
    }

    /// Register a function that may fail.
    ///
    /// An `Err` from the function is handled like a missing dependency: the
    /// function's own default is used if one is registered, otherwise the
    /// node is unresolved.
    pub fn register_fallible<'p, F, E>(
        &mut self,
        name: impl Into<String>,
        parameters: &[&str],
        defaults: impl IntoIterator<Item = (&'p str, V)>,
        function: F,
    ) -> Result<()>
    where
        F: Fn(&Arguments<'_, V>) -> std::result::Result<V, E> + Send + Sync + 'static,
        E: fmt::Display,
        V: 'static,
    {
        let callable: Callable<V> = Arc::new(move |args: &Arguments<'_, V>| {
            function(args).map_err(|error| ComputeError::new(error.to_string()))
        });
        self.insert(name.into(), parameters, defaults, callable)
    }

    fn insert<'p>(
        &mut self,
        name: String,
        parameters: &[&str],
        defaults: impl IntoIterator<Item = (&'p str, V)>,
        callable: Callable<V>,
    ) -> Result<()> {
        if self.functions.contains_key(&name) {
            return Err(GraphError::DuplicateName(name));
        }

        let mut declared = Parameters::with_capacity(parameters.len());
        for &parameter in parameters {
            if declared.iter().any(|p| p == parameter) {
                return Err(GraphError::DuplicateParameter {
                    function: name,
                    parameter: parameter.to_string(),
                });
            }
            declared.push(parameter.to_string());
        }

        let mut staged: IndexMap<String, V> = IndexMap::new();
        for (parameter, value) in defaults {
            if !declared.iter().any(|p| p == parameter) {
                return Err(GraphError::UnknownDefault {
                    function: name,
                    parameter: parameter.to_string(),
                });
            }
            if self.defaults.contains_key(parameter) || staged.contains_key(parameter) {
                return Err(GraphError::DuplicateDefault(parameter.to_string()));
            }
            staged.insert(parameter.to_string(), value);
        }

        debug!(
            function = %name,
            parameters = declared.len(),
            defaults = staged.len(),
            "registered function"
        );

        let spec = FunctionSpec::new(name.clone(), declared);
        self.functions.insert(name, Function::new(spec, callable));
        self.defaults.extend(staged);
        Ok(())
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Whether a function with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Spec of a registered function.
    pub fn function(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions.get(name).map(Function::spec)
    }

    /// Registered default for a parameter name.
    pub fn default_value(&self, parameter: &str) -> Option<&V> {
        self.defaults.get(parameter)
    }
}

impl<V: Clone> GraphBuilder<V> {
    /// Check the dependency edges for cycles and freeze a [`CompiledGraph`].
    ///
    /// The builder stays usable afterwards; later registrations do not
    /// affect graphs that were already compiled.
    pub fn compile(&self) -> Result<CompiledGraph<V>> {
        let span = info_span!("compile", label = self.label.as_deref().unwrap_or_default());
        let _enter = span.enter();

        if self.functions.is_empty() {
            return Err(GraphError::EmptyGraph);
        }

        let edges = self.functions.values().flat_map(|function| {
            function
                .spec()
                .depends_on()
                .map(move |dependency| (function.name(), dependency))
        });

        let cycles: Vec<Vec<String>> = strongly_connected_components(edges)
            .into_iter()
            .filter(|component| component.is_cyclic())
            .map(|component| component.into_members().into_iter().map(str::to_string).collect())
            .collect();

        if !cycles.is_empty() {
            let cycles = Cycles::new(cycles);
            warn!(cycles = cycles.len(), "{cycles}");
            return Err(GraphError::CyclicDependency(cycles));
        }

        let layers = assign_layers(&self.functions)?;
        debug!(
            functions = self.functions.len(),
            nodes = layers.node_count(),
            depth = layers.len(),
            "compiled graph"
        );

        Ok(CompiledGraph::new(
            self.label.clone(),
            self.functions.clone(),
            self.defaults.clone(),
            layers,
        ))
    }
}

impl<V> Default for GraphBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for GraphBuilder<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphBuilder")
            .field("label", &self.label)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("defaults", &self.defaults.keys().collect::<Vec<_>>())
            .finish()
    }
}
